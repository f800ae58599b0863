//! Co-op campaign configuration: a child of a retailer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::RetailerConfig;
use crate::service::validation::{self, FieldError, Validate};

fn default_attribution_window_days() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CoopCampaignConfig {
    pub name: String,
    pub retailer_name: String,
    /// Campaign tags whose conversions are attributed to this co-op.
    pub utm_campaigns: Vec<String>,
    /// Conversion action name on the advertiser's account.
    pub conversion_name: String,
    #[serde(default = "default_attribution_window_days")]
    pub attribution_window_days: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CoopCampaignConfig {
    pub fn without_timestamps(mut self) -> Self {
        self.created_at = None;
        self.updated_at = None;
        self
    }
}

impl Validate for CoopCampaignConfig {
    const REQUIRED: &'static [&'static str] =
        &["name", "retailer_name", "utm_campaigns", "conversion_name"];

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validation::check_name("name", &self.name, &mut errors);
        validation::check_name("retailer_name", &self.retailer_name, &mut errors);
        if self.utm_campaigns.is_empty() {
            errors.push(FieldError::new(
                "utm_campaigns",
                "at least one campaign is required",
                "value_error.list.min_items",
            ));
        }
        for (i, c) in self.utm_campaigns.iter().enumerate() {
            if c.trim().is_empty() {
                errors.push(FieldError::at(
                    vec!["utm_campaigns".into(), i.to_string()],
                    "must not be blank",
                    "value_error.any_str.min_length",
                ));
            }
        }
        validation::check_not_blank("conversion_name", &self.conversion_name, &mut errors);
        validation::check_range(
            "attribution_window_days",
            self.attribution_window_days,
            1,
            90,
            &mut errors,
        );
        errors
    }
}

/// A co-op joined with its retailer: everything the conversion query needs.
#[derive(Clone, Debug)]
pub struct CoopWithRetailer {
    pub coop: CoopCampaignConfig,
    pub retailer: RetailerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_campaign_entries_are_located_by_index() {
        let c: CoopCampaignConfig = serde_json::from_value(json!({
            "name": "spring",
            "retailer_name": "acme",
            "utm_campaigns": ["spring_sale", "  "],
            "conversion_name": "Purchase"
        }))
        .unwrap();
        let errors = c.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].loc, vec!["utm_campaigns".to_string(), "1".to_string()]);
        assert_eq!(c.attribution_window_days, 7);
    }

    #[test]
    fn empty_campaign_list_is_rejected() {
        let c: CoopCampaignConfig = serde_json::from_value(json!({
            "name": "spring",
            "retailer_name": "acme",
            "utm_campaigns": [],
            "conversion_name": "",
            "attribution_window_days": 120
        }))
        .unwrap();
        let locs: Vec<String> = c.validate().into_iter().map(|e| e.loc[0].clone()).collect();
        assert_eq!(locs, vec!["utm_campaigns", "conversion_name", "attribution_window_days"]);
    }
}
