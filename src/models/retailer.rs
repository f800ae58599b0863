//! Retailer configuration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::validation::{self, FieldError, Validate};

fn default_time_zone() -> String {
    "UTC".into()
}

fn default_currency() -> String {
    "USD".into()
}

fn default_max_backfill_days() -> i64 {
    90
}

fn default_true() -> bool {
    true
}

/// A retailer's warehouse integration: where its analytics events live and
/// where its generated resources go.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RetailerConfig {
    pub name: String,
    /// Analytics events table as `dataset.table`.
    pub ga_table: String,
    /// Generated dataset for this retailer. Defaults to `coop_<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_max_backfill_days")]
    pub max_backfill_days: i64,
    /// Opaque credentials handed to warehouse integrations. Stored, never returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub credentials: Option<serde_json::Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `dataset.table` split into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub dataset: &'a str,
    pub table: &'a str,
}

impl RetailerConfig {
    /// Dataset that holds the retailer's generated tables.
    pub fn dataset_name(&self) -> String {
        self.dataset
            .clone()
            .unwrap_or_else(|| format!("coop_{}", self.name))
    }

    pub fn analytics_table(&self) -> Option<TableRef<'_>> {
        let (dataset, table) = self.ga_table.split_once('.')?;
        if dataset.is_empty() || table.is_empty() || table.contains('.') {
            return None;
        }
        Some(TableRef { dataset, table })
    }

    /// Why the dataset may not be generated into, if it names a schema this
    /// service must never drop: the config schema, a system schema, or the
    /// schema holding the analytics table.
    pub fn reserved_dataset(&self, config_schema: &str) -> Option<String> {
        let ds = self.dataset_name();
        if ds == config_schema {
            return Some(format!("'{}' holds the configuration tables", ds));
        }
        if ds == "public" || ds == "information_schema" || ds.starts_with("pg_") {
            return Some(format!("'{}' is a system schema", ds));
        }
        if self.analytics_table().is_some_and(|t| t.dataset == ds) {
            return Some(format!("'{}' holds the analytics table", ds));
        }
        None
    }

    /// Response view: credentials are write-only.
    pub fn redacted(mut self) -> Self {
        self.credentials = None;
        self
    }

    /// Drops client-supplied timestamps; the store owns them.
    pub fn without_timestamps(mut self) -> Self {
        self.created_at = None;
        self.updated_at = None;
        self
    }
}

impl Validate for RetailerConfig {
    const REQUIRED: &'static [&'static str] = &["name", "ga_table"];

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validation::check_name("name", &self.name, &mut errors);
        match self.analytics_table() {
            Some(t) => {
                validation::check_identifier("ga_table", t.dataset, &mut errors);
                validation::check_identifier("ga_table", t.table, &mut errors);
            }
            None => errors.push(FieldError::new(
                "ga_table",
                "must be of the form dataset.table",
                "value_error.format",
            )),
        }
        if let Some(ds) = &self.dataset {
            validation::check_identifier("dataset", ds, &mut errors);
        }
        validation::check_time_zone("time_zone", &self.time_zone, &mut errors);
        validation::check_currency("currency", &self.currency, &mut errors);
        validation::check_range("max_backfill_days", self.max_backfill_days, 1, 90, &mut errors);
        if let Some(c) = &self.credentials {
            if !c.is_object() {
                errors.push(FieldError::new("credentials", "must be an object", "type_error.dict"));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn retailer(v: serde_json::Value) -> RetailerConfig {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let r = retailer(json!({"name": "acme", "ga_table": "analytics_1.events"}));
        assert_eq!(r.time_zone, "UTC");
        assert_eq!(r.currency, "USD");
        assert_eq!(r.max_backfill_days, 90);
        assert!(r.is_active);
        assert_eq!(r.dataset_name(), "coop_acme");
        assert!(r.validate().is_empty());
    }

    #[test]
    fn reserved_datasets_are_named() {
        let with = |ds: &str| retailer(json!({"name": "acme", "ga_table": "analytics_1.events", "dataset": ds}));
        assert!(with("coop").reserved_dataset("coop").unwrap().contains("configuration"));
        assert!(with("public").reserved_dataset("coop").is_some());
        assert!(with("pg_catalog").reserved_dataset("coop").is_some());
        assert!(with("information_schema").reserved_dataset("coop").is_some());
        assert!(with("analytics_1").reserved_dataset("coop").unwrap().contains("analytics"));
        assert!(with("acme_ads").reserved_dataset("coop").is_none());
        let default = retailer(json!({"name": "acme", "ga_table": "analytics_1.events"}));
        assert!(default.reserved_dataset("coop").is_none());
        assert!(default.reserved_dataset("coop_acme").is_some());
    }

    #[test]
    fn analytics_table_requires_two_parts() {
        let r = retailer(json!({"name": "acme", "ga_table": "events"}));
        assert!(r.analytics_table().is_none());
        let errors = r.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].loc, vec!["ga_table".to_string()]);

        let r = retailer(json!({"name": "acme", "ga_table": "a.b.c"}));
        assert!(r.analytics_table().is_none());
    }

    #[test]
    fn collects_every_bad_field() {
        let r = retailer(json!({
            "name": "Acme Corp",
            "ga_table": "analytics.events",
            "currency": "usd",
            "max_backfill_days": 0
        }));
        let locs: Vec<String> = r.validate().into_iter().map(|e| e.loc[0].clone()).collect();
        assert_eq!(locs, vec!["name", "currency", "max_backfill_days"]);
    }

    #[test]
    fn explicit_dataset_wins() {
        let r = retailer(json!({"name": "acme", "ga_table": "a.b", "dataset": "acme_out"}));
        assert_eq!(r.dataset_name(), "acme_out");
    }
}
