//! Request validation: required fields, typed deserialization, per-field rules.

use crate::error::AppError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use serde_path_to_error::{Path, Segment};
use std::sync::OnceLock;

/// One failed rule. `loc` is the path to the offending field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(field: &str, msg: impl Into<String>, kind: &str) -> Self {
        Self::at(vec![field.to_string()], msg, kind)
    }

    pub fn at(loc: Vec<String>, msg: impl Into<String>, kind: &str) -> Self {
        FieldError {
            loc,
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

/// Field-level rules for a request payload.
pub trait Validate {
    /// Fields that must be present and non-null in the raw body.
    const REQUIRED: &'static [&'static str];

    fn validate(&self) -> Vec<FieldError>;
}

pub struct RequestValidator;

impl RequestValidator {
    /// Turn a raw JSON body into `T`, reporting every problem found as a 422.
    pub fn parse<T: DeserializeOwned + Validate>(body: Value) -> Result<T, AppError> {
        let obj = match &body {
            Value::Object(m) => m,
            _ => {
                return Err(AppError::Validation(vec![FieldError::new(
                    "body",
                    "body must be a JSON object",
                    "type_error.dict",
                )]))
            }
        };
        let missing: Vec<FieldError> = T::REQUIRED
            .iter()
            .filter(|f| obj.get(**f).map_or(true, Value::is_null))
            .map(|f| FieldError::new(f, "field required", "value_error.missing"))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(missing));
        }
        let parsed: T = serde_path_to_error::deserialize(body).map_err(|e| {
            let loc = error_loc(e.path());
            AppError::Validation(vec![FieldError::at(loc, e.inner().to_string(), "type_error")])
        })?;
        let errors = parsed.validate();
        if errors.is_empty() {
            Ok(parsed)
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

/// `["utm_campaigns", "0"]` for a bad list entry; `["body"]` when serde could not tell.
fn error_loc(path: &Path) -> Vec<String> {
    let loc: Vec<String> = path
        .iter()
        .filter_map(|seg| match seg {
            Segment::Seq { index } => Some(index.to_string()),
            Segment::Map { key } => Some(key.clone()),
            Segment::Enum { variant } => Some(variant.clone()),
            Segment::Unknown => None,
        })
        .collect();
    if loc.is_empty() {
        vec!["body".to_string()]
    } else {
        loc
    }
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]{0,62}$").expect("static regex"))
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("static regex"))
}

fn time_zone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_]+(/[A-Za-z0-9_+\-]+)*$").expect("static regex"))
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("static regex"))
}

/// Record names double as warehouse identifiers, so they are kept lower-case.
pub fn check_name(field: &str, v: &str, errors: &mut Vec<FieldError>) {
    if !name_re().is_match(v) {
        errors.push(FieldError::new(
            field,
            "must start with a lower-case letter and contain only a-z, 0-9 and _ (max 63)",
            "value_error.str.regex",
        ));
    }
}

pub fn check_identifier(field: &str, v: &str, errors: &mut Vec<FieldError>) {
    if !identifier_re().is_match(v) {
        errors.push(FieldError::new(
            field,
            format!("'{}' is not a valid identifier", v),
            "value_error.str.regex",
        ));
    }
}

pub fn check_time_zone(field: &str, v: &str, errors: &mut Vec<FieldError>) {
    if !time_zone_re().is_match(v) {
        errors.push(FieldError::new(field, "must be a time zone name such as America/New_York", "value_error.str.regex"));
    }
}

pub fn check_currency(field: &str, v: &str, errors: &mut Vec<FieldError>) {
    if !currency_re().is_match(v) {
        errors.push(FieldError::new(field, "must be a three-letter ISO 4217 code", "value_error.str.regex"));
    }
}

pub fn check_not_blank(field: &str, v: &str, errors: &mut Vec<FieldError>) {
    if v.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be blank", "value_error.any_str.min_length"));
    }
}

pub fn check_range(field: &str, v: i64, min: i64, max: i64, errors: &mut Vec<FieldError>) {
    if v < min || v > max {
        errors.push(FieldError::new(
            field,
            format!("must be between {} and {}", min, max),
            "value_error.number.range",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoopCampaignConfig, RetailerConfig};
    use serde_json::json;

    fn details(err: AppError) -> Vec<FieldError> {
        match err {
            AppError::Validation(d) => d,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn reports_all_missing_required_fields() {
        let err = RequestValidator::parse::<RetailerConfig>(json!({"currency": "EUR"})).unwrap_err();
        let d = details(err);
        assert_eq!(d.len(), 2);
        assert!(d.iter().all(|e| e.kind == "value_error.missing"));
        assert_eq!(d[0].loc, vec!["name"]);
        assert_eq!(d[1].loc, vec!["ga_table"]);
    }

    #[test]
    fn null_counts_as_missing() {
        let err = RequestValidator::parse::<RetailerConfig>(json!({"name": null, "ga_table": "a.b"})).unwrap_err();
        assert_eq!(details(err)[0].loc, vec!["name"]);
    }

    #[test]
    fn wrong_types_are_reported_against_the_field() {
        let err = RequestValidator::parse::<RetailerConfig>(json!({
            "name": "acme",
            "ga_table": "a.b",
            "max_backfill_days": "ninety"
        }))
        .unwrap_err();
        let d = details(err);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].loc, vec!["max_backfill_days"]);
        assert_eq!(d[0].kind, "type_error");
    }

    #[test]
    fn wrong_list_entry_is_located_by_index() {
        let err = RequestValidator::parse::<CoopCampaignConfig>(json!({
            "name": "spring",
            "retailer_name": "acme",
            "utm_campaigns": ["ok", 5],
            "conversion_name": "Purchase"
        }))
        .unwrap_err();
        assert_eq!(details(err)[0].loc, vec!["utm_campaigns", "1"]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = RequestValidator::parse::<RetailerConfig>(json!([1, 2])).unwrap_err();
        assert_eq!(details(err)[0].kind, "type_error.dict");
    }

    #[test]
    fn valid_body_parses() {
        let r = RequestValidator::parse::<RetailerConfig>(json!({
            "name": "acme",
            "ga_table": "analytics_123.events",
            "time_zone": "America/New_York",
            "currency": "EUR"
        }))
        .unwrap();
        assert_eq!(r.currency, "EUR");
    }

    #[test]
    fn field_error_serializes_type_key() {
        let v = serde_json::to_value(FieldError::new("name", "bad", "value_error")).unwrap();
        assert_eq!(v, json!({"loc": ["name"], "msg": "bad", "type": "value_error"}));
    }
}
