//! Environment-driven settings. `.env` is read first when present.

use crate::error::ConfigError;
use std::env;
use std::net::SocketAddr;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Defaults to `database_url` when unset.
    pub warehouse_url: String,
    pub coop_schema: String,
    pub bind_addr: SocketAddr,
    pub max_db_connections: u32,
    pub body_limit_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/coop".into());
        let warehouse_url = get("WAREHOUSE_URL").unwrap_or_else(|| database_url.clone());
        let coop_schema = get("COOP_SCHEMA").unwrap_or_else(|| "coop".into());
        if coop_schema.is_empty() || !coop_schema.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidValue {
                key: "COOP_SCHEMA",
                value: coop_schema,
            });
        }
        Ok(Settings {
            database_url,
            warehouse_url,
            coop_schema,
            bind_addr: parse(&get, "BIND_ADDR", "0.0.0.0:3000")?,
            max_db_connections: parse(&get, "MAX_DB_CONNECTIONS", "5")?,
            body_limit_bytes: parse(&get, "BODY_LIMIT_BYTES", "1048576")?,
        })
    }
}

fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    let raw = get(key).unwrap_or_else(|| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn warehouse_falls_back_to_database() {
        let s = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://db/one"), ("COOP_SCHEMA", "coop")])).unwrap();
        assert_eq!(s.warehouse_url, "postgres://db/one");
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.max_db_connections, 5);
    }

    #[test]
    fn bad_numbers_name_the_key() {
        let err = Settings::from_lookup(lookup(&[("COOP_SCHEMA", "coop"), ("MAX_DB_CONNECTIONS", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MAX_DB_CONNECTIONS", .. }));
    }

    #[test]
    fn schema_must_be_an_identifier() {
        let err = Settings::from_lookup(lookup(&[("COOP_SCHEMA", "coop; drop")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "COOP_SCHEMA", .. }));
    }
}
