use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings read once per cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    pub user_id_index: String,
    pub url_expiry: Duration,
    pub max_labels: i32,
    pub min_confidence: f32,
    pub identity_header: String,
    /// Identity used when the header is absent. `None` rejects such requests.
    pub default_user_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any name→value source; `from_env` passes the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            table_name: required("TABLE_NAME")?,
            bucket_name: required("BUCKET_NAME")?,
            user_id_index: lookup("USER_ID_INDEX").unwrap_or_else(|| "UserIdIndex".to_string()),
            url_expiry: Duration::from_secs(parse_or(&lookup, "SIGNED_URL_EXPIRY_SECS", 3600)?),
            max_labels: parse_or(&lookup, "LABEL_MAX_LABELS", 10)?,
            min_confidence: parse_or(&lookup, "LABEL_MIN_CONFIDENCE", 70.0)?,
            identity_header: lookup("IDENTITY_HEADER")
                .unwrap_or_else(|| "Authorization".to_string()),
            default_user_id: match lookup("DEFAULT_USER_ID") {
                Some(v) if v.is_empty() => None,
                Some(v) => Some(v),
                None => Some("demo-user".to_string()),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
