use std::time::Duration;

use serde::Deserialize;

/// CORS configuration for browser clients of the chat API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (wildcard "*" or explicit list)
    #[serde(default)]
    pub origins: AnyOrList,
    /// Allowed request headers (wildcard "*" or explicit list)
    #[serde(default)]
    pub headers: AnyOrList,
    /// Max age for preflight cache in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl CorsConfig {
    /// Preflight cache lifetime
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}

/// Either a wildcard "*" or an explicit list of values
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAnyOrList")]
pub enum AnyOrList {
    /// Match any value
    #[default]
    Any,
    /// Explicit list
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnyOrList {
    One(String),
    Many(Vec<String>),
}

impl From<RawAnyOrList> for AnyOrList {
    fn from(raw: RawAnyOrList) -> Self {
        let values = match raw {
            RawAnyOrList::One(value) => vec![value],
            RawAnyOrList::Many(values) => values,
        };

        if values.iter().any(|v| v == "*") {
            Self::Any
        } else {
            Self::List(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_string() {
        let config: CorsConfig = toml::from_str(r#"origins = "*""#).unwrap();
        assert_eq!(config.origins, AnyOrList::Any);
    }

    #[test]
    fn wildcard_inside_list_wins() {
        let config: CorsConfig = toml::from_str(r#"origins = ["http://localhost:3000", "*"]"#).unwrap();
        assert_eq!(config.origins, AnyOrList::Any);
    }

    #[test]
    fn explicit_origins() {
        let config: CorsConfig = toml::from_str(
            r#"
            origins = ["http://localhost:3000"]
            max_age = 600
        "#,
        )
        .unwrap();

        assert_eq!(
            config.origins,
            AnyOrList::List(vec!["http://localhost:3000".to_owned()])
        );
        assert_eq!(config.headers, AnyOrList::Any);
        assert_eq!(config.max_age_duration(), Some(Duration::from_secs(600)));
    }
}
