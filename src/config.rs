use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::backend;

pub const DEFAULT_CONFIG_PATH: &str = "mm-account.json";

/// Account file: which adapter to construct and what to hand it.
#[derive(Debug, Deserialize)]
pub struct AccountConfig {
    pub protocol: String,
    pub auth: serde_json::Value,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown protocol {protocol:?} (known: {known})")]
    UnknownProtocol { protocol: String, known: String },
}

pub fn load(path: &Path) -> Result<AccountConfig, ConfigError> {
    let label = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: label.clone(),
        source,
    })?;
    parse(&label, &text)
}

fn parse(label: &str, text: &str) -> Result<AccountConfig, ConfigError> {
    let config: AccountConfig =
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: label.to_string(),
            source,
        })?;
    if !backend::known_protocols().contains(&config.protocol.as_str()) {
        return Err(ConfigError::UnknownProtocol {
            protocol: config.protocol,
            known: backend::known_protocols().join(", "),
        });
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, parse};

    #[test]
    fn valid_config_should_parse() {
        let config = parse(
            "test",
            r#"{"protocol": "local", "auth": {"user": "alice"}}"#,
        )
        .expect("config parses");
        assert_eq!(config.protocol, "local");
        assert_eq!(config.auth["user"], "alice");
        assert!(config.config.is_none());
    }

    #[test]
    fn unknown_protocol_should_be_rejected() {
        let err = parse("test", r#"{"protocol": "xmpp", "auth": {}}"#);
        assert!(matches!(err, Err(ConfigError::UnknownProtocol { .. })));
    }

    #[test]
    fn missing_fields_should_be_a_parse_error() {
        let err = parse("test", r#"{"protocol": "local"}"#);
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }
}
