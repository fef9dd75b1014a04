use std::fs;
use std::io;

use serde::Deserialize;

/// Connection configuration, matching the 5-field JSON document
/// `config/config.go`'s `configImpl` unmarshals (`pid`, `ptoken`, `cname`,
/// `csopubkey`, `csoaddr`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "pid")]
    pub project_id: String,
    #[serde(rename = "ptoken")]
    pub project_token: String,
    #[serde(rename = "cname")]
    pub connection_name: String,
    #[serde(rename = "csopubkey")]
    pub cso_public_key: String,
    #[serde(rename = "csoaddr")]
    pub cso_address: String,
}

impl Config {
    /// `NewConfig`: builds a config in-process, without touching the filesystem.
    pub fn new(
        project_id: impl Into<String>,
        project_token: impl Into<String>,
        connection_name: impl Into<String>,
        cso_public_key: impl Into<String>,
        cso_address: impl Into<String>,
    ) -> Config {
        Config {
            project_id: project_id.into(),
            project_token: project_token.into(),
            connection_name: connection_name.into(),
            cso_public_key: cso_public_key.into(),
            cso_address: cso_address.into(),
        }
    }

    /// `NewConfigFromFile`: reads and parses a `cso_key.json`-shaped file.
    pub fn from_file(path: &str) -> Result<Config, ConfigError> {
        let bytes = fs::read(path).map_err(ConfigError::Io)?;
        serde_json::from_slice(&bytes).map_err(ConfigError::Json)
    }
}

/// Failures loading a `Config` from disk.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config file: {e}"),
            ConfigError::Json(e) => write!(f, "could not parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_five_field_document() {
        let json = r#"{
            "pid": "proj-1",
            "ptoken": "dG9rZW4=",
            "cname": "worker-a",
            "csopubkey": "-----BEGIN PUBLIC KEY-----\n...\n-----END PUBLIC KEY-----",
            "csoaddr": "https://hub.example.com"
        }"#;
        let conf: Config = serde_json::from_str(json).unwrap();
        assert_eq!(conf.project_id, "proj-1");
        assert_eq!(conf.connection_name, "worker-a");
        assert_eq!(conf.cso_address, "https://hub.example.com");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Config::from_file("/nonexistent/cso_key.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
