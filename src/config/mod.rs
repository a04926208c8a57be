mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, io::ErrorKind};
use tracing::debug;

/// Loads the configuration file named by `CONFIG_PATH` and resolves the API
/// key from the environment. A missing key is fatal.
pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let mut config = read_file(&config_path).await?;
    let api_key = env::var(&config.llm.api_key_env).ok();
    config.llm.api_key = resolve_api_key(&config.llm.api_key_env, api_key)?;

    Ok(config)
}

/// Same as [`load`] but with an explicit path and key, for callers that do not
/// want to touch the process environment.
pub async fn load_from(config_path: &str, api_key: Option<String>) -> Result<Config> {
    let mut config = read_file(config_path).await?;
    config.llm.api_key = resolve_api_key(&config.llm.api_key_env, api_key)?;
    Ok(config)
}

impl Config {
    pub fn from_yaml(config_str: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to the defaults.
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(config_str)?)
    }
}

async fn read_file(config_path: &str) -> Result<Config> {
    debug!("Loading configuration from: {}", config_path);

    match tokio::fs::read_to_string(config_path).await {
        Ok(config_str) => Config::from_yaml(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No configuration file at {}, using defaults", config_path);
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn resolve_api_key(var_name: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(Error::config(format!(
            "{var_name} environment variable is not set"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.logs.level, "info");
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.llm.timeout_secs, 120);
        assert!(config.llm.system_prompt.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml(
            r#"
server:
  port: 9000
llm:
  model: "gemini-1.5-flash"
  timeout_secs: 30
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(
            config.llm.base_url,
            "https://generativelanguage.googleapis.com"
        );
    }

    #[test]
    fn test_api_key_in_file_is_ignored() {
        let config = Config::from_yaml(
            r#"
llm:
  api_key: "from-file"
"#,
        )
        .unwrap();
        assert!(config.llm.api_key.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let result = Config::from_yaml("server:\n  port: \"not-a-number\"\n");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[tokio::test]
    async fn test_load_from_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.yaml");

        let config = load_from(&path.to_string_lossy(), Some("key".to_string()))
            .await
            .unwrap();
        assert_eq!(config.llm.api_key, "key");
        assert_eq!(config.server.port, 8080);
    }

    #[tokio::test]
    async fn test_load_from_without_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        tokio::fs::write(&path, "llm:\n  api_key_env: \"PID_KEY\"\n")
            .await
            .unwrap();

        let err = load_from(&path.to_string_lossy(), None).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("PID_KEY"));

        let err = load_from(&path.to_string_lossy(), Some("   ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
