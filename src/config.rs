//! Client configuration.
//!
//! Resolution order (later wins):
//!
//! 1. Built-in defaults
//! 2. JSON file at `$LINECHAT_CONFIG`, else `<config dir>/linechat/config.json`
//! 3. Environment variables (`LINECHAT_NAME`, `LINECHAT_MESSAGE_CODE`,
//!    `LINECHAT_CONNECT_TIMEOUT`, `LINECHAT_CONNECT`, `LINECHAT_LOG_FILE`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Code prefixed to every line the user sends.
pub const DEFAULT_MESSAGE_CODE: u32 = 100;

/// Default dial timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local display name, used in logs and the users pane.
    pub name: String,
    pub message_code: u32,
    pub connect_timeout_secs: u64,
    /// `host:port` to dial at startup.
    pub autoconnect: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: std::env::var("USER").unwrap_or_else(|_| "anonymous".to_string()),
            message_code: DEFAULT_MESSAGE_CODE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            autoconnect: None,
            log_file: None,
        }
    }
}

/// Resolve the config file path.
///
/// 1. `$LINECHAT_CONFIG`
/// 2. `<config dir>/linechat/config.json` (XDG on Linux, Library on macOS)
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("LINECHAT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("linechat").join("config.json"))
}

impl Config {
    /// Load defaults, then the config file if present, then the environment.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.is_file() => {
                tracing::info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(name) = lookup("LINECHAT_NAME") {
            self.name = name;
        }
        if let Some(code) = lookup("LINECHAT_MESSAGE_CODE") {
            self.message_code = code
                .trim()
                .parse()
                .with_context(|| format!("Invalid LINECHAT_MESSAGE_CODE value: {}", code))?;
        }
        if let Some(secs) = lookup("LINECHAT_CONNECT_TIMEOUT") {
            self.connect_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid LINECHAT_CONNECT_TIMEOUT value: {}", secs))?;
        }
        if let Some(target) = lookup("LINECHAT_CONNECT") {
            self.autoconnect = Some(target);
        }
        if let Some(path) = lookup("LINECHAT_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("connect_timeout_secs must be greater than zero"));
        }
        self.autoconnect_target()?;
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Split `autoconnect` into host and port.
    pub fn autoconnect_target(&self) -> Result<Option<(String, u16)>> {
        let Some(target) = self.autoconnect.as_deref() else {
            return Ok(None);
        };
        let (host, port) = target
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("Invalid autoconnect target {}: expected host:port", target))?;
        let port = port
            .parse()
            .with_context(|| format!("Invalid port in autoconnect target {}", target))?;
        Ok(Some((host.to_string(), port)))
    }

    /// Log file location.
    ///
    /// 1. `log_file` if set
    /// 2. `<cache dir>/linechat/linechat.log`
    /// 3. `<temp dir>/linechat.log` (fallback)
    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("linechat").join("linechat.log");
        }
        std::env::temp_dir().join("linechat.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    /// Generate a unique file path for this test to avoid conflicts.
    fn test_config_path(test_name: &str) -> PathBuf {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "linechat-test-{}-{}-{}.json",
            test_name,
            std::process::id(),
            timestamp
        ))
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.message_code, DEFAULT_MESSAGE_CODE);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.autoconnect, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_fields() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("LINECHAT_NAME", "alice"),
                ("LINECHAT_MESSAGE_CODE", "250"),
                ("LINECHAT_CONNECT_TIMEOUT", "3"),
                ("LINECHAT_CONNECT", "10.0.0.5:7000"),
                ("LINECHAT_LOG_FILE", "/tmp/chat.log"),
            ]))
            .expect("apply_env");

        assert_eq!(config.name, "alice");
        assert_eq!(config.message_code, 250);
        assert_eq!(config.connect_timeout_secs, 3);
        assert_eq!(
            config.autoconnect_target().expect("target"),
            Some(("10.0.0.5".to_string(), 7000))
        );
        assert_eq!(config.log_path(), PathBuf::from("/tmp/chat.log"));
    }

    #[test]
    fn test_env_rejects_bad_numbers() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup(&[("LINECHAT_MESSAGE_CODE", "abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("LINECHAT_MESSAGE_CODE"));
    }

    #[test]
    fn test_validate_rejects_bad_target() {
        let config = Config {
            autoconnect: Some("no-port".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            autoconnect: Some("host:99999".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            connect_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() {
        let path = test_config_path("partial");
        std::fs::write(&path, r#"{"name":"bob","message_code":300}"#).expect("write");

        let config = Config::from_file(&path).expect("from_file");
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.name, "bob");
        assert_eq!(config.message_code, 300);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_from_file_reports_invalid_json() {
        let path = test_config_path("invalid");
        std::fs::write(&path, "not json").expect("write");

        let result = Config::from_file(&path);
        let _ = std::fs::remove_file(&path);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
