use config::{Config, ConfigError, Environment, File};
use lead_pipeline::OrchestratorSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Without this section any origin may call the API.
    pub cors: Option<CorsConfig>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SubmissionConfig {
    pub cooldown_secs: u64,
    pub storage_timeout_ms: u64,
    pub session_idle_secs: u64,
    /// Upper bound on tracked browser sessions.
    pub max_sessions: usize,
    pub default_source: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 30,
            storage_timeout_ms: 10_000,
            session_idle_secs: 1_800,
            max_sessions: 10_000,
            default_source: "contact".to_string(),
        }
    }
}

impl SubmissionConfig {
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            cooldown: Duration::from_secs(self.cooldown_secs),
            storage_timeout: Duration::from_millis(self.storage_timeout_ms),
            default_source: self.default_source.clone(),
        }
    }

    /// Never shorter than the cooldown, or pruning would reopen the window.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs.max(self.cooldown_secs))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// HTTP endpoint of the transactional email provider.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
    pub subject_prefix: String,
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            from: None,
            to: Vec::new(),
            subject_prefix: "[Site]".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    /// Reads `path` (or the default location), writing a default file first
    /// when none exists. `LEADBOX__SECTION__KEY` variables override the file.
    pub fn load(path: Option<PathBuf>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.unwrap_or_else(get_config_path);

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            let default_config = toml::to_string_pretty(&ApiConfig::default()).map_err(|e| {
                ConfigError::Message(format!("Failed to serialize default config: {e}"))
            })?;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .add_source(
                Environment::with_prefix("LEADBOX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("leadbox").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("api.toml");

        let (config, used) = ApiConfig::load(Some(path.clone())).unwrap();

        assert_eq!(used, path);
        assert!(path.exists());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.submission.cooldown_secs, 30);
        assert!(!config.notification.enabled);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.toml");
        std::fs::write(
            &path,
            r#"
[submission]
cooldown_secs = 45

[notification]
enabled = true
endpoint = "https://mail.example.test/emails"
to = ["agence@example.fr"]
"#,
        )
        .unwrap();

        let (config, _) = ApiConfig::load(Some(path)).unwrap();

        assert_eq!(config.submission.cooldown_secs, 45);
        assert_eq!(config.submission.storage_timeout_ms, 10_000);
        assert_eq!(config.submission.max_sessions, 10_000);
        assert!(config.notification.enabled);
        assert_eq!(config.notification.to, vec!["agence@example.fr"]);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_session_idle_never_below_cooldown() {
        let submission = SubmissionConfig {
            cooldown_secs: 60,
            session_idle_secs: 10,
            ..SubmissionConfig::default()
        };

        assert_eq!(submission.session_idle(), Duration::from_secs(60));
        assert_eq!(
            submission.orchestrator_settings().storage_timeout,
            Duration::from_millis(10_000)
        );
    }
}
