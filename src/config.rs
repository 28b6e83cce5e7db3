use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the configured backend URL.
pub const BACKEND_URL_ENV: &str = "SUPERAGENT_URL";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the SuperAgent backend
    pub backend_url: String,

    /// Timeout applied to every outbound request, in seconds
    pub request_timeout_secs: u64,

    /// Superchat home directory
    pub config_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub theme: String,
    pub show_timestamps: bool,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            backend_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 60,
            config_home: home.join(".superchat"),
            ui: UiConfig {
                theme: "dark".to_string(),
                show_timestamps: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from `~/.superchat/config.toml`, writing the
    /// defaults there on first run.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Self::load_from(home.join(".superchat"))
    }

    /// Load configuration rooted at an explicit home directory.
    pub fn load_from(config_home: PathBuf) -> Result<Self> {
        let config_path = config_home.join("config.toml");

        fs::create_dir_all(&config_home)
            .context("Failed to create .superchat directory")?;

        let existed = config_path.exists();
        let mut config = if existed {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.config_home = config_home;
        if !existed {
            config.save()?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_home.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Apply the environment and CLI backend-URL overrides, lowest
    /// precedence first.
    pub fn apply_overrides(&mut self, env_url: Option<String>, cli_url: Option<String>) {
        for url in [env_url, cli_url].into_iter().flatten() {
            if !url.trim().is_empty() {
                self.backend_url = url;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_defaults_back() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join(".superchat");

        let config = Config::load_from(home.clone()).unwrap();

        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 60);
        assert!(home.join("config.toml").exists());
    }

    #[test]
    fn saved_changes_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join(".superchat");

        let mut config = Config::load_from(home.clone()).unwrap();
        config.backend_url = "http://10.0.0.5:8000".to_string();
        config.ui.show_timestamps = false;
        config.save().unwrap();

        let reloaded = Config::load_from(home).unwrap();
        assert_eq!(reloaded.backend_url, "http://10.0.0.5:8000");
        assert!(!reloaded.ui.show_timestamps);
    }

    #[test]
    fn cli_override_wins_over_environment() {
        let mut config = Config::default();
        config.apply_overrides(
            Some("http://env-host:8000".to_string()),
            Some("http://cli-host:8000".to_string()),
        );
        assert_eq!(config.backend_url, "http://cli-host:8000");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some("   ".to_string()), None);
        assert_eq!(config.backend_url, "http://localhost:8000");

        config.apply_overrides(Some("http://env-host:8000".to_string()), None);
        assert_eq!(config.backend_url, "http://env-host:8000");
    }
}
