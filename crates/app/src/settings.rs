//! Handles settings for the application.
//!
//! Values come from an optional TOML file (`config/batchbook.toml` unless
//! `--config` says otherwise), then `BATCHBOOK_*` environment variables, then
//! command line overrides. Nested keys use `__` in the environment, e.g.
//! `BATCHBOOK_REMOTE__KIND=rest`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{cli::GlobalArgs, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/batchbook";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RemoteSettings {
    /// Only the local snapshot persists batches.
    #[default]
    Offline,
    /// Relational database, e.g. `sqlite:./batchbook.db?mode=rwc`.
    Database { url: String },
    /// PostgREST-style service.
    Rest { base_url: String, api_key: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub level: String,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub currency_symbol: String,
    pub remote: RemoteSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            data_dir: PathBuf::from("data"),
            export_dir: PathBuf::from("exports"),
            currency_symbol: "₹".to_string(),
            remote: RemoteSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("BATCHBOOK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if let Some(level) = &args.level {
            settings.level = level.clone();
        }
        if let Some(data_dir) = &args.data_dir {
            settings.data_dir = data_dir.clone();
        }
        Ok(settings)
    }

    /// Local snapshot, used when no remote is configured.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("batches.json")
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let args = GlobalArgs {
            config: Some("target/test_state/missing".to_string()),
            level: Some("debug".to_string()),
            data_dir: None,
        };
        let settings = Settings::load(&args).unwrap();

        assert_eq!(settings.level, "debug");
        assert_eq!(settings.currency_symbol, "₹");
        assert_eq!(settings.snapshot_path(), PathBuf::from("data/batches.json"));
    }

    #[test]
    fn remote_kind_is_tagged() {
        let remote: RemoteSettings = serde_json::from_str(
            r#"{ "kind": "rest", "base_url": "https://demo.example.co", "api_key": "anon" }"#,
        )
        .unwrap();
        assert_eq!(
            remote,
            RemoteSettings::Rest {
                base_url: "https://demo.example.co".to_string(),
                api_key: "anon".to_string(),
            }
        );
    }
}
