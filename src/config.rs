//! Application configuration and viewer preferences.
//!
//! `AppConfig` comes from `PYTHRONE_*` environment variables (a `.env` file is
//! honoured) plus an optional config file named by `PYTHRONE_CONFIG`.
//! `Preferences` is the viewer's hidden-status selection, kept in a small JSON
//! file so every front end shows the same buckets.

use crate::entities::AnimalStatus;
use crate::grouping::StatusVisibility;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_PATH: &str = "pythrone.db";
pub const DEFAULT_PREFERENCES_PATH: &str = "pythrone-prefs.json";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// SQLite file. Read from PYTHRONE_DATABASE_PATH.
    #[serde(default)]
    pub database_path: Option<String>,

    /// Hidden-status preferences file. Read from PYTHRONE_PREFERENCES_PATH.
    #[serde(default)]
    pub preferences_path: Option<String>,

    /// Listen address for the API server. Read from PYTHRONE_SERVER_ADDR.
    #[serde(default)]
    pub server_addr: Option<String>,

    /// Default tracing filter when RUST_LOG is unset. Read from PYTHRONE_LOG_LEVEL.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("PYTHRONE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("PYTHRONE"));
        c.build()?.try_deserialize()
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(
            self.database_path
                .as_deref()
                .unwrap_or(DEFAULT_DATABASE_PATH),
        )
    }

    pub fn preferences_path(&self) -> PathBuf {
        PathBuf::from(
            self.preferences_path
                .as_deref()
                .unwrap_or(DEFAULT_PREFERENCES_PATH),
        )
    }

    pub fn server_addr_or_default(&self) -> String {
        self.server_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string())
    }

    pub fn log_level_or_default(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

// ============================================================================
// PREFERENCES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub hidden_statuses: Vec<AnimalStatus>,
}

impl Preferences {
    pub fn visibility(&self) -> StatusVisibility {
        StatusVisibility::hiding(self.hidden_statuses.iter().copied())
    }

    pub fn set_visibility(&mut self, visibility: &StatusVisibility) {
        self.hidden_statuses = visibility.hidden().collect();
    }
}

/// Read preferences; a missing file means nothing is hidden.
pub fn load_preferences(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no preferences file, using defaults");
        return Ok(Preferences::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse preferences {}", path.display()))
}

pub fn save_preferences(path: &Path, prefs: &Preferences) -> Result<()> {
    let json = serde_json::to_string_pretty(prefs)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write preferences {}", path.display()))?;
    tracing::debug!(path = %path.display(), hidden = prefs.hidden_statuses.len(), "saved preferences");
    Ok(())
}
