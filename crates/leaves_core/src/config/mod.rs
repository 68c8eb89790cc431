use crate::badge::Severity;
use crate::error::AppError;
use crate::remote::{DEFAULT_ENDPOINT, DEFAULT_SUGGESTION_LIMIT};
use crate::store::DEFAULT_STORE_KEY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "LEAVES_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub urgent: &'static str,
    pub warning: &'static str,
    pub reset: &'static str,
}

impl Palette {
    fn wrap(&self, color: &str, text: &str) -> String {
        if color.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", color, text, self.reset)
        }
    }

    pub fn accentize(&self, text: &str) -> String {
        self.wrap(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        self.wrap(self.muted, text)
    }

    pub fn severity(&self, severity: Severity, text: &str) -> String {
        match severity {
            Severity::Urgent => self.wrap(self.urgent, text),
            Severity::Warning => self.wrap(self.warning, text),
            Severity::Neutral => text.to_string(),
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match canonical_theme_name_option(theme) {
        Some(ref name) if name == "autumn" => Palette {
            accent: "\x1b[38;5;208m",
            muted: "\x1b[38;5;180m",
            urgent: "\x1b[38;5;160m",
            warning: "\x1b[38;5;214m",
            reset: "\x1b[0m",
        },
        Some(ref name) if name == "noir" => Palette {
            accent: "\x1b[38;5;250m",
            muted: "\x1b[38;5;243m",
            urgent: "\x1b[1;38;5;255m",
            warning: "\x1b[38;5;252m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            urgent: "",
            warning: "",
            reset: "",
        },
    }
}

fn canonical_theme_name_option(theme: Option<&str>) -> Option<String> {
    theme.and_then(canonical_theme_name)
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        return Some("default".into());
    }

    match trimmed {
        "plain" | "none" => Some("default".to_string()),
        "fall" | "autumn_leaves" | "leaves" => Some("autumn".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        other => Some(other.to_string()),
    }
}

fn default_store_key() -> String {
    DEFAULT_STORE_KEY.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_suggestion_limit() -> usize {
    DEFAULT_SUGGESTION_LIMIT
}

fn default_create_delay_ms() -> u64 {
    1000
}

fn default_refresh_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default = "default_store_key")]
    pub store_key: String,
    #[serde(default = "default_endpoint")]
    pub suggestion_endpoint: String,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Simulated latency before a submitted note is stored.
    #[serde(default = "default_create_delay_ms")]
    pub create_delay_ms: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub desktop_notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: None,
            aliases: HashMap::new(),
            store_key: default_store_key(),
            suggestion_endpoint: default_endpoint(),
            suggestion_limit: default_suggestion_limit(),
            create_delay_ms: default_create_delay_ms(),
            refresh_interval_secs: default_refresh_interval_secs(),
            desktop_notifications: false,
        }
    }
}

impl Config {
    pub fn create_delay(&self) -> Duration {
        Duration::from_millis(self.create_delay_ms)
    }

    /// Never zero; a zero interval would spin the refresh loop.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub aliases: HashMap<String, String>,
    pub store_key: Option<String>,
    pub suggestion_endpoint: Option<String>,
    pub suggestion_limit: Option<usize>,
    pub create_delay_ms: Option<u64>,
    pub refresh_interval_secs: Option<u64>,
    pub desktop_notifications: Option<bool>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("leaves").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("leaves")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_config_theme(config))
}

fn normalize_config_theme(mut config: Config) -> Config {
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }

    for (alias, value) in overrides.aliases.iter() {
        merged.aliases.insert(alias.clone(), value.clone());
    }

    if let Some(key) = overrides.store_key.as_ref() {
        merged.store_key = key.clone();
    }
    if let Some(endpoint) = overrides.suggestion_endpoint.as_ref() {
        merged.suggestion_endpoint = endpoint.clone();
    }
    if let Some(limit) = overrides.suggestion_limit {
        merged.suggestion_limit = limit;
    }
    if let Some(delay) = overrides.create_delay_ms {
        merged.create_delay_ms = delay;
    }
    if let Some(interval) = overrides.refresh_interval_secs {
        merged.refresh_interval_secs = interval;
    }
    if let Some(enabled) = overrides.desktop_notifications {
        merged.desktop_notifications = enabled;
    }

    merged
}
