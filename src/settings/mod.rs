/// User settings for the dashboard controller.
///
/// Settings are a convenience, not critical state, so the store is forgiving
/// in both directions:
///
/// 1. **Load**: every field is read independently from the stored JSON
///    record. A missing, mistyped, empty or zero value falls back to its
///    built-in default; an unparseable record yields all defaults.
/// 2. **Save**: persistence failures are recorded in the activity log and
///    otherwise swallowed.
///
/// The record lives under a fixed key ([`SETTINGS_KEY`]) in a
/// [`KeyValueStore`]. Environment variables (`THREATWATCH_*`) can override
/// fields for the current process without being persisted.
pub mod store;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activity;

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Storage key holding the JSON-encoded settings record.
pub const SETTINGS_KEY: &str = "threatDetectionSettings";

/// API base URL used when no origin is known.
pub const FALLBACK_API_URL: &str = "http://localhost:5000";

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_MAX_LOG_ENTRIES: u32 = 100;

// ---------------------------------------------------------------------------
// Settings record
// ---------------------------------------------------------------------------

/// Fully populated user configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Backend base URL, e.g. `http://localhost:5000`.
    #[serde(rename = "apiUrl", alias = "apiBaseUrl")]
    pub api_base_url: String,
    /// Poll period in milliseconds. Always greater than zero.
    #[serde(rename = "refreshInterval", alias = "refreshIntervalMs")]
    pub refresh_interval_ms: u64,
    #[serde(rename = "autoRefresh")]
    pub auto_refresh: bool,
    /// Number of threats requested for the logs view. Always greater than zero.
    #[serde(rename = "maxLogs", alias = "maxLogEntries")]
    pub max_log_entries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults(None)
    }
}

impl Settings {
    /// Built-in defaults. `origin` stands in for the page origin of the
    /// browser client; without one the documented localhost URL is used.
    pub fn defaults(origin: Option<&str>) -> Self {
        let api_base_url = origin
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(FALLBACK_API_URL)
            .to_string();
        Self {
            api_base_url,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            auto_refresh: true,
            max_log_entries: DEFAULT_MAX_LOG_ENTRIES,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Merge a stored JSON record over `defaults`, field by field.
    pub fn from_stored(raw: &Value, defaults: &Settings) -> Self {
        let field = |names: &[&str]| names.iter().find_map(|n| raw.get(*n));

        let api_base_url = field(&["apiUrl", "apiBaseUrl"])
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| defaults.api_base_url.clone());

        let refresh_interval_ms = field(&["refreshInterval", "refreshIntervalMs"])
            .and_then(positive_integer)
            .unwrap_or(defaults.refresh_interval_ms);

        let auto_refresh = field(&["autoRefresh"])
            .and_then(Value::as_bool)
            .unwrap_or(defaults.auto_refresh);

        let max_log_entries = field(&["maxLogs", "maxLogEntries"])
            .and_then(positive_integer)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(defaults.max_log_entries);

        Self {
            api_base_url,
            refresh_interval_ms,
            auto_refresh,
            max_log_entries,
        }
    }

    /// Render as TOML for display.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }
}

/// Accept a JSON number that is a positive integer (floats are rounded).
fn positive_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return (n > 0).then_some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 1.0).then(|| f.round() as u64)
}

// ---------------------------------------------------------------------------
// Settings store
// ---------------------------------------------------------------------------

/// Loads, persists and resets [`Settings`] in a key-value store.
pub struct SettingsStore {
    store: Box<dyn KeyValueStore>,
    origin: Option<String>,
}

impl SettingsStore {
    pub fn new(store: Box<dyn KeyValueStore>, origin: Option<String>) -> Self {
        Self { store, origin }
    }

    /// Store in the default file location, falling back to memory when no
    /// home directory can be determined. The origin comes from
    /// `THREATWATCH_ORIGIN`.
    pub fn open_default() -> Self {
        let origin = std::env::var("THREATWATCH_ORIGIN").ok();
        let store: Box<dyn KeyValueStore> = match FileStore::default_location() {
            Some(file) => Box::new(file),
            None => Box::new(MemoryStore::new()),
        };
        Self::new(store, origin)
    }

    pub fn defaults(&self) -> Settings {
        Settings::defaults(self.origin.as_deref())
    }

    /// Defaults merged with whatever partial record is stored.
    pub fn load(&self) -> Settings {
        let defaults = self.defaults();
        let Some(raw) = self.store.get(SETTINGS_KEY) else {
            return defaults;
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Settings::from_stored(&value, &defaults),
            Err(_) => defaults,
        }
    }

    /// Persist `settings`. Never fails observably.
    pub fn save(&self, settings: &Settings) {
        if let Err(e) = self.try_save(settings) {
            activity::warn("settings.save_failed", &format!("{e:#}"));
        }
    }

    /// Restore the hard-coded defaults and persist them.
    pub fn reset(&self) -> Settings {
        let defaults = self.defaults();
        self.save(&defaults);
        defaults
    }

    /// Set one field from its textual form, persist, and return the result.
    ///
    /// Keys accept either the snake_case CLI names or the stored camelCase
    /// names: `api_url`, `refresh_interval`, `auto_refresh`, `max_logs`.
    pub fn set_value(&self, key: &str, raw: &str) -> Result<Settings> {
        let mut settings = self.load();
        apply_value(&mut settings, key, raw)?;
        self.try_save(&settings)?;
        Ok(settings)
    }

    fn try_save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings).context("failed to encode settings")?;
        self.store.set(SETTINGS_KEY, &json)
    }
}

/// Parse and assign a single settings field.
fn apply_value(settings: &mut Settings, key: &str, raw: &str) -> Result<()> {
    let raw = raw.trim();
    match key {
        "api_url" | "apiUrl" | "api_base_url" | "apiBaseUrl" => {
            if !(raw.starts_with("http://") || raw.starts_with("https://")) {
                anyhow::bail!("expected an http(s) URL for '{key}', got '{raw}'");
            }
            settings.api_base_url = raw.to_string();
        }
        "refresh_interval" | "refreshInterval" | "refresh_interval_ms" => {
            settings.refresh_interval_ms = parse_positive(key, raw)?;
        }
        "auto_refresh" | "autoRefresh" => {
            settings.auto_refresh = parse_bool(raw)
                .with_context(|| format!("expected a boolean for '{key}', got '{raw}'"))?;
        }
        "max_logs" | "maxLogs" | "max_log_entries" => {
            let n = parse_positive(key, raw)?;
            settings.max_log_entries =
                u32::try_from(n).with_context(|| format!("'{key}' is too large: {n}"))?;
        }
        _ => anyhow::bail!("unknown settings key: '{key}'"),
    }
    Ok(())
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let n: u64 = raw
        .parse()
        .with_context(|| format!("expected a positive integer for '{key}', got '{raw}'"))?;
    if n == 0 {
        anyhow::bail!("'{key}' must be greater than zero");
    }
    Ok(n)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Apply `THREATWATCH_*` overrides from the process environment.
///
/// Supported variables:
/// - `THREATWATCH_API_URL`: backend base URL
/// - `THREATWATCH_REFRESH_MS`: poll interval in milliseconds
/// - `THREATWATCH_AUTO_REFRESH`: `1`/`true`/`yes`/`on` or the negations
/// - `THREATWATCH_MAX_LOGS`: logs view size
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_with(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup. Invalid values are
/// ignored.
pub fn apply_overrides_with(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let overrides = [
        ("THREATWATCH_API_URL", "api_url"),
        ("THREATWATCH_REFRESH_MS", "refresh_interval"),
        ("THREATWATCH_AUTO_REFRESH", "auto_refresh"),
        ("THREATWATCH_MAX_LOGS", "max_logs"),
    ];
    for (var, key) in overrides {
        if let Some(val) = lookup(var) {
            let mut candidate = settings.clone();
            if apply_value(&mut candidate, key, &val).is_ok() {
                *settings = candidate;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Directory holding all threatwatch state: `$THREATWATCH_HOME` if set,
/// otherwise `~/.threatwatch`.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("THREATWATCH_HOME") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::home_dir().map(|home| home.join(".threatwatch"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn memory(raw: Option<&str>) -> SettingsStore {
        let store = match raw {
            Some(raw) => MemoryStore::new().with(SETTINGS_KEY, raw),
            None => MemoryStore::new(),
        };
        SettingsStore::new(Box::new(store), None)
    }

    #[test]
    fn empty_storage_yields_documented_defaults() {
        let settings = memory(None).load();
        assert_eq!(settings.api_base_url, "http://localhost:5000");
        assert_eq!(settings.refresh_interval_ms, 30_000);
        assert!(settings.auto_refresh);
        assert_eq!(settings.max_log_entries, 100);
    }

    #[test]
    fn origin_replaces_fallback_url() {
        let store = SettingsStore::new(
            Box::new(MemoryStore::new()),
            Some("https://dash.example.com".to_string()),
        );
        assert_eq!(store.load().api_base_url, "https://dash.example.com");
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = memory(None);
        let settings = Settings {
            api_base_url: "http://10.0.0.5:8080".to_string(),
            refresh_interval_ms: 5_000,
            auto_refresh: false,
            max_log_entries: 25,
        };
        store.save(&settings);
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn partial_record_falls_back_per_field() {
        let store = memory(Some(r#"{"autoRefresh": false, "maxLogs": 10}"#));
        let settings = store.load();
        assert!(!settings.auto_refresh);
        assert_eq!(settings.max_log_entries, 10);
        assert_eq!(settings.refresh_interval_ms, 30_000);
        assert_eq!(settings.api_base_url, FALLBACK_API_URL);
    }

    #[test]
    fn invalid_fields_fall_back_individually() {
        let store = memory(Some(
            r#"{"apiUrl": "", "refreshInterval": 0, "autoRefresh": "yes", "maxLogs": 50, "extra": 1}"#,
        ));
        let settings = store.load();
        assert_eq!(settings.api_base_url, FALLBACK_API_URL);
        assert_eq!(settings.refresh_interval_ms, 30_000);
        assert!(settings.auto_refresh);
        assert_eq!(settings.max_log_entries, 50);
    }

    #[test]
    fn long_form_aliases_are_accepted() {
        let store = memory(Some(
            r#"{"apiBaseUrl": "http://a:1", "refreshIntervalMs": 1500.4, "maxLogEntries": 7}"#,
        ));
        let settings = store.load();
        assert_eq!(settings.api_base_url, "http://a:1");
        assert_eq!(settings.refresh_interval_ms, 1500);
        assert_eq!(settings.max_log_entries, 7);
    }

    #[test]
    fn corrupt_record_yields_defaults() {
        assert_eq!(memory(Some("{not json")).load(), Settings::default());
    }

    #[test]
    fn reset_persists_defaults() {
        let store = memory(Some(r#"{"maxLogs": 3}"#));
        let reset = store.reset();
        assert_eq!(reset, Settings::default());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn set_value_parses_and_persists() {
        let store = memory(None);
        store.set_value("refresh_interval", "10000").unwrap();
        store.set_value("auto_refresh", "off").unwrap();
        let settings = store.set_value("api_url", "https://threats.local").unwrap();
        assert_eq!(settings.refresh_interval_ms, 10_000);
        assert!(!settings.auto_refresh);
        assert_eq!(store.load().api_base_url, "https://threats.local");
    }

    #[test]
    fn set_value_rejects_bad_input() {
        let store = memory(None);
        assert!(store.set_value("refresh_interval", "0").is_err());
        assert!(store.set_value("max_logs", "-4").is_err());
        assert!(store.set_value("auto_refresh", "maybe").is_err());
        assert!(store.set_value("api_url", "ftp://x").is_err());
        assert!(store.set_value("colour", "blue").is_err());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn overrides_apply_valid_values_only() {
        let vars: HashMap<&str, &str> = [
            ("THREATWATCH_API_URL", "http://override:9000"),
            ("THREATWATCH_REFRESH_MS", "0"),
            ("THREATWATCH_AUTO_REFRESH", "false"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_overrides_with(&mut settings, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(settings.api_base_url, "http://override:9000");
        assert_eq!(settings.refresh_interval_ms, 30_000);
        assert!(!settings.auto_refresh);
    }

    #[test]
    fn toml_rendering_uses_stored_key_names() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("apiUrl"));
        assert!(toml.contains("refreshInterval = 30000"));
    }
}
