use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cardia_history::HistoryConfig;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "CARDIA_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardiaConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// The JSON file backing the history store. Called `data_file` before v1.
    pub store_path: PathBuf,
    /// Added in v1; older configs get the defaults.
    #[serde(default)]
    pub history: HistoryConfig,
    pub created_at: jiff::Timestamp,
}

impl CardiaConfig {
    /// A fresh config pointing at `store_path` with default history behavior.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            config_version: CURRENT_VERSION,
            store_path: store_path.into(),
            history: HistoryConfig::default(),
            created_at: jiff::Timestamp::now(),
        }
    }

    /// A fresh config using the platform data directory for the store.
    pub fn with_default_store() -> eyre::Result<Self> {
        Ok(Self::new(default_store_path()?))
    }
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("cardia"))
}

/// Where the config lives: `$CARDIA_CONFIG` if set, else the platform
/// config directory.
pub fn config_path() -> eyre::Result<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(config_dir()?.join("config.json")),
    }
}

pub fn default_store_path() -> eyre::Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| eyre::eyre!("no data directory found"))?;
    Ok(base.join("cardia").join("history.json"))
}

pub fn has_config() -> bool {
    config_path().map(|p| p.exists()).unwrap_or(false)
}

pub fn load_config() -> eyre::Result<CardiaConfig> {
    load_config_from(&config_path()?)
}

/// Load the config if one exists, otherwise defaults (not written to disk).
pub fn load_or_default() -> eyre::Result<CardiaConfig> {
    if has_config() {
        load_config()
    } else {
        tracing::debug!("no config file, using defaults");
        CardiaConfig::with_default_store()
    }
}

pub fn load_config_from(path: &Path) -> eyre::Result<CardiaConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));

    let migrated = migrate(json, on_disk_version)?;
    let config: CardiaConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update cardia."
        ));
    }

    // v0 → v1: rename data_file to store_path, add history settings
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        if let Some(data_file) = obj.remove("data_file") {
            obj.entry("store_path").or_insert(data_file);
        }
        obj.entry("history")
            .or_insert_with(|| serde_json::json!({}));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (store_path, history)");
    }

    Ok(json)
}

pub fn save_config(config: &CardiaConfig) -> eyre::Result<PathBuf> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, config: &CardiaConfig) -> eyre::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
