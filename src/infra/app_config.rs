use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Visual width of a tab when the editor does not report one.
    pub tab_width: usize,
    /// Extra columns between the longest anchor line and the callouts.
    pub cushion: usize,
    /// Glyph repeated to pad callouts into alignment.
    pub filler: String,
    /// Diff deadline in milliseconds; 0 disables it.
    pub diff_timeout_ms: u64,
    /// Show locations unprojected when their baseline cannot be fetched.
    pub highlight_fallback_to_identity: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            cushion: 2,
            filler: "-".to_string(),
            diff_timeout_ms: 0,
            highlight_fallback_to_identity: true,
        }
    }
}

/// Config from `$DRIFTMARK_CONFIG_PATH`, else `driftmark/config.toml` under
/// the user config dir. Defaults when there is no file.
pub fn load_config() -> AppConfig {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => AppConfig::default(),
    }
}

pub fn load_config_from(path: &Path) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents),
        Err(err) => {
            log::debug!("no config at {}: {}", path.display(), err);
            AppConfig::default()
        }
    }
}

/// Parse a config file, falling back to defaults when it is malformed.
pub fn parse_config(contents: &str) -> AppConfig {
    match toml::from_str(contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring malformed config: {}", err);
            AppConfig::default()
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("DRIFTMARK_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".config")))?;
    Some(config_dir.join("driftmark").join("config.toml"))
}
