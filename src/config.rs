//! Optional TOML configuration file with defaults for command-line options.
//!
//! ```toml
//! organization = "Example Org"
//! removal_allowed = false
//! manage = "once"
//! format = "binary"
//! output_dir = "/Users/Shared/profiles"
//! ```
//!
//! Every key is optional; flags given on the command line win over the file.

use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::profile::{ManageMode, OutputFormat};

/// File name looked up under the platform configuration directory.
const CONFIG_FILE: &str = "config.toml";

/// Contents of the configuration file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Settings {
    pub organization: Option<String>,
    pub removal_allowed: Option<bool>,
    /// `Once`, `Often` or `Always`, any case.
    pub manage: Option<String>,
    pub format: Option<OutputFormat>,
    /// Directory for the default `<identifier>.mobileconfig` output.
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// The configured management mode, validated.
    pub fn manage_mode(&self) -> Result<Option<ManageMode>, AppError> {
        self.manage.as_deref().map(str::parse).transpose()
    }
}

/// `<config dir>/mcxtoprofile/config.toml`, e.g.
/// `~/Library/Application Support/mcxtoprofile/config.toml` on macOS.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mcxtoprofile").join(CONFIG_FILE))
}

/// Parse and validate configuration text.
pub fn parse(text: &str) -> Result<Settings, AppError> {
    let settings: Settings = toml::from_str(text)
        .map_err(|e| AppError::Validation(format!("invalid configuration: {e}")))?;
    settings.manage_mode()?;
    Ok(settings)
}

/// Load settings from `explicit` if given, otherwise from [`default_path`]
/// when that file exists. No file means default settings.
pub fn load(explicit: Option<&Path>) -> Result<Settings, AppError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(AppError::FileNotFound(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Settings::default()),
        },
    };

    tracing::debug!(path = %path.display(), "loading configuration");
    let text = std::fs::read_to_string(&path)?;
    parse(&text)
}
