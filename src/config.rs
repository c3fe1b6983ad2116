use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::derivation::BuildMode;

const APP_DIR: &str = "mxl-env";
const CONFIG_FILE: &str = "config.toml";

/// Install root used when neither the command line nor the config names one.
pub const DEFAULT_INSTALL_ROOT: &str = "vcpkg_installed";

/// User defaults read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub install_root: Option<PathBuf>,
    pub build_mode: Option<BuildMode>,
    pub prompt_marker: Option<String>,
    pub default_shell: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Load from the default location, if a home directory can be found at all.
    pub fn load_default() -> Result<Self> {
        match default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// `$XDG_CONFIG_HOME/mxl-env/config.toml`, or `~/.config/mxl-env/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".config")))?;

    Some(base.join(APP_DIR).join(CONFIG_FILE))
}

pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
