//! Configuration file support for linecmd.
//!
//! Loads optional `.linecmd/config.toml` from a root directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::colors::ColorMode;
use crate::interface::InterfaceSettings;

/// Root configuration structure
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinecmdConfig {
    pub interface: InterfaceConfig,
    #[serde(rename = "loop")]
    pub cli_loop: LoopConfig,
    pub output: OutputConfig,
}

/// How lines are routed to handlers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Run every handler that accepts a line, not only the first.
    pub multi_handle_commands: bool,
    /// Report the debug form of failures after their message.
    pub print_error_chain: bool,
    /// Answer `help` with the command listing.
    pub help: bool,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            multi_handle_commands: false,
            print_error_chain: false,
            help: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Written before every read; none by default.
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub color: ColorMode,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl LinecmdConfig {
    /// Load config from `.linecmd/config.toml` in the given root directory.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        Self::load_from_path(&Self::path_in(root))
    }

    /// Where [`load`](Self::load) looks under `root`.
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(".linecmd").join("config.toml")
    }

    /// Load config from a specific path, warning on stderr on failure.
    pub fn load_from_path(path: &Path) -> Self {
        match Self::try_load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("[linecmd][warn] {e}");
                Self::default()
            }
        }
    }

    /// Load config from a specific path. A missing file gives the defaults.
    pub fn try_load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn interface_settings(&self) -> InterfaceSettings {
        InterfaceSettings {
            multi_handle_commands: self.interface.multi_handle_commands,
            print_error_chain: self.interface.print_error_chain,
        }
    }
}
