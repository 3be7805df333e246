// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storage_links::LinkerOptions;
use storage_types::LinkScheme;

use crate::cli::Cli;
use crate::error::ConfigError;

pub const DEFAULT_BASE_PATH: &str = "/run/disk";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parent of the by-path, by-uuid and by-serial directories
    pub base_path: PathBuf,

    /// Print device attributes alongside each event
    pub verbose: bool,

    /// Remove links left over from a previous run at startup
    pub prune_stale_links: bool,

    pub log_level: LoggingLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            verbose: false,
            prune_stale_links: true,
            log_level: LoggingLevel::Info,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the config file named on the command line, then flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_path) = &cli.base_path {
            self.base_path = base_path.clone();
        }
        if cli.verbose {
            self.verbose = true;
        }
        if cli.no_prune {
            self.prune_stale_links = false;
        }
    }

    pub fn scheme_dir(&self, scheme: LinkScheme) -> PathBuf {
        self.base_path.join(scheme.dir_name())
    }

    pub fn linker_options(&self) -> LinkerOptions {
        LinkerOptions {
            prune_stale: self.prune_stale_links,
        }
    }
}
