//! Runtime configuration from the environment.
//!
//! | Variable            | Default               |
//! |---------------------|-----------------------|
//! | `EDUCA_PORT`        | `3000`                |
//! | `EDUCA_STORE_PATH`  | `.educa/dataset.json` |
//! | `EDUCA_ENCODING`    | `latin1`              |
//!
//! A `.env` file in the working directory is loaded first, if present.
//! CLI flags override whatever is read here.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::parser::TextEncoding;
use crate::store::DEFAULT_STORE_PATH;
use crate::transaction::ImportOptions;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub port: u16,
    pub store_path: PathBuf,
    pub encoding: TextEncoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            encoding: TextEncoding::default(),
        }
    }
}

impl Config {
    /// Load from process environment (after `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("EDUCA_PORT") {
            config.port = port.trim().parse().map_err(|_| invalid("EDUCA_PORT", &port))?;
        }
        if let Some(path) = lookup("EDUCA_STORE_PATH").filter(|p| !p.trim().is_empty()) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(encoding) = lookup("EDUCA_ENCODING") {
            config.encoding = encoding
                .parse()
                .map_err(|_| invalid("EDUCA_ENCODING", &encoding))?;
        }

        Ok(config)
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            encoding: self.encoding,
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
