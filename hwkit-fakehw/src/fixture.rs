// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use hwkit_types::{HostInfo, PropertyMap};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid fixture: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A whole fake machine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    /// Name of the class profile the registry vocabulary follows.
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub host: HostInfo,

    #[serde(default, rename = "device")]
    pub devices: Vec<FakeDevice>,
}

/// One registry entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FakeDevice {
    pub udi: String,

    #[serde(default)]
    pub parent: String,

    /// Class name first, then every class it derives from.
    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub properties: PropertyMap,

    /// Native volume-manager state for block devices.
    #[serde(default)]
    pub disk: Option<FakeDisk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FakeDisk {
    #[serde(default)]
    pub description: PropertyMap,

    #[serde(default)]
    pub mount_path: Option<String>,
}

impl Fixture {
    pub fn from_toml_str(input: &str) -> Result<Self, FixtureError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let contents = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// The bundled MacBook fixture.
    pub fn macbook() -> Result<Self, FixtureError> {
        Self::from_toml_str(MACBOOK)
    }
}

pub const MACBOOK: &str = include_str!("../fixtures/macbook.toml");
