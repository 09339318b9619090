// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;

use hwkit_core::{Backend, ClassProfile, Settings};
use hwkit_fakehw::FakeHardware;
use hwkit_udisks::UdisksManager;

const DEFAULT_FIXTURE_PROFILE: &str = "darwin";

/// The backend a command runs against.
pub struct Hardware {
    pub backend: Arc<Backend>,
    /// Present when running against the system bus; drives `listen`.
    pub manager: Option<UdisksManager>,
}

impl Hardware {
    pub async fn open(settings: &Settings, fixture: Option<&Path>) -> Result<Self> {
        match fixture {
            Some(path) => Self::from_fixture(settings, path),
            None => Self::system(settings).await,
        }
    }

    fn from_fixture(settings: &Settings, path: &Path) -> Result<Self> {
        let hardware = FakeHardware::load(path)
            .with_context(|| format!("failed to load fixture {}", path.display()))?;
        let name = hardware
            .profile
            .as_deref()
            .unwrap_or(DEFAULT_FIXTURE_PROFILE);
        let Some(profile) = ClassProfile::by_name(name) else {
            bail!("fixture {} names unknown profile '{name}'", path.display());
        };
        info!("Using fixture {} ({name} profile)", path.display());

        Ok(Self {
            backend: Backend::new(
                hardware.registry,
                hardware.session,
                profile,
                settings.clone(),
            ),
            manager: None,
        })
    }

    async fn system(settings: &Settings) -> Result<Self> {
        let manager = UdisksManager::connect()
            .await
            .context("failed to connect to UDisks2")?;

        Ok(Self {
            backend: Backend::new(
                manager.registry(),
                manager.session(),
                ClassProfile::linux(),
                settings.clone(),
            ),
            manager: Some(manager),
        })
    }
}
