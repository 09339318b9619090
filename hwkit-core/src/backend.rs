// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use hwkit_contracts::{NativeSession, RegistryWalker};

use crate::config::Settings;
use crate::profile::ClassProfile;

/// Everything a device needs to talk to its platform.
pub struct Backend {
    registry: Arc<dyn RegistryWalker>,
    session: Arc<dyn NativeSession>,
    profile: ClassProfile,
    settings: Settings,
}

impl Backend {
    pub fn new(
        registry: Arc<dyn RegistryWalker>,
        session: Arc<dyn NativeSession>,
        profile: ClassProfile,
        settings: Settings,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            session,
            profile,
            settings,
        })
    }

    pub fn registry(&self) -> &dyn RegistryWalker {
        self.registry.as_ref()
    }

    pub fn session(&self) -> &dyn NativeSession {
        self.session.as_ref()
    }

    pub fn profile(&self) -> &ClassProfile {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
