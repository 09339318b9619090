// SPDX-License-Identifier: GPL-3.0-only

//! Fixture-driven registry and volume manager.
//!
//! Machines are described in TOML (see `fixtures/macbook.toml`). The
//! registry counts live entries so tests can check that every entry is
//! released, and the session records calls and can be told to fail or hang.

pub mod fixture;
pub mod registry;
pub mod session;

use std::path::Path;
use std::sync::Arc;

pub use fixture::{FakeDevice, FakeDisk, Fixture, FixtureError};
pub use registry::FakeRegistry;
pub use session::{Behavior, Call, FakeOperation, FakeSession};

/// Registry and session built from the same fixture.
#[derive(Debug, Clone)]
pub struct FakeHardware {
    pub registry: Arc<FakeRegistry>,
    pub session: Arc<FakeSession>,
    /// Class profile name the fixture was written for.
    pub profile: Option<String>,
}

impl FakeHardware {
    pub fn from_fixture(fixture: Fixture) -> Self {
        let session = Arc::new(FakeSession::from_fixture(&fixture));
        Self {
            registry: Arc::new(FakeRegistry::new(fixture.devices)),
            session,
            profile: fixture.profile,
        }
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        Ok(Self::from_fixture(Fixture::load(path)?))
    }

    pub fn macbook() -> Result<Self, FixtureError> {
        Ok(Self::from_fixture(Fixture::macbook()?))
    }
}
