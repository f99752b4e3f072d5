//! Shared handle to the live-tunable gains.
//!
//! An operator console (or a test) holds one clone and writes through it;
//! the drive controller holds another and re-reads a snapshot once per
//! tick. A poisoned lock still holds plain `Copy` data, so it is recovered
//! instead of propagated.

use std::sync::{Arc, PoisonError, RwLock};

use tagdrive_common::drive::error::DriveError;
use tagdrive_common::drive::tunables::DriveTunables;
use tracing::info;

/// Cloneable handle to the tunable gains.
#[derive(Debug, Clone, Default)]
pub struct TunableStore {
    inner: Arc<RwLock<DriveTunables>>,
}

impl TunableStore {
    pub fn new(initial: DriveTunables) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Copy of the current values.
    pub fn snapshot(&self) -> DriveTunables {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate in place.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut DriveTunables),
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    /// Set one value by its external name (e.g. `turn_to_angle_kP`).
    pub fn set_by_name(&self, name: &str, value: f64) -> Result<(), DriveError> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.set_by_name(name, value)?;
        info!(tunable = name, value, "tunable updated");
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        self.snapshot().get_by_name(name)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
