use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::navigation::{DecodeStats, NavigationSnapshot, Navigator};
use crate::nmea::{DecodeError, DecodedReading};
use crate::waypoint::Waypoint;

/// Cheaply cloneable, thread-safe handle over a [Navigator].
///
/// The feed side takes the write lock per sentence; readers take owned
/// [NavigationSnapshot] copies and never hold the lock across their own
/// computations. A panic while holding the lock does not wedge the
/// other side: the poison is discarded, scalar state is always
/// internally consistent after any single update.
#[derive(Clone)]
pub struct SharedNavigator {
    inner: Arc<RwLock<Navigator>>,
}

impl SharedNavigator {
    pub fn new(navigator: Navigator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(navigator)),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Navigator> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, Navigator> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decode and fold one NMEA line into the shared state.
    pub fn feed_line(&self, line: &str) -> Result<(), DecodeError> {
        self.write().feed_line(line)
    }

    /// Fold one already-decoded reading into the shared state.
    pub fn accept(&self, reading: DecodedReading) {
        self.write().accept(reading);
    }

    /// Owned copy of the current navigation state.
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.read().snapshot()
    }

    pub fn set_target(&self, target: Option<Waypoint>) {
        self.write().set_target(target);
    }

    pub fn clear_target(&self) {
        self.write().clear_target();
    }

    pub fn stats(&self) -> DecodeStats {
        self.read().stats()
    }

    pub fn reset(&self) {
        self.write().reset();
    }
}
