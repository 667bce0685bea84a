//! Provider identity registry.
//!
//! Every initialized provider gets a process-unique 16-bit id that
//! qualifies its cache keys. The registry is explicit shared state handed
//! into [`TileProvider::initialize`](super::TileProvider::initialize)
//! rather than a global counter; composite providers keep a clone to
//! initialize lazily created children.
//!
//! Ids are never reused. Exhausting the id space is a fatal configuration
//! error, not a wrap-around.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::error;

use crate::config::ConfigError;

/// Process-unique identity of one initialized provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u16);

impl ProviderId {
    /// Wrap a raw id. Exists for key construction in tests and stubs;
    /// production ids come from [`ProviderIdRegistry::next_id`].
    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source shared by a provider tree.
///
/// Cheap to clone; clones draw from the same counter.
#[derive(Debug, Clone, Default)]
pub struct ProviderIdRegistry {
    next: Arc<AtomicU32>,
}

impl ProviderIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ProviderIdSpaceExhausted`] once more than `u16::MAX`
    /// ids have been assigned. The counter is not reset: stale providers
    /// keep their ids and no key can ever alias another provider's.
    pub fn next_id(&self) -> Result<ProviderId, ConfigError> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if id > u16::MAX as u32 {
            error!("tile provider id space exhausted");
            return Err(ConfigError::ProviderIdSpaceExhausted);
        }
        Ok(ProviderId(id as u16))
    }

    /// How many ids have been assigned.
    pub fn assigned(&self) -> u32 {
        self.next.load(Ordering::Relaxed).min(u16::MAX as u32 + 1)
    }
}
