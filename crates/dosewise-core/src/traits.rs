//! The seam between the engine and whatever loads the formulary.
//!
//! The engine never reads files or caches anything itself. A `ConfigSource`
//! hands it an immutable snapshot, and that snapshot is shared by every
//! request scored against it.

use std::sync::Arc;

use dosewise_contracts::config::FormularyConfig;

/// A read-only provider of the formulary snapshot.
///
/// Implementations load once (at process start or on an explicit reload)
/// and return the same `Arc` on every call. Callers must never mutate the
/// returned config; concurrent requests rely on it being frozen.
pub trait ConfigSource: Send + Sync {
    /// The current formulary snapshot.
    fn config(&self) -> Arc<FormularyConfig>;
}

impl ConfigSource for Arc<FormularyConfig> {
    fn config(&self) -> Arc<FormularyConfig> {
        Arc::clone(self)
    }
}
