//! Type definitions for the order engine

pub mod records;

/// Engine configuration.
///
/// Plain in-process state; callers construct one at startup and hand it to
/// [`crate::OrderEngine`]. Defaults reproduce the storefront's original
/// cadences.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seconds between delivery tracking advances.
    pub delivery_tick_secs: u64,
    /// Seconds between refund pipeline advances.
    pub refund_tick_secs:   u64,
    /// Base URL of the optional remote order mirror. `None` disables
    /// mirroring entirely.
    pub mirror_base_url:    Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delivery_tick_secs: 10,
            refund_tick_secs:   4,
            mirror_base_url:    None,
        }
    }
}

impl EngineConfig {
    /// Sets the delivery tick period.
    #[must_use]
    pub fn with_delivery_tick_secs(mut self, secs: u64) -> Self {
        self.delivery_tick_secs = secs;
        self
    }

    /// Sets the refund tick period.
    #[must_use]
    pub fn with_refund_tick_secs(mut self, secs: u64) -> Self {
        self.refund_tick_secs = secs;
        self
    }

    /// Enables the remote order mirror.
    #[must_use]
    pub fn with_mirror_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.mirror_base_url = Some(base_url.into());
        self
    }
}
