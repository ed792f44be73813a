//! Fabric configuration.

/// Default inbox depth for best-effort delivery.
///
/// Deep enough that drops only occur under deliberate saturation for any
/// realistic topology size.
pub const DEFAULT_INBOX_CAPACITY: usize = 1024;

/// Delivery behavior for node inboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Unbounded inboxes; no message is ever dropped. This is the mode the
    /// protocol's liveness properties are stated (and tested) under.
    Reliable,
    /// Bounded inboxes; a send to a full inbox drops the message and moves
    /// on. A dropped Matched or Accept can stall the recipient forever, a
    /// known liveness risk accepted for fidelity with the original design.
    BestEffort {
        /// Inbox depth.
        capacity: usize,
    },
}

impl DeliveryMode {
    /// Best-effort delivery at the default inbox depth.
    pub fn best_effort() -> Self {
        DeliveryMode::BestEffort {
            capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

impl Default for DeliveryMode {
    fn default() -> Self {
        DeliveryMode::Reliable
    }
}

/// Configuration for the channel fabric.
#[derive(Debug, Clone, Copy, Default)]
pub struct FabricConfig {
    /// How inboxes behave when pressed.
    pub mode: DeliveryMode,
}

impl FabricConfig {
    /// Fabric with the given delivery mode.
    pub fn with_mode(mode: DeliveryMode) -> Self {
        Self { mode }
    }
}
