//! Simulation configuration.

use pairwise_fabric::DeliveryMode;
use pairwise_node::EngineConfig;
use std::time::Duration;

/// Configuration for one simulation run.
///
/// Defaults to reliable delivery and no pacing: the configuration the
/// protocol's liveness properties are stated under. The simulator binary
/// switches to best-effort delivery and nonzero pacing to reproduce the
/// original trace-friendly behavior.
#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    /// Inbox behavior for the channel fabric.
    pub delivery: DeliveryMode,
    /// Per-engine tuning.
    pub engine: EngineConfig,
}

impl SimulationConfig {
    /// Override the delivery mode.
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Override the engine pacing delay.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.engine.pacing = pacing;
        self
    }
}
