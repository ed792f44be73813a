//! Delivery counters shared across all send handles.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected while the fabric is in use.
///
/// Updated concurrently from every node's send path; read by the
/// coordinator after the run.
#[derive(Debug, Default)]
pub struct FabricStats {
    sent: AtomicU64,
    dropped_full: AtomicU64,
    dropped_disconnected: AtomicU64,
}

impl FabricStats {
    /// Messages successfully enqueued.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Messages dropped because the target inbox was full.
    pub fn dropped_full(&self) -> u64 {
        self.dropped_full.load(Ordering::Relaxed)
    }

    /// Messages discarded because the target inbox was already closed
    /// (the recipient had finalized and exited).
    pub fn dropped_disconnected(&self) -> u64 {
        self.dropped_disconnected.load(Ordering::Relaxed)
    }

    /// Total messages dropped (full + disconnected).
    pub fn dropped(&self) -> u64 {
        self.dropped_full() + self.dropped_disconnected()
    }

    /// Delivery rate (sent / (sent + dropped)).
    pub fn delivery_rate(&self) -> f64 {
        let total = self.sent() + self.dropped();
        if total == 0 {
            1.0
        } else {
            self.sent() as f64 / total as f64
        }
    }

    pub(crate) fn note_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_dropped_full(&self) {
        self.dropped_full.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_dropped_disconnected(&self) {
        self.dropped_disconnected.fetch_add(1, Ordering::Relaxed);
    }
}
