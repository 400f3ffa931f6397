//! Single-flight guard for aggregation runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// At most one refresh in flight.
///
/// Clones share the same flag, so a gate can be handed to a worker thread.
#[derive(Debug, Clone, Default)]
pub struct RefreshGate {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of a refresh; releases the gate on drop.
#[derive(Debug)]
pub struct RefreshPermit {
    busy: Arc<AtomicBool>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` when a refresh is already running
    pub fn try_begin(&self) -> Option<RefreshPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_second_begin_is_rejected() {
        let gate = RefreshGate::new();
        let permit = gate.try_begin();
        assert!(permit.is_some());
        assert!(gate.is_busy());
        assert!(gate.try_begin().is_none());

        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn test_permit_released_from_worker_thread() {
        let gate = RefreshGate::new();
        let permit = gate.try_begin().unwrap();

        let worker = thread::spawn(move || {
            let _held = permit;
        });
        worker.join().unwrap();

        assert!(!gate.is_busy());
    }

    #[test]
    fn test_clones_share_state() {
        let gate = RefreshGate::new();
        let shared = gate.clone();
        let _permit = gate.try_begin().unwrap();
        assert!(shared.try_begin().is_none());
    }
}
