//! Single-slot frame request queue.
//!
//! The control thread submits states as fast as edits arrive; the render loop
//! takes whatever is newest at its frame boundary. A submission that was
//! never taken is overwritten, so stale frames are never rendered.

use parking_lot::Mutex;

use crate::transform::params::AdjustmentState;

#[derive(Debug, Default)]
struct Pending {
    state: Option<AdjustmentState>,
    generation: u64,
}

/// Latest-wins render request slot. Safe to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct FrameSlot {
    pending: Mutex<Pending>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `state` for the next frame, replacing any request not yet taken.
    /// Returns the request's generation number.
    pub fn submit(&self, state: AdjustmentState) -> u64 {
        let mut pending = self.pending.lock();
        if pending.state.is_some() {
            tracing::trace!(generation = pending.generation, "superseding pending frame");
        }
        pending.generation += 1;
        pending.state = Some(state);
        pending.generation
    }

    /// Take the newest request, leaving the slot empty.
    pub fn take(&self) -> Option<(u64, AdjustmentState)> {
        let mut pending = self.pending.lock();
        let generation = pending.generation;
        pending.state.take().map(|state| (generation, state))
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().state.is_some()
    }

    /// Generation of the most recent submission.
    pub fn generation(&self) -> u64 {
        self.pending.lock().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::params::keys;
    use std::sync::Arc;

    fn state(v: f32) -> AdjustmentState {
        AdjustmentState::default().apply_adjustment(keys::CONTRAST, v)
    }

    #[test]
    fn test_newer_submission_supersedes_pending() {
        let slot = FrameSlot::new();
        slot.submit(state(1.0));
        slot.submit(state(2.0));
        let (generation, latest) = slot.take().unwrap();
        assert_eq!(generation, 2);
        assert_eq!(latest, state(2.0));
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_concurrent_submitters_leave_one_request() {
        let slot = Arc::new(FrameSlot::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        slot.submit(state((t * 25 + i) as f32));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(slot.generation(), 100);
        assert!(slot.take().is_some());
        assert!(!slot.has_pending());
    }
}
