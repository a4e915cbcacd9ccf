// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host frame scheduler contract.
//!
//! The host owns the display refresh loop. The engine asks it for the next
//! tick with [`FrameScheduler::request_tick`] and the host answers by calling
//! `TimelineEngine::advance` once that frame arrives. Handles let the engine
//! cancel a request it no longer wants.

use std::collections::VecDeque;

/// Identifies one outstanding tick request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickHandle(pub u64);

/// Per-frame callback scheduler provided by the host
pub trait FrameScheduler {
    /// Ask for one more tick on the next frame
    fn request_tick(&mut self) -> TickHandle;

    /// Withdraw a request. Unknown or already delivered handles are ignored.
    fn cancel_tick(&mut self, handle: TickHandle);
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for Box<T> {
    fn request_tick(&mut self) -> TickHandle {
        (**self).request_tick()
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        (**self).cancel_tick(handle);
    }
}

/// Deterministic scheduler that only delivers ticks when told to.
///
/// Used by tests and headless hosts: call [`fire`](Self::fire) to take the
/// oldest pending request, then advance the engine.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: VecDeque<TickHandle>,
    requested: usize,
    cancelled: usize,
}

impl ManualScheduler {
    /// Create a scheduler with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the oldest pending tick, if any
    pub fn fire(&mut self) -> Option<TickHandle> {
        self.pending.pop_front()
    }

    /// Whether `handle` is still waiting
    pub fn is_pending(&self, handle: TickHandle) -> bool {
        self.pending.contains(&handle)
    }

    /// Number of requests waiting
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is waiting
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total requests ever made
    pub fn requested_count(&self) -> usize {
        self.requested
    }

    /// Requests withdrawn while still pending
    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_tick(&mut self) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.pending.push_back(handle);
        self.requested += 1;
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        if let Some(pos) = self.pending.iter().position(|h| *h == handle) {
            self.pending.remove(pos);
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_is_fifo() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.request_tick();
        let b = scheduler.request_tick();

        assert_ne!(a, b);
        assert_eq!(scheduler.fire(), Some(a));
        assert_eq!(scheduler.fire(), Some(b));
        assert_eq!(scheduler.fire(), None);
        assert_eq!(scheduler.requested_count(), 2);
    }

    #[test]
    fn test_cancel_ignores_delivered_handles() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.request_tick();
        assert!(scheduler.is_pending(a));

        assert_eq!(scheduler.fire(), Some(a));
        scheduler.cancel_tick(a);
        assert_eq!(scheduler.cancelled_count(), 0);

        let b = scheduler.request_tick();
        scheduler.cancel_tick(b);
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.cancelled_count(), 1);
    }
}
