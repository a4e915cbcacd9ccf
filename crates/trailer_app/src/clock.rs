// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host clock and the redraw-driven frame scheduler.

use std::time::Instant;
use trailer_timeline::{FrameScheduler, TickHandle};

/// Monotonic millisecond clock anchored at app start
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    epoch: Instant,
}

impl HostClock {
    /// Start the clock now
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since the clock started
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Wakes the host so the next frame gets drawn
pub type RedrawWaker = Box<dyn Fn()>;

/// Frame scheduler backed by the window's redraw loop.
///
/// A tick request asks the window for a redraw through the waker; the next
/// `RedrawRequested` takes the tick with [`take_due`](Self::take_due) and
/// advances the engine.
#[derive(Default)]
pub struct RedrawScheduler {
    next_id: u64,
    pending: Option<TickHandle>,
    waker: Option<RedrawWaker>,
}

impl RedrawScheduler {
    /// Create a scheduler with nothing pending and no window attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler that calls `waker` on every tick request
    pub fn with_waker(waker: impl Fn() + 'static) -> Self {
        Self {
            waker: Some(Box::new(waker)),
            ..Self::default()
        }
    }

    /// Take the pending tick for this frame, if any
    pub fn take_due(&mut self) -> Option<TickHandle> {
        self.pending.take()
    }

    /// Whether a tick is waiting for the next frame
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl std::fmt::Debug for RedrawScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedrawScheduler")
            .field("next_id", &self.next_id)
            .field("pending", &self.pending)
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_tick(&mut self) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.pending = Some(handle);
        if let Some(wake) = &self.waker {
            wake();
        }
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use trailer_timeline::{
        PlaybackPhase, RecordingAudio, SceneScript, SceneSpec, TimelineEngine,
    };

    #[test]
    fn test_cancel_only_matching_handle() {
        let mut scheduler = RedrawScheduler::new();
        let first = scheduler.request_tick();
        let second = scheduler.request_tick();

        scheduler.cancel_tick(first);
        assert!(scheduler.has_pending());
        scheduler.cancel_tick(second);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_tick_request_wakes_window() {
        let wakes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&wakes);
        let mut scheduler = RedrawScheduler::with_waker(move || counter.set(counter.get() + 1));

        let handle = scheduler.request_tick();
        assert_eq!(wakes.get(), 1);
        scheduler.cancel_tick(handle);
        assert_eq!(wakes.get(), 1);

        scheduler.request_tick();
        assert_eq!(wakes.get(), 2);
        assert!(scheduler.take_due().is_some());
    }

    #[test]
    fn test_engine_wakes_once_per_frame() {
        let wakes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&wakes);
        let script = SceneScript::new(vec![SceneSpec::new(1, 0.0, 1.0)]).unwrap();
        let scheduler = RedrawScheduler::with_waker(move || counter.set(counter.get() + 1));
        let mut engine = TimelineEngine::new(script, RecordingAudio::new(), scheduler);

        engine.start(0.0);
        assert_eq!(wakes.get(), 1);
        assert!(engine.scheduler_mut().take_due().is_some());
        engine.advance(16.0);
        assert_eq!(wakes.get(), 2);

        assert!(engine.scheduler_mut().take_due().is_some());
        engine.advance(2000.0);
        assert_eq!(engine.phase(), PlaybackPhase::Finished);
        assert_eq!(wakes.get(), 2);
    }

    #[test]
    fn test_drives_engine_to_finish() {
        let script = SceneScript::new(vec![
            SceneSpec::new(1, 0.0, 1.0),
            SceneSpec::new(2, 1.0, 2.0),
        ])
        .unwrap();
        let mut engine = TimelineEngine::new(script, RecordingAudio::new(), RedrawScheduler::new());
        engine.start(0.0);

        let mut now = 0.0;
        let mut frames = 0;
        while engine.scheduler_mut().take_due().is_some() {
            now += 16.0;
            frames += 1;
            engine.advance(now);
        }

        assert_eq!(engine.phase(), PlaybackPhase::Finished);
        assert_eq!(frames, 125);
        assert!(!engine.scheduler().has_pending());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = HostClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
