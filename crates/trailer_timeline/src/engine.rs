// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline engine: master clock, scene selection, cues, seeking.
//!
//! The engine is a small state machine:
//!
//! ```text
//! NotStarted --start--> Running --elapsed >= total--> Finished
//!                          ^                             |
//!                          +---- seek(t < total) --------+
//! ```
//!
//! Any phase can be torn down with [`TimelineEngine::dispose`].
//!
//! Host time is a monotonic millisecond timestamp (the value a display
//! refresh callback receives). Scene times are seconds.

use crate::audio::AudioBackend;
use crate::scene::{CueKind, SceneId, SceneSpec};
use crate::scheduler::{FrameScheduler, TickHandle};
use crate::script::SceneScript;
use crate::seek::SeekTarget;

/// Lifecycle phase of a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// Created, clock not anchored
    #[default]
    NotStarted,
    /// Advancing every frame
    Running,
    /// Past the end; bed stopped, last scene held
    Finished,
    /// Torn down; every operation is a no-op
    Disposed,
}

impl PlaybackPhase {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Running => "Running",
            Self::Finished => "Finished",
            Self::Disposed => "Disposed",
        }
    }
}

/// What caused the active scene to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// Initial scene selected by `start`
    Start,
    /// Natural forward progress of the clock
    Advance,
    /// Out-of-band jump
    Seek,
}

/// Transition published to observers, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// Playback began at time zero
    Started,
    /// A different scene became active
    SceneChanged {
        /// Previously active scene
        from: Option<SceneId>,
        /// Newly active scene
        to: SceneId,
        /// What triggered the change
        cause: ChangeCause,
    },
    /// A one-shot cue was sent to the audio backend
    CueFired {
        /// Scene that owns the cue
        scene: SceneId,
        /// Cue kind
        cue: CueKind,
    },
    /// A seek was applied
    Seeked {
        /// Target time after clamping, in seconds
        target: f64,
    },
    /// The end of the script was reached
    Finished {
        /// Elapsed time that triggered it
        elapsed: f64,
    },
    /// A seek pulled a finished timeline back into playback
    Resumed {
        /// Seek target
        elapsed: f64,
    },
    /// The engine was torn down
    Disposed,
}

/// Mutable playback state, owned by the engine
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    /// Host timestamp (ms) at which elapsed time is zero
    pub origin_ms: f64,
    /// Last computed elapsed time in seconds, unclamped
    pub elapsed: f64,
    /// Index into the script of the active scene
    pub active_scene: Option<usize>,
    /// Whether `start` has run
    pub started: bool,
    /// Whether the end was reached and the bed stopped
    pub finished: bool,
    /// Whether the engine was torn down
    pub disposed: bool,
    /// Outstanding tick request
    pub pending_tick: Option<TickHandle>,
}

impl PlaybackState {
    /// Phase derived from the flags
    pub fn phase(&self) -> PlaybackPhase {
        if self.disposed {
            PlaybackPhase::Disposed
        } else if !self.started {
            PlaybackPhase::NotStarted
        } else if self.finished {
            PlaybackPhase::Finished
        } else {
            PlaybackPhase::Running
        }
    }

    /// Whether an advance tick is scheduled
    pub fn is_running(&self) -> bool {
        self.pending_tick.is_some()
    }
}

/// Read-only view for renderers and progress UI
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Elapsed seconds, clamped to `[0, total_duration]` for display
    pub elapsed: f64,
    /// Elapsed seconds as used for seek math
    pub raw_elapsed: f64,
    /// Length of the script in seconds
    pub total_duration: f64,
    /// Scene to display, `None` before start
    pub active_scene: Option<&'a SceneSpec>,
    /// Whether the end was reached
    pub finished: bool,
    /// Lifecycle phase
    pub phase: PlaybackPhase,
}

impl Snapshot<'_> {
    /// Fraction of the script played, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.total_duration <= 0.0 {
            return 0.0;
        }
        (self.elapsed / self.total_duration).clamp(0.0, 1.0) as f32
    }
}

/// The timeline engine.
///
/// Owns the script, the playback state, the audio backend and the frame
/// scheduler. All mutation goes through [`start`](Self::start),
/// [`advance`](Self::advance), [`seek`](Self::seek) and
/// [`dispose`](Self::dispose).
pub struct TimelineEngine<A: AudioBackend, S: FrameScheduler> {
    script: SceneScript,
    audio: A,
    scheduler: S,
    state: PlaybackState,
    events: Vec<TimelineEvent>,
}

impl<A: AudioBackend, S: FrameScheduler> TimelineEngine<A, S> {
    /// Create an engine at rest
    pub fn new(script: SceneScript, audio: A, scheduler: S) -> Self {
        Self {
            script,
            audio,
            scheduler,
            state: PlaybackState::default(),
            events: Vec::new(),
        }
    }

    /// The script being played
    pub fn script(&self) -> &SceneScript {
        &self.script
    }

    /// The audio backend
    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Mutable access to the audio backend (volume controls, initialization)
    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// The frame scheduler
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable access to the frame scheduler, for delivering ticks
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Raw playback state
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase()
    }

    /// Whether an advance tick is scheduled
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Read-only state for the renderer and progress UI
    pub fn snapshot(&self) -> Snapshot<'_> {
        let total = self.script.total_duration();
        Snapshot {
            elapsed: self.state.elapsed.clamp(0.0, total),
            raw_elapsed: self.state.elapsed,
            total_duration: total,
            active_scene: self.state.active_scene.and_then(|i| self.script.get(i)),
            finished: self.state.finished,
            phase: self.state.phase(),
        }
    }

    /// Drain published transitions, oldest first
    pub fn take_events(&mut self) -> Vec<TimelineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin playback from time zero.
    ///
    /// Starts the bed and schedules the first tick. The first scene's cue is
    /// not fired; only later scene changes fire cues.
    pub fn start(&mut self, now_ms: f64) {
        if self.state.phase() != PlaybackPhase::NotStarted {
            tracing::debug!("Ignoring start: timeline is {}", self.state.phase().name());
            return;
        }

        self.state.started = true;
        self.state.origin_ms = now_ms;
        self.state.elapsed = 0.0;
        self.events.push(TimelineEvent::Started);

        if let Some(index) = self.script.resolve(0.0) {
            self.apply_scene(index, ChangeCause::Start);
        }

        self.audio.initialize();
        self.audio.start_bed();
        self.schedule_tick();

        tracing::info!(
            "Timeline started: {} scenes, {:.2}s",
            self.script.len(),
            self.script.total_duration()
        );
    }

    /// Per-frame step.
    ///
    /// Recomputes elapsed time from `now_ms`, finishes the timeline once the
    /// end is reached, and otherwise switches scenes (firing the new scene's
    /// cue) when the resolved scene differs from the active one. Reschedules
    /// itself while running. Calls outside the running phase are ignored.
    pub fn advance(&mut self, now_ms: f64) {
        if self.state.phase() != PlaybackPhase::Running {
            tracing::trace!("Ignoring tick: timeline is {}", self.state.phase().name());
            return;
        }

        // The tick being serviced is no longer outstanding; drop any other request.
        if let Some(handle) = self.state.pending_tick.take() {
            self.scheduler.cancel_tick(handle);
        }

        // Host timestamps may lag the one a seek was anchored with; elapsed
        // only moves backward through seek.
        let elapsed = self.elapsed_at(now_ms).max(self.state.elapsed);
        self.state.elapsed = elapsed;

        if elapsed >= self.script.total_duration() {
            self.finish();
            return;
        }

        match self.script.resolve(elapsed) {
            Some(index) => {
                self.apply_scene(index, ChangeCause::Advance);
            }
            None => {
                tracing::warn!("No scene covers {:.3}s; keeping the current scene", elapsed);
            }
        }

        self.schedule_tick();
    }

    /// Jump to `target` seconds.
    ///
    /// Applies the scene for the target immediately without firing its cue.
    /// Seeking before the end resumes a finished timeline (bed and ticks);
    /// seeking to or past the end finishes it. Ignored before `start` and
    /// after `dispose`.
    pub fn seek(&mut self, target: f64, now_ms: f64) {
        match self.state.phase() {
            PlaybackPhase::NotStarted | PlaybackPhase::Disposed => {
                tracing::debug!("Ignoring seek: timeline is {}", self.state.phase().name());
                return;
            }
            PlaybackPhase::Running | PlaybackPhase::Finished => {}
        }

        let target = if target.is_nan() { 0.0 } else { target.max(0.0) };
        let total = self.script.total_duration();

        self.state.origin_ms = now_ms - target * 1000.0;
        self.state.elapsed = target;
        self.events.push(TimelineEvent::Seeked { target });
        tracing::debug!("Seek to {:.3}s", target);

        if target >= total {
            self.apply_scene(self.script.last_index(), ChangeCause::Seek);
            self.finish();
            return;
        }

        match self.script.resolve(target) {
            Some(index) => {
                self.apply_scene(index, ChangeCause::Seek);
            }
            None => {
                tracing::warn!("No scene covers {:.3}s; keeping the current scene", target);
            }
        }

        if self.state.finished {
            self.state.finished = false;
            self.audio.start_bed();
            self.events.push(TimelineEvent::Resumed { elapsed: target });
            tracing::info!("Timeline resumed at {:.2}s", target);
        }

        if self.state.pending_tick.is_none() {
            self.schedule_tick();
        }
    }

    /// Cancel the pending tick and stop the bed. Idempotent.
    pub fn dispose(&mut self) {
        self.cancel_tick();
        self.audio.stop_bed();

        if !self.state.disposed {
            self.state.disposed = true;
            self.events.push(TimelineEvent::Disposed);
            tracing::info!("Timeline disposed at {:.2}s", self.state.elapsed);
        }
    }

    fn elapsed_at(&self, now_ms: f64) -> f64 {
        (now_ms - self.state.origin_ms) / 1000.0
    }

    /// Make `index` the active scene. Returns whether it changed.
    ///
    /// The cue fires only for a change caused by a forward tick.
    fn apply_scene(&mut self, index: usize, cause: ChangeCause) -> bool {
        let Some(next) = self.script.get(index) else {
            return false;
        };
        let (to, cue) = (next.id, next.one_shot_cue());

        let from = self
            .state
            .active_scene
            .and_then(|i| self.script.get(i))
            .map(|s| s.id);
        if from == Some(to) {
            return false;
        }

        self.state.active_scene = Some(index);
        tracing::debug!("Scene {:?} -> {} ({:?})", from, to, cause);

        if cause == ChangeCause::Advance {
            if let Some(cue) = cue {
                self.audio.fire_cue(cue);
                self.events.push(TimelineEvent::CueFired { scene: to, cue });
            }
        }

        self.events.push(TimelineEvent::SceneChanged { from, to, cause });
        true
    }

    fn finish(&mut self) {
        if self.state.finished {
            return;
        }
        self.state.finished = true;
        self.cancel_tick();
        self.audio.stop_bed();
        self.events.push(TimelineEvent::Finished {
            elapsed: self.state.elapsed,
        });
        tracing::info!("Timeline finished at {:.2}s", self.state.elapsed);
    }

    fn schedule_tick(&mut self) {
        self.cancel_tick();
        self.state.pending_tick = Some(self.scheduler.request_tick());
    }

    fn cancel_tick(&mut self) {
        if let Some(handle) = self.state.pending_tick.take() {
            self.scheduler.cancel_tick(handle);
        }
    }
}

impl<A: AudioBackend, S: FrameScheduler> SeekTarget for TimelineEngine<A, S> {
    fn total_duration(&self) -> f64 {
        self.script.total_duration()
    }

    fn seek(&mut self, target: f64, now_ms: f64) {
        TimelineEngine::seek(self, target, now_ms);
    }
}

impl<A: AudioBackend, S: FrameScheduler> Drop for TimelineEngine<A, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
