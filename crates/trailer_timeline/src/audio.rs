// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio backend contract used by the timeline engine.
//!
//! The engine only ever asks for three things: start the continuous bed,
//! stop it, and fire a one-shot cue. Everything about how sound is made
//! stays behind this trait. Implementations must swallow their own
//! failures (no output device, autoplay denied, ...) and degrade to
//! silence; nothing here returns an error to the engine.

use crate::scene::CueKind;

/// Sound output driven by the timeline
pub trait AudioBackend {
    /// Prepare the output. Idempotent; may do nothing until a user gesture.
    fn initialize(&mut self) {}

    /// Start the continuous bed. Safe to call after a prior [`stop_bed`](Self::stop_bed).
    fn start_bed(&mut self);

    /// Stop the bed and leave no residual sound. Idempotent.
    fn stop_bed(&mut self);

    /// Fire a one-shot cue
    fn fire_cue(&mut self, cue: CueKind);
}

impl<T: AudioBackend + ?Sized> AudioBackend for Box<T> {
    fn initialize(&mut self) {
        (**self).initialize();
    }

    fn start_bed(&mut self) {
        (**self).start_bed();
    }

    fn stop_bed(&mut self) {
        (**self).stop_bed();
    }

    fn fire_cue(&mut self, cue: CueKind) {
        (**self).fire_cue(cue);
    }
}

/// Silent backend for visual-only playback
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn start_bed(&mut self) {}

    fn stop_bed(&mut self) {}

    fn fire_cue(&mut self, _cue: CueKind) {}
}

/// One call made on a [`RecordingAudio`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    /// `initialize()`
    Initialize,
    /// `start_bed()`
    StartBed,
    /// `stop_bed()`
    StopBed,
    /// `fire_cue(kind)`
    Cue(CueKind),
}

/// Backend that records every call in order
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    calls: Vec<AudioCall>,
}

impl RecordingAudio {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, oldest first
    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    /// How many times `call` was made
    pub fn count(&self, call: AudioCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    /// Cues fired so far, oldest first
    pub fn cues(&self) -> Vec<CueKind> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                AudioCall::Cue(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl AudioBackend for RecordingAudio {
    fn initialize(&mut self) {
        self.calls.push(AudioCall::Initialize);
    }

    fn start_bed(&mut self) {
        self.calls.push(AudioCall::StartBed);
    }

    fn stop_bed(&mut self) {
        self.calls.push(AudioCall::StopBed);
    }

    fn fire_cue(&mut self, cue: CueKind) {
        self.calls.push(AudioCall::Cue(cue));
    }
}
