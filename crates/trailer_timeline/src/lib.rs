// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback timeline for the trailer sequence.
//!
//! This crate owns everything that decides *what plays when*:
//! - Scene scripts: contiguous, validated `[start, end)` intervals
//! - The master clock and per-frame advance
//! - One-shot cue firing on forward scene changes
//! - Seeking, including resuming a finished timeline
//! - A progress track widget for egui hosts
//!
//! ## Architecture
//!
//! [`TimelineEngine`] is generic over two host seams:
//! - [`AudioBackend`]: continuous bed plus one-shot cues
//! - [`FrameScheduler`]: per-frame tick requests
//!
//! Renderers read [`Snapshot`] and drain [`TimelineEvent`]s; they never
//! mutate playback state directly.

pub mod audio;
pub mod engine;
pub mod error;
pub mod scene;
pub mod scheduler;
pub mod script;
pub mod seek;
pub mod ui;

pub use audio::{AudioBackend, AudioCall, NullAudio, RecordingAudio};
pub use engine::{
    ChangeCause, PlaybackPhase, PlaybackState, Snapshot, TimelineEngine, TimelineEvent,
};
pub use error::{Result, ScriptError, TimelineError};
pub use scene::{CueKind, SceneContent, SceneId, SceneKind, SceneSpec};
pub use scheduler::{FrameScheduler, ManualScheduler, TickHandle};
pub use script::{SceneScript, ScriptDocument};
pub use seek::{pointer_to_time, SeekControl, SeekTarget, TrackGeometry};
pub use ui::{format_clock, seek_bar, SeekBarStyle};
