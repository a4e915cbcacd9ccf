// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for script construction and loading.

use crate::scene::SceneId;
use std::path::PathBuf;
use thiserror::Error;

/// A scene script that breaks the contiguity rules.
///
/// These are content bugs: the engine refuses to run a script that has any of them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// No scenes at all
    #[error("scene script is empty")]
    Empty,

    /// First scene does not begin at zero
    #[error("first scene {id} starts at {start}s, expected 0s")]
    NonZeroStart {
        /// Offending scene
        id: SceneId,
        /// Its start time
        start: f64,
    },

    /// A bound is NaN or infinite
    #[error("scene {id} has a non-finite bound")]
    NonFinite {
        /// Offending scene
        id: SceneId,
    },

    /// `end <= start`
    #[error("scene {id} has an empty interval [{start}s, {end}s)")]
    EmptyInterval {
        /// Offending scene
        id: SceneId,
        /// Start time
        start: f64,
        /// End time
        end: f64,
    },

    /// Scenes are not sorted by start time
    #[error("scene {next} starts before scene {prev}")]
    Unsorted {
        /// Earlier scene in the list
        prev: SceneId,
        /// Later scene in the list
        next: SceneId,
    },

    /// Time between two neighbours that no scene covers
    #[error("gap between scene {prev} (ends {end}s) and scene {next} (starts {start}s)")]
    Gap {
        /// Earlier scene
        prev: SceneId,
        /// Its end time
        end: f64,
        /// Later scene
        next: SceneId,
        /// Its start time
        start: f64,
    },

    /// Two neighbours cover the same time
    #[error("scene {prev} (ends {end}s) overlaps scene {next} (starts {start}s)")]
    Overlap {
        /// Earlier scene
        prev: SceneId,
        /// Its end time
        end: f64,
        /// Later scene
        next: SceneId,
        /// Its start time
        start: f64,
    },

    /// The same ID is used twice
    #[error("duplicate scene id {id}")]
    DuplicateId {
        /// Repeated ID
        id: SceneId,
    },
}

/// Errors raised while building or loading a scene script
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Script content is invalid
    #[error("invalid scene script: {0}")]
    Script(#[from] ScriptError),

    /// Script text could not be deserialized
    #[error("failed to parse {format} scene script: {message}")]
    Parse {
        /// `"RON"` or `"JSON"`
        format: &'static str,
        /// Deserializer message
        message: String,
    },

    /// File extension is neither `.ron` nor `.json`
    #[error("unsupported scene script format: {0}")]
    UnsupportedFormat(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
