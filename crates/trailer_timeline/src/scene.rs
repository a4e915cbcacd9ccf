// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene records that make up a trailer script.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a scene within a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sound cue attached to a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    /// The continuous bed. Never fired as a one-shot.
    Ambient,
    /// Deep falling sine hit
    Boom,
    /// Filtered noise swell
    Whoosh,
    /// Kick plus distorted crunch
    Blast,
    /// Burst of short random blips
    Glitch,
}

impl CueKind {
    /// Whether this cue designates the continuous bed
    pub fn is_ambient(self) -> bool {
        matches!(self, Self::Ambient)
    }

    /// Label used in scripts and logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Boom => "boom",
            Self::Whoosh => "whoosh",
            Self::Blast => "blast",
            Self::Glitch => "glitch",
        }
    }
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Presentation style the renderer uses for a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Centered lines with a staggered fade in
    #[default]
    Intro,
    /// Stacked gradient lines
    Stack,
    /// Large lines with an optional tagline
    Hero,
    /// Oversized single word
    Impact,
    /// Closing card
    Final,
    /// Jittered monospace lines
    Glitch,
    /// Announcement with a sub line
    Teaser,
}

/// Renderer payload. The timeline never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneContent {
    /// Presentation style
    #[serde(default)]
    pub kind: SceneKind,
    /// Main text lines, top to bottom
    #[serde(default)]
    pub lines: Vec<String>,
    /// Secondary line shown under the main text
    #[serde(default)]
    pub sub_text: Option<String>,
}

impl SceneContent {
    /// Create content of the given kind
    pub fn new(kind: SceneKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
            sub_text: None,
        }
    }

    /// Append a main line
    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }

    /// Set the secondary line
    pub fn sub_text(mut self, text: impl Into<String>) -> Self {
        self.sub_text = Some(text.into());
        self
    }
}

/// One scene: a half-open `[start, end)` interval in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSpec {
    /// Unique scene ID
    pub id: SceneId,
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
    /// What the renderer shows
    #[serde(default)]
    pub content: SceneContent,
    /// One-shot cue fired when playback enters this scene
    #[serde(default)]
    pub cue: Option<CueKind>,
}

impl SceneSpec {
    /// Create a scene with empty content and no cue
    pub fn new(id: u32, start: f64, end: f64) -> Self {
        Self {
            id: SceneId(id),
            start,
            end,
            content: SceneContent::default(),
            cue: None,
        }
    }

    /// Attach a cue
    pub fn with_cue(mut self, cue: CueKind) -> Self {
        self.cue = Some(cue);
        self
    }

    /// Attach renderer content
    pub fn with_content(mut self, content: SceneContent) -> Self {
        self.content = content;
        self
    }

    /// Length of the interval in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open containment test
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// The cue to fire on entry, if any. The bed label never qualifies.
    pub fn one_shot_cue(&self) -> Option<CueKind> {
        self.cue.filter(|cue| !cue.is_ambient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_contains() {
        let scene = SceneSpec::new(1, 4.0, 9.0);
        assert!(!scene.contains(3.999));
        assert!(scene.contains(4.0));
        assert!(scene.contains(8.999));
        assert!(!scene.contains(9.0));
        assert_eq!(scene.duration(), 5.0);
    }

    #[test]
    fn test_ambient_is_not_a_one_shot() {
        let bed = SceneSpec::new(1, 0.0, 3.0).with_cue(CueKind::Ambient);
        let hit = SceneSpec::new(2, 3.0, 6.0).with_cue(CueKind::Boom);
        let silent = SceneSpec::new(3, 6.0, 8.0);

        assert_eq!(bed.one_shot_cue(), None);
        assert_eq!(hit.one_shot_cue(), Some(CueKind::Boom));
        assert_eq!(silent.one_shot_cue(), None);
    }

    #[test]
    fn test_cue_labels_match_serde_names() {
        let cues = [
            CueKind::Ambient,
            CueKind::Boom,
            CueKind::Whoosh,
            CueKind::Blast,
            CueKind::Glitch,
        ];
        for cue in &cues {
            let json = serde_json::to_string(cue).unwrap();
            assert_eq!(json, format!("\"{}\"", cue.name()));
        }
    }

    #[test]
    fn test_content_builder() {
        let content = SceneContent::new(SceneKind::Hero)
            .line("FROM THE MINDS AT")
            .line("STYLE HUB")
            .sub_text("Innovation starts with a single thought");

        assert_eq!(content.lines.len(), 2);
        assert_eq!(content.kind, SceneKind::Hero);
        assert!(content.sub_text.is_some());
    }
}
