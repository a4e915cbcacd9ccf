// SPDX-License-Identifier: MIT OR Apache-2.0
//! Validated, immutable scene scripts.
//!
//! A [`SceneScript`] can only be built from scenes that tile `[0, total)`
//! without gaps or overlaps, so every time in that range resolves to exactly
//! one scene. Scripts are usually authored in RON:
//!
//! ```ron
//! (
//!     scenes: [
//!         (id: 1, start: 0.0, end: 4.0, cue: Some(ambient)),
//!         (id: 2, start: 4.0, end: 9.0, cue: Some(whoosh),
//!          content: (kind: hero, lines: ["A NEW VISION"])),
//!     ],
//! )
//! ```

use crate::error::{Result, ScriptError, TimelineError};
use crate::scene::{SceneId, SceneSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// On-disk shape of a script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDocument {
    /// Scenes in playback order
    pub scenes: Vec<SceneSpec>,
}

/// Ordered, contiguous list of scenes starting at time zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScriptDocument", into = "ScriptDocument")]
pub struct SceneScript {
    scenes: Vec<SceneSpec>,
}

impl SceneScript {
    /// Validate and wrap a list of scenes
    pub fn new(scenes: Vec<SceneSpec>) -> std::result::Result<Self, ScriptError> {
        validate(&scenes)?;
        Ok(Self { scenes })
    }

    /// Parse a RON document
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let doc: ScriptDocument = ron::from_str(text).map_err(|e| TimelineError::Parse {
            format: "RON",
            message: e.to_string(),
        })?;
        Ok(Self::new(doc.scenes)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let doc: ScriptDocument = serde_json::from_str(text).map_err(|e| TimelineError::Parse {
            format: "JSON",
            message: e.to_string(),
        })?;
        Ok(Self::new(doc.scenes)?)
    }

    /// Load a script file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let script = match ext.as_deref() {
            Some("ron") => Self::from_ron_str(&std::fs::read_to_string(path)?)?,
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            _ => return Err(TimelineError::UnsupportedFormat(path.to_path_buf())),
        };

        tracing::info!(
            "Loaded scene script {:?}: {} scenes, {:.2}s",
            path,
            script.len(),
            script.total_duration()
        );
        Ok(script)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let doc = ScriptDocument {
            scenes: self.scenes.clone(),
        };
        ron::ser::to_string_pretty(&doc, ron::ser::PrettyConfig::default()).map_err(|e| {
            TimelineError::Parse {
                format: "RON",
                message: e.to_string(),
            }
        })
    }

    /// All scenes in order
    pub fn scenes(&self) -> &[SceneSpec] {
        &self.scenes
    }

    /// Scene at a position in the list
    pub fn get(&self, index: usize) -> Option<&SceneSpec> {
        self.scenes.get(index)
    }

    /// Position of the scene with the given ID
    pub fn index_of(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    /// Number of scenes (never zero)
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Always false for a validated script
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Index of the last scene
    pub fn last_index(&self) -> usize {
        self.scenes.len() - 1
    }

    /// End of the last scene
    pub fn total_duration(&self) -> f64 {
        self.scenes.last().map_or(0.0, |s| s.end)
    }

    /// Index of the scene whose interval contains `time`.
    ///
    /// Returns `None` for negative, NaN, or `time >= total_duration()`.
    /// A shared boundary belongs to the later scene.
    pub fn resolve(&self, time: f64) -> Option<usize> {
        if time.is_nan() || time < 0.0 || time >= self.total_duration() {
            return None;
        }
        // First scene starting after `time`; the one before it is the candidate.
        let after = self.scenes.partition_point(|s| s.start <= time);
        let index = after.checked_sub(1)?;
        self.scenes[index].contains(time).then_some(index)
    }

    /// Scene whose interval contains `time`
    pub fn scene_at(&self, time: f64) -> Option<&SceneSpec> {
        self.resolve(time).map(|i| &self.scenes[i])
    }
}

impl TryFrom<ScriptDocument> for SceneScript {
    type Error = ScriptError;

    fn try_from(doc: ScriptDocument) -> std::result::Result<Self, Self::Error> {
        Self::new(doc.scenes)
    }
}

impl From<SceneScript> for ScriptDocument {
    fn from(script: SceneScript) -> Self {
        Self {
            scenes: script.scenes,
        }
    }
}

fn validate(scenes: &[SceneSpec]) -> std::result::Result<(), ScriptError> {
    let first = scenes.first().ok_or(ScriptError::Empty)?;

    let mut ids = HashSet::with_capacity(scenes.len());
    for scene in scenes {
        if !scene.start.is_finite() || !scene.end.is_finite() {
            return Err(ScriptError::NonFinite { id: scene.id });
        }
        if scene.end <= scene.start {
            return Err(ScriptError::EmptyInterval {
                id: scene.id,
                start: scene.start,
                end: scene.end,
            });
        }
        if !ids.insert(scene.id) {
            return Err(ScriptError::DuplicateId { id: scene.id });
        }
    }

    if first.start != 0.0 {
        return Err(ScriptError::NonZeroStart {
            id: first.id,
            start: first.start,
        });
    }

    for pair in scenes.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start < prev.start {
            return Err(ScriptError::Unsorted {
                prev: prev.id,
                next: next.id,
            });
        }
        if prev.end < next.start {
            return Err(ScriptError::Gap {
                prev: prev.id,
                end: prev.end,
                next: next.id,
                start: next.start,
            });
        }
        if prev.end > next.start {
            return Err(ScriptError::Overlap {
                prev: prev.id,
                end: prev.end,
                next: next.id,
                start: next.start,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{CueKind, SceneKind};

    fn three_scenes() -> SceneScript {
        SceneScript::new(vec![
            SceneSpec::new(1, 0.0, 4.0).with_cue(CueKind::Ambient),
            SceneSpec::new(2, 4.0, 9.0).with_cue(CueKind::Whoosh),
            SceneSpec::new(3, 9.0, 9.25).with_cue(CueKind::Boom),
        ])
        .unwrap()
    }

    #[test]
    fn test_gap_is_rejected() {
        let err = SceneScript::new(vec![SceneSpec::new(1, 0.0, 4.0), SceneSpec::new(2, 5.0, 9.0)])
            .unwrap_err();
        assert!(matches!(err, ScriptError::Gap { .. }));
    }

    #[test]
    fn test_overlap_is_rejected() {
        let err = SceneScript::new(vec![SceneSpec::new(1, 0.0, 4.0), SceneSpec::new(2, 3.0, 9.0)])
            .unwrap_err();
        assert!(matches!(err, ScriptError::Overlap { .. }));
    }

    #[test]
    fn test_other_malformed_scripts_are_rejected() {
        assert_eq!(SceneScript::new(Vec::new()).unwrap_err(), ScriptError::Empty);

        assert!(matches!(
            SceneScript::new(vec![SceneSpec::new(1, 1.0, 4.0)]).unwrap_err(),
            ScriptError::NonZeroStart { .. }
        ));
        assert!(matches!(
            SceneScript::new(vec![SceneSpec::new(1, 0.0, 0.0)]).unwrap_err(),
            ScriptError::EmptyInterval { .. }
        ));
        assert!(matches!(
            SceneScript::new(vec![SceneSpec::new(1, 0.0, f64::NAN)]).unwrap_err(),
            ScriptError::NonFinite { .. }
        ));
        assert!(matches!(
            SceneScript::new(vec![SceneSpec::new(1, 0.0, 4.0), SceneSpec::new(1, 4.0, 8.0)])
                .unwrap_err(),
            ScriptError::DuplicateId { .. }
        ));
        assert!(matches!(
            SceneScript::new(vec![
                SceneSpec::new(1, 0.0, 4.0),
                SceneSpec::new(2, 4.0, 8.0),
                SceneSpec::new(3, 2.0, 3.0),
            ])
            .unwrap_err(),
            ScriptError::Unsorted { .. }
        ));
    }

    #[test]
    fn test_resolution_is_total_over_the_script() {
        let script = three_scenes();
        let total = script.total_duration();

        let mut t = 0.0;
        while t < total {
            let matches = script.scenes().iter().filter(|s| s.contains(t)).count();
            assert_eq!(matches, 1, "t = {t}");
            let index = script.resolve(t).unwrap();
            assert!(script.scenes()[index].contains(t));
            t += 0.05;
        }

        assert_eq!(script.resolve(total), None);
        assert_eq!(script.resolve(total + 1.0), None);
        assert_eq!(script.resolve(-0.1), None);
        assert_eq!(script.resolve(f64::NAN), None);
    }

    #[test]
    fn test_boundary_resolves_to_later_scene() {
        let script = three_scenes();
        assert_eq!(script.scene_at(0.0).unwrap().id, SceneId(1));
        assert_eq!(script.scene_at(4.0).unwrap().id, SceneId(2));
        assert_eq!(script.scene_at(9.0).unwrap().id, SceneId(3));
        assert_eq!(script.scene_at(3.999_999).unwrap().id, SceneId(1));
    }

    #[test]
    fn test_ron_roundtrip_and_lookup() {
        let script = three_scenes();
        let text = script.to_ron().unwrap();
        let loaded = SceneScript::from_ron_str(&text).unwrap();

        assert_eq!(loaded, script);
        assert_eq!(loaded.index_of(SceneId(3)), Some(2));
        assert_eq!(loaded.last_index(), 2);
        assert_eq!(loaded.total_duration(), 9.25);
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{
            "scenes": [
                { "id": 1, "start": 0.0, "end": 3.0, "cue": "ambient",
                  "content": { "kind": "intro", "lines": ["IN THE SILENCE"] } },
                { "id": 2, "start": 3.0, "end": 6.0, "cue": "glitch",
                  "content": { "kind": "glitch", "lines": ["DETECTED"] } }
            ]
        }"#;

        let script = SceneScript::from_json_str(json).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.scenes()[1].cue, Some(CueKind::Glitch));
        assert_eq!(script.scenes()[1].content.kind, SceneKind::Glitch);
    }

    #[test]
    fn test_invalid_document_surfaces_script_error() {
        let json = r#"{ "scenes": [ { "id": 1, "start": 0.0, "end": 4.0 },
                                   { "id": 2, "start": 5.0, "end": 9.0 } ] }"#;
        let err = SceneScript::from_json_str(json).unwrap_err();
        assert!(matches!(err, TimelineError::Script(ScriptError::Gap { .. })));

        let err = SceneScript::from_ron_str("(scenes: [").unwrap_err();
        assert!(matches!(err, TimelineError::Parse { format: "RON", .. }));
    }

    #[test]
    fn test_serde_deserialize_validates() {
        let bad = r#"{ "scenes": [ { "id": 1, "start": 2.0, "end": 4.0 } ] }"#;
        assert!(serde_json::from_str::<SceneScript>(bad).is_err());

        let good = r#"{ "scenes": [ { "id": 1, "start": 0.0, "end": 4.0 } ] }"#;
        assert_eq!(serde_json::from_str::<SceneScript>(good).unwrap().len(), 1);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = SceneScript::load(Path::new("trailer.yaml")).unwrap_err();
        assert!(matches!(err, TimelineError::UnsupportedFormat(_)));
    }
}
