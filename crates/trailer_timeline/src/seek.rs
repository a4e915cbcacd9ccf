// SPDX-License-Identifier: MIT OR Apache-2.0
//! Seek control: pointer positions on a progress track to timeline seeks.
//!
//! A gesture is a press (seeks immediately), any number of moves while the
//! button is held (each seeks again), and a release (ends the gesture).
//! Moves are accepted anywhere once a gesture has begun, so the pointer may
//! leave the track.

/// Horizontal extent of the progress track, in host pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackGeometry {
    /// Left edge
    pub left: f32,
    /// Width
    pub width: f32,
}

impl TrackGeometry {
    /// Create a track geometry
    pub fn new(left: f32, width: f32) -> Self {
        Self { left, width }
    }

    /// Whether pointer positions can be mapped onto this track
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.left.is_finite() && self.width > 0.0
    }

    /// X coordinate for a progress fraction
    pub fn fraction_to_x(&self, fraction: f32) -> f32 {
        self.left + fraction.clamp(0.0, 1.0) * self.width
    }
}

/// Map a pointer X coordinate to a time in `[0, total]`.
///
/// Returns `None` for a degenerate track.
pub fn pointer_to_time(pointer_x: f32, track: TrackGeometry, total: f64) -> Option<f64> {
    if !track.is_valid() || !pointer_x.is_finite() {
        return None;
    }
    let fraction = ((pointer_x - track.left) / track.width).clamp(0.0, 1.0);
    Some(f64::from(fraction) * total)
}

/// Anything a seek gesture can drive
pub trait SeekTarget {
    /// Length of the timeline in seconds
    fn total_duration(&self) -> f64;

    /// Jump to `target` seconds at host time `now_ms`
    fn seek(&mut self, target: f64, now_ms: f64);
}

/// Drag state of one seek gesture
#[derive(Debug, Clone, Copy, Default)]
pub struct SeekControl {
    dragging: bool,
}

impl SeekControl {
    /// Create an idle control
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Pointer pressed on the track. Seeks and begins a gesture.
    pub fn press(
        &mut self,
        pointer_x: f32,
        track: TrackGeometry,
        target: &mut impl SeekTarget,
        now_ms: f64,
    ) -> Option<f64> {
        let time = pointer_to_time(pointer_x, track, target.total_duration())?;
        self.dragging = true;
        target.seek(time, now_ms);
        Some(time)
    }

    /// Pointer moved. Seeks only while a gesture is in progress.
    pub fn drag_to(
        &mut self,
        pointer_x: f32,
        track: TrackGeometry,
        target: &mut impl SeekTarget,
        now_ms: f64,
    ) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        let time = pointer_to_time(pointer_x, track, target.total_duration())?;
        target.seek(time, now_ms);
        Some(time)
    }

    /// Pointer released. Returns whether a gesture ended.
    pub fn release(&mut self) -> bool {
        std::mem::take(&mut self.dragging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCall, RecordingAudio};
    use crate::engine::TimelineEngine;
    use crate::scene::{CueKind, SceneId, SceneSpec};
    use crate::scheduler::ManualScheduler;
    use crate::script::SceneScript;

    #[derive(Default)]
    struct FakeTarget {
        seeks: Vec<f64>,
    }

    impl SeekTarget for FakeTarget {
        fn total_duration(&self) -> f64 {
            20.0
        }

        fn seek(&mut self, target: f64, _now_ms: f64) {
            self.seeks.push(target);
        }
    }

    const TRACK: TrackGeometry = TrackGeometry {
        left: 100.0,
        width: 200.0,
    };

    #[test]
    fn test_pointer_to_time_clamps() {
        assert_eq!(pointer_to_time(200.0, TRACK, 20.0), Some(10.0));
        assert_eq!(pointer_to_time(50.0, TRACK, 20.0), Some(0.0));
        assert_eq!(pointer_to_time(900.0, TRACK, 20.0), Some(20.0));
    }

    #[test]
    fn test_degenerate_track_is_noop() {
        assert_eq!(pointer_to_time(10.0, TrackGeometry::new(0.0, 0.0), 20.0), None);
        assert_eq!(pointer_to_time(10.0, TrackGeometry::new(0.0, -5.0), 20.0), None);
        assert_eq!(pointer_to_time(f32::NAN, TRACK, 20.0), None);

        let mut control = SeekControl::new();
        let mut target = FakeTarget::default();
        assert_eq!(
            control.press(10.0, TrackGeometry::new(0.0, 0.0), &mut target, 0.0),
            None
        );
        assert!(!control.is_dragging());
        assert!(target.seeks.is_empty());
    }

    #[test]
    fn test_drag_gesture() {
        let mut control = SeekControl::new();
        let mut target = FakeTarget::default();

        assert_eq!(control.drag_to(150.0, TRACK, &mut target, 0.0), None);

        control.press(150.0, TRACK, &mut target, 0.0);
        assert!(control.is_dragging());
        control.drag_to(250.0, TRACK, &mut target, 16.0);
        // Pointer left the track to the right
        control.drag_to(1000.0, TRACK, &mut target, 32.0);

        assert!(control.release());
        assert!(!control.release());
        control.drag_to(200.0, TRACK, &mut target, 48.0);

        assert_eq!(target.seeks, vec![5.0, 15.0, 20.0]);
    }

    #[test]
    fn test_scrub_through_engine_fires_no_cues() {
        let script = SceneScript::new(vec![
            SceneSpec::new(1, 0.0, 5.0).with_cue(CueKind::Ambient),
            SceneSpec::new(2, 5.0, 10.0).with_cue(CueKind::Boom),
            SceneSpec::new(3, 10.0, 20.0).with_cue(CueKind::Glitch),
        ])
        .unwrap();
        let mut engine =
            TimelineEngine::new(script, RecordingAudio::new(), ManualScheduler::new());
        engine.start(0.0);

        let mut control = SeekControl::new();
        control.press(100.0, TRACK, &mut engine, 100.0);
        for x in [150.0, 210.0, 260.0, 120.0] {
            control.drag_to(x, TRACK, &mut engine, 200.0);
        }
        control.release();

        assert_eq!(engine.snapshot().active_scene.unwrap().id, SceneId(1));
        assert!((engine.snapshot().elapsed - 2.0).abs() < 1e-6);
        assert!(engine.audio().cues().is_empty());
        assert_eq!(engine.audio().count(AudioCall::StartBed), 1);
    }
}
