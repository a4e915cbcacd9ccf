// SPDX-License-Identifier: MIT OR Apache-2.0
//! Progress track widget.
//!
//! Draws the playback progress and turns pointer input on it into seeks
//! through a [`SeekControl`].

use crate::seek::{pointer_to_time, SeekControl, SeekTarget, TrackGeometry};
use egui::{Align2, Color32, FontId, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2};

const TRACK_HEIGHT: f32 = 4.0;
const HOVER_HEIGHT: f32 = 8.0;
const HANDLE_RADIUS: f32 = 6.0;
const HIT_HEIGHT: f32 = 24.0;

/// Colors for the progress track
#[derive(Debug, Clone, Copy)]
pub struct SeekBarStyle {
    /// Unplayed part
    pub track: Color32,
    /// Played part
    pub fill: Color32,
    /// Drag handle
    pub handle: Color32,
}

impl Default for SeekBarStyle {
    fn default() -> Self {
        Self {
            track: Color32::from_white_alpha(40),
            fill: Color32::from_rgb(220, 38, 38),
            handle: Color32::WHITE,
        }
    }
}

/// Progress track that seeks on press and drag.
///
/// `progress` is the fraction already played. Takes the full available
/// width.
pub fn seek_bar(
    ui: &mut Ui,
    control: &mut SeekControl,
    target: &mut impl SeekTarget,
    progress: f32,
    now_ms: f64,
    style: &SeekBarStyle,
) -> Response {
    let desired = Vec2::new(ui.available_width(), HIT_HEIGHT);
    let (rect, response) = ui.allocate_exact_size(desired, Sense::click_and_drag());
    let track = TrackGeometry::new(rect.min.x, rect.width());

    // Only the primary button scrubs; other buttons pass through.
    let primary_down = ui.input(|i| i.pointer.primary_down());
    if response.is_pointer_button_down_on() && primary_down {
        if let Some(pos) = response.interact_pointer_pos() {
            if !control.is_dragging() {
                control.press(pos.x, track, target, now_ms);
            } else if ui.input(|i| i.pointer.delta().x != 0.0) {
                control.drag_to(pos.x, track, target, now_ms);
            }
        }
    } else if control.release() {
        tracing::trace!("Seek gesture ended");
    }

    if ui.is_rect_visible(rect) {
        let active = response.hovered() || control.is_dragging();
        paint_track(ui, rect, track, progress, active, style);

        let hover = response.hover_pos().or(response.interact_pointer_pos());
        if let Some(time) = hover.and_then(|pos| pointer_to_time(pos.x, track, target.total_duration())) {
            paint_hover_time(ui, rect, track, time, target.total_duration(), style);
        }
    }

    if control.is_dragging() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
    } else if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    response
}

fn paint_track(
    ui: &Ui,
    rect: Rect,
    track: TrackGeometry,
    progress: f32,
    active: bool,
    style: &SeekBarStyle,
) {
    let painter = ui.painter();
    let height = if active { HOVER_HEIGHT } else { TRACK_HEIGHT };
    let bar = Rect::from_center_size(rect.center(), Vec2::new(rect.width(), height));

    painter.rect_filled(bar, height * 0.5, style.track);

    let fill_x = track.fraction_to_x(progress);
    let filled = Rect::from_min_max(bar.min, Pos2::new(fill_x, bar.max.y));
    painter.rect_filled(filled, height * 0.5, style.fill);

    if active {
        let center = Pos2::new(fill_x, bar.center().y);
        painter.circle(center, HANDLE_RADIUS, style.handle, Stroke::new(1.0, style.fill));
    }
}

/// Time under the pointer, drawn just above the track
fn paint_hover_time(ui: &Ui, rect: Rect, track: TrackGeometry, time: f64, total: f64, style: &SeekBarStyle) {
    let fraction = if total > 0.0 { (time / total) as f32 } else { 0.0 };
    let x = track.fraction_to_x(fraction).clamp(rect.min.x + 24.0, rect.max.x - 24.0);
    ui.painter().text(
        Pos2::new(x, rect.min.y),
        Align2::CENTER_BOTTOM,
        format_clock(time),
        FontId::monospace(11.0),
        style.handle,
    );
}

/// `seconds` as `m:ss.cc`, rounded to the nearest centisecond
pub fn format_clock(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    format!("{}:{:02}.{:02}", centis / 6000, (centis / 100) % 60, centis % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Event, Modifiers, PointerButton, RawInput};

    #[derive(Default)]
    struct Recorder {
        seeks: Vec<f64>,
    }

    impl SeekTarget for Recorder {
        fn total_duration(&self) -> f64 {
            100.0
        }

        fn seek(&mut self, target: f64, _now_ms: f64) {
            self.seeks.push(target);
        }
    }

    /// Run a frame with `events`, returning the bar's rect
    fn bar_frame(
        ctx: &egui::Context,
        events: Vec<Event>,
        control: &mut SeekControl,
        target: &mut Recorder,
    ) -> Rect {
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
            events,
            ..RawInput::default()
        };
        let mut rect = Rect::NOTHING;
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                rect = seek_bar(ui, control, target, 0.0, 0.0, &SeekBarStyle::default()).rect;
            });
        });
        rect
    }

    /// Press `button` on the middle of the bar and hold it for a few frames
    fn press_and_hold(button: PointerButton) -> (Vec<f64>, bool) {
        let ctx = egui::Context::default();
        let mut control = SeekControl::new();
        let mut target = Recorder::default();

        let rect = bar_frame(&ctx, Vec::new(), &mut control, &mut target);
        let pos = rect.center();
        bar_frame(&ctx, vec![Event::PointerMoved(pos)], &mut control, &mut target);
        let press = Event::PointerButton {
            pos,
            button,
            pressed: true,
            modifiers: Modifiers::default(),
        };
        bar_frame(&ctx, vec![press], &mut control, &mut target);
        bar_frame(&ctx, Vec::new(), &mut control, &mut target);

        (target.seeks, control.is_dragging())
    }

    #[test]
    fn test_secondary_button_does_not_seek() {
        let (seeks, dragging) = press_and_hold(PointerButton::Secondary);
        assert!(seeks.is_empty());
        assert!(!dragging);

        let (seeks, _) = press_and_hold(PointerButton::Middle);
        assert!(seeks.is_empty());
    }

    #[test]
    fn test_primary_press_seeks_to_pointer() {
        let (seeks, dragging) = press_and_hold(PointerButton::Primary);
        assert_eq!(seeks.len(), 1);
        assert!((seeks[0] - 50.0).abs() < 1.0);
        assert!(dragging);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00.00");
        assert_eq!(format_clock(9.25), "0:09.25");
        assert_eq!(format_clock(75.5), "1:15.50");
        assert_eq!(format_clock(-3.0), "0:00.00");
    }

    #[test]
    fn test_format_clock_carries_rounding_into_minutes() {
        assert_eq!(format_clock(59.999), "1:00.00");
        assert_eq!(format_clock(59.994), "0:59.99");
        assert_eq!(format_clock(119.996), "2:00.00");
        assert_eq!(format_clock(3599.999), "60:00.00");
    }
}
