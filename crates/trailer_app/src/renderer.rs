// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene rendering.
//!
//! Features:
//! - Per-kind layouts (intro, hero, stack, impact, glitch, final, teaser)
//! - Staggered entrance animations
//! - Exit fade of the previous scene before the next one enters
//! - Start overlay and timecode chrome
//!
//! The renderer only reads the script and the timeline's events. Scrubbing
//! (seek) swaps scenes instantly with no entrance animation.

use crate::theme::{faded, TrailerTheme};
use egui::{Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use std::f32::consts::{PI, TAU};
use trailer_timeline::{ChangeCause, SceneKind, SceneScript, SceneSpec, TimelineEvent};

/// Exit fade of the outgoing scene, in milliseconds
const EXIT_MS: f64 = 600.0;

/// Age at which every entrance animation has settled, in seconds
const SETTLED_SECS: f32 = 4.0;

/// Reference height the font sizes are tuned for
const REFERENCE_HEIGHT: f32 = 720.0;

/// `cubic-bezier(0.22, 1, 0.36, 1)`
fn ease_out_quint(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(5)
}

fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Linear progress of a phase that starts at `delay` and lasts `duration`
fn phase(age: f32, delay: f32, duration: f32) -> f32 {
    ((age - delay) / duration).clamp(0.0, 1.0)
}

/// A scene on screen
#[derive(Debug, Clone, Copy, PartialEq)]
struct Shown {
    /// Index into the script
    index: usize,
    /// Host time (ms) its entrance starts, or its exit started
    since_ms: f64,
}

/// One line of text in a scene layout
#[derive(Debug, Clone)]
struct TextItem<'a> {
    text: &'a str,
    font: FontId,
    color: Color32,
    alpha: f32,
    offset: Vec2,
    gap_after: f32,
    glow: bool,
    ghosts: bool,
}

impl<'a> TextItem<'a> {
    fn new(text: &'a str, font: FontId, color: Color32) -> Self {
        Self {
            text,
            font,
            color,
            alpha: 1.0,
            offset: Vec2::ZERO,
            gap_after: 0.0,
            glow: false,
            ghosts: false,
        }
    }
}

/// Draws the active scene and transitions between scenes
pub struct SceneRenderer {
    current: Option<Shown>,
    outgoing: Option<Shown>,
    rng: fastrand::Rng,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer {
    /// Create a renderer showing nothing
    pub fn new() -> Self {
        Self {
            current: None,
            outgoing: None,
            rng: fastrand::Rng::new(),
        }
    }

    /// Follow a timeline transition
    pub fn on_event(&mut self, event: &TimelineEvent, script: &SceneScript, now_ms: f64) {
        let TimelineEvent::SceneChanged { to, cause, .. } = event else {
            return;
        };
        let Some(index) = script.index_of(*to) else {
            tracing::warn!("Scene {} is not in the script", to);
            return;
        };

        match cause {
            ChangeCause::Seek => {
                self.outgoing = None;
                self.current = Some(Shown {
                    index,
                    since_ms: now_ms - f64::from(SETTLED_SECS) * 1000.0,
                });
            }
            ChangeCause::Start | ChangeCause::Advance => {
                self.outgoing = self.current.take().map(|shown| Shown {
                    index: shown.index,
                    since_ms: now_ms,
                });
                let delay = if self.outgoing.is_some() {
                    EXIT_MS
                } else {
                    0.0
                };
                self.current = Some(Shown {
                    index,
                    since_ms: now_ms + delay,
                });
            }
        }
    }

    /// Draw the outgoing and current scenes into `rect`
    pub fn paint(
        &mut self,
        painter: &Painter,
        rect: Rect,
        script: &SceneScript,
        theme: &TrailerTheme,
        now_ms: f64,
    ) {
        let scale = (rect.height() / REFERENCE_HEIGHT).clamp(0.5, 2.0);

        if let Some(out) = self.outgoing {
            let exit = ((now_ms - out.since_ms) / EXIT_MS) as f32;
            match script.get(out.index) {
                Some(scene) if exit < 1.0 => {
                    self.paint_scene(painter, rect, scene, SETTLED_SECS, exit, scale, theme);
                }
                _ => self.outgoing = None,
            }
        }

        if let Some(current) = self.current {
            let age = ((now_ms - current.since_ms) / 1000.0) as f32;
            if age >= 0.0 {
                if let Some(scene) = script.get(current.index) {
                    self.paint_scene(painter, rect, scene, age, 0.0, scale, theme);
                }
            }
        }
    }

    fn paint_scene(
        &mut self,
        painter: &Painter,
        rect: Rect,
        scene: &SceneSpec,
        age: f32,
        exit: f32,
        scale: f32,
        theme: &TrailerTheme,
    ) {
        let content = &scene.content;
        let lines = &content.lines;
        let sub = content.sub_text.as_deref();
        let opacity = 1.0 - exit.clamp(0.0, 1.0);
        let mut items = Vec::new();
        let mut zoom = 1.0;

        match content.kind {
            SceneKind::Intro | SceneKind::Hero | SceneKind::Teaser => {
                let size = if content.kind == SceneKind::Teaser { 48.0 } else { 64.0 };
                for (i, line) in lines.iter().enumerate() {
                    let e = ease_out_quint(phase(age, 0.2 + 0.3 * i as f32, 1.2));
                    let mut item = TextItem::new(
                        line,
                        FontId::proportional(size * scale * (1.1 - 0.1 * e)),
                        theme.text,
                    );
                    item.alpha = e;
                    item.offset = Vec2::new(0.0, 20.0 * (1.0 - e));
                    item.gap_after = 16.0 * scale;
                    item.glow = true;
                    items.push(item);
                }
                if let Some(sub) = sub {
                    let (color, alpha) = if content.kind == SceneKind::Teaser {
                        (theme.accent, ease_out_cubic(phase(age, 0.8, 1.0)))
                    } else {
                        (theme.accent_soft, 0.7 * phase(age, 1.0, 2.0))
                    };
                    let mut item = TextItem::new(sub, FontId::proportional(18.0 * scale), color);
                    item.alpha = alpha;
                    items.push(item);
                }
            }
            SceneKind::Stack => {
                let count = lines.len().max(1) as f32;
                for (i, line) in lines.iter().enumerate() {
                    let e = ease_out_quint(phase(age, 0.2 + 0.3 * i as f32, 1.2));
                    let shade = 0.6 * i as f32 / count;
                    let mut item = TextItem::new(
                        line,
                        FontId::proportional(56.0 * scale * (1.1 - 0.1 * e)),
                        lerp_color(theme.text, theme.muted, shade),
                    );
                    item.alpha = e;
                    item.offset = Vec2::new(0.0, 20.0 * (1.0 - e));
                    item.gap_after = 12.0 * scale;
                    items.push(item);
                }
            }
            SceneKind::Impact => {
                let e = ease_out_cubic(phase(age, 0.0, 0.8));
                zoom = (0.8 + 0.2 * e) * (1.0 + 0.2 * exit);
                for line in lines {
                    let mut item = TextItem::new(line, FontId::proportional(120.0 * scale), theme.text);
                    item.alpha = e;
                    item.gap_after = 16.0 * scale;
                    item.glow = true;
                    items.push(item);
                }
                if let Some(sub) = sub {
                    let mut item = TextItem::new(sub, FontId::proportional(20.0 * scale), theme.accent);
                    item.alpha = e;
                    items.push(item);
                }
            }
            SceneKind::Glitch => {
                for (i, line) in lines.iter().enumerate() {
                    let t = (age - 0.1 * i as f32).max(0.0);
                    let spring = (-8.0 * t).exp() * (12.0 * t).cos();
                    let mut item = TextItem::new(line, FontId::monospace(60.0 * scale), theme.text);
                    item.alpha = phase(age, 0.1 * i as f32, 0.15);
                    item.offset = Vec2::new(-10.0 * spring * scale, 0.0);
                    item.gap_after = 8.0 * scale;
                    item.ghosts = true;
                    items.push(item);
                }
            }
            SceneKind::Final => {
                let e = ease_out_cubic(phase(age, 0.0, 3.0));
                zoom = 0.9 + 0.1 * e;
                if let Some(first) = lines.first() {
                    let mut item = TextItem::new(first, FontId::proportional(18.0 * scale), theme.muted);
                    item.alpha = e;
                    item.gap_after = 16.0 * scale;
                    items.push(item);
                }
                for line in lines.iter().skip(1) {
                    let mut item = TextItem::new(line, FontId::proportional(88.0 * scale), theme.text);
                    item.alpha = e;
                    item.gap_after = 48.0 * scale;
                    item.glow = true;
                    items.push(item);
                }
                if let Some(sub) = sub {
                    let s = phase(age, 2.0, 1.0);
                    let pulse = 0.75 + 0.25 * (age * PI).cos();
                    let mut item = TextItem::new(sub, FontId::proportional(20.0 * scale), theme.accent);
                    item.alpha = s * pulse;
                    item.offset = Vec2::new(0.0, 20.0 * (1.0 - s));
                    items.push(item);
                }
            }
        }

        for item in &mut items {
            item.alpha *= opacity;
            if zoom != 1.0 {
                item.font.size *= zoom;
            }
        }

        let rule = match content.kind {
            SceneKind::Impact | SceneKind::Teaser if sub.is_some() => Some(phase(age, 0.5, 1.0)),
            SceneKind::Final if sub.is_some() => Some(1.0),
            _ => None,
        };

        self.paint_items(painter, rect, &items, rule, scale, opacity, theme);
    }

    /// Lay out `items` centered in `rect`. A rule is drawn above the last item.
    fn paint_items(
        &mut self,
        painter: &Painter,
        rect: Rect,
        items: &[TextItem<'_>],
        rule: Option<f32>,
        scale: f32,
        opacity: f32,
        theme: &TrailerTheme,
    ) {
        let galleys: Vec<_> = items
            .iter()
            .map(|item| {
                painter.layout_no_wrap(
                    item.text.to_owned(),
                    item.font.clone(),
                    faded(item.color, item.alpha),
                )
            })
            .collect();

        let rule_gap = if rule.is_some() { 24.0 * scale } else { 0.0 };
        let height: f32 = items
            .iter()
            .zip(&galleys)
            .map(|(item, galley)| galley.size().y + item.gap_after)
            .sum::<f32>()
            + rule_gap;

        let mut y = rect.center().y - height * 0.5;
        let last = items.len().saturating_sub(1);

        for (i, (item, galley)) in items.iter().zip(galleys).enumerate() {
            if i == last {
                if let Some(progress) = rule {
                    let width = rect.width().min(420.0 * scale) * progress;
                    let cy = y + rule_gap * 0.5;
                    painter.line_segment(
                        [
                            Pos2::new(rect.center().x - width * 0.5, cy),
                            Pos2::new(rect.center().x + width * 0.5, cy),
                        ],
                        Stroke::new(1.0, faded(theme.accent, opacity)),
                    );
                    y += rule_gap;
                }
            }

            let size = galley.size();
            let pos = Pos2::new(rect.center().x - size.x * 0.5, y) + item.offset;

            if item.glow && item.alpha > 0.0 {
                let halo = faded(theme.text, item.alpha * 0.12);
                for d in [Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(0.0, -2.0), Vec2::new(0.0, 2.0)] {
                    let copy = painter.layout_no_wrap(item.text.to_owned(), item.font.clone(), halo);
                    painter.galley(pos + d, copy, halo);
                }
            }

            if item.ghosts && item.alpha > 0.0 {
                for ghost in theme.ghost {
                    let jitter = Vec2::new(self.rng.f32() * 4.0 - 2.0, self.rng.f32() * 4.0 - 2.0);
                    let color = faded(ghost, item.alpha);
                    let copy = painter.layout_no_wrap(item.text.to_owned(), item.font.clone(), color);
                    painter.galley(pos + jitter, copy, color);
                }
            }

            painter.galley(pos, galley, theme.text);
            y += size.y + item.gap_after;
        }
    }
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8;
    Color32::from_rgba_unmultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

/// Bottom-right timecode
pub fn paint_timecode(painter: &Painter, rect: Rect, elapsed: f64, theme: &TrailerTheme) {
    let text = format!("2026_TRAILER_SEQ_01 // {elapsed:.2}s");
    painter.text(
        rect.right_bottom() + Vec2::new(-24.0, -24.0),
        egui::Align2::RIGHT_BOTTOM,
        text,
        FontId::monospace(11.0),
        theme.dim,
    );
}

fn start_button_center(rect: Rect) -> Pos2 {
    rect.center() - Vec2::new(0.0, 40.0)
}

/// Clickable area of the start prompt inside `rect`
pub fn start_button_rect(rect: Rect) -> Rect {
    Rect::from_center_size(start_button_center(rect) + Vec2::new(0.0, 40.0), Vec2::new(320.0, 220.0))
}

/// Full-screen start prompt
pub fn paint_start_overlay(
    painter: &Painter,
    rect: Rect,
    hovered: bool,
    now_secs: f32,
    theme: &TrailerTheme,
) {
    painter.rect_filled(rect, 0.0, faded(theme.background, 0.9));

    let center = start_button_center(rect);
    let radius = 48.0;
    let accent = if hovered { theme.accent } else { faded(theme.accent, 0.7) };

    // Soft halo
    painter.circle_filled(center, radius + 12.0, faded(theme.accent, if hovered { 0.12 } else { 0.06 }));
    painter.circle_filled(center, radius, faded(theme.background, 0.5));
    painter.circle_stroke(center, radius, Stroke::new(1.0, faded(theme.accent, 0.3)));

    // Slow spinning arc
    let start = now_secs * TAU / 3.0;
    let arc: Vec<Pos2> = (0..=32)
        .map(|i| {
            let a = start + (i as f32 / 32.0) * PI * 0.75;
            center + Vec2::angled(a) * radius
        })
        .collect();
    painter.add(Shape::line(arc, Stroke::new(1.5, accent)));

    // Play glyph
    let s = 14.0;
    painter.add(Shape::convex_polygon(
        vec![
            center + Vec2::new(-s * 0.6, -s),
            center + Vec2::new(s, 0.0),
            center + Vec2::new(-s * 0.6, s),
        ],
        accent,
        Stroke::NONE,
    ));

    let title_color = if hovered { theme.accent } else { theme.text };
    painter.text(
        center + Vec2::new(0.0, radius + 36.0),
        egui::Align2::CENTER_CENTER,
        "ENTER EXPERIENCE",
        FontId::proportional(24.0),
        title_color,
    );
    painter.text(
        center + Vec2::new(0.0, radius + 66.0),
        egui::Align2::CENTER_CENTER,
        "SOUND RECOMMENDED",
        FontId::proportional(11.0),
        theme.dim,
    );
}

/// Replay hint shown once the timeline has finished
pub fn paint_replay_hint(painter: &Painter, rect: Rect, theme: &TrailerTheme) {
    painter.text(
        rect.center_bottom() + Vec2::new(0.0, -56.0),
        egui::Align2::CENTER_CENTER,
        "SPACE TO REPLAY",
        FontId::proportional(12.0),
        theme.muted,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailer_timeline::{SceneId, SceneSpec};

    fn script() -> SceneScript {
        SceneScript::new(vec![
            SceneSpec::new(1, 0.0, 2.0),
            SceneSpec::new(2, 2.0, 4.0),
            SceneSpec::new(3, 4.0, 6.0),
        ])
        .unwrap()
    }

    fn changed(to: u32, cause: ChangeCause) -> TimelineEvent {
        TimelineEvent::SceneChanged {
            from: None,
            to: SceneId(to),
            cause,
        }
    }

    #[test]
    fn test_easing_bounds() {
        assert_eq!(ease_out_quint(0.0), 0.0);
        assert_eq!(ease_out_quint(1.0), 1.0);
        assert_eq!(ease_out_quint(5.0), 1.0);
        assert!(ease_out_quint(0.5) > 0.9);
        assert_eq!(phase(0.1, 0.2, 1.0), 0.0);
        assert_eq!(phase(0.75, 0.25, 1.0), 0.5);
    }

    #[test]
    fn test_advance_queues_exit_before_entrance() {
        let script = script();
        let mut renderer = SceneRenderer::new();

        renderer.on_event(&changed(1, ChangeCause::Start), &script, 0.0);
        assert!(renderer.outgoing.is_none());
        assert_eq!(renderer.current.unwrap().since_ms, 0.0);

        renderer.on_event(&changed(2, ChangeCause::Advance), &script, 2000.0);
        let out = renderer.outgoing.unwrap();
        assert_eq!(out.index, 0);
        assert_eq!(out.since_ms, 2000.0);
        assert_eq!(renderer.current.unwrap().index, 1);
        assert_eq!(renderer.current.unwrap().since_ms, 2600.0);
    }

    #[test]
    fn test_seek_swaps_instantly() {
        let script = script();
        let mut renderer = SceneRenderer::new();

        renderer.on_event(&changed(1, ChangeCause::Start), &script, 0.0);
        renderer.on_event(&changed(2, ChangeCause::Advance), &script, 2000.0);
        renderer.on_event(&changed(3, ChangeCause::Seek), &script, 2100.0);

        assert!(renderer.outgoing.is_none());
        let current = renderer.current.unwrap();
        assert_eq!(current.index, 2);
        assert!(current.since_ms < 2100.0);
    }

    #[test]
    fn test_other_events_are_ignored() {
        let script = script();
        let mut renderer = SceneRenderer::new();
        renderer.on_event(&TimelineEvent::Started, &script, 0.0);
        renderer.on_event(&changed(99, ChangeCause::Advance), &script, 0.0);
        assert!(renderer.current.is_none());
    }

    #[test]
    fn test_start_button_covers_prompt() {
        let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(1280.0, 720.0));
        let button = start_button_rect(screen);
        assert!(button.contains(start_button_center(screen)));
        assert!(screen.contains_rect(button));
    }

    #[test]
    fn test_lerp_color_endpoints() {
        assert_eq!(lerp_color(Color32::WHITE, Color32::BLACK, 0.0), Color32::WHITE);
        assert_eq!(lerp_color(Color32::WHITE, Color32::BLACK, 1.0), Color32::BLACK);
    }
}
