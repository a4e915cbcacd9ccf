// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cinematic palette and egui styling.

use egui::{Color32, Stroke, Style, Visuals};

/// Colors used across the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailerTheme {
    /// Backdrop
    pub background: Color32,
    /// Main text
    pub text: Color32,
    /// Accent for sub lines, rules and the progress fill
    pub accent: Color32,
    /// Secondary accent for hero taglines
    pub accent_soft: Color32,
    /// Muted text
    pub muted: Color32,
    /// Dimmed chrome such as the timecode
    pub dim: Color32,
    /// Particle tint
    pub particle: Color32,
    /// Glitch ghost colors
    pub ghost: [Color32; 2],
}

impl Default for TrailerTheme {
    fn default() -> Self {
        Self {
            background: Color32::BLACK,
            text: Color32::WHITE,
            accent: Color32::from_rgb(0, 240, 255),
            accent_soft: Color32::from_rgb(165, 243, 252),
            muted: Color32::from_rgb(156, 163, 175),
            dim: Color32::from_rgb(75, 85, 99),
            particle: Color32::from_rgb(200, 220, 255),
            ghost: [
                Color32::from_rgba_unmultiplied(255, 0, 0, 128),
                Color32::from_rgba_unmultiplied(0, 0, 255, 128),
            ],
        }
    }
}

impl TrailerTheme {
    /// Convert to egui Visuals
    pub fn to_egui_visuals(&self) -> Visuals {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.background;
        visuals.window_fill = self.background;
        visuals.extreme_bg_color = self.background;
        visuals.override_text_color = Some(self.text);
        visuals.selection.bg_fill = self.accent.gamma_multiply(0.4);
        visuals.selection.stroke = Stroke::new(1.0, self.accent);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.accent);

        visuals
    }

    /// Convert to egui Style
    pub fn to_egui_style(&self) -> Style {
        Style {
            visuals: self.to_egui_visuals(),
            ..Style::default()
        }
    }

    /// Apply theme to egui context
    pub fn apply(&self, ctx: &egui::Context) {
        ctx.set_style(self.to_egui_style());
    }
}

/// `color` with its alpha scaled by `opacity`
pub fn faded(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visuals_use_black_backdrop() {
        let theme = TrailerTheme::default();
        let visuals = theme.to_egui_visuals();
        assert_eq!(visuals.panel_fill, Color32::BLACK);
        assert_eq!(visuals.override_text_color, Some(Color32::WHITE));
    }

    #[test]
    fn test_faded_clamps() {
        assert_eq!(faded(Color32::WHITE, 2.0), Color32::WHITE);
        assert_eq!(faded(Color32::WHITE, -1.0), Color32::TRANSPARENT);
    }
}
