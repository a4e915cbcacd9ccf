// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decorative particle field.
//!
//! Particles drift upward and wrap to the bottom. They shy away from the
//! pointer and brighten with the current [`Intensity`]. Nothing here feeds
//! back into playback.

use crate::config::BackgroundSettings;
use crate::theme::{faded, TrailerTheme};
use egui::{Color32, Mesh, Painter, Pos2, Rect, Vec2};
use trailer_timeline::CueKind;

/// Reference frame time for particle speeds, in seconds
const FRAME: f32 = 1.0 / 60.0;

/// Decaying loudness estimate driven by cues
#[derive(Debug, Clone, Copy, Default)]
pub struct Intensity {
    level: f32,
}

impl Intensity {
    /// Level lost per second
    const DECAY: f32 = 1.5;

    /// Current level in `[0, 1]`
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Raise the level for a fired cue
    pub fn bump(&mut self, cue: CueKind) {
        let amount = match cue {
            CueKind::Ambient => 0.0,
            CueKind::Whoosh => 0.4,
            CueKind::Glitch => 0.6,
            CueKind::Boom => 0.8,
            CueKind::Blast => 1.0,
        };
        self.level = self.level.max(amount);
    }

    /// Let the level fall over `dt` seconds
    pub fn decay(&mut self, dt: f32) {
        self.level = (self.level - Self::DECAY * dt).max(0.0);
    }
}

#[derive(Debug, Clone, Copy)]
struct Particle {
    pos: Pos2,
    size: f32,
    speed: f32,
    opacity: f32,
}

/// Rising particle field
pub struct Background {
    particles: Vec<Particle>,
    bounds: Rect,
    settings: BackgroundSettings,
    rng: fastrand::Rng,
}

impl Background {
    /// Create a field filling `bounds`
    pub fn new(settings: BackgroundSettings, bounds: Rect) -> Self {
        let mut background = Self {
            particles: Vec::with_capacity(settings.particle_count),
            bounds,
            settings,
            rng: fastrand::Rng::new(),
        };
        background.populate();
        background
    }

    fn populate(&mut self) {
        self.particles.clear();
        for _ in 0..self.settings.particle_count {
            let pos = Pos2::new(
                self.bounds.min.x + self.rng.f32() * self.bounds.width(),
                self.bounds.min.y + self.rng.f32() * self.bounds.height(),
            );
            self.particles.push(Particle {
                pos,
                size: self.rng.f32() * 1.5,
                speed: self.rng.f32() * 0.2 + 0.05,
                opacity: self.rng.f32() * 0.5 + 0.1,
            });
        }
    }

    /// Number of particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Follow a window resize; particles are rescattered
    pub fn resize(&mut self, bounds: Rect) {
        if bounds != self.bounds {
            self.bounds = bounds;
            self.populate();
        }
    }

    /// Step the field by `dt` seconds
    pub fn update(&mut self, dt: f32, pointer: Option<Pos2>, intensity: f32) {
        let frames = dt / FRAME;
        let boost = 1.0 + 3.0 * intensity;
        let radius = self.settings.pointer_radius;

        for p in &mut self.particles {
            p.pos.y -= p.speed * boost * frames;

            if let Some(pointer) = pointer {
                let away: Vec2 = p.pos - pointer;
                let distance = away.length();
                if distance > f32::EPSILON && distance < radius {
                    let push = (1.0 - distance / radius) * 2.0 * frames;
                    p.pos += away / distance * push;
                    p.pos.x = p.pos.x.clamp(self.bounds.min.x, self.bounds.max.x);
                    p.pos.y = p.pos.y.min(self.bounds.max.y);
                }
            }

            if p.pos.y < self.bounds.min.y {
                p.pos.y = self.bounds.max.y;
                p.pos.x = self.bounds.min.x + self.rng.f32() * self.bounds.width();
            }
        }
    }

    /// Draw the vignette and particles
    pub fn paint(&self, painter: &Painter, theme: &TrailerTheme, intensity: f32) {
        let glow = self.settings.opacity * (1.0 + intensity);
        for p in &self.particles {
            let color = faded(theme.particle, p.opacity * glow);
            painter.circle_filled(p.pos, p.size.max(0.5), color);
        }
        paint_vignette(painter, self.bounds, theme.background);
    }
}

/// Dark bands fading in from the top and bottom edges
fn paint_vignette(painter: &Painter, rect: Rect, color: Color32) {
    let band = rect.height() * 0.3;
    let clear = Color32::TRANSPARENT;
    let solid = faded(color, 0.8);

    let mut mesh = Mesh::default();
    add_gradient(&mut mesh, Rect::from_min_size(rect.min, Vec2::new(rect.width(), band)), solid, clear);
    add_gradient(
        &mut mesh,
        Rect::from_min_max(Pos2::new(rect.min.x, rect.max.y - band), rect.max),
        clear,
        solid,
    );
    painter.add(mesh);
}

/// Vertical gradient quad
fn add_gradient(mesh: &mut Mesh, rect: Rect, top: Color32, bottom: Color32) {
    let base = mesh.vertices.len() as u32;
    mesh.colored_vertex(rect.left_top(), top);
    mesh.colored_vertex(rect.right_top(), top);
    mesh.colored_vertex(rect.right_bottom(), bottom);
    mesh.colored_vertex(rect.left_bottom(), bottom);
    mesh.add_triangle(base, base + 1, base + 2);
    mesh.add_triangle(base, base + 2, base + 3);
}
