// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedural sound for the bed and the one-shot cues.
//!
//! Everything is mono `f32`. The bed is an endless iterator; cues are short
//! enough to render up front into a buffer.
//!
//! - Bed: 55 Hz sine drifting ±2 Hz, plus a detuned saw through a
//!   breathing low-pass
//! - Boom: sine sub drop with a two second tail
//! - Whoosh: band-passed noise sweeping up
//! - Blast: low punch plus a filtered square crunch
//! - Glitch: eight random square/saw blips

use std::f64::consts::{PI, TAU};
use trailer_timeline::CueKind;

/// Output sample rate for everything in this module
pub const SAMPLE_RATE: u32 = 44_100;

/// Highest cutoff/rate ratio the state-variable filter stays stable at
const MAX_CUTOFF_RATIO: f64 = 0.11;

/// Oscillator phase in cycles, `[0, 1)`
#[derive(Debug, Clone, Copy, Default)]
struct Phase(f64);

impl Phase {
    /// Current phase, then advance by one sample at `freq`
    fn step(&mut self, freq: f64, rate: f64) -> f64 {
        let current = self.0;
        self.0 = (self.0 + freq / rate).rem_euclid(1.0);
        current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wave {
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Wave {
    fn at(self, phase: f64) -> f64 {
        match self {
            Wave::Sine => (phase * TAU).sin(),
            Wave::Saw => 2.0 * phase - 1.0,
            Wave::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Wave::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// Chamberlin state-variable filter
#[derive(Debug, Clone, Copy, Default)]
struct Svf {
    low: f64,
    band: f64,
}

impl Svf {
    /// Returns `(low, band)`. Band is normalized to unity gain at the peak.
    fn process(&mut self, input: f64, cutoff: f64, q: f64, rate: f64) -> (f64, f64) {
        let ratio = (cutoff / rate).clamp(0.0, MAX_CUTOFF_RATIO);
        let f = 2.0 * (PI * ratio).sin();
        let damp = 1.0 / q.max(0.5);

        self.low += f * self.band;
        let high = input - self.low - damp * self.band;
        self.band += f * high;

        (self.low, self.band * damp)
    }
}

/// Exponential ramp from `from` to `to` over `duration`, held afterwards
fn exp_ramp(from: f64, to: f64, t: f64, duration: f64) -> f64 {
    if t <= 0.0 {
        from
    } else if t >= duration {
        to
    } else {
        from * (to / from).powf(t / duration)
    }
}

/// Linear ramp from `from` to `to` over `duration`, held afterwards
fn lin_ramp(from: f64, to: f64, t: f64, duration: f64) -> f64 {
    from + (to - from) * (t / duration).clamp(0.0, 1.0)
}

/// Continuous ambient bed. Never ends.
#[derive(Debug, Clone)]
pub struct Bed {
    rate: f64,
    drone: Phase,
    drift: Phase,
    pad: Phase,
    breath: Phase,
    filter: Svf,
}

impl Bed {
    /// Create a bed rendering at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            rate: f64::from(sample_rate),
            drone: Phase::default(),
            drift: Phase::default(),
            pad: Phase::default(),
            breath: Phase::default(),
            filter: Svf::default(),
        }
    }
}

impl Iterator for Bed {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let rate = self.rate;

        let drift = Wave::Sine.at(self.drift.step(0.05, rate));
        let drone = Wave::Sine.at(self.drone.step(55.0 + 2.0 * drift, rate));

        let breath = Wave::Triangle.at(self.breath.step(0.12, rate));
        let saw = Wave::Saw.at(self.pad.step(110.5, rate));
        let (pad, _) = self.filter.process(saw, 400.0 + 300.0 * breath, 2.0, rate);

        Some((drone + 0.3 * pad) as f32)
    }
}

/// Length of a cue's rendered buffer in seconds
pub fn cue_duration(cue: CueKind) -> f64 {
    match cue {
        CueKind::Ambient => 0.0,
        CueKind::Boom => 2.0,
        CueKind::Whoosh => 1.5,
        CueKind::Blast => 0.5,
        CueKind::Glitch => 0.47,
    }
}

/// Render a one-shot cue. The bed label renders nothing.
pub fn render_cue(cue: CueKind, sample_rate: u32, rng: &mut fastrand::Rng) -> Vec<f32> {
    let rate = f64::from(sample_rate);
    let len = (cue_duration(cue) * rate).round() as usize;

    let samples = match cue {
        CueKind::Ambient => Vec::new(),
        CueKind::Boom => boom(len, rate),
        CueKind::Whoosh => whoosh(len, rate, rng),
        CueKind::Blast => blast(len, rate),
        CueKind::Glitch => glitch(len, rate, rng),
    };

    samples
        .into_iter()
        .map(|s| s.clamp(-1.0, 1.0) as f32)
        .collect()
}

fn boom(len: usize, rate: f64) -> Vec<f64> {
    let mut osc = Phase::default();
    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            let freq = exp_ramp(100.0, 0.01, t, 2.0);
            let gain = exp_ramp(0.8, 0.001, t, 2.0);
            Wave::Sine.at(osc.step(freq, rate)) * gain
        })
        .collect()
}

fn whoosh(len: usize, rate: f64, rng: &mut fastrand::Rng) -> Vec<f64> {
    let mut filter = Svf::default();
    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            let noise = rng.f64() * 2.0 - 1.0;
            let cutoff = exp_ramp(100.0, 5000.0, t, 1.0);
            let (_, band) = filter.process(noise, cutoff, 0.8, rate);
            let gain = if t < 0.5 {
                lin_ramp(0.0, 0.4, t, 0.5)
            } else {
                lin_ramp(0.4, 0.0, t - 0.5, 1.0)
            };
            band * gain
        })
        .collect()
}

fn blast(len: usize, rate: f64) -> Vec<f64> {
    let mut low = Phase::default();
    let mut mid = Phase::default();
    let mut filter = Svf::default();

    (0..len)
        .map(|i| {
            let t = i as f64 / rate;

            let punch = Wave::Sine.at(low.step(exp_ramp(150.0, 10.0, t, 0.5), rate))
                * exp_ramp(1.0, 0.01, t, 0.5);

            let crunch = if t < 0.4 {
                let square = Wave::Square.at(mid.step(lin_ramp(80.0, 20.0, t, 0.3), rate));
                let (lp, _) = filter.process(square, 1000.0, std::f64::consts::FRAC_1_SQRT_2, rate);
                lp * exp_ramp(0.3, 0.001, t, 0.3)
            } else {
                0.0
            };

            punch + crunch
        })
        .collect()
}

fn glitch(len: usize, rate: f64, rng: &mut fastrand::Rng) -> Vec<f64> {
    let mut out = vec![0.0; len];

    for i in 0..8 {
        let wave = if i % 2 == 0 { Wave::Square } else { Wave::Saw };
        let offset = rng.f64() * 0.4;
        let duration = 0.02 + rng.f64() * 0.05;
        let freq = 200.0 + rng.f64() * 2000.0;

        let first = (offset * rate) as usize;
        let count = (duration * rate) as usize;
        let mut osc = Phase::default();

        for (n, sample) in out.iter_mut().skip(first).take(count).enumerate() {
            let t = n as f64 / rate;
            *sample += wave.at(osc.step(freq, rate)) * exp_ramp(0.1, 0.001, t, duration);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUES: [CueKind; 5] = [
        CueKind::Ambient,
        CueKind::Boom,
        CueKind::Whoosh,
        CueKind::Blast,
        CueKind::Glitch,
    ];

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    #[test]
    fn test_ambient_renders_nothing() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(render_cue(CueKind::Ambient, SAMPLE_RATE, &mut rng).is_empty());
    }

    #[test]
    fn test_cue_lengths_match_durations() {
        let mut rng = fastrand::Rng::with_seed(1);
        for cue in CUES {
            let samples = render_cue(cue, SAMPLE_RATE, &mut rng);
            let expected = (cue_duration(cue) * f64::from(SAMPLE_RATE)).round() as usize;
            assert_eq!(samples.len(), expected, "{cue}");
        }
    }

    #[test]
    fn test_cues_are_bounded_and_audible() {
        let mut rng = fastrand::Rng::with_seed(7);
        for cue in CUES {
            if cue.is_ambient() {
                continue;
            }
            let samples = render_cue(cue, SAMPLE_RATE, &mut rng);
            assert!(samples.iter().all(|s| s.is_finite()), "{cue}");
            let level = peak(&samples);
            assert!(level <= 1.0, "{cue} clips");
            assert!(level > 0.01, "{cue} is silent");
        }
    }

    #[test]
    fn test_boom_decays() {
        let mut rng = fastrand::Rng::with_seed(1);
        let samples = render_cue(CueKind::Boom, SAMPLE_RATE, &mut rng);
        let tenth = samples.len() / 10;
        assert!(peak(&samples[..tenth]) > 10.0 * peak(&samples[samples.len() - tenth..]));
    }

    #[test]
    fn test_whoosh_fades_in_and_out() {
        let mut rng = fastrand::Rng::with_seed(3);
        let samples = render_cue(CueKind::Whoosh, SAMPLE_RATE, &mut rng);
        assert_eq!(samples[0], 0.0);
        assert!(samples.last().unwrap().abs() < 1e-3);
    }

    #[test]
    fn test_glitch_is_deterministic_per_seed() {
        let a = render_cue(CueKind::Glitch, SAMPLE_RATE, &mut fastrand::Rng::with_seed(42));
        let b = render_cue(CueKind::Glitch, SAMPLE_RATE, &mut fastrand::Rng::with_seed(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_bed_is_endless_and_bounded() {
        let bed = Bed::new(SAMPLE_RATE);
        let second: Vec<f32> = bed.take(SAMPLE_RATE as usize).collect();
        assert_eq!(second.len(), SAMPLE_RATE as usize);
        assert!(second.iter().all(|s| s.is_finite() && s.abs() < 2.0));
        assert!(peak(&second) > 0.5);
    }

    #[test]
    fn test_ramps() {
        assert_eq!(exp_ramp(100.0, 1.0, 0.0, 2.0), 100.0);
        assert!((exp_ramp(100.0, 1.0, 1.0, 2.0) - 10.0).abs() < 1e-9);
        assert_eq!(exp_ramp(100.0, 1.0, 5.0, 2.0), 1.0);
        assert_eq!(lin_ramp(0.0, 0.4, 0.25, 0.5), 0.2);
        assert_eq!(lin_ramp(0.0, 0.4, 3.0, 0.5), 0.4);
    }
}
