// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sound output for the trailer.
//!
//! This module provides:
//! - The continuous bed, looping until stopped
//! - One-shot cues rendered by [`crate::synth`]
//! - Master, bed and cue volume controls
//!
//! When the "audio" feature is not enabled, a stub implementation is provided
//! that logs a warning once and plays nothing. Output failures never reach the
//! timeline: the backend degrades to silence.

use crate::config::AudioSettings;

#[cfg(feature = "audio")]
mod engine {
    use super::*;
    use crate::synth::{self, Bed, SAMPLE_RATE};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use std::time::Duration;
    use trailer_timeline::{AudioBackend, CueKind};

    /// Endless bed as a rodio source
    struct BedSource(Bed);

    impl Iterator for BedSource {
        type Item = f32;

        fn next(&mut self) -> Option<f32> {
            self.0.next()
        }
    }

    impl Source for BedSource {
        fn current_frame_len(&self) -> Option<usize> {
            None
        }

        fn channels(&self) -> u16 {
            1
        }

        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn total_duration(&self) -> Option<Duration> {
            None
        }
    }

    /// Audio output driven by the timeline
    pub struct TrailerAudio {
        /// Output stream (must be kept alive)
        _stream: Option<OutputStream>,
        /// Stream handle for creating sinks
        stream_handle: Option<OutputStreamHandle>,
        /// Sink playing the bed, if running
        bed: Option<Sink>,
        /// Volume settings
        settings: AudioSettings,
        /// Noise source for whoosh and glitch
        rng: fastrand::Rng,
        /// Whether opening the output was attempted
        initialized: bool,
    }

    impl TrailerAudio {
        /// Create a backend. The output device opens on `initialize`.
        pub fn new(settings: AudioSettings) -> Self {
            Self {
                _stream: None,
                stream_handle: None,
                bed: None,
                settings,
                rng: fastrand::Rng::new(),
                initialized: false,
            }
        }

        /// Check if audio is available
        pub fn is_available(&self) -> bool {
            self.stream_handle.is_some()
        }

        /// Current volume settings
        pub fn settings(&self) -> &AudioSettings {
            &self.settings
        }

        /// Set the master volume, applied to the running bed immediately
        pub fn set_master_volume(&mut self, volume: f32) {
            self.settings.master_volume = volume.clamp(0.0, 1.0);
            if let Some(bed) = &self.bed {
                bed.set_volume(self.settings.bed_gain());
            }
        }

        fn new_sink(&self) -> Option<Sink> {
            if !self.settings.enabled {
                return None;
            }
            let handle = self.stream_handle.as_ref()?;
            match Sink::try_new(handle) {
                Ok(sink) => Some(sink),
                Err(e) => {
                    tracing::warn!("Failed to create audio sink: {}", e);
                    None
                }
            }
        }
    }

    impl AudioBackend for TrailerAudio {
        fn initialize(&mut self) {
            if self.initialized {
                return;
            }
            self.initialized = true;

            if !self.settings.enabled {
                tracing::info!("Audio disabled in settings");
                return;
            }

            match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    tracing::info!("Audio output initialized successfully");
                    self._stream = Some(stream);
                    self.stream_handle = Some(handle);
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize audio: {}. Audio will be disabled.", e);
                }
            }
        }

        fn start_bed(&mut self) {
            self.stop_bed();

            let Some(sink) = self.new_sink() else {
                return;
            };
            sink.set_volume(self.settings.bed_gain());
            sink.append(BedSource(Bed::new(SAMPLE_RATE)));
            self.bed = Some(sink);

            tracing::debug!("Bed started");
        }

        fn stop_bed(&mut self) {
            if let Some(sink) = self.bed.take() {
                sink.stop();
                tracing::debug!("Bed stopped");
            }
        }

        fn fire_cue(&mut self, cue: CueKind) {
            let samples = synth::render_cue(cue, SAMPLE_RATE, &mut self.rng);
            if samples.is_empty() {
                return;
            }
            let Some(sink) = self.new_sink() else {
                return;
            };

            sink.set_volume(self.settings.cue_gain());
            sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
            sink.detach(); // Let it play independently

            tracing::debug!("Cue {} fired", cue);
        }
    }

    impl Drop for TrailerAudio {
        fn drop(&mut self) {
            self.stop_bed();
        }
    }
}

#[cfg(not(feature = "audio"))]
mod engine {
    use super::*;
    use trailer_timeline::{AudioBackend, CueKind};

    /// Audio backend stub (no audio support)
    pub struct TrailerAudio {
        /// Volume settings
        settings: AudioSettings,
        /// Log warning once
        warned: bool,
    }

    impl TrailerAudio {
        /// Create a backend that plays nothing
        pub fn new(settings: AudioSettings) -> Self {
            tracing::info!("Audio: stub implementation (audio feature not enabled)");
            Self {
                settings,
                warned: false,
            }
        }

        fn warn_once(&mut self) {
            if !self.warned && self.settings.enabled {
                tracing::warn!("Audio playback not available: compile with --features audio");
                self.warned = true;
            }
        }

        /// Check if audio is available
        pub fn is_available(&self) -> bool {
            false
        }

        /// Current volume settings
        pub fn settings(&self) -> &AudioSettings {
            &self.settings
        }

        /// Set the master volume
        pub fn set_master_volume(&mut self, volume: f32) {
            self.settings.master_volume = volume.clamp(0.0, 1.0);
        }
    }

    impl AudioBackend for TrailerAudio {
        fn initialize(&mut self) {
            self.warn_once();
        }

        fn start_bed(&mut self) {
            self.warn_once();
        }

        fn stop_bed(&mut self) {}

        fn fire_cue(&mut self, _cue: CueKind) {}
    }
}

pub use engine::TrailerAudio;

#[cfg(test)]
mod tests {
    use super::*;
    use trailer_timeline::{AudioBackend, CueKind};

    fn disabled() -> AudioSettings {
        AudioSettings {
            enabled: false,
            ..AudioSettings::default()
        }
    }

    #[test]
    fn test_disabled_backend_stays_silent() {
        let mut audio = TrailerAudio::new(disabled());
        audio.initialize();
        audio.start_bed();
        audio.fire_cue(CueKind::Boom);
        audio.stop_bed();
        audio.stop_bed();

        assert!(!audio.is_available());
    }

    #[test]
    fn test_master_volume_is_clamped() {
        let mut audio = TrailerAudio::new(disabled());
        audio.set_master_volume(3.0);
        assert_eq!(audio.settings().master_volume, 1.0);
        audio.set_master_volume(-1.0);
        assert_eq!(audio.settings().master_volume, 0.0);
    }
}
