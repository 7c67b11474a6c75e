use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VocalizeError};
use crate::pcm::PcmFormat;
use crate::voice::{Emotion, Voice};

/// Slowest playback rate a session accepts.
pub const MIN_SPEED: f64 = 0.5;
/// Fastest playback rate a session accepts.
pub const MAX_SPEED: f64 = 2.0;

/// Parameters of the frequency analyser feeding the visualizer.
///
/// Byte magnitudes are mapped linearly from `[min_decibels, max_decibels]`
/// onto `0..=255`.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Transform size. Must be a power of two in `32..=32768`.
    pub fft_size: usize,
    /// Weight of the previous frame in `[0, 1)`.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of magnitude values per frame.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(VocalizeError::Config(format!(
                "fft_size must be a power of two between 32 and 32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(VocalizeError::Config(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(VocalizeError::Config(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct SessionConfig {
    /// Format of the PCM the provider returns.
    pub pcm: PcmFormat,
    pub analyser: AnalyserConfig,
    pub voice: Voice,
    pub emotion: Emotion,
    /// Playback rate multiplier, clamped to `MIN_SPEED..=MAX_SPEED`.
    pub speed: f64,
    /// Leading part of exported file names.
    pub file_prefix: String,
    /// Start playback as soon as a generation finishes.
    pub autoplay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pcm: PcmFormat::default(),
            analyser: AnalyserConfig::default(),
            voice: Voice::default(),
            emotion: Emotion::default(),
            speed: 1.0,
            file_prefix: "vocalize".to_string(),
            autoplay: true,
        }
    }
}

impl SessionConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.analyser.validate()?;
        self.pcm.validate()?;
        if !self.speed.is_finite() {
            return Err(VocalizeError::Config("speed must be finite".to_string()));
        }
        Ok(())
    }
}

/// Clamp a requested playback rate to the supported range.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

impl From<AnalyserConfigBuilderError> for VocalizeError {
    fn from(e: AnalyserConfigBuilderError) -> Self {
        VocalizeError::Config(e.to_string())
    }
}

impl From<SessionConfigBuilderError> for VocalizeError {
    fn from(e: SessionConfigBuilderError) -> Self {
        VocalizeError::Config(e.to_string())
    }
}
