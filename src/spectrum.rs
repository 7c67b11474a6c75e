//! Real-time frequency snapshots for visualization.
//!
//! Mirrors a browser analyser node: the newest `fft_size` samples are
//! windowed, transformed, smoothed against the previous frame and mapped from
//! decibels onto bytes. The result is lossy and only meant for drawing.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::config::AnalyserConfig;
use crate::error::Result;

/// A live time-domain signal the analyser can tap.
pub trait SignalSource: Send + Sync {
    /// Fill `out` with the newest samples, oldest first, zero-padding where
    /// no audio exists. Returns false when no data is available at all.
    fn read_time_domain(&self, out: &mut [f32]) -> bool;
}

/// Produces one byte-magnitude frame per call from an attached source.
pub struct SpectrumSampler {
    config: AnalyserConfig,
    source: Option<Arc<dyn SignalSource>>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    frame: Vec<u8>,
}

impl std::fmt::Debug for SpectrumSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumSampler")
            .field("config", &self.config)
            .field("connected", &self.source.is_some())
            .finish()
    }
}

impl SpectrumSampler {
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        config.validate()?;

        let size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let bins = config.bin_count();

        Ok(Self {
            window: (0..size).map(|i| blackman_window(i, size)).collect(),
            input: vec![0.0; size],
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
            smoothed: vec![0.0; bins],
            frame: vec![0; bins],
            source: None,
            fft,
            config,
        })
    }

    /// Connect the signal source. Only the first call has any effect.
    pub fn attach(&mut self, source: Arc<dyn SignalSource>) -> bool {
        if self.source.is_some() {
            log::debug!("Analyser already has a source, ignoring attach");
            return false;
        }
        log::debug!("Analyser connected ({}-point FFT)", self.config.fft_size);
        self.source = Some(source);
        true
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// The most recent frame.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Compute a new frame. Without data the frame is all zeros.
    pub fn sample(&mut self) -> &[u8] {
        let has_data = match &self.source {
            Some(source) => source.read_time_domain(&mut self.input),
            None => false,
        };
        if !has_data {
            self.clear();
            return &self.frame;
        }

        for ((slot, &x), &w) in self.buffer.iter_mut().zip(&self.input).zip(&self.window) {
            *slot = Complex::new(x * w, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let n = self.config.fft_size as f32;
        let tau = self.config.smoothing;
        let min_db = self.config.min_decibels;
        let range = self.config.max_decibels - min_db;

        for ((smoothed, out), bin) in self
            .smoothed
            .iter_mut()
            .zip(self.frame.iter_mut())
            .zip(&self.buffer)
        {
            let magnitude = bin.norm() / n;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            *out = to_byte(*smoothed, min_db, range);
        }

        &self.frame
    }

    /// Reset to the zero baseline.
    pub fn clear(&mut self) {
        self.smoothed.fill(0.0);
        self.frame.fill(0);
    }
}

fn to_byte(magnitude: f32, min_db: f32, range: f32) -> u8 {
    if magnitude.is_nan() || magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    ((db - min_db) / range * 255.0).clamp(0.0, 255.0) as u8
}

/// Blackman window (alpha = 0.16) for spectral analysis.
fn blackman_window(index: usize, size: usize) -> f32 {
    let phase = 2.0 * PI * index as f32 / size as f32;
    0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sine {
        bin: usize,
        amplitude: f32,
    }

    impl SignalSource for Sine {
        fn read_time_domain(&self, out: &mut [f32]) -> bool {
            let n = out.len() as f32;
            for (i, s) in out.iter_mut().enumerate() {
                *s = self.amplitude * (2.0 * PI * self.bin as f32 * i as f32 / n).sin();
            }
            true
        }
    }

    struct Unavailable;

    impl SignalSource for Unavailable {
        fn read_time_domain(&self, _out: &mut [f32]) -> bool {
            false
        }
    }

    fn unsmoothed() -> AnalyserConfig {
        AnalyserConfig {
            smoothing: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn unconnected_sampler_yields_zero_frame() {
        let mut sampler = SpectrumSampler::new(AnalyserConfig::default()).unwrap();
        let frame = sampler.sample();
        assert_eq!(frame.len(), 128);
        assert!(frame.iter().all(|&v| v == 0));
    }

    #[test]
    fn source_without_data_yields_zero_frame() {
        let mut sampler = SpectrumSampler::new(AnalyserConfig::default()).unwrap();
        sampler.attach(Arc::new(Unavailable));
        assert!(sampler.sample().iter().all(|&v| v == 0));
    }

    #[test]
    fn second_attach_is_ignored() {
        let mut sampler = SpectrumSampler::new(AnalyserConfig::default()).unwrap();
        assert!(sampler.attach(Arc::new(Unavailable)));
        assert!(!sampler.attach(Arc::new(Sine { bin: 4, amplitude: 1.0 })));
        assert!(sampler.sample().iter().all(|&v| v == 0));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let mut sampler = SpectrumSampler::new(unsmoothed()).unwrap();
        sampler.attach(Arc::new(Sine { bin: 16, amplitude: 0.001 }));
        let frame = sampler.sample().to_vec();

        let (peak, &level) = frame.iter().enumerate().max_by_key(|(_, v)| **v).unwrap();
        assert_eq!(peak, 16);
        assert!(level > 0);
        assert_eq!(frame[100], 0);
    }

    #[test]
    fn frame_length_follows_fft_size() {
        let config = AnalyserConfig {
            fft_size: 1024,
            ..Default::default()
        };
        let sampler = SpectrumSampler::new(config).unwrap();
        assert_eq!(sampler.frame().len(), 512);
    }

    #[test]
    fn smoothing_ramps_up_over_frames() {
        let mut sampler = SpectrumSampler::new(AnalyserConfig::default()).unwrap();
        sampler.attach(Arc::new(Sine { bin: 16, amplitude: 0.001 }));
        let first = sampler.sample()[16];
        let second = sampler.sample()[16];
        assert!(second > first);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AnalyserConfig {
            fft_size: 100,
            ..Default::default()
        };
        assert!(SpectrumSampler::new(config).is_err());
    }

    #[test]
    fn blackman_window_shape() {
        let size = 256;
        assert!(blackman_window(0, size).abs() < 1e-6);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 1e-6);
    }
}
