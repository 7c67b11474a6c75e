//! Transport decoding of raw PCM audio.
//!
//! Remote providers hand back audio as a base64 string wrapping signed 16-bit
//! little-endian samples. The decoder only restores the bytes; sample rate and
//! channel layout travel out-of-band in a [`PcmFormat`].

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VocalizeError};

/// Output sample rate of the remote speech model.
pub const SAMPLE_RATE: u32 = 24000;

/// Layout of a raw PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl PcmFormat {
    pub fn bytes_per_sample(&self) -> u32 {
        u32::from(self.bits_per_sample / 8)
    }

    /// Bytes consumed per second of audio (24000 Hz mono 16-bit: 48000).
    ///
    /// Saturates for layouts that [`validate`](Self::validate) rejects.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate
            .saturating_mul(u32::from(self.channels))
            .saturating_mul(self.bytes_per_sample())
    }

    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample / 8)
    }

    /// Check the layout is 16-bit PCM whose header fields fit their widths.
    pub fn validate(&self) -> Result<()> {
        if self.bits_per_sample != 16 || self.channels == 0 || self.sample_rate == 0 {
            return Err(VocalizeError::Config(format!(
                "PCM must be 16-bit with at least one channel and a non-zero rate, got {:?}",
                self
            )));
        }
        let block_align = self.channels.checked_mul(self.bits_per_sample / 8);
        let byte_rate = self
            .sample_rate
            .checked_mul(u32::from(self.channels))
            .and_then(|v| v.checked_mul(self.bytes_per_sample()));
        if block_align.is_none() || byte_rate.is_none() {
            return Err(VocalizeError::Config(format!(
                "PCM layout of {} channels at {} Hz overflows the WAV header",
                self.channels, self.sample_rate
            )));
        }
        Ok(())
    }

    /// Duration in seconds of `byte_len` bytes in this format.
    pub fn duration_secs(&self, byte_len: usize) -> f64 {
        let rate = self.byte_rate();
        if rate == 0 {
            return 0.0;
        }
        byte_len as f64 / f64::from(rate)
    }
}

/// Transport-encoded audio as received from a speech provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload(String);

impl AudioPayload {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Wrap raw bytes for transport.
    pub fn encode(bytes: &[u8]) -> Self {
        Self(general_purpose::STANDARD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into raw PCM bytes in the given format.
    ///
    /// Fails on characters outside the base64 alphabet or truncated padding.
    /// The audio content itself is not inspected.
    pub fn decode(&self, format: PcmFormat) -> Result<RawPcmBuffer> {
        let bytes = general_purpose::STANDARD.decode(self.0.as_bytes())?;
        log::debug!("Decoded {} PCM bytes from payload", bytes.len());
        Ok(RawPcmBuffer { bytes, format })
    }
}

/// Interleaved signed 16-bit little-endian samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPcmBuffer {
    bytes: Vec<u8>,
    format: PcmFormat,
}

impl RawPcmBuffer {
    pub fn new(bytes: Vec<u8>, format: PcmFormat) -> Self {
        Self { bytes, format }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Estimated playback length: bytes / (sample rate * bytes per sample * channels).
    pub fn duration_secs(&self) -> f64 {
        self.format.duration_secs(self.bytes.len())
    }
}
