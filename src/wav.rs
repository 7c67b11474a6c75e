//! Minimal RIFF/WAVE container for raw PCM.

use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, VocalizeError};
use crate::pcm::{PcmFormat, RawPcmBuffer};

/// Size of the canonical PCM header (RIFF + fmt + data chunk headers).
pub const HEADER_LEN: usize = 44;

/// Size of the `fmt ` chunk body for plain PCM.
const FMT_CHUNK_LEN: u32 = 16;

/// WAVE_FORMAT_PCM
const FORMAT_PCM: u16 = 1;

/// Largest payload whose RIFF and data sizes fit their 32-bit fields.
pub const MAX_DATA_LEN: usize = (u32::MAX - 36) as usize;

/// A playable WAV file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAsset {
    bytes: Vec<u8>,
    format: PcmFormat,
}

impl WavAsset {
    /// Wrap a decoded PCM buffer in a WAV header.
    pub fn from_pcm(pcm: &RawPcmBuffer) -> Result<Self> {
        Self::encode(pcm.as_bytes(), pcm.format())
    }

    /// Build `44 + pcm.len()` bytes: standard header followed by the payload.
    ///
    /// An empty payload produces a valid, zero-length file. Payloads over
    /// [`MAX_DATA_LEN`] fail with [`VocalizeError::TooLarge`].
    pub fn encode(pcm: &[u8], format: PcmFormat) -> Result<Self> {
        let (riff_size, data_size) = chunk_sizes(pcm.len())?;

        let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());

        // RIFF header
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&riff_size.to_le_bytes());
        out.extend_from_slice(b"WAVE");

        // fmt chunk
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&format.channels.to_le_bytes());
        out.extend_from_slice(&format.sample_rate.to_le_bytes());
        out.extend_from_slice(&format.byte_rate().to_le_bytes());
        out.extend_from_slice(&format.block_align().to_le_bytes());
        out.extend_from_slice(&format.bits_per_sample.to_le_bytes());

        // data chunk
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_size.to_le_bytes());
        out.extend_from_slice(pcm);

        Ok(Self { bytes: out, format })
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
        self.bytes.len() <= HEADER_LEN
    }

    /// The PCM payload following the header.
    pub fn pcm(&self) -> &[u8] {
        &self.bytes[HEADER_LEN.min(self.bytes.len())..]
    }

    pub fn duration_secs(&self) -> f64 {
        self.format.duration_secs(self.pcm().len())
    }

    /// Read the file back through a standard decoder as mono f32 in [-1, 1].
    ///
    /// Multi-channel audio is downmixed by averaging each frame. A trailing
    /// partial frame is ignored.
    pub fn samples(&self) -> Result<Vec<f32>> {
        let align = usize::from(self.format.block_align().max(1));
        let pcm = self.pcm();
        let whole = pcm.len() - pcm.len() % align;

        let trimmed;
        let bytes = if whole == pcm.len() {
            self.bytes.as_slice()
        } else {
            log::debug!("Ignoring {} trailing bytes of a partial frame", pcm.len() - whole);
            trimmed = Self::encode(&pcm[..whole], self.format)?;
            trimmed.as_bytes()
        };

        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));
        let scale = f32::from(i16::MAX) + 1.0;

        let interleaved = reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / scale))
            .collect::<std::result::Result<Vec<f32>, _>>()?;

        if channels == 1 {
            return Ok(interleaved);
        }
        Ok(interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// RIFF chunk size and data chunk size for a payload of `data_len` bytes.
fn chunk_sizes(data_len: usize) -> Result<(u32, u32)> {
    u32::try_from(data_len)
        .ok()
        .and_then(|data| data.checked_add(36).map(|riff| (riff, data)))
        .ok_or(VocalizeError::TooLarge(data_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn header_fields_match_mono_16_bit_at_24khz() {
        let pcm = vec![0u8; 1000];
        let wav = WavAsset::encode(&pcm, PcmFormat::default()).unwrap();
        let b = wav.as_bytes();

        assert_eq!(b.len(), 44 + 1000);
        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(u32_at(b, 4), 36 + 1000);
        assert_eq!(&b[8..12], b"WAVE");
        assert_eq!(&b[12..16], b"fmt ");
        assert_eq!(u32_at(b, 16), 16);
        assert_eq!(u16_at(b, 20), 1);
        assert_eq!(u16_at(b, 22), 1);
        assert_eq!(u32_at(b, 24), 24000);
        assert_eq!(u32_at(b, 28), 48000);
        assert_eq!(u16_at(b, 32), 2);
        assert_eq!(u16_at(b, 34), 16);
        assert_eq!(&b[36..40], b"data");
        assert_eq!(u32_at(b, 40), 1000);
    }

    #[test]
    fn payload_follows_header_unchanged() {
        let pcm = [1u8, 2, 3, 4];
        let wav = WavAsset::encode(&pcm, PcmFormat::default()).unwrap();
        assert_eq!(wav.pcm(), &pcm);
    }

    #[test]
    fn empty_payload_is_a_valid_silent_file() {
        let wav = WavAsset::encode(&[], PcmFormat::default()).unwrap();
        assert_eq!(wav.len(), HEADER_LEN);
        assert!(wav.is_empty());
        assert_eq!(wav.duration_secs(), 0.0);
        assert!(wav.samples().unwrap().is_empty());
    }

    #[test]
    fn standard_decoder_reads_the_container() {
        let samples: [i16; 4] = [0, i16::MAX, i16::MIN, -1];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let wav = WavAsset::encode(&pcm, PcmFormat::default()).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav.as_bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn samples_are_normalized() {
        let pcm: Vec<u8> = [i16::MIN, 0, 16384]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let samples = WavAsset::encode(&pcm, PcmFormat::default()).unwrap().samples().unwrap();
        assert_eq!(samples, vec![-1.0, 0.0, 0.5]);
    }

    #[test]
    fn duration_follows_byte_rate() {
        let wav = WavAsset::encode(&vec![0u8; 24000], PcmFormat::default()).unwrap();
        assert!((wav.duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn odd_length_payload_keeps_whole_samples() {
        let pcm: Vec<u8> = [i16::MIN, 16384]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .chain([0x7f])
            .collect();
        let wav = WavAsset::encode(&pcm, PcmFormat::default()).unwrap();
        assert_eq!(wav.len(), HEADER_LEN + 5);
        assert_eq!(wav.pcm(), pcm.as_slice());
        assert_eq!(wav.samples().unwrap(), vec![-1.0, 0.5]);

        let lone = WavAsset::encode(&[1, 2, 3], PcmFormat::default()).unwrap();
        assert_eq!(lone.samples().unwrap().len(), 1);
    }

    #[test]
    fn chunk_sizes_fit_32_bit_fields() {
        assert_eq!(chunk_sizes(1000).unwrap(), (1036, 1000));
        assert_eq!(chunk_sizes(MAX_DATA_LEN).unwrap(), (u32::MAX, u32::MAX - 36));
        assert!(matches!(
            chunk_sizes(MAX_DATA_LEN + 1),
            Err(VocalizeError::TooLarge(_))
        ));
    }
}
