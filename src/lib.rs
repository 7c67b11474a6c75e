//! # vocalize-rs
//!
//! A Rust library that turns remote text-to-speech output into a playable
//! asset and keeps a word-highlighting display and a spectrum visualizer in
//! step with playback.
//!
//! ## Features
//!
//! - **PCM to WAV**: Decode base64 PCM and wrap it in a standard RIFF/WAVE container
//! - **Word timing**: Estimate when each word is spoken from its character count
//! - **Sync loop**: Resolve the active word from a live playback clock
//! - **Spectrum**: Byte-magnitude FFT frames for visualization
//! - **Providers**: Gemini native-audio TTS behind the `gemini` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! vocalize-rs = { version = "2026.2", features = ["gemini"] }
//! ```
//!
//! ```ignore
//! use vocalize_rs::{
//!     asset::MemoryAssetStore, playback::HeadlessPlayer, providers::gemini::GeminiProvider,
//!     Session, SessionConfig,
//! };
//!
//! let mut session = Session::new(
//!     GeminiProvider::from_env()?,
//!     HeadlessPlayer::new(),
//!     MemoryAssetStore::new(),
//!     SessionConfig::default(),
//! )?;
//! session.generate("Hello, world!")?;
//! while let Some(report) = session.frame() {
//!     if report.active_changed {
//!         println!("{:?}", session.active_token().map(|t| &t.text));
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod asset;
pub mod config;
pub mod error;
pub mod pcm;
pub mod playback;
pub mod providers;
pub mod session;
pub mod spectrum;
pub mod sync;
pub mod timing;
pub mod voice;
pub mod wav;

pub use config::{AnalyserConfig, SessionConfig};
pub use error::{Result, VocalizeError};
pub use pcm::{AudioPayload, PcmFormat, RawPcmBuffer};
pub use session::{GenerationOutcome, Session};
pub use timing::{TextToken, Timeline};
pub use voice::{Emotion, Voice};
pub use wav::WavAsset;

/// What to say and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Voice,
    pub emotion: Emotion,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: Voice, emotion: Emotion) -> Self {
        Self {
            text: text.into(),
            voice,
            emotion,
        }
    }
}

/// Common interface for remote text-to-speech providers.
///
/// A provider is an opaque producer of transport-encoded raw PCM. Request
/// shaping, authentication and transport are its own business.
pub trait SpeechProvider {
    /// Synthesize speech for the request.
    fn synthesize(&mut self, request: &SpeechRequest) -> Result<AudioPayload>;

    /// Cheap local check that a request could be sent, e.g. a credential is
    /// present. Runs before a session touches playback.
    fn check_credentials(&self) -> Result<()> {
        Ok(())
    }

    /// Synthesize and decode in one step.
    fn synthesize_pcm(&mut self, request: &SpeechRequest, format: PcmFormat) -> Result<RawPcmBuffer> {
        self.synthesize(request)?.decode(format)
    }
}
