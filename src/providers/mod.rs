//! Remote speech providers.
//!
//! This module contains implementations of [`SpeechProvider`](crate::SpeechProvider).
//!
//! # Available Providers
//!
//! Enable providers via Cargo features:
//! - `gemini` - Gemini native-audio TTS (HTTPS, API key required)

#[cfg(feature = "gemini")]
pub mod gemini;
