//! Gemini text-to-speech provider.
//!
//! Sends the prompt (emotion prefix + text) to the `generateContent` endpoint
//! with audio output and a prebuilt voice, and returns the base64 PCM the
//! model answers with (24 kHz, mono, 16-bit).
//!
//! # Examples
//!
//! ```rust,no_run
//! use vocalize_rs::providers::gemini::GeminiProvider;
//! use vocalize_rs::{Emotion, SpeechProvider, SpeechRequest, Voice};
//!
//! // Reads GEMINI_API_KEY (or VITE_GEMINI_API_KEY)
//! let mut provider = GeminiProvider::from_env()?;
//! let payload = provider.synthesize(&SpeechRequest::new("Hello!", Voice::Kore, Emotion::Happy))?;
//! println!("{} base64 chars", payload.as_str().len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::error::{Result, VocalizeError};
use crate::pcm::AudioPayload;
use crate::{SpeechProvider, SpeechRequest};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "VITE_GEMINI_API_KEY"];

/// Parameters for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiParams {
    /// `None` falls back to [`API_KEY_VARS`].
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiParams {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GeminiProvider {
    pub fn new(params: GeminiParams) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(params.timeout)
            .build()?;

        let api_key = params
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                API_KEY_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|key| !key.trim().is_empty())
            });
        if api_key.is_none() {
            log::warn!("No Gemini API key configured; generation will fail");
        }

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/models/{}:generateContent",
                params.base_url.trim_end_matches('/'),
                params.model
            ),
        })
    }

    /// Default parameters, key from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiParams::default())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SpeechProvider for GeminiProvider {
    fn check_credentials(&self) -> Result<()> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(VocalizeError::MissingCredential),
        }
    }

    fn synthesize(&mut self, request: &SpeechRequest) -> Result<AudioPayload> {
        let api_key = self.api_key.as_deref().ok_or(VocalizeError::MissingCredential)?;

        log::info!(
            "Requesting {} chars of speech (voice {}, {})",
            request.text.chars().count(),
            request.voice,
            request.emotion
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request_body(request))
            .send()?;

        let status = response.status();
        let text = response.text()?;
        parse_response(status, &text)
    }
}

/// Turn a raw response into audio or a provider error.
///
/// Error bodies that are not JSON (e.g. a gateway's HTML page) fall back to a
/// message naming the status.
pub fn parse_response(status: StatusCode, text: &str) -> Result<AudioPayload> {
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|body| error_message(&body))
            .unwrap_or_else(|| format!("Speech request failed with status {status}"));
        return Err(VocalizeError::Provider(message));
    }
    let body: Value = serde_json::from_str(text)?;
    extract_audio(&body)
}

/// JSON body asking for audio in the requested voice.
pub fn request_body(request: &SpeechRequest) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": request.emotion.apply(&request.text) }]
        }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": request.voice.name() }
                }
            }
        }
    })
}

/// Pull the first inline audio part out of a response.
pub fn extract_audio(body: &Value) -> Result<AudioPayload> {
    body.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.pointer("/content/parts"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(|part| part.pointer("/inlineData/data").and_then(Value::as_str))
        .map(AudioPayload::new)
        .ok_or_else(|| {
            VocalizeError::Provider(
                error_message(body).unwrap_or_else(|| "No audio data received from Gemini.".to_string()),
            )
        })
}

fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
