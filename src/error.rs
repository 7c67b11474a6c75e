/// Message shown when a failure carries no text of its own.
pub const GENERIC_FAILURE: &str = "Failed to generate speech";

#[derive(thiserror::Error, Debug)]
pub enum VocalizeError {
    #[error("Audio payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Provider(String),
    #[error("API Key is missing.")]
    MissingCredential,
    #[error("Audio payload of {0} bytes is too large for a WAV file")]
    TooLarge(usize),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Playback failed: {0}")]
    Playback(String),
    #[error("No audio has been generated yet.")]
    NoAsset,
}

impl VocalizeError {
    /// The text stored in a session's error slot.
    ///
    /// Provider failures are surfaced verbatim; an empty message falls back to
    /// [`GENERIC_FAILURE`].
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }
}

pub type Result<T, E = VocalizeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_message_is_surfaced_verbatim() {
        let err = VocalizeError::Provider("quota exceeded".to_string());
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[test]
    fn empty_provider_message_uses_generic_fallback() {
        let err = VocalizeError::Provider("  ".to_string());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn missing_credential_reads_like_the_ui_message() {
        assert_eq!(
            VocalizeError::MissingCredential.user_message(),
            "API Key is missing."
        );
    }
}
