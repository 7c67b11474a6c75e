//! Prebuilt voices and speaking styles offered by the remote model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VocalizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Voice {
    Puck,
    Charon,
    #[default]
    Kore,
    Fenrir,
    Zephyr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Voice {
    pub const ALL: [Voice; 5] = [
        Voice::Puck,
        Voice::Charon,
        Voice::Kore,
        Voice::Fenrir,
        Voice::Zephyr,
    ];

    /// Provider-facing voice name.
    pub fn name(&self) -> &'static str {
        match self {
            Voice::Puck => "Puck",
            Voice::Charon => "Charon",
            Voice::Kore => "Kore",
            Voice::Fenrir => "Fenrir",
            Voice::Zephyr => "Zephyr",
        }
    }

    pub fn gender(&self) -> Gender {
        match self {
            Voice::Kore | Voice::Zephyr => Gender::Female,
            Voice::Puck | Voice::Charon | Voice::Fenrir => Gender::Male,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Voice::Puck => "Deep & Resonant",
            Voice::Charon => "Authoritative & Clear",
            Voice::Kore => "Soothing & Calm",
            Voice::Fenrir => "Energetic & Fast",
            Voice::Zephyr => "Bright & Friendly",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Voice {
    type Err = VocalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voice::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                VocalizeError::Config(format!(
                    "Unknown voice '{s}'. Available voices: {}",
                    Voice::ALL.map(|v| v.name()).join(", ")
                ))
            })
    }
}

/// Speaking style, expressed to the model as an instruction prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Excited,
    Calm,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Excited,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Calm,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Neutral => "Neutral",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Angry => "Angry",
            Emotion::Excited => "Excited",
            Emotion::Calm => "Calm",
        }
    }

    /// Lowercase form used in exported file names.
    pub fn slug(&self) -> String {
        self.label().to_lowercase()
    }

    pub fn prompt_prefix(&self) -> &'static str {
        match self {
            Emotion::Neutral => "",
            Emotion::Happy => "Say cheerfully: ",
            Emotion::Excited => "Say excitedly: ",
            Emotion::Sad => "Say sadly: ",
            Emotion::Angry => "Say angrily: ",
            Emotion::Calm => "Say calmly: ",
        }
    }

    /// The prompt sent to the model for `text`.
    pub fn apply(&self, text: &str) -> String {
        format!("{}{text}", self.prompt_prefix())
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Emotion {
    type Err = VocalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VocalizeError::Config(format!("Unknown emotion '{s}'")))
    }
}
