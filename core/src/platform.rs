//! Platform profile: which audio container the host can play.
//!
//! The synthesizer always produces MP3. Unix-family hosts play OGG, everything
//! else plays MP3. The profile is resolved once and passed to every component
//! that needs to know, so both profiles can be exercised on one machine.

use crate::{DuckytieError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Ogg,
}

impl AudioFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp3" => Some(AudioFormat::Mp3),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// Format of a path, judged by its extension only.
    pub fn of_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = DuckytieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(&s.trim().trim_start_matches('.').to_ascii_lowercase()).ok_or_else(
            || DuckytieError::ConfigError(format!("unknown audio format '{s}' (expected mp3 or ogg)")),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    required_format: AudioFormat,
}

impl PlatformProfile {
    /// Format produced by the synthesizer before any adaptation.
    pub const SOURCE_FORMAT: AudioFormat = AudioFormat::Mp3;

    pub fn new(required_format: AudioFormat) -> Self {
        Self { required_format }
    }

    /// Profile of the machine we are running on.
    pub fn detect() -> Self {
        if cfg!(unix) {
            Self::new(AudioFormat::Ogg)
        } else {
            Self::new(AudioFormat::Mp3)
        }
    }

    pub fn required_format(&self) -> AudioFormat {
        self.required_format
    }

    pub fn extension_for(&self, format: AudioFormat) -> &'static str {
        format.extension()
    }

    pub fn required_extension(&self) -> &'static str {
        self.extension_for(self.required_format)
    }

    /// Whether synthesized audio must be re-encoded before playback.
    pub fn needs_adaptation(&self) -> bool {
        self.required_format != Self::SOURCE_FORMAT
    }

    /// Reject paths whose extension is not the one this host plays.
    pub fn check_extension(&self, path: &Path) -> Result<()> {
        match AudioFormat::of_path(path) {
            None => Err(DuckytieError::Validation(format!(
                "audio file name must end with \".mp3\" or \".ogg\", got {}",
                path.display()
            ))),
            Some(format) if format != self.required_format => {
                Err(DuckytieError::PlatformMismatch(format!(
                    "this platform plays \".{}\" files, but {} is \".{}\"",
                    self.required_extension(),
                    path.display(),
                    format.extension()
                )))
            }
            Some(_) => Ok(()),
        }
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::detect()
    }
}
