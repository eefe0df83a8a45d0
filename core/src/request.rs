//! Per-call data: what to say, where the audio lives, how long it played.

use crate::language::is_supported_language;
use crate::platform::{AudioFormat, PlatformProfile};
use crate::{DuckytieError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Validated input for one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    text: String,
    language: String,
    slow: bool,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>, slow: bool) -> Result<Self> {
        let text = text.into();
        let language = language.into();
        if !is_supported_language(&language) {
            return Err(DuckytieError::Validation(format!(
                "Invalid language code: {language}"
            )));
        }
        if text.trim().is_empty() {
            return Err(DuckytieError::Validation("No text to speak".into()));
        }
        Ok(Self {
            text,
            language,
            slow,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn slow(&self) -> bool {
        self.slow
    }
}

/// An audio file on disk, named `<base_name>.<ext>` inside `dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioResource {
    dir: PathBuf,
    base_name: String,
    format: AudioFormat,
}

impl AudioResource {
    /// A freshly synthesized resource, in the synthesizer's source format.
    pub fn new(dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Result<Self> {
        let base_name = base_name.into();
        validate_base_name(&base_name)?;
        Ok(Self {
            dir: dir.into(),
            base_name,
            format: PlatformProfile::SOURCE_FORMAT,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.base_name, self.format.extension()))
    }

    /// Same base name and directory, different container.
    pub fn with_format(&self, format: AudioFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }
}

/// The base name may point into a subdirectory but must not carry an extension.
pub fn validate_base_name(base_name: &str) -> Result<()> {
    if base_name.contains('.') {
        return Err(DuckytieError::Validation(format!(
            "audio file name '{base_name}' can't have the dot character (.) or any file extension"
        )));
    }
    let file_part = Path::new(base_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if file_part.trim().is_empty() || base_name.ends_with(['/', '\\']) {
        return Err(DuckytieError::Validation(
            "audio file name must not be empty".into(),
        ));
    }
    Ok(())
}

/// Outcome of one completed playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlaybackResult {
    pub elapsed: Duration,
}

impl PlaybackResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}
