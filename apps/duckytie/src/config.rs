use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use duckytie_audio::{SayOptions, SpeakerConfig};
use duckytie_core::{AudioFormat, DuckytieError, Result};

/// Effective configuration for one run of the command
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub speaker: SpeakerConfig,
    /// Defaults for every `say` call; command-line options override these
    pub say: SayOptions,
}

impl AppConfig {
    /// Load configuration from a TOML file, overlaying values onto env-driven defaults.
    ///
    /// An explicit `--config` path must exist and parse. Otherwise the path comes from
    /// DUCKYTIE_CONFIG or ./duckytie.toml, and problems with it only produce a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let default = Self::default();
        if let Some(p) = explicit {
            let s = fs::read_to_string(p).map_err(|e| {
                DuckytieError::ConfigError(format!("cannot read {}: {e}", p.display()))
            })?;
            return Self::from_toml_str(&s, default)
                .map_err(|e| DuckytieError::ConfigError(format!("{}: {e}", p.display())));
        }

        let path = std::env::var("DUCKYTIE_CONFIG").unwrap_or_else(|_| "duckytie.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::debug!(target = "duckytie", path = %path, "No TOML config found; using defaults/env");
            return Ok(default);
        }
        match fs::read_to_string(p) {
            Ok(s) => match Self::from_toml_str(&s, default.clone()) {
                Ok(cfg) => Ok(cfg),
                Err(e) => {
                    tracing::warn!(target = "duckytie", error = %e, "Failed to parse TOML; using defaults");
                    Ok(default)
                }
            },
            Err(e) => {
                tracing::warn!(target = "duckytie", error = %e, "Failed to read TOML; using defaults");
                Ok(default)
            }
        }
    }

    fn from_toml_str(s: &str, base: Self) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str::<AppToml>(s).map(|t| t.overlay(base))
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AppToml {
    pub speaker: Option<SpeakerToml>,
    pub say: Option<SayToml>,
}

impl AppToml {
    fn overlay(self, mut base: AppConfig) -> AppConfig {
        if let Some(s) = self.speaker {
            s.apply(&mut base.speaker);
        }
        if let Some(s) = self.say {
            s.apply(&mut base.say);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SpeakerToml {
    pub output_dir: Option<PathBuf>,
    pub required_format: Option<AudioFormat>,
    pub poll_interval_ms: Option<u64>,
    pub max_wait_ms: Option<u64>,
    pub player: Option<String>,
    pub ffmpeg_bin: Option<PathBuf>,
    pub tld: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub quiet: Option<bool>,
}

impl SpeakerToml {
    fn apply(self, cfg: &mut SpeakerConfig) {
        if let Some(v) = self.output_dir {
            cfg.output_dir = v;
        }
        if let Some(v) = self.required_format {
            cfg.required_format = Some(v);
        }
        if let Some(v) = self.poll_interval_ms.filter(|v| *v > 0) {
            cfg.poll_interval = Duration::from_millis(v);
        }
        if let Some(v) = self.max_wait_ms {
            cfg.max_wait = Some(Duration::from_millis(v));
        }
        if let Some(v) = self.player {
            cfg.player = Some(v);
        }
        if let Some(v) = self.ffmpeg_bin {
            cfg.ffmpeg_bin = Some(v);
        }
        if let Some(v) = self.tld {
            cfg.tld = v;
        }
        if let Some(v) = self.request_timeout_ms {
            cfg.request_timeout = Duration::from_millis(v);
        }
        if let Some(v) = self.quiet {
            cfg.quiet = v;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SayToml {
    pub audio_filename: Option<String>,
    pub language: Option<String>,
    pub slow: Option<bool>,
    pub must_delete: Option<bool>,
}

impl SayToml {
    fn apply(self, opts: &mut SayOptions) {
        if let Some(v) = self.audio_filename {
            opts.audio_filename = v;
        }
        if let Some(v) = self.language {
            opts.language = v;
        }
        if let Some(v) = self.slow {
            opts.slow = v;
        }
        if let Some(v) = self.must_delete {
            opts.must_delete = v;
        }
    }
}
