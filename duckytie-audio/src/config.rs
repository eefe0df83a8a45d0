use duckytie_core::{AudioFormat, PlatformProfile};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Settings shared by every stage of the speech pipeline.
///
/// `Default` reads these environment overrides:
/// - DUCKYTIE_OUTPUT_DIR, DUCKYTIE_FORMAT
/// - DUCKYTIE_POLL_INTERVAL_MS, DUCKYTIE_MAX_WAIT_MS
/// - DUCKYTIE_PLAYER, FFMPEG_BIN
/// - DUCKYTIE_TLD, DUCKYTIE_REQUEST_TIMEOUT_MS
#[derive(Clone, Debug)]
pub struct SpeakerConfig {
    /// Directory audio files are written to.
    pub output_dir: PathBuf,
    /// Forces a platform profile instead of detecting it from the host.
    pub required_format: Option<AudioFormat>,
    pub poll_interval: Duration,
    /// Upper bound on a single playback; `None` waits forever.
    pub max_wait: Option<Duration>,
    /// Preferred player binary (name on `PATH` or absolute path).
    pub player: Option<String>,
    pub ffmpeg_bin: Option<PathBuf>,
    /// Top-level domain of the speech service host, e.g. `com` or `com.br`.
    pub tld: String,
    pub request_timeout: Duration,
    /// Silence banners and progress output from external tools.
    pub quiet: bool,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        let output_dir = std::env::var("DUCKYTIE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let required_format = std::env::var("DUCKYTIE_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .and_then(|s| match s.parse::<AudioFormat>() {
                Ok(f) => Some(f),
                Err(e) => {
                    warn!(target = "duckytie", error = %e, "Ignoring DUCKYTIE_FORMAT");
                    None
                }
            });
        let poll_interval = env_millis("DUCKYTIE_POLL_INTERVAL_MS")
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_millis(250));
        let max_wait = env_millis("DUCKYTIE_MAX_WAIT_MS");
        let player = std::env::var("DUCKYTIE_PLAYER")
            .ok()
            .filter(|s| !s.is_empty());
        let ffmpeg_bin = std::env::var("FFMPEG_BIN")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let tld = std::env::var("DUCKYTIE_TLD")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "com".to_string());
        let request_timeout =
            env_millis("DUCKYTIE_REQUEST_TIMEOUT_MS").unwrap_or(Duration::from_millis(10_000));

        Self {
            output_dir,
            required_format,
            poll_interval,
            max_wait,
            player,
            ffmpeg_bin,
            tld,
            request_timeout,
            quiet: true,
        }
    }
}

impl SpeakerConfig {
    /// Resolve the platform profile once, honoring a forced format.
    pub fn platform_profile(&self) -> PlatformProfile {
        self.required_format
            .map(PlatformProfile::new)
            .unwrap_or_else(PlatformProfile::detect)
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
