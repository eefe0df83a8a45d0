//! Container adaptation: make the synthesized MP3 playable on this host.

use crate::config::SpeakerConfig;
use crate::utils::{discard_file, resolve_bin};
use async_trait::async_trait;
use duckytie_core::{AudioFormat, AudioResource, DuckytieError, PlatformProfile, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// Re-encodes `src` into `dst` using the given container format.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, src: &Path, dst: &Path, format: AudioFormat) -> Result<()>;
}

/// Shells out to `ffmpeg`.
pub struct FfmpegTranscoder {
    bin: Option<PathBuf>,
    quiet: bool,
}

impl FfmpegTranscoder {
    pub fn new(cfg: &SpeakerConfig) -> Self {
        let bin = resolve_bin(cfg.ffmpeg_bin.as_deref(), "ffmpeg");
        if let Some(ref b) = bin {
            debug!(target = "adapter", bin = ?b, "Detected ffmpeg binary");
        }
        Self {
            bin,
            quiet: cfg.quiet,
        }
    }

    fn command(&self, bin: &Path, src: &Path, dst: &Path, format: AudioFormat) -> Command {
        let codec = match format {
            AudioFormat::Ogg => "libvorbis",
            AudioFormat::Mp3 => "libmp3lame",
        };
        let mut cmd = Command::new(bin);
        if self.quiet {
            cmd.arg("-hide_banner").arg("-loglevel").arg("error");
        }
        cmd.arg("-y").arg("-i").arg(src);
        cmd.arg("-vn").arg("-c:a").arg(codec);
        cmd.arg(dst);
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, src: &Path, dst: &Path, format: AudioFormat) -> Result<()> {
        let bin = self.bin.as_ref().ok_or_else(|| {
            DuckytieError::Resource("ffmpeg not found; install it or set FFMPEG_BIN".into())
        })?;
        let mut cmd = self.command(bin, src, dst, format);
        debug!(target = "adapter", command = ?cmd, "Running ffmpeg");
        let output = cmd
            .output()
            .await
            .map_err(|e| DuckytieError::Resource(format!("failed to run ffmpeg: {e}")))?;
        if !output.status.success() {
            return Err(DuckytieError::Resource(format!(
                "ffmpeg failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Converts synthesizer output into the platform's required format.
pub struct FormatAdapter {
    profile: PlatformProfile,
    transcoder: Arc<dyn Transcoder>,
}

impl FormatAdapter {
    pub fn new(profile: PlatformProfile, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            profile,
            transcoder,
        }
    }

    /// Returns the single audio file left on disk for this call.
    ///
    /// On a host that plays the source format this is a no-op. Otherwise the
    /// file is re-encoded next to the original and the original is removed. If
    /// re-encoding fails, both the source and any partial output are removed.
    pub async fn adapt(&self, resource: &AudioResource) -> Result<AudioResource> {
        let path = resource.path();
        if resource.format() != PlatformProfile::SOURCE_FORMAT {
            return Err(DuckytieError::Validation(format!(
                "expected a \".{}\" file to adapt, got {}",
                PlatformProfile::SOURCE_FORMAT.extension(),
                path.display()
            )));
        }
        if !self.profile.needs_adaptation() {
            debug!(target = "adapter", path = ?path, "Source format already playable");
            return Ok(resource.clone());
        }

        let target = resource.with_format(self.profile.required_format());
        let target_path = target.path();
        if let Err(e) = self
            .transcoder
            .transcode(&path, &target_path, target.format())
            .await
        {
            discard_file(&target_path).await;
            discard_file(&path).await;
            return Err(e);
        }
        tokio::fs::remove_file(&path).await?;
        info!(
            target = "adapter",
            name = resource.base_name(),
            from = ?path,
            to = ?target_path,
            "Converted audio for this platform"
        );
        Ok(target)
    }
}
