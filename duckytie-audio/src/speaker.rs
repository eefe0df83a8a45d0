//! The `say` pipeline: synthesize, adapt, play, clean up.

use crate::adapter::{FfmpegTranscoder, FormatAdapter, Transcoder};
use crate::cleaner::LifecycleCleaner;
use crate::config::SpeakerConfig;
use crate::playback::{AudioBackend, PlaybackEngine, PlayerOptions, ProcessBackend};
use crate::synth::{GoogleTts, Synthesizer};
use crate::utils::discard_file;
use duckytie_core::{
    AudioResource, DuckytieError, PlatformProfile, PlaybackResult, Result, SpeechRequest,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-call options for [`Speaker::say`] and [`Speaker::create_audio`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SayOptions {
    /// File name without extension; the extension is chosen per platform.
    pub audio_filename: String,
    pub language: String,
    pub slow: bool,
    pub must_delete: bool,
}

impl Default for SayOptions {
    fn default() -> Self {
        Self {
            audio_filename: "temp".to_string(),
            language: "en".to_string(),
            slow: false,
            must_delete: true,
        }
    }
}

/// Owns one of each pipeline stage. Calls are strictly sequential: `say` takes
/// `&mut self` because the audio device is exclusively held during playback.
pub struct Speaker {
    output_dir: PathBuf,
    profile: PlatformProfile,
    synthesizer: Arc<dyn Synthesizer>,
    adapter: FormatAdapter,
    engine: PlaybackEngine,
    cleaner: LifecycleCleaner,
}

impl Speaker {
    /// Production pipeline: Google speech, ffmpeg, and a command-line player.
    pub fn new(cfg: SpeakerConfig) -> Result<Self> {
        let synthesizer = Arc::new(GoogleTts::new(&cfg)?);
        let transcoder = Arc::new(FfmpegTranscoder::new(&cfg));
        let backend = Box::new(ProcessBackend::new(PlayerOptions::from(&cfg)));
        Ok(Self::with_parts(&cfg, synthesizer, transcoder, backend))
    }

    pub fn with_parts(
        cfg: &SpeakerConfig,
        synthesizer: Arc<dyn Synthesizer>,
        transcoder: Arc<dyn Transcoder>,
        backend: Box<dyn AudioBackend>,
    ) -> Self {
        let profile = cfg.platform_profile();
        info!(
            target = "speaker",
            format = %profile.required_format(),
            synthesizer = synthesizer.name(),
            "Speech pipeline ready"
        );
        Self {
            output_dir: cfg.output_dir.clone(),
            profile,
            synthesizer,
            adapter: FormatAdapter::new(profile, transcoder),
            engine: PlaybackEngine::new(profile, backend)
                .with_poll_interval(cfg.poll_interval)
                .with_max_wait(cfg.max_wait),
            cleaner: LifecycleCleaner::new(profile),
        }
    }

    pub fn profile(&self) -> PlatformProfile {
        self.profile
    }

    /// Synthesize `text` and leave exactly one playable file on disk.
    ///
    /// All validation happens before any file is written.
    pub async fn create_audio(&self, text: &str, opts: &SayOptions) -> Result<PathBuf> {
        let resource = AudioResource::new(&self.output_dir, opts.audio_filename.as_str())?;
        let request = SpeechRequest::new(text, opts.language.as_str(), opts.slow)?;
        let source = resource.path();

        if let Err(e) = self.synthesizer.synthesize(&request, &source).await {
            // Only a failed write can leave a partial file behind.
            if matches!(e, DuckytieError::IoError(_)) {
                discard_file(&source).await;
            }
            return Err(e);
        }

        let path = self.adapter.adapt(&resource).await?.path();
        info!(target = "speaker", path = ?path, "File {} has been created.", path.display());
        Ok(path)
    }

    /// Play an existing file, then delete it if `must_delete` is set.
    ///
    /// If playback itself fails the delete policy is still applied; the
    /// playback error is what gets returned.
    pub async fn play_audio(&mut self, path: &Path, must_delete: bool) -> Result<PlaybackResult> {
        match self.engine.play(path).await {
            Ok(result) => {
                self.cleaner.cleanup(path, must_delete).await?;
                Ok(result)
            }
            Err(e) => {
                if must_delete && !e.is_validation() {
                    if let Err(cleanup_err) = self.cleaner.cleanup(path, true).await {
                        warn!(target = "speaker", path = ?path, error = %cleanup_err, "Cleanup after failed playback also failed");
                    }
                }
                Err(e)
            }
        }
    }

    /// Read `text` aloud, blocking until playback completes.
    pub async fn say(&mut self, text: &str, opts: &SayOptions) -> Result<PlaybackResult> {
        let path = self.create_audio(text, opts).await?;
        self.play_audio(&path, opts.must_delete).await
    }
}
