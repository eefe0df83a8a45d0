//! Integration tests for the full say pipeline with fake collaborators
//!
//! The synthesizer writes a stub MP3, the transcoder copies bytes, and the
//! backend pretends to play for a fixed number of polls. Tokio's paused clock
//! keeps the poll loop instant.

use async_trait::async_trait;
use duckytie_audio::{
    AudioBackend, FfmpegTranscoder, FormatAdapter, LifecycleCleaner, SayOptions, Speaker,
    SpeakerConfig, Synthesizer, Transcoder,
};
use duckytie_core::{
    supported_languages, AudioFormat, AudioResource, DuckytieError, PlatformProfile, Result,
    SpeechRequest,
};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct FakeSynth {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl Synthesizer for FakeSynth {
    fn name(&self) -> &str {
        "fake"
    }

    async fn synthesize(&self, request: &SpeechRequest, out: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DuckytieError::Resource("provider unreachable".into()));
        }
        let body = format!("ID3 {} {} {}", request.language(), request.slow(), request.text());
        tokio::fs::write(out, body).await?;
        Ok(())
    }
}

#[derive(Default)]
struct CopyTranscoder {
    fail: bool,
}

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn transcode(&self, src: &Path, dst: &Path, _format: AudioFormat) -> Result<()> {
        if self.fail {
            tokio::fs::write(dst, b"partial").await?;
            return Err(DuckytieError::Resource("encoder crashed".into()));
        }
        tokio::fs::copy(src, dst).await?;
        Ok(())
    }
}

#[derive(Default)]
struct Counters {
    shutdowns: AtomicUsize,
    loads: AtomicUsize,
}

struct FakeBackend {
    polls: usize,
    remaining: usize,
    fail_start: bool,
    loaded: Option<PathBuf>,
    counters: Arc<Counters>,
}

impl FakeBackend {
    fn new(polls: usize, counters: Arc<Counters>) -> Self {
        Self {
            polls,
            remaining: 0,
            fail_start: false,
            loaded: None,
            counters,
        }
    }
}

impl AudioBackend for FakeBackend {
    fn init_device(&mut self) -> Result<()> {
        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(DuckytieError::Resource(format!("cannot load {}", path.display())));
        }
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        self.loaded = Some(path.to_path_buf());
        Ok(())
    }

    fn start_playback(&mut self) -> Result<()> {
        if self.loaded.is_none() {
            return Err(DuckytieError::Resource("nothing loaded".into()));
        }
        if self.fail_start {
            return Err(DuckytieError::Resource("device busy".into()));
        }
        self.remaining = self.polls;
        Ok(())
    }

    fn is_playing(&mut self) -> Result<bool> {
        if self.remaining == 0 {
            return Ok(false);
        }
        self.remaining -= 1;
        Ok(true)
    }

    fn shutdown_device(&mut self) {
        self.loaded = None;
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    dir: TempDir,
    synth: Arc<FakeSynth>,
    counters: Arc<Counters>,
    speaker: Speaker,
}

fn harness(
    format: AudioFormat,
    synth: FakeSynth,
    transcoder: CopyTranscoder,
    backend: impl FnOnce(Arc<Counters>) -> FakeBackend,
) -> Harness {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cfg = SpeakerConfig {
        output_dir: dir.path().to_path_buf(),
        required_format: Some(format),
        poll_interval: Duration::from_millis(250),
        max_wait: None,
        ..SpeakerConfig::default()
    };
    let synth = Arc::new(synth);
    let counters = Arc::new(Counters::default());
    let speaker = Speaker::with_parts(
        &cfg,
        synth.clone(),
        Arc::new(transcoder),
        Box::new(backend(counters.clone())),
    );
    Harness {
        dir,
        synth,
        counters,
        speaker,
    }
}

fn simple(format: AudioFormat) -> Harness {
    harness(format, FakeSynth::default(), CopyTranscoder::default(), |c| {
        FakeBackend::new(3, c)
    })
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn keep(name: &str) -> SayOptions {
    SayOptions {
        audio_filename: name.to_string(),
        must_delete: false,
        ..SayOptions::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_say_keeps_mp3_on_mp3_platform() {
    let mut h = simple(AudioFormat::Mp3);

    let result = h.speaker.say("hello", &keep("greet")).await.unwrap();

    assert_eq!(result.elapsed, Duration::from_millis(750));
    assert!(result.elapsed_seconds() >= 0.0);
    assert_eq!(files_in(h.dir.path()), vec!["greet.mp3"]);
    assert_eq!(h.counters.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_say_keeps_single_ogg_on_ogg_platform() {
    let mut h = simple(AudioFormat::Ogg);

    h.speaker.say("hello", &keep("greet")).await.unwrap();

    assert_eq!(files_in(h.dir.path()), vec!["greet.ogg"]);
    let content = std::fs::read_to_string(h.dir.path().join("greet.ogg")).unwrap();
    assert_eq!(content, "ID3 en false hello");
}

#[tokio::test(start_paused = true)]
async fn test_say_leaves_nothing_when_deleting() {
    for format in [AudioFormat::Mp3, AudioFormat::Ogg] {
        for name in ["temp", "greet", "my_clip"] {
            let mut h = simple(format);
            let opts = SayOptions {
                audio_filename: name.to_string(),
                ..SayOptions::default()
            };
            h.speaker.say("hello there", &opts).await.unwrap();
            assert!(files_in(h.dir.path()).is_empty(), "{format} {name}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_language_and_speed_reach_the_synthesizer() {
    let mut h = simple(AudioFormat::Mp3);
    let opts = SayOptions {
        language: "fr".into(),
        slow: true,
        must_delete: false,
        ..SayOptions::default()
    };

    h.speaker.say("bonjour", &opts).await.unwrap();

    let content = std::fs::read_to_string(h.dir.path().join("temp.mp3")).unwrap();
    assert_eq!(content, "ID3 fr true bonjour");
}

#[tokio::test]
async fn test_unknown_language_fails_before_io() {
    let mut h = simple(AudioFormat::Ogg);
    let opts = SayOptions {
        language: "xx".into(),
        ..SayOptions::default()
    };

    let err = h.speaker.say("hello", &opts).await.unwrap_err();

    assert!(matches!(err, DuckytieError::Validation(_)));
    assert_eq!(h.synth.calls.load(Ordering::SeqCst), 0);
    assert!(files_in(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_filename_with_extension_fails_before_io() {
    let mut h = simple(AudioFormat::Ogg);

    for name in ["temp.mp3", "temp.ogg", "archive.v2"] {
        let err = h.speaker.say("hello", &keep(name)).await.unwrap_err();
        assert!(matches!(err, DuckytieError::Validation(_)), "{name}");
    }
    assert_eq!(h.synth.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.counters.loads.load(Ordering::SeqCst), 0);
    assert!(files_in(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_blank_text_is_rejected() {
    let mut h = simple(AudioFormat::Mp3);
    let err = h.speaker.say("   ", &SayOptions::default()).await.unwrap_err();
    assert!(matches!(err, DuckytieError::Validation(_)));
    assert_eq!(h.synth.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_synthesis_failure_propagates() {
    let mut h = harness(
        AudioFormat::Ogg,
        FakeSynth {
            fail: true,
            ..FakeSynth::default()
        },
        CopyTranscoder::default(),
        |c| FakeBackend::new(1, c),
    );

    let err = h.speaker.say("hello", &SayOptions::default()).await.unwrap_err();

    assert!(matches!(err, DuckytieError::Resource(_)));
    assert_eq!(h.counters.loads.load(Ordering::SeqCst), 0);
    assert!(files_in(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_adaptation_failure_removes_both_files() {
    let mut h = harness(
        AudioFormat::Ogg,
        FakeSynth::default(),
        CopyTranscoder { fail: true },
        |c| FakeBackend::new(1, c),
    );

    let err = h.speaker.say("hello", &keep("greet")).await.unwrap_err();

    assert!(matches!(err, DuckytieError::Resource(ref m) if m.contains("encoder")));
    assert!(files_in(h.dir.path()).is_empty());
    assert_eq!(h.counters.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_playback_failure_applies_delete_policy() {
    let failing = |c| FakeBackend {
        fail_start: true,
        ..FakeBackend::new(1, c)
    };

    let mut h = harness(
        AudioFormat::Ogg,
        FakeSynth::default(),
        CopyTranscoder::default(),
        failing,
    );
    let err = h.speaker.say("hello", &SayOptions::default()).await.unwrap_err();
    assert!(matches!(err, DuckytieError::Resource(_)));
    assert!(files_in(h.dir.path()).is_empty());
    assert_eq!(h.counters.shutdowns.load(Ordering::SeqCst), 1);

    let mut h = harness(
        AudioFormat::Ogg,
        FakeSynth::default(),
        CopyTranscoder::default(),
        failing,
    );
    assert!(h.speaker.say("hello", &keep("greet")).await.is_err());
    assert_eq!(files_in(h.dir.path()), vec!["greet.ogg"]);
}

#[tokio::test(start_paused = true)]
async fn test_create_then_play_then_cleanup_twice() {
    let mut h = simple(AudioFormat::Ogg);

    let path = h.speaker.create_audio("hello", &keep("clip")).await.unwrap();
    assert_eq!(path, h.dir.path().join("clip.ogg"));
    assert!(path.exists());

    h.speaker.play_audio(&path, false).await.unwrap();
    assert!(path.exists());

    let cleaner = LifecycleCleaner::new(h.speaker.profile());
    cleaner.cleanup(&path, true).await.unwrap();
    let err = cleaner.cleanup(&path, true).await.unwrap_err();
    assert!(matches!(err, DuckytieError::MissingFile(_)));
}

#[tokio::test]
async fn test_play_audio_rejects_foreign_format_without_deleting() {
    let mut h = simple(AudioFormat::Ogg);
    let mp3 = h.dir.path().join("windows.mp3");
    std::fs::write(&mp3, b"ID3").unwrap();

    let err = h.speaker.play_audio(&mp3, true).await.unwrap_err();

    assert!(matches!(err, DuckytieError::PlatformMismatch(_)));
    assert!(mp3.exists());
    assert_eq!(h.counters.shutdowns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_supported_language_produces_an_mp3() {
    let h = simple(AudioFormat::Mp3);

    for lang in supported_languages() {
        let opts = SayOptions {
            audio_filename: format!("clip_{}", lang.code.replace('-', "_")),
            language: lang.code.to_string(),
            ..SayOptions::default()
        };
        let path = h.speaker.create_audio("hello", &opts).await.unwrap();
        assert_eq!(path, h.dir.path().join(format!("{}.mp3", opts.audio_filename)));
        assert!(path.exists(), "{}", lang.code);
    }
    assert_eq!(
        h.synth.calls.load(Ordering::SeqCst),
        supported_languages().len()
    );
    assert_eq!(files_in(h.dir.path()).len(), supported_languages().len());
}

/// True when `ffmpeg` and `ffprobe` run and ffmpeg has both encoders we need.
fn ffmpeg_available() -> bool {
    let probe_ok = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    let encoders = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).into_owned())
        .unwrap_or_default();
    probe_ok && encoders.contains("libmp3lame") && encoders.contains("libvorbis")
}

fn duration_secs(path: &Path) -> f64 {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .expect("ffprobe failed to run");
    String::from_utf8_lossy(&out.stdout)
        .trim()
        .parse()
        .expect("ffprobe printed no duration")
}

#[tokio::test]
async fn test_ffmpeg_adaptation_keeps_duration_and_removes_mp3() {
    if !ffmpeg_available() {
        eprintln!("skipping: ffmpeg/ffprobe with libmp3lame and libvorbis not available");
        return;
    }
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = AudioResource::new(dir.path(), "tone").unwrap();
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg("sine=frequency=440:duration=2")
        .args(["-c:a", "libmp3lame"])
        .arg(source.path())
        .status()
        .unwrap();
    assert!(status.success());
    let source_secs = duration_secs(&source.path());

    let cfg = SpeakerConfig {
        ffmpeg_bin: None,
        quiet: true,
        ..SpeakerConfig::default()
    };
    let adapter = FormatAdapter::new(
        PlatformProfile::new(AudioFormat::Ogg),
        Arc::new(FfmpegTranscoder::new(&cfg)),
    );
    let adapted = adapter.adapt(&source).await.unwrap();

    assert_eq!(adapted.format(), AudioFormat::Ogg);
    assert_eq!(adapted.path(), dir.path().join("tone.ogg"));
    assert!(!source.path().exists());
    assert_eq!(files_in(dir.path()), vec!["tone.ogg"]);
    let adapted_secs = duration_secs(&adapted.path());
    assert!(
        (adapted_secs - source_secs).abs() < 0.1,
        "mp3 {source_secs}s vs ogg {adapted_secs}s"
    );
}
