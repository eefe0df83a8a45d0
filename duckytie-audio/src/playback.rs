//! Playback: load an audio file into an output device, play it to completion,
//! and report how long it took.
//!
//! Completion is detected by polling `is_playing` at a fixed interval. The
//! device is held through a guard so `shutdown_device` runs on every exit path.

use crate::config::SpeakerConfig;
use crate::utils::{get_from_path, program_name};
use duckytie_core::{AudioFormat, DuckytieError, PlatformProfile, PlaybackResult, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// An audio output device.
#[cfg_attr(test, mockall::automock)]
pub trait AudioBackend: Send {
    fn init_device(&mut self) -> Result<()>;
    fn load_file(&mut self, path: &Path) -> Result<()>;
    fn start_playback(&mut self) -> Result<()>;
    fn is_playing(&mut self) -> Result<bool>;
    /// Must tolerate being called on a device that was never (fully) initialized.
    fn shutdown_device(&mut self);
}

/// Players tried, in order, after any configured preference.
const PLAYERS: &[&str] = &["ffplay", "mpv", "mpg123", "ogg123", "paplay", "afplay"];

#[derive(Clone, Debug, Default)]
pub struct PlayerOptions {
    pub preferred: Option<String>,
    pub quiet: bool,
}

impl From<&SpeakerConfig> for PlayerOptions {
    fn from(cfg: &SpeakerConfig) -> Self {
        Self {
            preferred: cfg.player.clone(),
            quiet: cfg.quiet,
        }
    }
}

/// Plays files through an external command-line player.
pub struct ProcessBackend {
    opts: PlayerOptions,
    available: Vec<PathBuf>,
    loaded: Option<(PathBuf, PathBuf)>,
    child: Option<Child>,
}

impl ProcessBackend {
    pub fn new(opts: PlayerOptions) -> Self {
        Self {
            opts,
            available: Vec::new(),
            loaded: None,
            child: None,
        }
    }
}

fn supports(player: &str, format: AudioFormat) -> bool {
    match player {
        "mpg123" => format == AudioFormat::Mp3,
        "ogg123" | "paplay" => format == AudioFormat::Ogg,
        _ => true,
    }
}

fn player_command(player_bin: &Path, file: &Path, quiet: bool) -> Command {
    let mut cmd = Command::new(player_bin);
    match program_name(player_bin) {
        "ffplay" => {
            cmd.arg("-nodisp").arg("-autoexit");
            if quiet {
                cmd.arg("-hide_banner").arg("-loglevel").arg("quiet");
            }
        }
        "mpv" => {
            cmd.arg("--no-video");
            if quiet {
                cmd.arg("--really-quiet");
            }
        }
        "mpg123" | "ogg123" => {
            if quiet {
                cmd.arg("-q");
            }
        }
        _ => {}
    }
    cmd.arg(file);
    cmd.stdin(Stdio::null());
    if quiet {
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
    }
    cmd
}

impl AudioBackend for ProcessBackend {
    fn init_device(&mut self) -> Result<()> {
        self.shutdown_device();
        let preferred = self.opts.preferred.as_deref().and_then(|p| {
            let found = get_from_path(p);
            if found.is_none() {
                warn!(target = "playback", player = p, "Preferred player not found; falling back");
            }
            found
        });
        for bin in preferred.into_iter().chain(PLAYERS.iter().filter_map(|p| get_from_path(p))) {
            if !self.available.contains(&bin) {
                self.available.push(bin);
            }
        }
        if self.available.is_empty() {
            return Err(DuckytieError::Resource(format!(
                "no audio player found; install one of {} or set DUCKYTIE_PLAYER",
                PLAYERS.join(", ")
            )));
        }
        debug!(target = "playback", players = ?self.available, "Audio device ready");
        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        if self.available.is_empty() {
            return Err(DuckytieError::Resource(
                "audio device is not initialized".into(),
            ));
        }
        if !path.is_file() {
            return Err(DuckytieError::Resource(format!(
                "failed to load {}: no such file",
                path.display()
            )));
        }
        let format = AudioFormat::of_path(path);
        let player = self
            .available
            .iter()
            .find(|bin| format.map_or(true, |f| supports(program_name(bin), f)))
            .cloned()
            .ok_or_else(|| {
                DuckytieError::Resource(format!("no installed player can play {}", path.display()))
            })?;
        self.loaded = Some((player, path.to_path_buf()));
        Ok(())
    }

    fn start_playback(&mut self) -> Result<()> {
        let (player, file) = self
            .loaded
            .as_ref()
            .ok_or_else(|| DuckytieError::Resource("no audio file loaded".into()))?;
        let mut cmd = player_command(player, file, self.opts.quiet);
        debug!(target = "playback", command = ?cmd, "Starting player");
        let child = cmd.spawn().map_err(|e| {
            DuckytieError::Resource(format!("failed to start {}: {e}", player.display()))
        })?;
        self.child = Some(child);
        Ok(())
    }

    fn is_playing(&mut self) -> Result<bool> {
        let Some(child) = self.child.as_mut() else {
            return Ok(false);
        };
        match child.try_wait() {
            Ok(None) => Ok(true),
            Ok(Some(status)) => {
                self.child = None;
                if status.success() {
                    Ok(false)
                } else {
                    Err(DuckytieError::Resource(format!(
                        "audio player exited with {status}"
                    )))
                }
            }
            Err(e) => Err(DuckytieError::Resource(format!(
                "failed to query audio player: {e}"
            ))),
        }
    }

    fn shutdown_device(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                if let Err(e) = child.kill() {
                    warn!(target = "playback", error = %e, "Failed to stop audio player");
                }
            }
            let _ = child.wait();
        }
        self.loaded = None;
        self.available.clear();
    }
}

impl Drop for ProcessBackend {
    fn drop(&mut self) {
        self.shutdown_device();
    }
}

/// Releases the device when dropped, whichever way `play` returns.
struct DeviceGuard<'a> {
    backend: &'a mut dyn AudioBackend,
}

impl<'a> DeviceGuard<'a> {
    fn new(backend: &'a mut dyn AudioBackend) -> Self {
        Self { backend }
    }
}

impl Drop for DeviceGuard<'_> {
    fn drop(&mut self) {
        self.backend.shutdown_device();
        debug!(target = "playback", "Audio device released");
    }
}

pub struct PlaybackEngine {
    profile: PlatformProfile,
    backend: Box<dyn AudioBackend>,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl PlaybackEngine {
    pub fn new(profile: PlatformProfile, backend: Box<dyn AudioBackend>) -> Self {
        Self {
            profile,
            backend,
            poll_interval: Duration::from_millis(250),
            max_wait: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.poll_interval = interval;
        }
        self
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Play `path` to completion; returns the accumulated poll time.
    pub async fn play(&mut self, path: &Path) -> Result<PlaybackResult> {
        self.profile.check_extension(path)?;

        let mut device = DeviceGuard::new(self.backend.as_mut());
        device.backend.init_device()?;
        device.backend.load_file(path)?;
        device.backend.start_playback()?;
        debug!(target = "playback", path = ?path, "Playback started");

        let mut elapsed = Duration::ZERO;
        while device.backend.is_playing()? {
            if let Some(max) = self.max_wait {
                if elapsed >= max {
                    warn!(target = "playback", path = ?path, max_wait = ?max, "Playback exceeded max wait");
                    return Err(DuckytieError::PlaybackTimeout(max));
                }
            }
            tokio::time::sleep(self.poll_interval).await;
            elapsed += self.poll_interval;
        }
        drop(device);

        info!(
            target = "playback",
            path = ?path,
            seconds = elapsed.as_secs_f64(),
            "Audio file played for {} seconds",
            elapsed.as_secs_f64()
        );
        Ok(PlaybackResult { elapsed })
    }
}
