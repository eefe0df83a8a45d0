//! Duckytie audio pipeline.
//!
//! Turns text into speech and plays it, one blocking call at a time:
//! - synthesize an MP3 with a speech provider ([`Synthesizer`])
//! - convert it to the container this host plays ([`FormatAdapter`])
//! - play it to completion, polling for the end ([`PlaybackEngine`])
//! - delete the file unless the caller keeps it ([`LifecycleCleaner`])
//!
//! [`Speaker`] wires the four stages together.

pub mod adapter;
pub mod cleaner;
pub mod config;
pub mod playback;
pub mod speaker;
pub mod synth;

// Shared helpers (crate-visible only)
pub(crate) mod utils;

pub use adapter::{FfmpegTranscoder, FormatAdapter, Transcoder};
pub use cleaner::LifecycleCleaner;
pub use config::SpeakerConfig;
pub use playback::{AudioBackend, PlaybackEngine, PlayerOptions, ProcessBackend};
pub use speaker::{SayOptions, Speaker};
pub use synth::{split_text, GoogleTts, Synthesizer};
