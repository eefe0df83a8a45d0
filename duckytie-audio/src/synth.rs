//! Speech synthesis: text in, MP3 file out.
//!
//! The production provider talks to the Google Translate speech endpoint, the
//! same service the `gTTS` tool uses. Requests are limited to 100 characters,
//! so longer text is split into chunks whose MP3 bodies are concatenated.

use crate::config::SpeakerConfig;
use async_trait::async_trait;
use duckytie_core::{DuckytieError, Result, SpeechRequest};
use std::path::Path;
use tracing::{debug, info};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Boundaries preferred when splitting long text.
const PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '¡', '¿', '…', '。', '，', '、', '！', '？', '；', '：',
];

/// Turns a validated request into an MP3 file at `out`.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, request: &SpeechRequest, out: &Path) -> Result<()>;
}

pub struct GoogleTts {
    client: reqwest::Client,
    tld: String,
}

impl GoogleTts {
    pub const MAX_CHARS: usize = 100;

    pub fn new(cfg: &SpeakerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DuckytieError::Resource(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            tld: cfg.tld.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("https://translate.google.{}/translate_tts", self.tld)
    }

    fn build_request(
        &self,
        request: &SpeechRequest,
        chunk: &str,
        idx: usize,
        total: usize,
    ) -> reqwest::RequestBuilder {
        let speed = if request.slow() { "0.3" } else { "1" };
        self.client
            .get(self.endpoint())
            .header(
                reqwest::header::REFERER,
                format!("https://translate.google.{}/", self.tld),
            )
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", request.language()),
                ("ttsspeed", speed),
                ("q", chunk),
            ])
            .query(&[
                ("idx", idx),
                ("total", total),
                ("textlen", chunk.chars().count()),
            ])
    }
}

#[async_trait]
impl Synthesizer for GoogleTts {
    fn name(&self) -> &str {
        "google"
    }

    async fn synthesize(&self, request: &SpeechRequest, out: &Path) -> Result<()> {
        let chunks = split_text(request.text(), Self::MAX_CHARS);
        let total = chunks.len();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(target = "synth", idx, total, chars = chunk.chars().count(), "Requesting speech chunk");
            let resp = self
                .build_request(request, chunk, idx, total)
                .send()
                .await
                .map_err(|e| DuckytieError::Resource(format!("speech request failed: {e}")))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(DuckytieError::Resource(format!(
                    "speech service returned {status} for chunk {}/{total}",
                    idx + 1
                )));
            }
            let body = resp
                .bytes()
                .await
                .map_err(|e| DuckytieError::Resource(format!("failed to read speech audio: {e}")))?;
            audio.extend_from_slice(&body);
        }

        if audio.is_empty() {
            return Err(DuckytieError::Resource(
                "speech service returned no audio".into(),
            ));
        }

        tokio::fs::write(out, &audio).await?;
        info!(target = "synth", path = ?out, bytes = audio.len(), chunks = total, lang = request.language(), "Synthesized speech");
        Ok(())
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Whitespace is collapsed first. Cuts prefer punctuation, then spaces; a single
/// word longer than `max_chars` is cut on character boundaries.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }
    if normalized.chars().count() <= max_chars {
        return vec![normalized];
    }

    let mut pieces = Vec::new();
    for segment in normalized.split_inclusive(PUNCTUATION) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if segment.chars().count() <= max_chars {
            pieces.push(segment.to_string());
            continue;
        }
        for word in segment.split(' ') {
            if word.chars().count() <= max_chars {
                pieces.push(word.to_string());
            } else {
                let chars: Vec<char> = word.chars().collect();
                pieces.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            }
        }
    }

    // Greedily re-join small pieces so we send as few requests as possible.
    let mut chunks: Vec<String> = Vec::new();
    for piece in pieces {
        match chunks.last_mut() {
            Some(last) if last.chars().count() + 1 + piece.chars().count() <= max_chars => {
                last.push(' ');
                last.push_str(&piece);
            }
            _ => chunks.push(piece),
        }
    }
    chunks
}
