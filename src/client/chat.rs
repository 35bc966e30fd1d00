//! In-memory chat projection and a file-backed playback sink.

use std::path::PathBuf;

use tracing::{info, warn};
use uuid::Uuid;

use super::reassembly::{AudioClip, MessageKind, PlaybackSink, RenderSink};

/// One rendered chat entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who produced the message
    pub sender: String,
    /// Message text; empty for audio entries
    pub text: String,
    /// Direction
    pub kind: MessageKind,
    /// True while the message is still receiving live updates
    pub open: bool,
    /// True for audio entries
    pub audio: bool,
}

/// Ordered chat state written by the reassembler.
///
/// Blank text is rejected silently; no blank entries are ever created.
#[derive(Debug, Default)]
pub struct ChatStore {
    messages: Vec<ChatMessage>,
    /// Live transcript projection, independent of the message list
    live_transcript: String,
}

impl ChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The current live transcript text.
    pub fn live_transcript(&self) -> &str {
        &self.live_transcript
    }

    fn close_open(&mut self) {
        if let Some(last) = self.messages.last_mut() {
            last.open = false;
        }
    }
}

impl RenderSink for ChatStore {
    fn append_message(&mut self, sender: &str, text: &str, kind: MessageKind) {
        if text.trim().is_empty() {
            return;
        }
        self.close_open();
        self.messages.push(ChatMessage {
            sender: sender.to_string(),
            text: text.to_string(),
            kind,
            open: false,
            audio: false,
        });
        self.live_transcript.clear();
    }

    fn update_last_message(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        match self.messages.last_mut() {
            Some(last) if last.kind == MessageKind::Received && last.open => {
                last.text = text.to_string();
            }
            _ => self.messages.push(ChatMessage {
                sender: super::reassembly::ASSISTANT_SENDER.to_string(),
                text: text.to_string(),
                kind: MessageKind::Received,
                open: true,
                audio: false,
            }),
        }
    }

    fn append_audio_message(&mut self, sender: &str, clip: &AudioClip) {
        self.close_open();
        self.messages.push(ChatMessage {
            sender: sender.to_string(),
            text: format!("[audio {:.2}s]", clip.duration_secs()),
            kind: MessageKind::Received,
            open: false,
            audio: true,
        });
    }

    fn update_transcript(&mut self, text: &str) {
        self.live_transcript = text.to_string();
    }

    fn close_last_message(&mut self) {
        self.close_open();
    }
}

/// Playback sink that writes each clip to a uniquely named WAV file.
///
/// The terminal stand-in for in-browser playback: the clip is consumed
/// exactly once and its bytes are released when the write finishes.
#[derive(Debug)]
pub struct WavFileSink {
    dir: PathBuf,
}

impl WavFileSink {
    /// Create a sink writing into `dir`; the directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PlaybackSink for WavFileSink {
    fn play(&mut self, clip: AudioClip) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(error = %e, dir = %self.dir.display(), "failed to create clip directory");
            return;
        }
        let path = self.dir.join(format!("clip-{}.wav", Uuid::new_v4()));
        match std::fs::write(&path, &clip.wav) {
            Ok(()) => info!(
                path = %path.display(),
                duration_secs = clip.duration_secs(),
                "wrote audio clip"
            ),
            Err(e) => warn!(error = %e, path = %path.display(), "failed to write audio clip"),
        }
    }
}
