//! Per-connection reassembly of the upstream event stream.
//!
//! The upstream interleaves three logical streams over one ordered event
//! sequence: response text, audio transcript, and audio. Each is a separate
//! accumulator with its own delta/done lifecycle; a response may emit audio
//! deltas and transcript deltas concurrently, so no kind-grouping is assumed.
//!
//! One [`StreamReassembler`] exists per connection and is owned exclusively
//! by that connection's event loop. Each event is handled to completion
//! before the next; the accumulators are never left partially updated.

use tracing::{debug, trace, warn};

use crate::config::DeltaEncoding;

use super::buffer::SampleBuffer;
use super::codec::{self, DecodeError};
use super::events::ServerEvent;

/// Sender label attached to assistant output.
pub const ASSISTANT_SENDER: &str = "assistant";

/// PCM format used to reconstruct audio clips.
///
/// Negotiated at session setup; the engine never hardcodes a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioParams {
    /// Samples per second
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            sample_rate: crate::config::DEFAULT_SAMPLE_RATE,
            channels: crate::config::DEFAULT_CHANNELS,
        }
    }
}

/// A finished audio response, wrapped in a self-describing WAV container.
///
/// Created only at the audio `done` transition and consumed once by the
/// playback sink.
#[derive(Debug)]
pub struct AudioClip {
    /// Complete WAV file bytes (44-byte header + PCM16 payload)
    pub wav: Vec<u8>,
    /// Sample rate the container was built with
    pub sample_rate: u32,
    /// Channel count the container was built with
    pub channels: u16,
}

impl AudioClip {
    /// Payload length in bytes (excluding the container header).
    pub fn payload_len(&self) -> usize {
        self.wav.len().saturating_sub(44)
    }

    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        let bytes_per_second = f64::from(self.sample_rate) * f64::from(self.channels) * 2.0;
        self.payload_len() as f64 / bytes_per_second
    }
}

/// Direction of a chat message, as rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Sent by the local user
    Sent,
    /// Received from the assistant (or system)
    Received,
}

/// Render surface the reassembler writes chat state into.
///
/// Implementations must reject empty/whitespace-only text silently rather
/// than creating blank entries.
pub trait RenderSink: Send {
    /// Append a complete message.
    fn append_message(&mut self, sender: &str, text: &str, kind: MessageKind);

    /// Replace the text of the most recent still-open received message, or
    /// append a new one if none is open.
    fn update_last_message(&mut self, text: &str);

    /// Record a finished audio response.
    fn append_audio_message(&mut self, sender: &str, clip: &AudioClip);

    /// Live update of the audio-transcript projection. Distinct from the
    /// text projection; default implementations may ignore it.
    fn update_transcript(&mut self, _text: &str) {}

    /// Mark the most recent received message as final.
    fn close_last_message(&mut self) {}
}

/// Playback surface that consumes finished clips.
///
/// Clips are not guaranteed to be disjoint in time: a new clip may arrive
/// while a previous one is still playing. Implementations release whatever
/// backs a clip exactly once, after playback ends or errors.
pub trait PlaybackSink: Send {
    /// Hand one clip to playback, consuming it.
    fn play(&mut self, clip: AudioClip);
}

/// Lifecycle of the text accumulator.
///
/// Only text needs stored phase: its `done` arm must know whether any delta
/// arrived. Transcript `done` emits whenever the final text is non-blank,
/// and audio `done` gates on the sample buffer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Accumulating,
}

/// Per-connection state machine over the upstream event stream.
pub struct StreamReassembler {
    encoding: DeltaEncoding,
    params: AudioParams,

    text: String,
    text_phase: Phase,

    transcript: String,

    audio: SampleBuffer,

    render: Box<dyn RenderSink>,
    playback: Box<dyn PlaybackSink>,
}

impl StreamReassembler {
    /// Create a reassembler for one connection.
    pub fn new(
        encoding: DeltaEncoding,
        params: AudioParams,
        render: Box<dyn RenderSink>,
        playback: Box<dyn PlaybackSink>,
    ) -> Self {
        Self {
            encoding,
            params,
            text: String::new(),
            text_phase: Phase::Idle,
            transcript: String::new(),
            audio: SampleBuffer::new(),
            render,
            playback,
        }
    }

    /// Handle one raw wire message.
    ///
    /// Malformed JSON drops the single message and the stream continues;
    /// per-message isolation, never fatal.
    pub fn handle_raw(&mut self, raw: &str) {
        match serde_json::from_str::<ServerEvent>(raw) {
            Ok(event) => self.handle_event(event),
            Err(e) => warn!(error = %e, "dropping malformed event message"),
        }
    }

    /// Handle one decoded event to completion.
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::TextDelta { delta } => {
                if let Some(delta) = delta.filter(|d| !d.is_empty()) {
                    self.text.push_str(&delta);
                    self.text_phase = Phase::Accumulating;
                    self.render.update_last_message(&self.text);
                }
            }

            ServerEvent::TextDone { text } => {
                if self.text_phase == Phase::Accumulating {
                    let final_text = text.unwrap_or_else(|| std::mem::take(&mut self.text));
                    if !final_text.trim().is_empty() {
                        self.render.update_last_message(&final_text);
                        self.render.close_last_message();
                    }
                }
                self.text.clear();
                self.text_phase = Phase::Idle;
            }

            // Clears the text accumulator unconditionally, whether or not a
            // response.text.done was seen.
            ServerEvent::ResponseDone { .. } => {
                debug!("response done");
                self.text.clear();
                self.text_phase = Phase::Idle;
            }

            ServerEvent::AudioTranscriptDelta { delta } => {
                if let Some(delta) = delta.filter(|d| !d.is_empty()) {
                    self.transcript.push_str(&delta);
                    self.render.update_transcript(&self.transcript);
                }
            }

            ServerEvent::AudioTranscriptDone { transcript } => {
                let final_text = transcript.unwrap_or_else(|| std::mem::take(&mut self.transcript));
                if !final_text.trim().is_empty() {
                    self.render
                        .append_message(ASSISTANT_SENDER, &final_text, MessageKind::Received);
                }
                self.transcript.clear();
            }

            ServerEvent::AudioDelta { delta } => {
                if let Some(delta) = delta.filter(|d| !d.is_empty()) {
                    match self.decode_fragment(&delta) {
                        Ok(samples) => self.audio.append(samples),
                        // One bad fragment does not abort the audio stream;
                        // the fragment is dropped and accumulation continues.
                        Err(e) => warn!(error = %e, "dropping corrupt audio fragment"),
                    }
                }
            }

            ServerEvent::AudioDone => {
                if !self.audio.is_empty() {
                    let samples = self.audio.merge_and_clear();
                    self.flush_audio(&samples);
                }
            }

            ServerEvent::Error { error } => {
                warn!(payload = %error, "upstream reported an error");
            }

            // Informational housekeeping; no state change.
            ServerEvent::SessionCreated { .. }
            | ServerEvent::SessionUpdated { .. }
            | ServerEvent::ResponseCreated { .. }
            | ServerEvent::RateLimitsUpdated { .. }
            | ServerEvent::ConversationItemCreated { .. }
            | ServerEvent::OutputItemAdded { .. }
            | ServerEvent::OutputItemDone { .. }
            | ServerEvent::ContentPartAdded { .. }
            | ServerEvent::ContentPartDone { .. } => {
                trace!("informational event");
            }

            ServerEvent::Unknown => {
                debug!("ignoring unrecognized event type");
            }
        }
    }

    /// Decode one base64 delta into float samples using the session encoding.
    fn decode_fragment(&self, delta: &str) -> Result<Vec<f32>, DecodeError> {
        let bytes = codec::decode_base64(delta)?;
        match self.encoding {
            DeltaEncoding::Pcm16 => Ok(codec::pcm16_to_f32(&codec::bytes_to_pcm16(&bytes)?)),
            DeltaEncoding::Float32 => codec::bytes_to_f32(&bytes),
        }
    }

    /// Build a WAV clip from merged samples and hand it to the sinks.
    fn flush_audio(&mut self, samples: &[f32]) {
        let pcm = codec::f32_to_pcm16(samples);
        match codec::encode_wav(&pcm, self.params.sample_rate, self.params.channels) {
            Ok(wav) => {
                let clip = AudioClip {
                    wav,
                    sample_rate: self.params.sample_rate,
                    channels: self.params.channels,
                };
                debug!(
                    duration_secs = clip.duration_secs(),
                    "audio response complete"
                );
                self.render.append_audio_message(ASSISTANT_SENDER, &clip);
                self.playback.play(clip);
            }
            Err(e) => warn!(error = %e, "failed to encode audio clip"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullRender;
    impl RenderSink for NullRender {
        fn append_message(&mut self, _: &str, _: &str, _: MessageKind) {}
        fn update_last_message(&mut self, _: &str) {}
        fn append_audio_message(&mut self, _: &str, _: &AudioClip) {}
    }

    struct CountingPlayback(std::sync::Arc<std::sync::atomic::AtomicUsize>);
    impl PlaybackSink for CountingPlayback {
        fn play(&mut self, _clip: AudioClip) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    fn reassembler(
        plays: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    ) -> StreamReassembler {
        StreamReassembler::new(
            DeltaEncoding::Pcm16,
            AudioParams::default(),
            Box::new(NullRender),
            Box::new(CountingPlayback(plays)),
        )
    }

    #[test]
    fn test_audio_done_without_deltas_produces_no_clip() {
        let plays = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut r = reassembler(plays.clone());
        r.handle_event(ServerEvent::AudioDone);
        assert_eq!(plays.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_corrupt_fragment_is_dropped_and_stream_continues() {
        let plays = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut r = reassembler(plays.clone());

        // Odd-length PCM16 payload: dropped
        r.handle_event(ServerEvent::AudioDelta {
            delta: Some(crate::client::codec::encode_base64(&[1, 2, 3])),
        });
        // Valid fragment still accumulates
        r.handle_event(ServerEvent::AudioDelta {
            delta: Some(crate::client::codec::encode_base64(&[0, 1, 0, 2])),
        });
        r.handle_event(ServerEvent::AudioDone);
        assert_eq!(plays.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_json_is_dropped() {
        let plays = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut r = reassembler(plays);
        r.handle_raw("{not json");
        r.handle_raw(r#"{"type":"response.text.delta","delta":"still alive"}"#);
    }

    #[test]
    fn test_audio_clip_duration() {
        let clip = AudioClip {
            wav: vec![0u8; 44 + 48_000],
            sample_rate: 24_000,
            channels: 1,
        };
        assert!((clip.duration_secs() - 1.0).abs() < f64::EPSILON);
    }
}
