//! Client-side engine for the upstream event stream.
//!
//! Consumes the tagged event stream and produces three independent,
//! incrementally updated projections: live response text, live audio
//! transcript, and decoded PCM audio wrapped as playable WAV clips.
//!
//! # Modules
//!
//! - [`codec`] - base64 / PCM16 / float32 / WAV transcoding, pure functions
//! - [`buffer`] - ordered accumulation of decoded audio fragments
//! - [`events`] - wire event types (tolerant server enum, outbound commands)
//! - [`reassembly`] - per-connection state machine and sink traits
//! - [`chat`] - in-memory chat projection and file-backed playback
//! - [`session`] - live connection feeding one reassembler

pub mod buffer;
pub mod chat;
pub mod codec;
pub mod events;
pub mod reassembly;
pub mod session;

pub use buffer::SampleBuffer;
pub use chat::{ChatMessage, ChatStore, WavFileSink};
pub use events::{ClientEvent, ServerEvent};
pub use reassembly::{
    AudioClip, AudioParams, MessageKind, PlaybackSink, RenderSink, StreamReassembler,
};
pub use session::ChatClient;
