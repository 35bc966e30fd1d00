//! voxrelay: a WebSocket relay for realtime voice and text sessions, plus a
//! client-side stream reassembler that turns tagged delta events back into
//! chat messages, live transcripts, and playable audio clips.

pub mod client;
pub mod config;
pub mod errors;
pub mod relay;
pub mod routes;
pub mod state;

pub use config::RelayConfig;
pub use errors::{RelayError, RelayResult};
pub use state::AppState;
