//! Bidirectional WebSocket relay between a browser-facing socket and the
//! upstream realtime endpoint.

mod handler;
pub mod upstream;

pub use handler::relay_handler;
