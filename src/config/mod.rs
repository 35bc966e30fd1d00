//! Configuration for the voxrelay server and client.
//!
//! Configuration is read from environment variables, with a `.env` file loaded
//! first by `main` via dotenvy. Priority: process environment > .env values >
//! defaults.
//!
//! # Environment variables
//!
//! - `HOST` / `PORT` — listen address (defaults `127.0.0.1:3000`)
//! - `UPSTREAM_URL` — upstream realtime WebSocket endpoint
//! - `UPSTREAM_MODEL` — model appended as a `?model=` query parameter
//! - `OPENAI_API_KEY` — bearer credential for the upstream handshake
//! - `AUDIO_DELTA_ENCODING` — `pcm16` (default) or `float32`
//! - `AUDIO_SAMPLE_RATE` / `AUDIO_CHANNELS` — PCM format for reassembled clips
//! - `CLIP_DIR` — directory where the chat client writes decoded WAV clips
//!
//! # Example
//! ```rust,no_run
//! use voxrelay::config::RelayConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelayConfig::from_env()?;
//! println!("listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Default upstream realtime endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default upstream model.
pub const DEFAULT_UPSTREAM_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// Default sample rate for reassembled audio (the upstream provider's
/// published PCM16 output format).
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Default channel count for reassembled audio.
pub const DEFAULT_CHANNELS: u16 = 1;

/// Encoding of the base64 payload carried by `response.audio.delta` events.
///
/// The upstream protocol has shipped two incompatible variants; which one a
/// session uses is fixed at session setup, never sniffed per fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaEncoding {
    /// Little-endian signed 16-bit PCM samples (the current wire default)
    #[default]
    Pcm16,
    /// Little-endian IEEE 754 32-bit float samples
    Float32,
}

impl FromStr for DeltaEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pcm16" => Ok(DeltaEncoding::Pcm16),
            "float32" | "f32" => Ok(DeltaEncoding::Float32),
            _ => Err(ConfigError::InvalidValue {
                name: "AUDIO_DELTA_ENCODING",
                value: s.to_string(),
            }),
        }
    }
}

/// Server and client configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Upstream realtime WebSocket endpoint (without query parameters)
    pub upstream_url: String,
    /// Model requested from the upstream endpoint
    pub upstream_model: String,
    /// Bearer credential for the upstream handshake; required to serve
    pub api_key: Option<String>,
    /// Encoding of audio delta payloads for this session
    pub delta_encoding: DeltaEncoding,
    /// Sample rate used to reconstruct audio clips
    pub sample_rate: u32,
    /// Channel count used to reconstruct audio clips
    pub channels: u16,
    /// Directory where the chat client writes decoded WAV clips
    pub clip_dir: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_model: DEFAULT_UPSTREAM_MODEL.to_string(),
            api_key: None,
            delta_encoding: DeltaEncoding::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            clip_dir: PathBuf::from("clips"),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = match env::var("PORT") {
            Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: v,
            })?,
            Err(_) => defaults.port,
        };

        let upstream_url = env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url);
        validate_ws_url(&upstream_url)?;

        let upstream_model = env::var("UPSTREAM_MODEL").unwrap_or(defaults.upstream_model);
        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        let delta_encoding = match env::var("AUDIO_DELTA_ENCODING") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.delta_encoding,
        };

        // Zero would divide to a non-finite clip duration downstream.
        let sample_rate = match env::var("AUDIO_SAMPLE_RATE") {
            Ok(v) => v
                .parse()
                .ok()
                .filter(|&rate: &u32| rate > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "AUDIO_SAMPLE_RATE",
                    value: v,
                })?,
            Err(_) => defaults.sample_rate,
        };

        let channels = match env::var("AUDIO_CHANNELS") {
            Ok(v) => v
                .parse()
                .ok()
                .filter(|&ch: &u16| ch > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "AUDIO_CHANNELS",
                    value: v,
                })?,
            Err(_) => defaults.channels,
        };

        let clip_dir = env::var("CLIP_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.clip_dir);

        Ok(Self {
            host,
            port,
            upstream_url,
            upstream_model,
            api_key,
            delta_encoding,
            sample_rate,
            channels,
            clip_dir,
        })
    }

    /// The listen address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The full upstream URL including the model query parameter.
    pub fn upstream_request_url(&self) -> String {
        format!("{}?model={}", self.upstream_url, self.upstream_model)
    }
}

/// Validate that a URL parses and uses a WebSocket scheme.
fn validate_ws_url(raw: &str) -> Result<(), ConfigError> {
    let parsed =
        url::Url::parse(raw).map_err(|_| ConfigError::InvalidUpstreamUrl(raw.to_string()))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        _ => Err(ConfigError::InvalidUpstreamUrl(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.address(), "127.0.0.1:3000");
        assert_eq!(config.sample_rate, 24_000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.delta_encoding, DeltaEncoding::Pcm16);
    }

    #[test]
    fn test_upstream_request_url() {
        let config = RelayConfig {
            upstream_url: "wss://example.com/v1/realtime".to_string(),
            upstream_model: "test-model".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.upstream_request_url(),
            "wss://example.com/v1/realtime?model=test-model"
        );
    }

    #[test]
    fn test_delta_encoding_parse() {
        assert_eq!("pcm16".parse::<DeltaEncoding>().unwrap(), DeltaEncoding::Pcm16);
        assert_eq!("PCM16".parse::<DeltaEncoding>().unwrap(), DeltaEncoding::Pcm16);
        assert_eq!(
            "float32".parse::<DeltaEncoding>().unwrap(),
            DeltaEncoding::Float32
        );
        assert!("mp3".parse::<DeltaEncoding>().is_err());
    }

    #[test]
    fn test_zero_audio_params_rejected() {
        unsafe { env::set_var("AUDIO_SAMPLE_RATE", "0") };
        assert!(matches!(
            RelayConfig::from_env(),
            Err(ConfigError::InvalidValue {
                name: "AUDIO_SAMPLE_RATE",
                ..
            })
        ));

        unsafe { env::set_var("AUDIO_SAMPLE_RATE", "24000") };
        unsafe { env::set_var("AUDIO_CHANNELS", "0") };
        assert!(matches!(
            RelayConfig::from_env(),
            Err(ConfigError::InvalidValue {
                name: "AUDIO_CHANNELS",
                ..
            })
        ));

        unsafe { env::remove_var("AUDIO_SAMPLE_RATE") };
        unsafe { env::remove_var("AUDIO_CHANNELS") };
    }

    #[test]
    fn test_ws_url_validation() {
        assert!(validate_ws_url("wss://api.openai.com/v1/realtime").is_ok());
        assert!(validate_ws_url("ws://127.0.0.1:9000").is_ok());
        assert!(validate_ws_url("https://api.openai.com").is_err());
        assert!(validate_ws_url("not a url").is_err());
    }
}
