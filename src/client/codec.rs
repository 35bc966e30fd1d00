//! Binary transcoding between the wire's base64 payloads, PCM sample
//! representations, and the WAV container handed to playback.
//!
//! All functions are pure and stateless. Sample conversion follows the
//! standard asymmetric PCM convention: float-to-int scales positive values by
//! 32767 and negative values by 32768, int-to-float divides by 32768.0 so the
//! int16 domain maps to approximately [-1.0, 1.0).

use std::io::Cursor;

use base64::prelude::*;
use thiserror::Error;

/// Errors produced while decoding or transcoding audio payloads.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The base64 payload uses an invalid alphabet or padding
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A PCM16 byte buffer has an odd length
    #[error("PCM16 buffer has odd byte length {0}")]
    OddLength(usize),

    /// A float32 byte buffer length is not a multiple of four
    #[error("float32 buffer length {0} is not a multiple of 4")]
    FloatLength(usize),

    /// A delta fragment could not be decoded with the session's encoding
    #[error("corrupt audio fragment: {0}")]
    CorruptFragment(String),

    /// WAV container encoding failed
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
}

/// Decode a standard base64 string into raw bytes.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(BASE64_STANDARD.decode(text)?)
}

/// Encode raw bytes as a standard base64 string.
pub fn encode_base64(data: &[u8]) -> String {
    BASE64_STANDARD.encode(data)
}

/// Reinterpret a byte buffer as little-endian signed 16-bit samples.
pub fn bytes_to_pcm16(bytes: &[u8]) -> Result<Vec<i16>, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Reinterpret a byte buffer as little-endian 32-bit float samples.
pub fn bytes_to_f32(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::FloatLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|quad| f32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]))
        .collect())
}

/// Convert signed 16-bit samples to floats in approximately [-1.0, 1.0).
pub fn pcm16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| f32::from(s) / 32768.0).collect()
}

/// Convert float samples to little-endian PCM16 bytes.
///
/// Values are clamped to [-1.0, 1.0] before scaling.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let s = sample.clamp(-1.0, 1.0);
        let value = if s < 0.0 { s * 32768.0 } else { s * 32767.0 } as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Wrap raw PCM16 bytes in a canonical WAV container.
///
/// The output is a 44-byte RIFF/WAVE header (fmt chunk length 16, PCM format
/// tag 1, 16 bits per sample) followed by the payload; the data chunk length
/// equals the payload length exactly.
pub fn encode_wav(pcm16: &[u8], sample_rate: u32, channels: u16) -> Result<Vec<u8>, DecodeError> {
    let samples = bytes_to_pcm16(pcm16)?;

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}
