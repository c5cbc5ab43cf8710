//! Audio file decoding for track sources.
//!
//! Container detection is by magic bytes, not by URL extension: generated
//! clips are frequently served with opaque names.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::buffer::AudioBuffer;

/// Decoding failure, before it is tied to a URL.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    UnknownFormat,
    Malformed(String),
    Empty,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnknownFormat => write!(f, "unrecognised audio container"),
            DecodeError::Malformed(reason) => write!(f, "{reason}"),
            DecodeError::Empty => write!(f, "no audio frames"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a complete WAV or MP3 file held in memory.
pub fn decode_audio(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return decode_wav(bytes);
    }
    if looks_like_mp3(bytes) {
        return decode_mp3(bytes);
    }
    Err(DecodeError::UnknownFormat)
}

fn looks_like_mp3(bytes: &[u8]) -> bool {
    bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
}

fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| DecodeError::Malformed(format!("{e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| DecodeError::Malformed(format!("{e}")))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| DecodeError::Malformed(format!("{e}")))?
        }
    };

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }
    AudioBuffer::from_interleaved(samples, spec.channels, spec.sample_rate)
        .ok_or_else(|| DecodeError::Malformed("inconsistent WAV header".to_string()))
}

#[cfg(feature = "mp3")]
fn decode_mp3(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut pcm: Vec<i16> = Vec::new();
    let mut format: Option<(u16, u32)> = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                let frame_format = (frame.channels as u16, frame.sample_rate as u32);
                // Streams that change layout mid-file are cut at the change.
                match format {
                    None => format = Some(frame_format),
                    Some(f) if f != frame_format => break,
                    Some(_) => {}
                }
                pcm.extend_from_slice(&frame.data);
            }
            Err(minimp3::Error::Eof) | Err(minimp3::Error::InsufficientData) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => return Err(DecodeError::Malformed(format!("{e:?}"))),
        }
    }

    let (channels, sample_rate) = format.ok_or(DecodeError::Empty)?;
    AudioBuffer::from_i16(&pcm, channels, sample_rate)
        .ok_or_else(|| DecodeError::Malformed("inconsistent MP3 frames".to_string()))
}

#[cfg(not(feature = "mp3"))]
fn decode_mp3(_bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    Err(DecodeError::Malformed("MP3 support not enabled in this build".to_string()))
}

/// Extract the payload of a base64 `data:` URL.
///
/// Returns `None` when the URL is not a base64 data URL.
pub fn data_url_bytes(url: &str) -> Option<Result<Vec<u8>, DecodeError>> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    Some(
        STANDARD
            .decode(payload.trim())
            .map_err(|e| DecodeError::Malformed(format!("bad base64: {e}"))),
    )
}
