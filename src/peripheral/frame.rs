// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire frames exchanged with the wearable.
//!
//! Every characteristic value is a JSON object encoded as base64 text.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty payload")]
    Empty,
}

/// Heart-rate notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateFrame {
    pub heart_rate: f64,
}

/// Command written to the device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandFrame {
    pub command: String,
}

impl CommandFrame {
    pub fn stop() -> Self {
        Self {
            command: "stop".to_string(),
        }
    }
}

/// Exercise summary sent by the device after a stop command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSummaryFrame {
    pub exercise: String,
    pub reps: u32,
}

/// Encode a frame as base64 JSON.
pub fn encode<T: Serialize>(frame: &T) -> Result<Vec<u8>, FrameError> {
    let json = serde_json::to_vec(frame)?;
    Ok(STANDARD.encode(json).into_bytes())
}

/// Decode a characteristic value.
///
/// Accepts base64 JSON and, for firmware that skips the framing, bare JSON.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, FrameError> {
    let trimmed = payload.trim_ascii();
    if trimmed.is_empty() {
        return Err(FrameError::Empty);
    }

    if trimmed.first() == Some(&b'{') {
        return Ok(serde_json::from_slice(trimmed)?);
    }

    let json = STANDARD.decode(trimmed)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_stop_command() {
        let encoded = encode(&CommandFrame::stop()).unwrap();
        // {"command":"stop"}
        assert_eq!(encoded, b"eyJjb21tYW5kIjoic3RvcCJ9".to_vec());
    }

    #[test]
    fn test_decode_heart_rate() {
        let payload = STANDARD.encode(r#"{"heartRate": 92.5}"#);
        let frame: HeartRateFrame = decode(payload.as_bytes()).unwrap();
        assert_eq!(frame.heart_rate, 92.5);
    }

    #[test]
    fn test_decode_bare_json_summary() {
        let frame: ExerciseSummaryFrame =
            decode(br#" {"exercise":"squat","reps":12} "#).unwrap();
        assert_eq!(frame.exercise, "squat");
        assert_eq!(frame.reps, 12);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode::<HeartRateFrame>(b"not base64!"),
            Err(FrameError::Base64(_))
        ));
        assert!(matches!(
            decode::<HeartRateFrame>(STANDARD.encode("{}").as_bytes()),
            Err(FrameError::Json(_))
        ));
        assert!(matches!(
            decode::<HeartRateFrame>(b"  "),
            Err(FrameError::Empty)
        ));
    }
}
