//! Error types.
//!
//! Encoding failures are raised at the encode boundary, before anything is
//! played. Tone source failures are fatal to the playback call that hit them.

use thiserror::Error;

/// Errors produced while turning values, bit strings, or text into tone
/// instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A byte value outside 0-255.
    #[error("value {0} is outside the byte range 0-255")]
    Range(i64),

    /// A bit string that is not exactly 8 symbols of `0`/`1`.
    #[error("malformed bit string {bits:?}: {reason}")]
    Format {
        /// The offending input.
        bits: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A character whose code point does not fit in one byte.
    #[error("character {character:?} at position {position} has code point U+{code:04X}, above 0xFF")]
    Encoding {
        /// The offending character.
        character: char,
        /// Character index within the input text.
        position: usize,
        /// Its code point.
        code: u32,
    },
}

/// Errors produced by configuration validation and settings files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bit length must be a finite number of seconds above zero, got {0}")]
    BitLength(f64),

    #[error("byte separation must be a finite, non-negative number of seconds, got {0}")]
    ByteSep(f64),

    #[error("tone frequency must be between 0 and {max} Hz (exclusive), got {value}")]
    Frequency { value: f32, max: f32 },

    #[error("tone volume must be between 0 and 1, got {0}")]
    Volume(f32),

    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of a tone output.
#[derive(Debug, Error)]
pub enum ToneError {
    /// The audio device could not be opened or has gone away.
    #[error("audio device unavailable: {0}")]
    Device(String),

    /// The device accepted the stream but playback failed.
    #[error("playback failed: {0}")]
    Playback(String),

    /// Writing rendered audio to a file failed.
    #[error("export failed: {0}")]
    Export(#[from] hound::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_message() {
        let err = EncodeError::Encoding {
            character: '€',
            position: 3,
            code: '€' as u32,
        };
        let msg = err.to_string();
        assert!(msg.contains("position 3"));
        assert!(msg.contains("U+20AC"));
    }

    #[test]
    fn test_range_error_message() {
        assert_eq!(
            EncodeError::Range(256).to_string(),
            "value 256 is outside the byte range 0-255"
        );
    }
}
