//! Transmission and tone configuration.
//!
//! `OtaConfig` fixes the line timing, `ToneParams` the sound of the carrier,
//! and `Settings` bundles both for persistence as JSON.

use crate::audio::SAMPLE_RATE;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default seconds per bit.
pub const DEFAULT_BIT_LENGTH: f64 = 0.08;

/// Default seconds of silence between bytes.
pub const DEFAULT_BYTE_SEP: f64 = 1.0;

/// Default carrier frequency in Hz.
pub const DEFAULT_FREQUENCY: f32 = 3400.0;

/// Default linear carrier volume.
pub const DEFAULT_VOLUME: f32 = 0.2;

/// Timing parameters of the over-the-air encoding.
///
/// Immutable once built; every constructor validates. Both intervals are
/// converted to `Duration` up front, so a value that cannot be timed is
/// rejected here rather than at playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOtaConfig", into = "RawOtaConfig")]
pub struct OtaConfig {
    /// Seconds allotted to one bit.
    bit_length: f64,
    /// Seconds of silence after each byte.
    byte_sep: f64,
    bit: Duration,
    sep: Duration,
}

#[derive(Clone, Serialize, Deserialize)]
struct RawOtaConfig {
    bit_length: f64,
    byte_sep: f64,
}

impl TryFrom<RawOtaConfig> for OtaConfig {
    type Error = ConfigError;

    fn try_from(raw: RawOtaConfig) -> Result<Self, Self::Error> {
        Self::new(raw.bit_length, raw.byte_sep)
    }
}

impl From<OtaConfig> for RawOtaConfig {
    fn from(config: OtaConfig) -> Self {
        Self {
            bit_length: config.bit_length,
            byte_sep: config.byte_sep,
        }
    }
}

impl OtaConfig {
    /// Creates a configuration.
    ///
    /// # Arguments
    ///
    /// * `bit_length` - Seconds per bit; must be at least one nanosecond
    /// * `byte_sep` - Seconds of inter-byte silence, non-negative
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BitLength` or `ConfigError::ByteSep` when a value
    /// is out of range or too large for a `Duration`.
    pub fn new(bit_length: f64, byte_sep: f64) -> Result<Self, ConfigError> {
        let bit = match Duration::try_from_secs_f64(bit_length) {
            Ok(d) if !d.is_zero() => d,
            _ => return Err(ConfigError::BitLength(bit_length)),
        };
        let sep = Duration::try_from_secs_f64(byte_sep)
            .map_err(|_| ConfigError::ByteSep(byte_sep))?;
        Ok(Self {
            bit_length,
            byte_sep,
            bit,
            sep,
        })
    }

    /// Seconds per bit.
    pub fn bit_length(&self) -> f64 {
        self.bit_length
    }

    /// Seconds of silence between bytes.
    pub fn byte_sep(&self) -> f64 {
        self.byte_sep
    }

    /// Duration of one bit. Never zero.
    pub fn bit_duration(&self) -> Duration {
        self.bit
    }

    /// Duration of the silence between bytes.
    pub fn byte_sep_duration(&self) -> Duration {
        self.sep
    }
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            bit_length: DEFAULT_BIT_LENGTH,
            byte_sep: DEFAULT_BYTE_SEP,
            bit: Duration::from_millis(80),
            sep: Duration::from_secs(1),
        }
    }
}

/// Carrier tone parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToneParams")]
pub struct ToneParams {
    /// Frequency in Hz.
    frequency: f32,
    /// Linear amplitude, 0.0 to 1.0.
    volume: f32,
}

#[derive(Deserialize)]
struct RawToneParams {
    frequency: f32,
    volume: f32,
}

impl TryFrom<RawToneParams> for ToneParams {
    type Error = ConfigError;

    fn try_from(raw: RawToneParams) -> Result<Self, Self::Error> {
        Self::new(raw.frequency, raw.volume)
    }
}

impl ToneParams {
    /// Creates tone parameters.
    ///
    /// The frequency must sit strictly between 0 Hz and the Nyquist limit of
    /// the output sample rate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Frequency` or `ConfigError::Volume` when a value
    /// is out of range.
    pub fn new(frequency: f32, volume: f32) -> Result<Self, ConfigError> {
        let max = SAMPLE_RATE as f32 / 2.0;
        if !frequency.is_finite() || frequency <= 0.0 || frequency >= max {
            return Err(ConfigError::Frequency {
                value: frequency,
                max,
            });
        }
        if !(0.0..=1.0).contains(&volume) {
            return Err(ConfigError::Volume(volume));
        }
        Ok(Self { frequency, volume })
    }

    /// Frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Linear volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Volume in decibels relative to full scale, capped at 0 dB.
    ///
    /// Silence maps to negative infinity.
    pub fn decibels(&self) -> f32 {
        (20.0 * self.volume.log10()).min(0.0)
    }
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Everything a transmitter needs, persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Line timing.
    #[serde(default)]
    pub ota: OtaConfig,

    /// Carrier tone.
    #[serde(default)]
    pub tone: ToneParams,

    /// Whether to send the synchronization preamble before the payload.
    #[serde(default = "default_preamble")]
    pub preamble: bool,
}

fn default_preamble() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ota: OtaConfig::default(),
            tone: ToneParams::default(),
            preamble: true,
        }
    }
}

impl Settings {
    /// Serializes the settings to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses settings from JSON, validating every value.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or a value is out of range
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Saves the settings to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = self.to_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if file reading or parsing fails
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(OtaConfig::new(0.08, 1.0).is_ok());
        assert!(OtaConfig::new(0.08, 0.0).is_ok());
        assert!(matches!(
            OtaConfig::new(0.0, 1.0),
            Err(ConfigError::BitLength(_))
        ));
        assert!(matches!(
            OtaConfig::new(f64::NAN, 1.0),
            Err(ConfigError::BitLength(_))
        ));
        assert!(matches!(
            OtaConfig::new(0.08, -0.5),
            Err(ConfigError::ByteSep(_))
        ));
        assert!(matches!(
            OtaConfig::new(0.08, f64::INFINITY),
            Err(ConfigError::ByteSep(_))
        ));
    }

    #[test]
    fn test_config_rejects_untimeable_values() {
        // Too large for a Duration.
        assert!(matches!(
            OtaConfig::new(1e30, 1.0),
            Err(ConfigError::BitLength(_))
        ));
        assert!(matches!(
            OtaConfig::new(0.08, 1e30),
            Err(ConfigError::ByteSep(_))
        ));
        // Rounds to a zero-length bit.
        assert!(matches!(
            OtaConfig::new(1e-12, 1.0),
            Err(ConfigError::BitLength(_))
        ));
        // A vanishing gap is still a valid non-negative separation.
        let config = OtaConfig::new(0.08, 1e-12).unwrap();
        assert_eq!(config.byte_sep_duration(), Duration::ZERO);
    }

    #[test]
    fn test_settings_reject_untimeable_bit_length() {
        let result = Settings::from_json(r#"{ "ota": { "bit_length": 1e30, "byte_sep": 0.2 } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_default_matches_constructor() {
        assert_eq!(
            OtaConfig::default(),
            OtaConfig::new(DEFAULT_BIT_LENGTH, DEFAULT_BYTE_SEP).unwrap()
        );
    }

    #[test]
    fn test_config_durations() {
        let config = OtaConfig::new(0.08, 1.0).unwrap();
        assert_eq!(config.bit_duration(), Duration::from_millis(80));
        assert_eq!(config.byte_sep_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_tone_validation() {
        assert!(ToneParams::new(3400.0, 0.2).is_ok());
        assert!(ToneParams::new(440.0, 0.0).is_ok());
        assert!(ToneParams::new(0.0, 0.2).is_err());
        assert!(ToneParams::new(30_000.0, 0.2).is_err());
        assert!(matches!(
            ToneParams::new(440.0, 1.5),
            Err(ConfigError::Volume(_))
        ));
    }

    #[test]
    fn test_decibels_capped() {
        let full = ToneParams::new(440.0, 1.0).unwrap();
        assert_eq!(full.decibels(), 0.0);

        let tenth = ToneParams::new(440.0, 0.1).unwrap();
        assert!((tenth.decibels() + 20.0).abs() < 1e-4);

        let silent = ToneParams::new(440.0, 0.0).unwrap();
        assert_eq!(silent.decibels(), f32::NEG_INFINITY);
    }

    #[test]
    fn test_settings_roundtrip() {
        let settings = Settings {
            ota: OtaConfig::new(0.05, 0.5).unwrap(),
            tone: ToneParams::new(1200.0, 0.5).unwrap(),
            preamble: false,
        };
        let json = settings.to_json().unwrap();
        let loaded = Settings::from_json(&json).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let loaded = Settings::from_json(r#"{ "ota": { "bit_length": 0.1, "byte_sep": 0.2 } }"#)
            .unwrap();
        assert_eq!(loaded.ota.bit_length(), 0.1);
        assert_eq!(loaded.tone, ToneParams::default());
        assert!(loaded.preamble);
    }

    #[test]
    fn test_settings_rejects_invalid_values() {
        let result = Settings::from_json(r#"{ "ota": { "bit_length": -1.0, "byte_sep": 0.2 } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_settings_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otatone.json");
        let settings = Settings::default();
        settings.save_to_file(&path).unwrap();
        assert_eq!(Settings::load_from_file(&path).unwrap(), settings);
    }
}
