//! Synchronization preamble and whole-transmission encoding.

use super::bits::Bit;
use super::instruction::{InstructionBuilder, InstructionSequence};
use crate::config::OtaConfig;
use crate::error::EncodeError;

/// The repeating unit of the preamble.
pub const PREAMBLE_UNIT: [Bit; 2] = [Bit::One, Bit::Zero];

/// How many times the unit repeats.
pub const PREAMBLE_REPEATS: usize = 10;

/// Builds the synchronization header: `10` repeated ten times, unpadded,
/// starting with tone-on.
pub fn config_preamble(config: &OtaConfig) -> InstructionSequence {
    let bits: Vec<Bit> = PREAMBLE_UNIT
        .iter()
        .copied()
        .cycle()
        .take(PREAMBLE_UNIT.len() * PREAMBLE_REPEATS)
        .collect();
    InstructionBuilder::new(*config).bits_to_instructions(&bits, false)
}

/// Encoder for a complete over-the-air transmission.
///
/// Holds one immutable configuration and produces the preamble, the framed
/// payload, or both back to back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OtaEncoder {
    builder: InstructionBuilder,
}

impl OtaEncoder {
    pub fn new(config: OtaConfig) -> Self {
        Self {
            builder: InstructionBuilder::new(config),
        }
    }

    pub fn config(&self) -> &OtaConfig {
        self.builder.config()
    }

    pub fn builder(&self) -> &InstructionBuilder {
        &self.builder
    }

    /// The synchronization header for this configuration.
    pub fn config_instructions(&self) -> InstructionSequence {
        config_preamble(self.config())
    }

    /// Preamble followed by the framed payload for `text`.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::Encoding` if any character is above U+00FF.
    pub fn transmission(&self, text: &str) -> Result<InstructionSequence, EncodeError> {
        let payload = self.builder.string_to_instructions(text)?;
        let mut seq = self.config_instructions();
        seq.append(payload);
        Ok(seq)
    }
}
