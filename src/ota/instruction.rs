//! Tone instructions and the builder that produces them.
//!
//! Each bit becomes one `bit_length` interval: tone for 1, silence for 0.
//! Each byte is framed by a tone interval on both sides and followed by
//! `byte_sep` of silence:
//!
//! ```text
//!  pad  b7 b6 b5 b4 b3 b2 b1 b0  pad  sep
//!  on   .. .. .. .. .. .. .. ..  on   off(byte_sep)
//! ```

use super::bits::{Bit, ByteBits, BITS_PER_BYTE};
use crate::config::OtaConfig;
use crate::error::EncodeError;
use std::str::Chars;
use std::time::Duration;

/// Instructions emitted per byte: leading pad, bits, trailing pad, separator.
pub const SLOTS_PER_BYTE: usize = BITS_PER_BYTE + 3;

/// One timed interval of tone or silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToneInstruction {
    /// Whether the tone sounds during this interval.
    pub active: bool,
    /// How long the interval lasts.
    pub duration: Duration,
}

impl ToneInstruction {
    pub fn new(active: bool, duration: Duration) -> Self {
        Self { active, duration }
    }

    /// A tone interval.
    pub fn on(duration: Duration) -> Self {
        Self::new(true, duration)
    }

    /// A silent interval.
    pub fn off(duration: Duration) -> Self {
        Self::new(false, duration)
    }
}

/// An ordered list of tone instructions, played strictly left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSequence(Vec<ToneInstruction>);

impl InstructionSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the instructions in playback order.
    pub fn instructions(&self) -> &[ToneInstruction] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToneInstruction> {
        self.0.iter()
    }

    pub fn push(&mut self, instruction: ToneInstruction) {
        self.0.push(instruction);
    }

    /// Appends every instruction of `other`.
    pub fn append(&mut self, other: InstructionSequence) {
        self.0.extend(other.0);
    }

    /// Wall-clock time the sequence takes to play: the sum of all durations.
    pub fn total_duration(&self) -> Duration {
        self.0.iter().map(|i| i.duration).sum()
    }

    /// Renders the active flags as a `1`/`0` string, one symbol per
    /// instruction, ignoring durations.
    pub fn pattern(&self) -> String {
        self.0
            .iter()
            .map(|i| if i.active { '1' } else { '0' })
            .collect()
    }
}

impl FromIterator<ToneInstruction> for InstructionSequence {
    fn from_iter<T: IntoIterator<Item = ToneInstruction>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ToneInstruction> for InstructionSequence {
    fn extend<T: IntoIterator<Item = ToneInstruction>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for InstructionSequence {
    type Item = ToneInstruction;
    type IntoIter = std::vec::IntoIter<ToneInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a InstructionSequence {
    type Item = ToneInstruction;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, ToneInstruction>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// Checks that every character of `text` fits in one byte.
///
/// # Errors
///
/// Returns `EncodeError::Encoding` for the first character above U+00FF.
pub fn check_latin1(text: &str) -> Result<(), EncodeError> {
    match text.chars().enumerate().find(|(_, c)| *c as u32 > 0xFF) {
        Some((position, character)) => Err(EncodeError::Encoding {
            character,
            position,
            code: character as u32,
        }),
        None => Ok(()),
    }
}

/// Bytes of a string already checked by [`check_latin1`], one per character.
#[derive(Debug, Clone)]
pub struct Latin1Bytes<'a>(Chars<'a>);

impl Iterator for Latin1Bytes<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.0.next().map(|c| c as u32 as u8)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

/// Lazily framed instructions for a stream of bytes.
///
/// Produces exactly what [`InstructionBuilder::bytes_to_instructions`] would,
/// one instruction at a time, so long payloads never sit in memory as a
/// whole. Cloning the iterator before consuming it gives a restartable copy.
#[derive(Debug, Clone)]
pub struct ByteInstructions<I> {
    bytes: I,
    bit: Duration,
    sep: Duration,
    current: Option<ByteBits>,
    slot: usize,
}

impl<I: Iterator<Item = u8>> ByteInstructions<I> {
    fn new(bytes: I, config: &OtaConfig) -> Self {
        Self {
            bytes,
            bit: config.bit_duration(),
            sep: config.byte_sep_duration(),
            current: None,
            slot: SLOTS_PER_BYTE,
        }
    }
}

impl<I: Iterator<Item = u8>> Iterator for ByteInstructions<I> {
    type Item = ToneInstruction;

    fn next(&mut self) -> Option<ToneInstruction> {
        if self.slot == SLOTS_PER_BYTE {
            self.current = Some(ByteBits::from(self.bytes.next()?));
            self.slot = 0;
        }
        let bits = self.current?;

        let instruction = match self.slot {
            0 => ToneInstruction::on(self.bit),
            s if s <= BITS_PER_BYTE => {
                ToneInstruction::new(bits.bits()[s - 1].is_set(), self.bit)
            }
            s if s == BITS_PER_BYTE + 1 => ToneInstruction::on(self.bit),
            _ => ToneInstruction::off(self.sep),
        };
        self.slot += 1;
        Some(instruction)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let in_flight = SLOTS_PER_BYTE - self.slot;
        let (lo, hi) = self.bytes.size_hint();
        (
            lo.saturating_mul(SLOTS_PER_BYTE).saturating_add(in_flight),
            hi.and_then(|h| h.checked_mul(SLOTS_PER_BYTE))
                .and_then(|h| h.checked_add(in_flight)),
        )
    }
}

/// Turns bits, bytes, and text into tone instructions for one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstructionBuilder {
    config: OtaConfig,
}

impl InstructionBuilder {
    pub fn new(config: OtaConfig) -> Self {
        Self { config }
    }

    /// The configuration every instruction is timed against.
    pub fn config(&self) -> &OtaConfig {
        &self.config
    }

    /// One `bit_length` instruction per bit, active for `Bit::One`.
    ///
    /// With `padded`, one extra tone interval is placed before and after the
    /// bits, so a receiver can find the boundary even when the payload starts
    /// or ends with silence.
    ///
    /// # Arguments
    ///
    /// * `bits` - Bits in transmission order
    /// * `padded` - Whether to bracket the bits with framing tones
    pub fn bits_to_instructions(&self, bits: &[Bit], padded: bool) -> InstructionSequence {
        let bit = self.config.bit_duration();
        let mut seq = InstructionSequence(Vec::with_capacity(bits.len() + 2));
        if padded {
            seq.push(ToneInstruction::on(bit));
        }
        seq.extend(bits.iter().map(|b| ToneInstruction::new(b.is_set(), bit)));
        if padded {
            seq.push(ToneInstruction::on(bit));
        }
        seq
    }

    /// Frames already-typed bytes: a padded block per byte, each followed by
    /// one `byte_sep` silence (the last byte included).
    pub fn bytes_to_instructions(&self, bytes: &[ByteBits]) -> InstructionSequence {
        let sep = ToneInstruction::off(self.config.byte_sep_duration());
        let mut seq = InstructionSequence(Vec::with_capacity(bytes.len() * SLOTS_PER_BYTE));
        for byte in bytes {
            seq.append(self.bits_to_instructions(byte.bits(), true));
            seq.push(sep);
        }
        seq
    }

    /// Frames a series of bit strings such as `"01100001"`.
    ///
    /// Every string is validated before anything is built.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::Format` if any entry is not exactly eight `0`/`1`
    /// symbols.
    pub fn byte_series_to_instructions<S: AsRef<str>>(
        &self,
        bytes: &[S],
    ) -> Result<InstructionSequence, EncodeError> {
        let parsed = bytes
            .iter()
            .map(|s| s.as_ref().parse::<ByteBits>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.bytes_to_instructions(&parsed))
    }

    /// Frames each character of `text` as one byte, by code point.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::Encoding` if any character is above U+00FF; in
    /// that case nothing is built.
    ///
    /// # Examples
    ///
    /// ```
    /// use otatone::{InstructionBuilder, OtaConfig};
    /// use std::time::Duration;
    ///
    /// let builder = InstructionBuilder::new(OtaConfig::new(0.08, 1.0).unwrap());
    /// let seq = builder.string_to_instructions("a").unwrap();
    /// assert_eq!(seq.total_duration(), Duration::from_millis(1800));
    /// ```
    pub fn string_to_instructions(&self, text: &str) -> Result<InstructionSequence, EncodeError> {
        Ok(self.text_stream(text)?.collect())
    }

    /// Lazily frames a stream of bytes. See [`ByteInstructions`].
    pub fn stream<I>(&self, bytes: I) -> ByteInstructions<I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        ByteInstructions::new(bytes.into_iter(), &self.config)
    }

    /// Lazily frames `text` after checking every character up front.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::Encoding` if any character is above U+00FF.
    pub fn text_stream<'a>(
        &self,
        text: &'a str,
    ) -> Result<ByteInstructions<Latin1Bytes<'a>>, EncodeError> {
        check_latin1(text)?;
        Ok(self.stream(Latin1Bytes(text.chars())))
    }
}
