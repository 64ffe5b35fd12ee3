//! Byte <-> bit string conversion.
//!
//! Bytes are written most-significant bit first, so `97` becomes `01100001`.

use crate::error::EncodeError;
use std::fmt;
use std::str::FromStr;

/// Number of bits in one encoded byte.
pub const BITS_PER_BYTE: usize = 8;

/// A single binary symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    /// Returns true for `Bit::One`.
    #[inline]
    pub fn is_set(self) -> bool {
        self == Bit::One
    }

    /// The symbol used in bit strings.
    pub fn symbol(self) -> char {
        match self {
            Bit::Zero => '0',
            Bit::One => '1',
        }
    }
}

impl From<bool> for Bit {
    fn from(set: bool) -> Self {
        if set {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

impl TryFrom<char> for Bit {
    type Error = char;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        match symbol {
            '0' => Ok(Bit::Zero),
            '1' => Ok(Bit::One),
            other => Err(other),
        }
    }
}

/// Exactly eight bits, most-significant first.
///
/// The length invariant is carried by the type; only string parsing can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteBits([Bit; BITS_PER_BYTE]);

impl ByteBits {
    /// Returns the bits, most-significant first.
    pub fn bits(&self) -> &[Bit; BITS_PER_BYTE] {
        &self.0
    }

    /// Returns the numeric value of the bits.
    pub fn value(&self) -> u8 {
        self.0
            .iter()
            .fold(0u8, |acc, bit| (acc << 1) | bit.is_set() as u8)
    }
}

impl From<u8> for ByteBits {
    fn from(value: u8) -> Self {
        let mut bits = [Bit::Zero; BITS_PER_BYTE];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = Bit::from(value & (0x80 >> i) != 0);
        }
        Self(bits)
    }
}

impl From<ByteBits> for u8 {
    fn from(bits: ByteBits) -> Self {
        bits.value()
    }
}

impl FromStr for ByteBits {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: String| EncodeError::Format {
            bits: s.to_string(),
            reason,
        };

        let count = s.chars().count();
        if count != BITS_PER_BYTE {
            return Err(malformed(format!(
                "expected {} symbols, found {}",
                BITS_PER_BYTE, count
            )));
        }

        let mut bits = [Bit::Zero; BITS_PER_BYTE];
        for (i, symbol) in s.chars().enumerate() {
            bits[i] = Bit::try_from(symbol)
                .map_err(|c| malformed(format!("symbol {:?} at index {} is not 0 or 1", c, i)))?;
        }
        Ok(Self(bits))
    }
}

impl fmt::Display for ByteBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{}", bit.symbol())?;
        }
        Ok(())
    }
}

/// Encodes a byte value as eight bits.
///
/// # Errors
///
/// Returns `EncodeError::Range` if `value` is outside 0-255.
///
/// # Examples
///
/// ```
/// use otatone::ota::encode;
///
/// assert_eq!(encode(97).unwrap().to_string(), "01100001");
/// assert!(encode(256).is_err());
/// ```
pub fn encode(value: i64) -> Result<ByteBits, EncodeError> {
    u8::try_from(value)
        .map(ByteBits::from)
        .map_err(|_| EncodeError::Range(value))
}

/// Decodes an 8-symbol bit string back to its byte value.
///
/// # Errors
///
/// Returns `EncodeError::Format` if the input is not exactly eight `0`/`1`
/// symbols.
pub fn decode(bits: &str) -> Result<u8, EncodeError> {
    bits.parse::<ByteBits>().map(|b| b.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_msb_first() {
        assert_eq!(encode(97).unwrap().to_string(), "01100001");
        assert_eq!(encode(0).unwrap().to_string(), "00000000");
        assert_eq!(encode(255).unwrap().to_string(), "11111111");
        assert_eq!(encode(128).unwrap().to_string(), "10000000");
    }

    #[test]
    fn test_encode_out_of_range() {
        assert_eq!(encode(-1), Err(EncodeError::Range(-1)));
        assert_eq!(encode(256), Err(EncodeError::Range(256)));
        assert!(encode(i64::MAX).is_err());
    }

    #[test]
    fn test_roundtrip_all_values() {
        for v in 0..=255i64 {
            let bits = encode(v).unwrap();
            assert_eq!(decode(&bits.to_string()).unwrap() as i64, v);
        }
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        assert!(matches!(decode("0110000"), Err(EncodeError::Format { .. })));
        assert!(matches!(decode("011000011"), Err(EncodeError::Format { .. })));
        assert!(matches!(decode(""), Err(EncodeError::Format { .. })));
    }

    #[test]
    fn test_decode_rejects_bad_symbols() {
        assert!(matches!(decode("0110000x"), Err(EncodeError::Format { .. })));
        assert!(matches!(decode("01100002"), Err(EncodeError::Format { .. })));
        // Eight chars but more than eight bytes of UTF-8.
        assert!(matches!(decode("0110000é"), Err(EncodeError::Format { .. })));
    }

    #[test]
    fn test_decode_then_encode_is_identity() {
        for v in 0..=255u8 {
            let s = format!("{:08b}", v);
            let value = decode(&s).unwrap();
            assert_eq!(value, v);
            assert_eq!(encode(value as i64).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_bits_accessor() {
        let bits = ByteBits::from(0b1000_0001);
        assert_eq!(bits.bits()[0], Bit::One);
        assert_eq!(bits.bits()[1], Bit::Zero);
        assert_eq!(bits.bits()[7], Bit::One);
        assert_eq!(u8::from(bits), 0b1000_0001);
    }
}
