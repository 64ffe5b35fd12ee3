//! Over-the-air encoding: bytes to timed tone instructions.
//!
//! This module covers the transmit side only. There is no decoder; a
//! receiver has to recover bits from tone presence on its own, using the
//! preamble to find the start of a transmission.

mod bits;
mod instruction;
mod preamble;

pub use bits::{decode, encode, Bit, ByteBits, BITS_PER_BYTE};
pub use instruction::{
    check_latin1, ByteInstructions, InstructionBuilder, InstructionSequence, Latin1Bytes,
    ToneInstruction, SLOTS_PER_BYTE,
};
pub use preamble::{config_preamble, OtaEncoder, PREAMBLE_REPEATS, PREAMBLE_UNIT};
