//! otatone - Over-the-air acoustic transmitter.
//!
//! Encodes bytes as timed tone on/off intervals and plays them with precise
//! timing: tone for one bit length means 1, silence means 0, each byte framed
//! by a tone interval on both sides and followed by a silent gap.
//!
//! Only the transmit path exists. There is no decoder or receive protocol.

pub mod audio;
pub mod config;
pub mod error;
pub mod ota;
pub mod player;

// Re-export commonly used types
pub use audio::{export_to_wav, ToneEngine};
pub use config::{OtaConfig, Settings, ToneParams};
pub use error::{ConfigError, EncodeError, ToneError};
pub use ota::{
    config_preamble, decode, encode, Bit, ByteBits, InstructionBuilder, InstructionSequence,
    OtaEncoder, ToneInstruction,
};
pub use player::{Clock, PlaybackReport, PlaybackScheduler, PlayerState, ToneSource};
