//! Audio output for tone instructions.
//!
//! Contains:
//! - Real-time tone engine (rodio)
//! - Offline rendering and WAV export (hound)

pub mod engine;
pub mod export;

pub use engine::{ToneEngine, SAMPLE_RATE};
pub use export::{export_to_wav, render_samples};
