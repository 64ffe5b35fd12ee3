//! Playback of tone instructions against a tone output.

mod clock;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{PlaybackReport, PlaybackScheduler, PlayerState};

use crate::error::ToneError;

/// A tone output that can be switched on and off.
///
/// Waveform synthesis and device handling live behind this trait; the
/// scheduler only ever calls `start` and `stop`.
pub trait ToneSource {
    /// Starts sounding the tone.
    fn start(&mut self) -> Result<(), ToneError>;

    /// Silences the tone. Must succeed quietly if already silent.
    fn stop(&mut self) -> Result<(), ToneError>;
}

impl<T: ToneSource + ?Sized> ToneSource for Box<T> {
    fn start(&mut self) -> Result<(), ToneError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), ToneError> {
        (**self).stop()
    }
}
