//! Real-time playback of tone instructions.
//!
//! The scheduler walks an instruction sequence left to right, switching its
//! tone source on and off and waiting out each interval on its clock. It never
//! retries and never compensates for timing error; the drift between
//! requested and measured time is reported back to the caller instead.

use super::clock::{Clock, SystemClock};
use super::ToneSource;
use crate::error::ToneError;
use crate::ota::ToneInstruction;
use std::iter;
use std::time::Duration;

/// Whether the tone source is currently sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Silent. The state before and after every sequence.
    #[default]
    Idle,
    /// The tone is sounding.
    Playing,
}

/// Timing summary of one played sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Number of instructions played.
    pub instructions: usize,
    /// Sum of the instruction durations.
    pub requested: Duration,
    /// Time measured on the clock from first to last instruction.
    pub actual: Duration,
}

impl PlaybackReport {
    /// Absolute difference between requested and measured time.
    pub fn drift(&self) -> Duration {
        self.actual.abs_diff(self.requested)
    }

    /// Drift as a fraction of the requested time. Zero for an empty sequence.
    pub fn drift_ratio(&self) -> f64 {
        if self.requested.is_zero() {
            0.0
        } else {
            self.drift().as_secs_f64() / self.requested.as_secs_f64()
        }
    }
}

/// Drives one tone source through instruction sequences.
///
/// The scheduler owns its tone source for its whole lifetime, so at most one
/// sequence is ever in flight against it. Retuning the source goes through
/// [`PlaybackScheduler::tone_mut`], which the borrow checker keeps out of any
/// running [`PlaybackScheduler::play`].
pub struct PlaybackScheduler<T, C = SystemClock> {
    tone: T,
    clock: C,
    state: PlayerState,
}

impl<T: ToneSource> PlaybackScheduler<T, SystemClock> {
    /// Creates a scheduler that waits on the wall clock.
    pub fn new(tone: T) -> Self {
        Self::with_clock(tone, SystemClock::new())
    }
}

impl<T: ToneSource, C: Clock> PlaybackScheduler<T, C> {
    /// Creates a scheduler with an explicit clock.
    pub fn with_clock(tone: T, clock: C) -> Self {
        Self {
            tone,
            clock,
            state: PlayerState::Idle,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn tone(&self) -> &T {
        &self.tone
    }

    /// Mutable access to the tone source between sequences.
    pub fn tone_mut(&mut self) -> &mut T {
        &mut self.tone
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Releases the tone source and clock.
    pub fn into_parts(self) -> (T, C) {
        (self.tone, self.clock)
    }

    /// Plays every instruction in order, then forces the tone off.
    ///
    /// Blocks the calling thread for the whole sequence. The state is `Idle`
    /// when this returns, whether the sequence ended on tone or silence.
    ///
    /// # Errors
    ///
    /// A tone source failure aborts the sequence and is returned as-is. One
    /// best-effort stop is attempted first; its own failure is only logged.
    pub fn play<I>(&mut self, instructions: I) -> Result<PlaybackReport, ToneError>
    where
        I: IntoIterator<Item = ToneInstruction>,
    {
        let started = self.clock.elapsed();
        let mut requested = Duration::ZERO;
        let mut count = 0usize;

        for instruction in instructions {
            if let Err(e) = self.step(instruction) {
                return Err(self.abort(e));
            }
            requested += instruction.duration;
            count += 1;
        }
        if let Err(e) = self.stop_tone() {
            return Err(self.abort(e));
        }

        let report = PlaybackReport {
            instructions: count,
            requested,
            actual: self.clock.elapsed().saturating_sub(started),
        };
        tracing::debug!(
            "Played {} instructions: requested {:?}, actual {:?}, drift {:?}",
            report.instructions,
            report.requested,
            report.actual,
            report.drift()
        );
        Ok(report)
    }

    /// Sounds the tone for `duration`, then stops.
    ///
    /// # Errors
    ///
    /// Returns the tone source's error, as [`PlaybackScheduler::play`] does.
    pub fn sound_for(&mut self, duration: Duration) -> Result<PlaybackReport, ToneError> {
        self.play(iter::once(ToneInstruction::on(duration)))
    }

    fn step(&mut self, instruction: ToneInstruction) -> Result<(), ToneError> {
        if instruction.active {
            if self.state == PlayerState::Idle {
                self.tone.start()?;
                self.state = PlayerState::Playing;
                tracing::trace!("tone on");
            }
        } else {
            self.stop_tone()?;
        }
        self.clock.sleep(instruction.duration);
        Ok(())
    }

    /// Stops unconditionally; stopping a silent source is harmless.
    fn stop_tone(&mut self) -> Result<(), ToneError> {
        self.tone.stop()?;
        if self.state == PlayerState::Playing {
            tracing::trace!("tone off");
        }
        self.state = PlayerState::Idle;
        Ok(())
    }

    fn abort(&mut self, err: ToneError) -> ToneError {
        tracing::error!("Playback aborted: {}", err);
        if let Err(cleanup) = self.tone.stop() {
            tracing::warn!("Failed to silence tone after abort: {}", cleanup);
        }
        self.state = PlayerState::Idle;
        err
    }
}
