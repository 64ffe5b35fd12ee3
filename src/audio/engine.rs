//! Audio engine for real-time tone output.
//!
//! Keeps one continuous sine source playing on the rodio output stream and
//! gates it on and off through shared atomics, so switching the tone never
//! touches the audio thread's buffers.

use crate::config::ToneParams;
use crate::error::ToneError;
use crate::player::ToneSource;
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Sample rate for tone synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Length of the on/off ramp in samples (about 2 ms).
/// Avoids clicks at tone edges without blurring short bits.
const FADE_SAMPLES: u32 = 88;

/// Sine oscillator with a linear gate envelope.
///
/// Phase keeps running while gated off, so repeated tone intervals stay
/// phase-continuous.
#[derive(Debug, Clone)]
pub(crate) struct Carrier {
    /// Current phase (0.0 to 1.0).
    phase: f32,
    /// Phase increment per sample (frequency / sample_rate).
    phase_inc: f32,
    /// Peak amplitude.
    amplitude: f32,
    /// Current envelope level (0.0 to 1.0).
    envelope: f32,
}

impl Carrier {
    pub(crate) fn new(params: &ToneParams) -> Self {
        Self {
            phase: 0.0,
            phase_inc: params.frequency() / SAMPLE_RATE as f32,
            amplitude: params.volume(),
            envelope: 0.0,
        }
    }

    /// Produces the next sample with the gate open or closed.
    pub(crate) fn next_sample(&mut self, gate: bool) -> f32 {
        let step = 1.0 / FADE_SAMPLES as f32;
        if gate {
            self.envelope = (self.envelope + step).min(1.0);
        } else {
            self.envelope = (self.envelope - step).max(0.0);
        }

        let sample = (self.phase * TAU).sin() * self.amplitude * self.envelope;

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }
}

/// Shared state between the engine and the audio thread.
/// Uses atomics for lock-free access from the audio thread.
#[derive(Debug, Default)]
struct GateState {
    /// Whether the tone should be audible.
    sounding: AtomicBool,
    /// Set when the source is replaced; the audio thread then ends it.
    retired: AtomicBool,
}

/// Endless gated sine. Implements rodio's Source trait for playback.
struct GatedTone {
    carrier: Carrier,
    gate: Arc<GateState>,
}

impl Iterator for GatedTone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.gate.retired.load(Ordering::Relaxed) {
            return None;
        }
        let open = self.gate.sounding.load(Ordering::Relaxed);
        Some(self.carrier.next_sample(open))
    }
}

impl Source for GatedTone {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// A tone on the default audio output device.
///
/// Owns the output stream; dropping the engine closes the device.
pub struct ToneEngine {
    /// Gate of the currently installed source.
    gate: Arc<GateState>,
    /// Current tone parameters.
    params: ToneParams,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    /// Audio output handle for installing sources.
    stream_handle: OutputStreamHandle,
}

impl ToneEngine {
    /// Opens the default output device and installs a silent tone.
    ///
    /// # Errors
    ///
    /// Returns `ToneError::Device` if no output device can be opened and
    /// `ToneError::Playback` if the stream rejects the source.
    pub fn new(params: ToneParams) -> Result<Self, ToneError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| ToneError::Device(format!("failed to open audio output: {}", e)))?;
        let gate = Self::install(&stream_handle, &params)?;

        tracing::info!(
            "Opened tone output: {} Hz at {:.1} dB",
            params.frequency(),
            params.decibels()
        );

        Ok(Self {
            gate,
            params,
            _stream: stream,
            stream_handle,
        })
    }

    fn install(handle: &OutputStreamHandle, params: &ToneParams) -> Result<Arc<GateState>, ToneError> {
        let gate = Arc::new(GateState::default());
        let source = GatedTone {
            carrier: Carrier::new(params),
            gate: Arc::clone(&gate),
        };
        handle
            .play_raw(source)
            .map_err(|e| ToneError::Playback(format!("failed to start tone: {}", e)))?;
        Ok(gate)
    }

    /// Returns the current tone parameters.
    pub fn params(&self) -> &ToneParams {
        &self.params
    }

    /// Replaces the tone with a newly generated one.
    ///
    /// The old source is retired and the new one starts silent, so the caller
    /// must `start` again if a tone was sounding.
    ///
    /// # Errors
    ///
    /// Returns `ToneError::Playback` if the new source cannot be installed;
    /// the old one keeps playing in that case.
    pub fn set_params(&mut self, params: ToneParams) -> Result<(), ToneError> {
        let gate = Self::install(&self.stream_handle, &params)?;
        let old = std::mem::replace(&mut self.gate, gate);
        old.retired.store(true, Ordering::Relaxed);
        self.params = params;
        tracing::debug!("Retuned tone to {} Hz", params.frequency());
        Ok(())
    }

    /// Returns whether the tone is currently gated on.
    pub fn is_sounding(&self) -> bool {
        self.gate.sounding.load(Ordering::Relaxed)
    }
}

impl ToneSource for ToneEngine {
    fn start(&mut self) -> Result<(), ToneError> {
        self.gate.sounding.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ToneError> {
        self.gate.sounding.store(false, Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for ToneEngine {
    fn drop(&mut self) {
        self.gate.retired.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_starts_silent() {
        let params = ToneParams::new(1000.0, 0.5).unwrap();
        let mut carrier = Carrier::new(&params);
        for _ in 0..1000 {
            assert_eq!(carrier.next_sample(false), 0.0);
        }
    }

    #[test]
    fn test_carrier_ramps_to_volume() {
        let params = ToneParams::new(1000.0, 0.5).unwrap();
        let mut carrier = Carrier::new(&params);
        let samples: Vec<f32> = (0..SAMPLE_RATE / 10).map(|_| carrier.next_sample(true)).collect();

        // Ramp is gradual: the first sample is tiny.
        assert!(samples[1].abs() < 0.05);
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.5 + 1e-6);
        assert!(peak > 0.49);
    }

    #[test]
    fn test_carrier_fades_out() {
        let params = ToneParams::new(1000.0, 1.0).unwrap();
        let mut carrier = Carrier::new(&params);
        for _ in 0..1000 {
            carrier.next_sample(true);
        }
        for _ in 0..FADE_SAMPLES {
            carrier.next_sample(false);
        }
        assert_eq!(carrier.next_sample(false), 0.0);
    }

    #[test]
    fn test_gated_tone_ends_when_retired() {
        let gate = Arc::new(GateState::default());
        let mut tone = GatedTone {
            carrier: Carrier::new(&ToneParams::default()),
            gate: Arc::clone(&gate),
        };
        assert!(tone.next().is_some());
        gate.retired.store(true, Ordering::Relaxed);
        assert!(tone.next().is_none());
    }

    #[test]
    #[ignore] // Requires an audio output device
    fn test_engine_gate() {
        let mut engine = ToneEngine::new(ToneParams::default()).unwrap();
        assert!(!engine.is_sounding());
        engine.start().unwrap();
        assert!(engine.is_sounding());
        engine.stop().unwrap();
        engine.stop().unwrap();
        assert!(!engine.is_sounding());
        engine
            .set_params(ToneParams::new(880.0, 0.1).unwrap())
            .unwrap();
        assert_eq!(engine.params().frequency(), 880.0);
    }
}
