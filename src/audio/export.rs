//! Offline rendering of tone instructions.
//!
//! Produces the same carrier the engine plays, sample-accurate, so a
//! transmission can be captured to a WAV file instead of a speaker.

use super::engine::{Carrier, SAMPLE_RATE};
use crate::config::ToneParams;
use crate::error::ToneError;
use crate::ota::ToneInstruction;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;

/// Turns instructions into samples.
///
/// Sample boundaries are computed from the running total of durations, so
/// rounding never accumulates across a long sequence.
struct Renderer {
    carrier: Carrier,
    elapsed: Duration,
    written: u64,
}

impl Renderer {
    fn new(params: &ToneParams) -> Self {
        Self {
            carrier: Carrier::new(params),
            elapsed: Duration::ZERO,
            written: 0,
        }
    }

    fn render<E, F>(&mut self, instruction: ToneInstruction, mut emit: F) -> Result<(), E>
    where
        F: FnMut(f32) -> Result<(), E>,
    {
        self.elapsed += instruction.duration;
        let end = (self.elapsed.as_secs_f64() * SAMPLE_RATE as f64).round() as u64;
        while self.written < end {
            emit(self.carrier.next_sample(instruction.active))?;
            self.written += 1;
        }
        Ok(())
    }
}

/// Renders instructions to mono `f32` samples at [`SAMPLE_RATE`].
pub fn render_samples<I>(instructions: I, params: &ToneParams) -> Vec<f32>
where
    I: IntoIterator<Item = ToneInstruction>,
{
    let mut renderer = Renderer::new(params);
    let mut samples = Vec::new();
    for instruction in instructions {
        let rendered = renderer.render(instruction, |s| {
            samples.push(s);
            Ok::<(), Infallible>(())
        });
        if let Err(never) = rendered {
            match never {}
        }
    }
    samples
}

/// Exports instructions to a 16-bit mono WAV file.
///
/// Samples are streamed to disk as they are rendered, so a lazy instruction
/// stream is never held in memory.
///
/// # Arguments
///
/// * `instructions` - The sequence to render
/// * `params` - Carrier frequency and volume
/// * `output_path` - Path for the output WAV file
///
/// # Returns
///
/// Number of samples written
///
/// # Errors
///
/// Returns `ToneError::Export` if the file cannot be created or written
pub fn export_to_wav<I, P>(
    instructions: I,
    params: &ToneParams,
    output_path: P,
) -> Result<u64, ToneError>
where
    I: IntoIterator<Item = ToneInstruction>,
    P: AsRef<Path>,
{
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(output_path.as_ref(), spec)?;

    let mut renderer = Renderer::new(params);
    for instruction in instructions {
        renderer.render(instruction, |s| {
            // Convert f32 (-1.0 to 1.0) to i16
            writer.write_sample((s * 32767.0).clamp(-32768.0, 32767.0) as i16)
        })?;
    }
    writer.finalize()?;

    tracing::info!(
        "Wrote {} samples ({:.2} s) to {}",
        renderer.written,
        renderer.elapsed.as_secs_f64(),
        output_path.as_ref().display()
    );
    Ok(renderer.written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OtaConfig;
    use crate::ota::InstructionBuilder;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_sample_count_follows_total_duration() {
        let builder = InstructionBuilder::new(OtaConfig::new(0.08, 1.0).unwrap());
        let seq = builder.string_to_instructions("a").unwrap();
        let samples = render_samples(&seq, &ToneParams::default());
        // 1.8 s at 44.1 kHz
        assert_eq!(samples.len(), 79_380);
    }

    #[test]
    fn test_no_rounding_drift() {
        // 1/3 ms does not divide the sample period evenly.
        let step = Duration::from_nanos(333_333);
        let seq = vec![ToneInstruction::on(step); 3000];
        let samples = render_samples(seq, &ToneParams::default());
        let expected = (step.as_secs_f64() * 3000.0 * SAMPLE_RATE as f64).round() as usize;
        assert_eq!(samples.len(), expected);
    }

    #[test]
    fn test_silence_and_tone_regions() {
        let params = ToneParams::new(1000.0, 0.5).unwrap();
        let seq = vec![
            ToneInstruction::off(ms(100)),
            ToneInstruction::on(ms(100)),
            ToneInstruction::off(ms(100)),
        ];
        let samples = render_samples(seq, &params);
        assert_eq!(samples.len(), 13_230);

        assert!(samples[..4410].iter().all(|s| *s == 0.0));
        let peak = samples[4410..8820].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.45 && peak <= 0.5 + 1e-6);
        // Past the fade-out the tail is silent again.
        assert!(samples[9000..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_export_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        let builder = InstructionBuilder::new(OtaConfig::new(0.01, 0.02).unwrap());

        let written = export_to_wav(
            builder.text_stream("a").unwrap(),
            &ToneParams::default(),
            &path,
        )
        .unwrap();
        // 10 bits of 10 ms plus 20 ms of separator.
        assert_eq!(written, 5292);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len(), 5292);
    }

    #[test]
    fn test_export_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.wav");
        let result = export_to_wav(Vec::<ToneInstruction>::new(), &ToneParams::default(), path);
        assert!(matches!(result, Err(ToneError::Export(_))));
    }
}
