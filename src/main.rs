//! otatone - transmit text as tone on/off intervals.
//!
//! Plays the framed transmission on the default audio device, or renders it
//! to a WAV file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- "hello"                    # Play with default settings
//! cargo run -- --bit-length 0.05 "hello"  # Faster bits
//! cargo run -- --wav out.wav "hello"      # Render to a file instead
//! cargo run -- --calibrate                # Measure timing drift
//! ```

use anyhow::{bail, Context, Result};
use otatone::{
    export_to_wav, InstructionSequence, OtaConfig, OtaEncoder, PlaybackReport, PlaybackScheduler,
    Settings, ToneEngine, ToneInstruction, ToneParams,
};
use std::path::PathBuf;

/// Bits in the calibration burst.
const CALIBRATION_BITS: usize = 8;

/// Command-line options for the application.
#[derive(Debug, Default)]
struct CliOptions {
    /// Settings file to start from.
    config: Option<PathBuf>,
    /// Overrides for the settings file.
    bit_length: Option<f64>,
    byte_sep: Option<f64>,
    frequency: Option<f32>,
    volume: Option<f32>,
    /// Skip the synchronization preamble.
    no_preamble: bool,
    /// Render to this WAV file instead of playing.
    wav: Option<PathBuf>,
    /// Write the effective settings to this file.
    write_config: Option<PathBuf>,
    /// Play a timing burst and report drift.
    calibrate: bool,
    /// Text to transmit.
    text: Option<String>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--config <path>` or `-c <path>`: Load settings from a JSON file
    /// - `--bit-length <secs>`, `--byte-sep <secs>`: Line timing
    /// - `--frequency <hz>`, `--volume <0-1>`: Carrier tone
    /// - `--no-preamble`: Send the payload without the sync header
    /// - `--wav <path>` or `-w <path>`: Render to a WAV file
    /// - `--write-config <path>`: Save the effective settings
    /// - `--calibrate`: Play a short burst and print timing drift
    /// - `--help` or `-h`: Print help and exit
    ///
    /// Remaining arguments are joined with spaces into the text to send.
    fn parse() -> Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut opts = Self::default();
        let mut words: Vec<String> = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => opts.config = Some(next_value(&mut args, "--config")?.into()),
                "--bit-length" | "-b" => opts.bit_length = Some(number_arg(&mut args, "--bit-length")?),
                "--byte-sep" | "-s" => opts.byte_sep = Some(number_arg(&mut args, "--byte-sep")?),
                "--frequency" | "-f" => opts.frequency = Some(number_arg(&mut args, "--frequency")?),
                "--volume" | "-v" => opts.volume = Some(number_arg(&mut args, "--volume")?),
                "--wav" | "-w" => opts.wav = Some(next_value(&mut args, "--wav")?.into()),
                "--write-config" => {
                    opts.write_config = Some(next_value(&mut args, "--write-config")?.into())
                }
                "--no-preamble" => opts.no_preamble = true,
                "--calibrate" => opts.calibrate = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--" => words.extend(args.by_ref()),
                other if other.starts_with('-') && other.len() > 1 => {
                    bail!("Unknown option: {} (use --help for usage information)", other)
                }
                other => words.push(other.to_string()),
            }
        }

        if !words.is_empty() {
            opts.text = Some(words.join(" "));
        }
        Ok(opts)
    }

    /// Builds the effective settings: file (or defaults), then CLI overrides.
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from_file(path)
                .with_context(|| format!("Failed to load settings: {}", path.display()))?,
            None => Settings::default(),
        };

        if self.bit_length.is_some() || self.byte_sep.is_some() {
            settings.ota = OtaConfig::new(
                self.bit_length.unwrap_or(settings.ota.bit_length()),
                self.byte_sep.unwrap_or(settings.ota.byte_sep()),
            )?;
        }
        if self.frequency.is_some() || self.volume.is_some() {
            settings.tone = ToneParams::new(
                self.frequency.unwrap_or(settings.tone.frequency()),
                self.volume.unwrap_or(settings.tone.volume()),
            )?;
        }
        if self.no_preamble {
            settings.preamble = false;
        }
        Ok(settings)
    }
}

fn next_value<I: Iterator<Item = String>>(args: &mut I, name: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("{} requires a value", name))
}

fn number_arg<T, I>(args: &mut I, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    I: Iterator<Item = String>,
{
    let raw = next_value(args, name)?;
    raw.parse()
        .with_context(|| format!("Invalid value for {}: {:?}", name, raw))
}

fn print_help() {
    eprintln!("otatone - Over-the-air acoustic transmitter");
    eprintln!();
    eprintln!("Usage: otatone [OPTIONS] [TEXT]...");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config PATH       Load settings from a JSON file");
    eprintln!("  -b, --bit-length SECS   Seconds per bit (default 0.08)");
    eprintln!("  -s, --byte-sep SECS     Seconds of silence between bytes (default 1.0)");
    eprintln!("  -f, --frequency HZ      Tone frequency (default 3400)");
    eprintln!("  -v, --volume LEVEL      Tone volume, 0 to 1 (default 0.2)");
    eprintln!("      --no-preamble       Do not send the synchronization preamble");
    eprintln!("  -w, --wav PATH          Render to a WAV file instead of playing");
    eprintln!("      --write-config PATH Save the effective settings as JSON");
    eprintln!("      --calibrate         Play a short burst and report timing drift");
    eprintln!("  -h, --help              Print this help message");
    eprintln!();
    eprintln!("Characters must be in the range U+0000..U+00FF. Only transmission is");
    eprintln!("supported; there is no decoder.");
}

fn print_report(report: &PlaybackReport) {
    println!("Requested: {:.4} seconds.", report.requested.as_secs_f64());
    println!("Actual: {:.4} seconds.", report.actual.as_secs_f64());
    println!("Diff: {:.4} seconds.", report.drift().as_secs_f64());
    println!("Ratio: {:.3}%.", report.drift_ratio() * 100.0);
}

/// Plays alternating tone/silence bits and reports how far the wall clock
/// drifted from the requested timing.
fn calibrate(settings: &Settings) -> Result<()> {
    let bit = settings.ota.bit_duration();
    let burst: InstructionSequence = (0..CALIBRATION_BITS)
        .map(|i| ToneInstruction::new(i % 2 == 0, bit))
        .collect();

    let engine = ToneEngine::new(settings.tone).context("Failed to open audio output")?;
    let mut player = PlaybackScheduler::new(engine);
    let report = player.play(&burst).context("Calibration playback failed")?;
    print_report(&report);
    Ok(())
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    // Initialize logging (RUST_LOG=debug for scheduler detail)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = cli.settings()?;

    if let Some(path) = &cli.write_config {
        settings
            .save_to_file(path)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        tracing::info!("Saved settings to {}", path.display());
    }

    if cli.calibrate {
        return calibrate(&settings);
    }

    let text = match &cli.text {
        Some(text) => text,
        None if cli.write_config.is_some() => return Ok(()),
        None => bail!("Nothing to send (use --help for usage information)"),
    };

    // Validate the whole payload before touching the audio device.
    let encoder = OtaEncoder::new(settings.ota);
    let payload = encoder.builder().text_stream(text)?;
    let preamble = if settings.preamble {
        encoder.config_instructions()
    } else {
        InstructionSequence::new()
    };
    let instructions = preamble.into_iter().chain(payload);

    if let Some(path) = &cli.wav {
        export_to_wav(instructions, &settings.tone, path)
            .with_context(|| format!("Failed to export WAV: {}", path.display()))?;
        return Ok(());
    }

    let engine = ToneEngine::new(settings.tone).context("Failed to open audio output")?;
    let mut player = PlaybackScheduler::new(engine);
    let report = player.play(instructions).context("Playback failed")?;
    tracing::info!(
        "Sent {} characters in {:.2} s (drift {:.1} ms)",
        text.chars().count(),
        report.actual.as_secs_f64(),
        report.drift().as_secs_f64() * 1000.0
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_text_and_overrides() {
        let opts = parse(&["-b", "0.05", "--no-preamble", "hello", "world"]).unwrap();
        assert_eq!(opts.bit_length, Some(0.05));
        assert!(opts.no_preamble);
        assert_eq!(opts.text.as_deref(), Some("hello world"));

        let settings = opts.settings().unwrap();
        assert_eq!(settings.ota.bit_length(), 0.05);
        assert_eq!(settings.ota.byte_sep(), 1.0);
        assert!(!settings.preamble);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["--bit-length"]).is_err());
        assert!(parse(&["--volume", "loud"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let opts = parse(&["--byte-sep", "-1", "x"]).unwrap();
        assert!(opts.settings().is_err());
    }

    #[test]
    fn test_double_dash_passes_dashes_through() {
        let opts = parse(&["--", "-x", "y"]).unwrap();
        assert_eq!(opts.text.as_deref(), Some("-x y"));
    }
}
