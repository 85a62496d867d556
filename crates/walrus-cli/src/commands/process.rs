//! File-based tape delay processing.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use walrus_config::{ControlValue, Preset, ValidationError, load_preset, validate_control};
use walrus_core::linear_to_db;
use walrus_effects::{ControlId, SharedControls, TapeDelay};

use crate::wav::{StereoSamples, read_wav_stereo, write_wav_stereo};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file (mono is duplicated to both channels)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (stereo)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Factory preset, user preset name or preset file
    #[arg(short, long)]
    preset: Option<String>,

    /// Control override by ID, e.g. "DelayTime=350" or "ReverbOnOff=off"
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val, number_of_values = 1)]
    set: Vec<(String, String)>,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Append silence so the repeats and reverb can ring out
    #[arg(long)]
    tail: bool,

    /// Upper bound on the appended tail in seconds
    #[arg(long, default_value = "30")]
    max_tail: f32,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("invalid control format: '{s}' (expected KEY=VALUE)")),
    }
}

/// Parses an override value: `true/false/on/off` or a number.
fn parse_control_value(raw: &str) -> anyhow::Result<ControlValue> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Ok(ControlValue::Toggle(true)),
        "false" | "off" | "no" => Ok(ControlValue::Toggle(false)),
        _ => raw
            .parse::<f64>()
            .map(ControlValue::Number)
            .with_context(|| format!("'{raw}' is neither a number nor on/off")),
    }
}

/// Applies `--set` overrides on top of a preset.
///
/// Toggles also accept numbers (>= 0.5 is on). Unknown keys and wrong value
/// kinds are errors; out-of-range numbers are kept (the processor clamps
/// them) with a warning.
fn apply_overrides(preset: &mut Preset, overrides: &[(String, String)]) -> anyhow::Result<()> {
    for (key, raw) in overrides {
        let mut value = parse_control_value(raw)?;
        if let (Some(id), ControlValue::Number(v)) = (ControlId::from_key(key), value)
            && id.is_toggle()
        {
            value = ControlValue::Toggle(v >= 0.5);
        }
        let id = match validate_control(key, value) {
            Ok(id) => id,
            Err(ValidationError::OutOfRange { min, max, .. }) => {
                tracing::warn!(control = %key, value = %value, min, max, "value will be clamped");
                ControlId::from_key(key).context("validated key")?
            }
            Err(e) => {
                let keys: Vec<_> = ControlId::ALL.iter().map(|id| id.key()).collect();
                anyhow::bail!("{e} (controls: {})", keys.join(", "));
            }
        };
        preset.controls.insert(id.key().to_string(), value);
    }
    Ok(())
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let mut preset = match &args.preset {
        Some(name) => load_preset(name)?,
        None => Preset::new("command line"),
    };
    apply_overrides(&mut preset, &args.set)?;
    if let Err(e) = walrus_config::validate_preset(&preset) {
        tracing::warn!("preset '{}': {e}", preset.name);
    }

    println!("Reading {}...", args.input.display());
    let (mut samples, spec) = read_wav_stereo(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} ch, {} Hz, {:.2}s",
        samples.len(),
        spec.channels,
        spec.sample_rate,
        samples.len() as f32 / sample_rate
    );

    let mut delay = TapeDelay::new(
        preset.prepare_spec(sample_rate, args.block_size),
        preset.engine_config(),
    )?;
    let shared = SharedControls::new(&preset.to_snapshot());
    delay.set_controls(&shared.snapshot());
    delay.reset();
    tracing::info!(preset = %preset.name, sample_rate, block_size = args.block_size, "processing");

    let input_peak = peak(&samples);
    if args.tail {
        let tail_secs = delay.tail_seconds().min(args.max_tail.max(0.0));
        let frames = (tail_secs * sample_rate).ceil() as usize;
        tracing::info!(seconds = tail_secs, frames, "appending tail");
        samples.pad(frames);
    }

    let pb = ProgressBar::new(samples.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let block_size = args.block_size;
    let total = samples.len();
    let StereoSamples { left, right } = &mut samples;
    for (i, (l, r)) in left
        .chunks_mut(block_size)
        .zip(right.chunks_mut(block_size))
        .enumerate()
    {
        delay.process_block(l, r, &shared.snapshot());
        pb.set_position(((i + 1) * block_size).min(total) as u64);
    }
    pb.finish_with_message("done");

    let diagnostics = delay.diagnostics();
    if !diagnostics.is_clean() {
        tracing::warn!(
            clamped_controls = diagnostics.clamped_controls,
            clamped_samples = diagnostics.clamped_samples,
            non_finite_resets = diagnostics.non_finite_resets,
            "processor recovered from out-of-range values"
        );
    }

    println!("\nStats:");
    println!("  Input:  Peak {:.1} dB", linear_to_db(input_peak));
    println!("  Output: Peak {:.1} dB", linear_to_db(peak(&samples)));

    println!("\nWriting {}...", args.output.display());
    write_wav_stereo(&args.output, &samples, spec.sample_rate, args.bit_depth)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Done!");

    Ok(())
}

fn peak(samples: &StereoSamples) -> f32 {
    samples
        .left
        .iter()
        .chain(samples.right.iter())
        .map(|s| s.abs())
        .fold(0.0, f32::max)
}
