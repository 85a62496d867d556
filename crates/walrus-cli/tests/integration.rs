//! Integration tests for walrus-cli.
//!
//! Runs the built `walrus` binary against temporary WAV and preset files.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// The `walrus` binary with its config directory pointed into `home`.
fn walrus_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_walrus"));
    cmd.env("XDG_CONFIG_HOME", home).env("RUST_LOG", "warn");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run walrus")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_impulse(path: &Path, frames: usize, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        writer.write_sample(if i == 0 { 1.0f32 } else { 0.0 }).unwrap();
    }
    writer.finalize().unwrap();
}

/// Returns (left, right, spec).
fn read_stereo(path: &Path) -> (Vec<f32>, Vec<f32>, hound::WavSpec) {
    let reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples: Vec<f32> = reader.into_samples::<f32>().map(Result::unwrap).collect();
    let left = samples.iter().step_by(2).copied().collect();
    let right = samples.iter().skip(1).step_by(2).copied().collect();
    (left, right, spec)
}

const CLEAN_ECHO: &[&str] = &[
    "--set", "DelayTime=100",
    "--set", "Feedback=0.5",
    "--set", "DryWet=1",
    "--set", "WowDepth=0",
    "--set", "FlutterDepth=0",
    "--set", "FilterFreq=20000",
    "--set", "Saturation=0",
    "--set", "ReverbOnOff=off",
];

// ---------------------------------------------------------------------------
// walrus process
// ---------------------------------------------------------------------------

#[test]
fn process_places_first_echo_at_delay_time() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_impulse(&input, 10_000, 44100);

    let result = run(walrus_bin(dir.path())
        .arg("process")
        .arg(&input)
        .arg(&output)
        .args(CLEAN_ECHO));
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (left, right, spec) = read_stereo(&output);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(left.len(), 10_000);
    assert!(left[..4410].iter().all(|&s| s == 0.0));
    assert!(left[4410] > 0.9, "first echo {}", left[4410]);
    assert_eq!(left, right, "mono input feeds both channels");
}

#[test]
fn process_tail_extends_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_impulse(&input, 1000, 48000);

    let result = run(walrus_bin(dir.path())
        .args(["process", "--tail", "--max-tail", "0.5", "--bit-depth", "32"])
        .arg(&input)
        .arg(&output));
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (left, _, _) = read_stereo(&output);
    assert_eq!(left.len(), 1000 + 24_000);
    assert!(left.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
}

#[test]
fn process_with_factory_preset_and_16_bit_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_impulse(&input, 4800, 48000);

    let result = run(walrus_bin(dir.path())
        .args(["process", "--preset", "warped", "--bit-depth", "16"])
        .arg(&input)
        .arg(&output));
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let spec = hound::WavReader::open(&output).unwrap().spec();
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
}

#[test]
fn process_rejects_unknown_control() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    write_impulse(&input, 100, 48000);

    let result = run(walrus_bin(dir.path())
        .arg("process")
        .arg(&input)
        .arg(dir.path().join("out.wav"))
        .args(["--set", "Drive=1"]));
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("unknown control 'Drive'"), "{stderr}");
    assert!(!dir.path().join("out.wav").exists());
}

#[test]
fn process_rejects_missing_preset() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    write_impulse(&input, 100, 48000);

    let result = run(walrus_bin(dir.path())
        .args(["process", "--preset", "no_such_preset"])
        .arg(&input)
        .arg(dir.path().join("out.wav")));
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("preset not found"));
}

// ---------------------------------------------------------------------------
// walrus presets
// ---------------------------------------------------------------------------

#[test]
fn presets_list_shows_factory_presets() {
    let dir = TempDir::new().unwrap();
    let result = run(walrus_bin(dir.path()).args(["presets", "list", "--factory"]));
    assert!(result.status.success());

    let out = stdout(&result);
    for name in ["classic", "slapback", "warped", "space", "clean"] {
        assert!(out.contains(name), "missing '{name}' in:\n{out}");
    }
}

#[test]
fn presets_show_prints_controls() {
    let dir = TempDir::new().unwrap();
    let result = run(walrus_bin(dir.path()).args(["presets", "show", "slapback"]));
    assert!(result.status.success());

    let out = stdout(&result);
    assert!(out.contains("Preset: Slapback"), "{out}");
    assert!(out.contains("DelayTime"), "{out}");
    assert!(out.contains("110 ms"), "{out}");
    assert!(out.contains("ReverbOnOff"), "{out}");
}

#[test]
fn presets_export_writes_loadable_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mine.toml");

    let result = run(walrus_bin(dir.path())
        .args(["presets", "export", "space", "--output"])
        .arg(&path));
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("name = \"Space\""), "{text}");

    // A second export refuses to overwrite without --force.
    let again = run(walrus_bin(dir.path())
        .args(["presets", "export", "space", "--output"])
        .arg(&path));
    assert!(!again.status.success());

    // The exported file resolves as a literal path.
    let shown = run(walrus_bin(dir.path())
        .args(["presets", "show"])
        .arg(&path));
    assert!(stdout(&shown).contains("Preset: Space"));
}

// ---------------------------------------------------------------------------
// walrus info
// ---------------------------------------------------------------------------

#[test]
fn info_reports_buffer_and_tail() {
    let dir = TempDir::new().unwrap();
    let result = run(walrus_bin(dir.path()).args(["info", "--sample-rate", "44100"]));
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let out = stdout(&result);
    assert!(out.contains("Delay buffer:  262144 samples"), "{out}");
    assert!(out.contains("Tail:"), "{out}");
    assert!(out.contains("TapeDelayOnOff"), "{out}");
}

#[test]
fn info_rejects_bad_sample_rate() {
    let dir = TempDir::new().unwrap();
    let result = run(walrus_bin(dir.path()).args(["info", "--sample-rate", "0"]));
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("invalid sample rate"));
}
