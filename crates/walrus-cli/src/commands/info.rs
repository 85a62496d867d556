//! Control ranges, buffer sizes and tail length for an audio configuration.

use clap::Args;
use walrus_config::{Preset, load_preset};
use walrus_effects::{ControlId, TapeDelay};

/// Show processor information.
#[derive(Args)]
pub struct InfoArgs {
    /// Sample rate in Hz
    #[arg(short, long, default_value = "48000")]
    pub sample_rate: f32,

    /// Processing block size
    #[arg(long, default_value = "512")]
    pub block_size: usize,

    /// Preset whose engine options and feedback are used
    #[arg(short, long)]
    pub preset: Option<String>,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let preset = match &args.preset {
        Some(name) => load_preset(name)?,
        None => Preset::default(),
    };

    let mut delay = TapeDelay::new(
        preset.prepare_spec(args.sample_rate, args.block_size),
        preset.engine_config(),
    )?;
    delay.set_controls(&preset.to_snapshot());

    println!("Controls:");
    println!("  {:16} {:16} {:>18} {:>9}", "ID", "Name", "Range", "Default");
    for id in ControlId::ALL {
        let d = id.descriptor();
        let range = if id.is_toggle() {
            "off/on".to_string()
        } else {
            format!("{}-{} {}", d.min, d.max, d.unit.suffix())
        };
        let default = if id.is_toggle() {
            let state = if d.default >= 0.5 { "on" } else { "off" };
            state.to_string()
        } else {
            d.default.to_string()
        };
        println!("  {:16} {:16} {:>18} {:>9}", d.key, d.name, range.trim_end(), default);
    }
    println!();

    let spec = delay.spec();
    println!("Engine ({}):", preset.name);
    println!("  Sample rate:   {} Hz", spec.sample_rate);
    println!("  Block size:    {}", spec.max_block_size);
    println!("  Max delay:     {} s", spec.max_delay_seconds);
    if let Some(channel) = delay.channel(0) {
        let len = channel.delay_line().len();
        println!(
            "  Delay buffer:  {len} samples per channel ({})",
            format_bytes((len * 2 * std::mem::size_of::<f32>()) as u64)
        );
    }
    println!("  Filter:        {:?}", delay.config().filter_kind);
    println!(
        "  Silence fade:  {}",
        if delay.config().feedback_fade.is_some() { "on" } else { "off" }
    );
    println!(
        "  Tail:          {:.2} s at feedback {}",
        delay.tail_seconds(),
        delay.control(ControlId::Feedback)
    );

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
