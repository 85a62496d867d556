//! Preset management commands.
//!
//! Lists, shows and exports presets. Exported files land in the user preset
//! directory unless an output path is given.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use walrus_config::{
    Preset, ensure_user_presets_dir, factory_presets, list_user_presets, load_preset,
    preset_name_from_path, user_presets_dir, validate_preset,
};
use walrus_effects::ControlId;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List available presets (factory and user)
    List {
        /// Show only factory presets
        #[arg(long)]
        factory: bool,

        /// Show only user presets
        #[arg(long)]
        user: bool,
    },

    /// Show the controls and engine options of a preset
    Show {
        /// Preset name or path
        name: String,
    },

    /// Write a preset as TOML
    Export {
        /// Preset name or path
        name: String,

        /// Output file (defaults to <user presets dir>/<name>.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the user preset directory
    Paths,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { factory, user } => list_presets(factory, user),
        PresetsCommand::Show { name } => show_preset(&name),
        PresetsCommand::Export {
            name,
            output,
            force,
        } => export_preset(&name, output, force),
        PresetsCommand::Paths => {
            println!("User presets: {}", user_presets_dir().display());
            Ok(())
        }
    }
}

fn list_presets(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    let show_factory = !user_only;
    let show_user = !factory_only;

    if show_factory {
        println!("Factory Presets:");
        println!("================");
        for preset in factory_presets() {
            let desc = preset.description.as_deref().unwrap_or("");
            println!("  {:12} - {}", preset.name.to_lowercase(), desc);
        }
        println!();
    }

    if show_user {
        println!("User Presets:");
        println!("=============");
        let user_presets = list_user_presets();
        if user_presets.is_empty() {
            println!("  (none)");
            println!();
            println!("  Copy a factory preset with: walrus presets export <name>\n");
        } else {
            for path in user_presets {
                let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
                match Preset::load(&path) {
                    Ok(preset) => {
                        let desc = preset.description.as_deref().unwrap_or("");
                        println!("  {:12} - {}", name, desc);
                    }
                    Err(e) => {
                        tracing::debug!(path = %path.display(), "{e}");
                        println!("  {:12} - (error loading)", name);
                    }
                }
            }
        }
        println!();
    }

    Ok(())
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let preset = load_preset(name)?;

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    println!();

    if let Some(desc) = &preset.description {
        println!("Description: {desc}");
        println!();
    }

    println!("Engine:");
    println!("  max delay      {} s", preset.engine.max_delay_seconds);
    println!("  filter         {:?}", preset.engine.filter);
    match preset.engine.silence_hold_samples {
        0 => println!("  silence fade   off"),
        n => println!("  silence fade   after {n} samples"),
    }
    println!();

    let snapshot = preset.to_snapshot();
    println!("Controls:");
    for id in ControlId::ALL {
        let desc = id.descriptor();
        let stored = if preset.control(id).is_some() { "" } else { "  (default)" };
        if id.is_toggle() {
            let state = if snapshot.get(id) >= 0.5 { "on" } else { "off" };
            println!("  {:16} {state}{stored}", id.key());
        } else {
            println!(
                "  {:16} {}{stored}",
                id.key(),
                with_unit(snapshot.get(id), desc.unit.suffix())
            );
        }
    }

    if let Err(e) = validate_preset(&preset) {
        println!();
        println!("Warning: {e}");
    }

    Ok(())
}

fn with_unit(value: f32, suffix: &str) -> String {
    if suffix.is_empty() {
        value.to_string()
    } else {
        format!("{value} {suffix}")
    }
}

fn export_preset(name: &str, output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let preset = load_preset(name)?;

    let path = match output {
        Some(path) => path,
        None => {
            let file = format!("{}.toml", preset.name.to_lowercase().replace(' ', "_"));
            ensure_user_presets_dir()?.join(file)
        }
    };

    if path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists. Use --force to overwrite.",
            path.display()
        );
    }

    preset.save(&path)?;
    tracing::info!(preset = %preset.name, path = %path.display(), "exported preset");
    println!("Exported '{}' to {}", preset.name, path.display());
    Ok(())
}
