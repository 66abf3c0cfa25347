//! `fls`: inspect and convert field-line state files.
//!
//! Usage:
//!   fls inspect state.osfls
//!   fls convert lines.json --output-dir out --model batsrus --scale 6371000
//!   fls convert 2000-01-01T12-00-00.000.osfls --output-dir out --json
//!   fls schema > options.schema.json

#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use fieldlines::{load_state_file, FieldlinesState, Model, Options};

/// Field-line state file tool.
#[derive(Parser, Debug)]
#[command(name = "fls")]
#[command(about = "Inspect and convert field-line state files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of a .osfls or .json state file
    Inspect {
        /// State file to read
        input: PathBuf,
        /// Model assigned to JSON input
        #[arg(long, default_value = "batsrus")]
        model: String,
        /// Factor converting JSON coordinates to meters
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
    /// Convert a state file to .osfls (default) or .json
    Convert {
        /// State file to read
        input: PathBuf,
        /// Directory the converted file is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Write JSON instead of .osfls
        #[arg(long)]
        json: bool,
        /// Model assigned to JSON input
        #[arg(long, default_value = "batsrus")]
        model: String,
        /// Factor converting JSON coordinates to meters
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
    /// Print the JSON Schema of the options file
    Schema,
}

fn parse_model(name: &str) -> Result<Model> {
    match Model::from_name(name) {
        Model::Invalid => bail!("unknown model '{name}' (expected batsrus, enlil or pfss)"),
        model => Ok(model),
    }
}

fn inspect(state: &FieldlinesState) {
    println!("model:          {:?}", state.model());
    match fieldlines::time::iso_from_j2000(state.trigger_time()) {
        Ok(iso) => println!("trigger time:   {iso} ({} s)", state.trigger_time()),
        Err(_) => println!("trigger time:   {} s", state.trigger_time()),
    }
    println!("lines:          {}", state.n_lines());
    println!("vertices:       {}", state.vertex_positions().len());
    println!("extra names:    {}", state.extra_quantity_names().join(", "));
    println!("matched pairs:  {}", state.matching_fieldlines().len());
    for (i, pair) in state.matching_fieldlines().iter().enumerate() {
        println!(
            "  pair {i}: born {:.1}, dies {:.1}, {} + {} key frames",
            pair.first.birth_time,
            pair.first.death_time,
            pair.first.key_frames.len(),
            pair.second.key_frames.len(),
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Command::Inspect { input, model, scale } => {
            let state = load_state_file(&input, parse_model(&model)?, scale)
                .with_context(|| format!("reading {}", input.display()))?;
            inspect(&state);
        }
        Command::Convert {
            input,
            output_dir,
            json,
            model,
            scale,
        } => {
            let state = load_state_file(&input, parse_model(&model)?, scale)
                .with_context(|| format!("reading {}", input.display()))?;
            std::fs::create_dir_all(&output_dir)?;
            let written = if json {
                let stem = input.file_stem().unwrap_or(input.as_os_str());
                state.save_json(&output_dir.join(stem))?
            } else {
                state.save_osfls(&output_dir)?
            };
            println!("{}", written.display());
        }
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&Options::json_schema())?;
            println!("{schema}");
        }
    }
    Ok(())
}
