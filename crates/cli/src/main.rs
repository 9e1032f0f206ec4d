#![deny(unsafe_code)]
//! CLI for checking glforge assets without a GL context.
//!
//! Subcommands:
//! - `check <manifest>`: validate a manifest and print attach plans and formats
//! - `image <path>`: decode an image the way the texture loader would
//! - `stages`: list shader stages and their file extensions

mod error;
mod report;

use clap::{Parser, Subcommand};
use error::CliError;
use glforge_core::{load_rgba, Manifest};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "glforge", about = "Check shader and framebuffer assets")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log filter in `env_logger` syntax; overrides RUST_LOG.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a manifest: stage files exist, stage kinds match, sizes are valid.
    Check {
        /// Path to the manifest JSON file.
        manifest: PathBuf,
    },
    /// Decode an image to RGBA8 and report its size.
    Image {
        /// Image file path.
        path: PathBuf,
    },
    /// List shader stages and their conventional file extensions.
    Stages,
}

fn init_logging(filter: Option<&str>) {
    let mut builder = env_logger::Builder::new();
    match filter {
        Some(filter) => {
            builder.parse_filters(filter);
        }
        None => match std::env::var("RUST_LOG") {
            Ok(filter) => {
                builder.parse_filters(&filter);
            }
            Err(_) => {
                builder.filter_level(log::LevelFilter::Warn);
            }
        },
    }
    builder.init();
    log::debug!("logging initialized");
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Check { manifest } => {
            let loaded = Manifest::load(&manifest)?;
            let report = loaded.validate()?;
            if cli.json {
                let value = report::manifest_json(&loaded, &report);
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", report::manifest_text(&loaded, &report));
                eprintln!("{} ok", manifest.display());
            }
        }
        Command::Image { path } => {
            let rgba = load_rgba(&path)?;
            let (width, height) = rgba.dimensions();
            if cli.json {
                let info = serde_json::json!({
                    "path": path.display().to_string(),
                    "width": width,
                    "height": height,
                    "bytes": rgba.as_raw().len(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!(
                    "{}: {width}x{height} RGBA8 ({} bytes)",
                    path.display(),
                    rgba.as_raw().len()
                );
            }
        }
        Command::Stages => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report::stage_json())?);
            } else {
                for stage in glforge_core::ShaderStage::all() {
                    println!("  .{:<5} {stage}", stage.extension());
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
