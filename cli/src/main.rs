//! anuvad: consensus-message normalization CLI.
//!
//! Thin driver around the codec engine: converts messages between wire
//! formats, sniffs formats, looks up synonym tables, and runs the
//! self-check round-trip matrix. Descriptor-set loading (files and the
//! `ANUVAD_DESC_FILES` environment variable) is wired here; the engine
//! itself never touches the filesystem.

mod selftest;

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use anuvad_codec::{
    default_provider, detect_format, field_synonym, phase_synonym, process_registry, Format,
    ParseOptions, SerializeOptions,
};

/// List separator for `ANUVAD_DESC_FILES`.
const DESC_FILES_ENV: &str = "ANUVAD_DESC_FILES";

#[derive(Parser)]
#[command(name = "anuvad", version, about = "Normalize consensus messages across wire formats")]
struct Cli {
    /// Descriptor-set file to register before running (repeatable)
    #[arg(long = "descriptors", global = true, value_name = "FILE")]
    descriptors: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a message between wire formats
    Convert {
        /// Input format
        #[arg(long, default_value = "auto")]
        from: Format,
        /// Output format
        #[arg(long, default_value = "json")]
        to: Format,
        /// Fully-qualified protobuf message name (for protobuf input/output)
        #[arg(long)]
        msg_name: Option<String>,
        /// Message-type override, used verbatim
        #[arg(long)]
        override_type: Option<String>,
        /// Drop fields the protobuf schema does not know instead of erroring
        #[arg(long)]
        discard_unknown: bool,
        /// Print output as hex instead of raw bytes
        #[arg(long)]
        hex: bool,
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Print the detected wire format of the input
    Detect {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Look up phase/field synonym tables
    Synonyms {
        /// Phase token to resolve
        #[arg(long)]
        phase: Option<String>,
        /// Field name to resolve
        #[arg(long)]
        field: Option<String>,
    },
    /// Run the per-format round-trip, mutation, and synonym self-checks
    Selftest,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    register_descriptors(&cli.descriptors);

    match cli.command {
        Command::Convert {
            from,
            to,
            msg_name,
            override_type,
            discard_unknown,
            hex,
            file,
        } => convert(from, to, msg_name, override_type, discard_unknown, hex, file),
        Command::Detect { file } => {
            let data = read_input(file.as_deref())?;
            println!("{}", detect_format(&data));
            Ok(())
        }
        Command::Synonyms { phase, field } => synonyms(phase, field),
        Command::Selftest => selftest::run(),
    }
}

/// Register descriptor-set files from `--descriptors` and the
/// `ANUVAD_DESC_FILES` environment variable (`:`-separated paths) into the
/// process registry. Failures are logged, not fatal: a missing descriptor
/// only matters once a protobuf conversion needs it.
fn register_descriptors(flags: &[PathBuf]) {
    let mut paths: Vec<PathBuf> = flags.to_vec();
    if let Ok(list) = std::env::var(DESC_FILES_ENV) {
        paths.extend(
            list.split(':')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
    }
    for path in paths {
        match std::fs::read(&path) {
            Ok(bytes) => match process_registry().register_descriptor_set(&bytes) {
                Ok(()) => info!(path = %path.display(), "registered descriptor set"),
                Err(e) => warn!(path = %path.display(), error = %e, "descriptor registration failed"),
            },
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read descriptor file"),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn convert(
    from: Format,
    to: Format,
    msg_name: Option<String>,
    override_type: Option<String>,
    discard_unknown: bool,
    hex_out: bool,
    file: Option<PathBuf>,
) -> Result<()> {
    let data = read_input(file.as_deref())?;

    let message = anuvad_codec::parse(
        &data,
        &ParseOptions {
            format: from,
            override_msg_type: override_type,
            proto_message_full_name: msg_name.clone(),
            descriptor_provider: Some(default_provider()),
            proto_discard_unknown: discard_unknown,
        },
    )
    .with_context(|| format!("parsing {from} input"))?;

    let out = anuvad_codec::serialize(
        &message,
        &SerializeOptions {
            format: to,
            proto_message_full_name: msg_name,
            descriptor_provider: Some(default_provider()),
            proto_discard_unknown: discard_unknown,
        },
    )
    .with_context(|| format!("serializing to {to}"))?;

    if hex_out {
        println!("{}", hex::encode(&out));
    } else {
        std::io::stdout().write_all(&out)?;
    }
    Ok(())
}

fn synonyms(phase: Option<String>, field: Option<String>) -> Result<()> {
    if phase.is_none() && field.is_none() {
        anyhow::bail!("pass --phase and/or --field");
    }
    if let Some(token) = phase {
        match phase_synonym(&token) {
            Some(canonical) => println!("phase {} {} {}", token.cyan(), "→".dimmed(), canonical.green()),
            None => println!("phase {} {} {}", token.cyan(), "→".dimmed(), "not found".red()),
        }
    }
    if let Some(name) = field {
        match field_synonym(&name) {
            Some(canonical) => println!(
                "field {} {} {}",
                name.cyan(),
                "→".dimmed(),
                canonical.name().green()
            ),
            None => println!("field {} {} {}", name.cyan(), "→".dimmed(), "not found".red()),
        }
    }
    Ok(())
}

fn read_input(file: Option<&std::path::Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}
