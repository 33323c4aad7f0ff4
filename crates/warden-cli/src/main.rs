//! `warden` CLI — filter JSON documents by group, API version and view
//! dimension using a schema file.
//!
//! ## Usage
//!
//! ```sh
//! # Filter stdin → stdout for API consumers in "read" mode at version 2
//! cat users.json | warden filter -s schema.json -t User --groups api --dimension type=read --api-version 2
//!
//! # Several groups, file to file, compact output
//! warden filter -s schema.json -t User --groups api,personal -i users.json -o out.json --compact
//!
//! # Validate a schema file and list its types
//! warden check -s schema.json
//! ```
//!
//! Set `RUST_LOG=warden_core=trace` to see every excluded field.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use warden_core::{Options, Schema, Version};

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Filter JSON by permission group, API version and view dimension"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a JSON document
    Filter {
        /// Schema file describing the document's types
        #[arg(short, long)]
        schema: String,
        /// Schema type of the document root (arrays apply it per element)
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Comma-separated values accepted in the default group dimension
        #[arg(long)]
        groups: Option<String>,
        /// Accepted values for a named dimension, as name=v1,v2 (repeatable)
        #[arg(long = "dimension", value_name = "NAME=VALUES")]
        dimensions: Vec<String>,
        /// Requested API version (e.g. 2 or 2.1.0)
        #[arg(long)]
        api_version: Option<String>,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Validate a schema file and list its types
    Check {
        /// Schema file to validate
        #[arg(short, long)]
        schema: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Filter {
            schema,
            type_name,
            groups,
            dimensions,
            api_version,
            input,
            output,
            compact,
        } => {
            let schema = load_schema(&schema)?;
            let options =
                build_options(groups.as_deref(), &dimensions, api_version.as_deref())?;
            debug!(?options, "criteria");

            let json = read_input(input.as_deref())?;
            let value: serde_json::Value =
                serde_json::from_str(&json).context("Input is not valid JSON")?;
            let doc = schema
                .document(&type_name, &value)
                .with_context(|| format!("Cannot apply type '{}'", type_name))?;

            let rendered = if compact {
                warden_core::to_string(&options, &doc)
            } else {
                warden_core::to_string_pretty(&options, &doc)
            }
            .context("Failed to filter document")?;

            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Check { schema } => {
            let schema = load_schema(&schema)?;
            for name in schema.type_names() {
                let fields = schema.descriptor(name).map_or(0, |d| d.fields().len());
                println!("{}: {} fields", name, fields);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_schema(path: &str) -> Result<Schema> {
    Schema::from_path(path).with_context(|| format!("Invalid schema file: {}", path))
}

/// Build criteria from the command-line arguments.
///
/// - `--groups api,personal` accepts both groups
/// - `--dimension type=read,list` accepts both values in the "type" dimension
/// - empty value lists add no selector (the dimension is not filtered)
fn build_options(
    groups: Option<&str>,
    dimensions: &[String],
    api_version: Option<&str>,
) -> Result<Options> {
    let mut options = Options::new();

    if let Some(raw) = groups {
        options = options.groups(split_list(raw));
    }

    for spec in dimensions {
        let (name, values) = spec.split_once('=').with_context(|| {
            format!("Invalid --dimension '{}': expected NAME=VALUES", spec)
        })?;
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Invalid --dimension '{}': dimension name is empty", spec);
        }
        options = options.dimension(name, split_list(values));
    }

    if let Some(raw) = api_version {
        let version = Version::parse(raw).with_context(|| format!("Invalid --api-version '{}'", raw))?;
        options = options.api_version(version);
    }

    Ok(options)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
