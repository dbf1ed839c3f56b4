//! # objmap-cli
//!
//! Command-line interface for the objmap mapping engine.
//!
//! Type descriptors are loaded from YAML/JSON files, mapping profiles from
//! YAML, and the mapper options from an optional configuration file.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use objmap_core::{DeclarativeProfile, Mapper, MapperConfig};
use objmap_schema::DescriptorLoader;
use objmap_value::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "objmap")]
#[command(about = "Object-to-object mapping engine CLI")]
#[command(version)]
struct Cli {
    /// Path to a mapper configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a JSON object, or an array of objects, to a destination type
    Map {
        /// Input JSON file
        input: PathBuf,

        /// Type descriptor file; may be repeated
        #[arg(short, long = "types", required = true)]
        types: Vec<PathBuf>,

        /// Destination type
        #[arg(short, long)]
        destination: String,

        /// Mapping profile file
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Type of the input records; untyped input is mapped by exact name
        #[arg(short, long)]
        source_type: Option<String>,

        /// Output file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show property pairs discovered by naming convention
    Discover {
        /// Type descriptor file; may be repeated
        #[arg(short, long = "types", required = true)]
        types: Vec<PathBuf>,

        /// Source type
        #[arg(short, long)]
        source: String,

        /// Destination type
        #[arg(short, long)]
        destination: String,

        /// Minimum confidence, between 0 and 1
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Apply a profile and seal every mapping it configures
    Check {
        /// Type descriptor file; may be repeated
        #[arg(short, long = "types", required = true)]
        types: Vec<PathBuf>,

        /// Mapping profile file
        #[arg(short, long)]
        profile: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => MapperConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MapperConfig::default(),
    };

    match cli.command {
        Commands::Map {
            input,
            types,
            destination,
            profile,
            source_type,
            output,
        } => {
            let mapper = build_mapper(&types, config)?;
            if let Some(profile) = &profile {
                add_profile(&mapper, profile)?;
            }
            tracing::info!("Mapping {} -> {}", input.display(), destination);

            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let source = Value::parse_json(&text)
                .with_context(|| format!("Invalid JSON in {}", input.display()))?;
            let mapped = match source {
                Value::List(items) => {
                    let items: Vec<Value> = items
                        .into_iter()
                        .map(|item| tag(item, source_type.as_deref()))
                        .collect();
                    Value::List(mapper.map_array(&items, &destination)?)
                }
                other => mapper.map(&tag(other, source_type.as_deref()), &destination)?,
            };

            let json = serde_json::to_string_pretty(&mapped.to_json())?;
            match output {
                Some(path) => std::fs::write(&path, json + "\n")
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Commands::Discover {
            types,
            source,
            destination,
            threshold,
        } => {
            let mapper = build_mapper(&types, config)?;
            if let Some(threshold) = threshold {
                if !(0.0..=1.0).contains(&threshold) {
                    bail!("Threshold must be between 0 and 1, got {threshold}");
                }
                mapper.set_convention_threshold(threshold);
            }

            let matches = mapper.discover_with_confidence(&source, &destination);
            if matches.is_empty() {
                println!("No properties discovered for {source} -> {destination}");
            }
            for found in matches {
                println!(
                    "{} <- {} ({:.2})",
                    found.destination, found.source, found.confidence
                );
            }
        }
        Commands::Check { types, profile } => {
            let mapper = build_mapper(&types, config)?;
            add_profile(&mapper, &profile)?;
            let sealed = mapper.seal_all().context("Mapping configuration is invalid")?;
            println!("OK: {sealed} mappings sealed");
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_mapper(types: &[PathBuf], config: MapperConfig) -> anyhow::Result<Mapper> {
    let loader = DescriptorLoader::new();
    for path in types {
        let names = loader
            .load_file(path)
            .with_context(|| format!("Failed to load types from {}", path.display()))?;
        tracing::debug!("Loaded {} types from {}", names.len(), path.display());
    }
    Ok(Mapper::builder()
        .introspector(loader.registry())
        .config(config)
        .build())
}

fn add_profile(mapper: &Mapper, path: &Path) -> anyhow::Result<()> {
    let profile = DeclarativeProfile::from_file(path)
        .with_context(|| format!("Failed to load profile {}", path.display()))?;
    mapper
        .add_profile(&profile)
        .with_context(|| format!("Failed to apply profile {}", profile.name))?;
    Ok(())
}

fn tag(value: Value, type_name: Option<&str>) -> Value {
    match (value, type_name) {
        (Value::Object(object), Some(name)) => Value::Object(object.with_type(name)),
        (value, _) => value,
    }
}
