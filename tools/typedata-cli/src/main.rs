//! typedata - infer and merge typed records from JSON files
//!
//! Usage:
//!   typedata infer <FILES>...
//!   typedata merge [--overwrite PATH]... <FILES>...
//!
//! Input files hold a single JSON object, an array of objects, or one
//! object per line (NDJSON). Logs go to stderr, filtered by `RUST_LOG`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use typedata::codec::json::{struct_from_json, DecodeConfig, JsonMapper};
use typedata::schema::{InferenceConfig, MapperConfig, SchemaInference};
use typedata::{merge_values, OverwritePaths, TypedStruct, TypedValue};

#[derive(Parser)]
#[command(name = "typedata")]
#[command(about = "Infer and merge typed records from JSON")]
struct Cli {
    /// JSON file with `decode`, `inference` and `mapper` settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Infer the merged schema of all records and print it as JSON schema
    Infer {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Fold all records into one with value merge and print it as JSON
    Merge {
        /// Dot-path whose earlier value is replaced instead of accumulated
        #[arg(long = "overwrite", value_name = "PATH")]
        overwrite: Vec<String>,
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Settings {
    decode: DecodeConfig,
    inference: InferenceConfig,
    mapper: MapperConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "typedata=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };

    let output = match cli.command {
        Command::Infer { files } => infer(&settings, &files)?,
        Command::Merge { overwrite, files } => merge(&settings, &overwrite, &files)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_settings(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn infer(settings: &Settings, files: &[PathBuf]) -> Result<JsonValue> {
    let records = read_records(&settings.decode, files)?;
    tracing::info!(records = records.len(), "inferring schema");

    let samples: Vec<TypedValue> = records.into_iter().map(TypedValue::from).collect();
    let mut inference = SchemaInference::with_config(settings.inference.clone());
    let schema = inference.infer(&samples)?;

    let mut mapper = JsonMapper::with_config(settings.mapper.clone());
    let mut document = mapper.schema_document(&schema)?;
    if let (Some(root), JsonValue::Object(fields)) = (schema.as_struct(), &mut document) {
        fields.insert(
            "x-typedata-fingerprint".to_string(),
            JsonValue::from(root.fingerprint()),
        );
    }
    Ok(document)
}

fn merge(settings: &Settings, overwrite: &[String], files: &[PathBuf]) -> Result<JsonValue> {
    let records = read_records(&settings.decode, files)?;
    tracing::info!(records = records.len(), "merging records");

    let overwrite: OverwritePaths = overwrite.iter().cloned().collect();
    let mut records = records.into_iter();
    let Some(first) = records.next() else {
        bail!("No records found in input");
    };
    let merged = records.enumerate().try_fold(first, |acc, (i, next)| {
        merge_values(&acc, &next, &overwrite).with_context(|| format!("Failed to merge record {}", i + 2))
    })?;

    let mut mapper = JsonMapper::with_config(settings.mapper.clone());
    Ok(mapper.value(&TypedValue::from(merged))?)
}

fn read_records(config: &DecodeConfig, files: &[PathBuf]) -> Result<Vec<TypedStruct>> {
    let mut records = Vec::new();
    for path in files {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let stream = serde_json::Deserializer::from_str(&text).into_iter::<JsonValue>();
        for document in stream {
            let document =
                document.with_context(|| format!("Invalid JSON in {}", path.display()))?;
            match document {
                JsonValue::Array(items) => {
                    for item in &items {
                        records.push(decode_record(config, item, path)?);
                    }
                }
                other => records.push(decode_record(config, &other, path)?),
            }
        }
        tracing::debug!(file = %path.display(), total = records.len(), "read records");
    }
    Ok(records)
}

fn decode_record(config: &DecodeConfig, json: &JsonValue, path: &Path) -> Result<TypedStruct> {
    struct_from_json(json, config).with_context(|| format!("Unsupported record in {}", path.display()))
}
