//! Document Validator CLI
//!
//! Validates JSON documents against a schema definition file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use docschema::config::{OutputFormat, ValidatorConfig};
use docschema::field::Field;
use docschema::{Document, Errors, Schema, SchemaSet};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "docschema-validate")]
#[command(about = "Validate JSON documents against declared schemas")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate JSON files, or directories of them
    Check {
        /// Schema definition file (TOML or JSON)
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Document class to validate against
        #[arg(short, long)]
        document: Option<String>,
        /// Report format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Stop at the first invalid input
        #[arg(long)]
        fail_fast: bool,
        /// Files or directories to validate
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Summarize the documents in a schema definition
    Describe {
        /// Schema definition file (TOML or JSON)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// Write it to this file instead
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Outcome for one input file
#[derive(Debug, Serialize)]
struct InputReport {
    path: PathBuf,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Errors>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<String>,
    /// Why the input could not be loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    schema: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
    document: String,
    checked: usize,
    invalid: usize,
    inputs: Vec<InputReport>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every input was valid
fn run(cli: Cli) -> Result<bool> {
    let config = ValidatorConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Check {
            schema,
            document,
            format,
            fail_fast,
            inputs,
        } => {
            let set = load_schema_set(schema.as_deref(), &config)?;
            let document = document
                .or_else(|| config.validation.document.clone())
                .ok_or_else(|| anyhow!("no document given; pass --document or set validation.document"))?;
            let target = set.require(&document)?;

            let files = collect_inputs(&inputs, &config)?;
            tracing::debug!(files = files.len(), document = %document, "validating inputs");

            let fail_fast = fail_fast || config.validation.fail_fast;
            let mut reports = Vec::with_capacity(files.len());
            for path in files {
                let report = check_file(&target, &path);
                let stop = fail_fast && !report.valid;
                reports.push(report);
                if stop {
                    break;
                }
            }

            let invalid = reports.iter().filter(|r| !r.valid).count();
            let report = Report {
                schema: set.name().to_string(),
                version: set.version().to_string(),
                checksum: config
                    .output
                    .include_checksum
                    .then(|| set.checksum().to_string()),
                document,
                checked: reports.len(),
                invalid,
                inputs: reports,
            };

            print_report(&report, format.unwrap_or(config.output.format))?;
            Ok(invalid == 0)
        }

        Commands::Describe { schema } => {
            let set = load_schema_set(schema.as_deref(), &config)?;

            println!("{} {} ({})", set.name(), set.version(), set.checksum().short());
            for schema in set.schemas() {
                describe_schema(schema);
            }
            Ok(true)
        }

        Commands::Config { output } => {
            if let Some(path) = output {
                config.save(&path)?;
                println!("✅ Configuration written to {:?}", path);
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(true)
        }
    }
}

fn load_schema_set(schema: Option<&Path>, config: &ValidatorConfig) -> Result<SchemaSet> {
    let path = schema
        .map(Path::to_path_buf)
        .or_else(|| config.validation.schema.clone())
        .ok_or_else(|| anyhow!("no schema given; pass --schema or set validation.schema"))?;

    SchemaSet::load(&path).with_context(|| format!("failed to load schema {}", path.display()))
}

/// Expand directories into the files they hold, sorted by path
fn collect_inputs(inputs: &[PathBuf], config: &ValidatorConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let depth = if config.input.recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(input).max_depth(depth).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", input.display()))?;
            if entry.file_type().is_file() && config.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}

fn check_file(schema: &Arc<Schema>, path: &Path) -> InputReport {
    let loaded = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|json| Ok(Document::from_json(Arc::clone(schema), &json)?));

    match loaded {
        Ok(mut doc) => {
            let errors = doc.validate_nested();
            InputReport {
                path: path.to_path_buf(),
                valid: errors.is_empty(),
                messages: errors.full_messages(),
                errors: Some(errors),
                failure: None,
            }
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "input failed to load");
            InputReport {
                path: path.to_path_buf(),
                valid: false,
                errors: None,
                messages: Vec::new(),
                failure: Some(e.to_string()),
            }
        }
    }
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Pretty => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Compact => println!("{}", serde_json::to_string(report)?),
        OutputFormat::Text => {
            match &report.checksum {
                Some(checksum) => println!(
                    "🔍 {} {} ({}) - {}",
                    report.schema,
                    report.version,
                    &checksum[..checksum.len().min(12)],
                    report.document
                ),
                None => println!("🔍 {} {} - {}", report.schema, report.version, report.document),
            }
            println!();

            for input in &report.inputs {
                if input.valid {
                    println!("✅ {} - valid", input.path.display());
                    continue;
                }

                println!("❌ {} - INVALID", input.path.display());
                if let Some(failure) = &input.failure {
                    println!("   └─ {}", failure);
                }
                for message in &input.messages {
                    println!("   └─ {}", message);
                }
            }

            println!();
            println!("{} checked, {} invalid", report.checked, report.invalid);
        }
    }
    Ok(())
}

fn describe_schema(schema: &Schema) {
    let kind = if schema.is_embedded() { " (embedded)" } else { "" };
    println!();
    println!("  {}{}", schema.name(), kind);

    for field in schema.fields() {
        println!("    └─ {}", describe_field(field.as_ref()));
    }
}

fn describe_field(field: &dyn Field) -> String {
    let options = field.options();
    let mut line = format!("{}: {}", field.name(), field.kind());

    if let Some(nested) = field.nested_schema() {
        line.push_str(&format!(" of {}", nested.name()));
    }
    if options.is_required() {
        line.push_str(", required");
    }
    if let Some(default) = options.default_value() {
        line.push_str(&format!(", default {}", default));
    }
    if let Some(choices) = options.choices() {
        let choices: Vec<String> = choices.iter().map(ToString::to_string).collect();
        line.push_str(&format!(", one of [{}]", choices.join(", ")));
    }
    for constraint in field.constraints() {
        line.push_str(&format!(", {}", constraint));
    }
    if !options.persist() {
        line.push_str(", not persisted");
    }
    line
}
