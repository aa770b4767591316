//! CLI module for azurefleet
//!
//! Offline inspection of fleet documents (`schema`, `validate`, `expand`)
//! and a live `read` against Azure Resource Manager.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use azurefleet::api::{strip_nulls, FleetId};
use azurefleet::config::ProviderConfig;
use azurefleet::crossfield;
use azurefleet::expand::expand_fleet;
use azurefleet::model::FleetConfig;
use azurefleet::resource::{FleetResource, Resource, ResourceData};
use azurefleet::schema::fleet_schema;

/// azurefleet - inspect and manage Azure Fleet resources
#[derive(Parser, Debug, Clone)]
#[command(name = "azurefleet")]
#[command(version)]
#[command(about = "Azure Fleet resource schema, expand/flatten pipeline and lifecycle", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "json")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "AZUREFLEET_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output format for documents written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the configuration schema
    Schema,

    /// Validate a fleet document against the schema and cross-field rules
    Validate(DocumentArgs),

    /// Print the API record a fleet document expands to
    Expand(DocumentArgs),

    /// Read a live fleet and print its flattened configuration
    Read(ReadArgs),
}

/// Arguments for commands that take a fleet document
#[derive(Parser, Debug, Clone)]
pub struct DocumentArgs {
    /// Fleet document (YAML or JSON)
    pub file: PathBuf,
}

/// Arguments for the read command
#[derive(Parser, Debug, Clone)]
pub struct ReadArgs {
    /// Fleet resource ID
    pub id: String,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

/// Loads a fleet document, choosing the format by extension.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fleet document: {}", path.display()))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value = match extension {
        "json" => serde_json::from_str(&content)?,
        "yml" | "yaml" => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)
            .or_else(|_| serde_yaml::from_str(&content))
            .with_context(|| format!("Failed to parse fleet document: {}", path.display()))?,
    };
    Ok(value)
}

fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered);
    Ok(())
}

/// Runs schema validation, decoding and cross-field rules on a document.
///
/// Returns the decoded configuration, or the list of problems found.
pub fn check_document(document: &Value) -> std::result::Result<FleetConfig, Vec<String>> {
    let schema = fleet_schema();
    let diags = schema.validate(document);
    for warning in &diags.warnings {
        tracing::warn!("{}", warning);
    }
    if !diags.is_ok() {
        return Err(diags.errors);
    }

    let mut config = document.clone();
    schema.apply_defaults(&mut config);
    let config: FleetConfig =
        serde_json::from_value(config).map_err(|e| vec![format!("unmarshaling configuration: {}", e)])?;

    crossfield::validate_fleet(&config).map_err(|e| vec![e.to_string()])?;
    Ok(config)
}

/// Executes a subcommand and returns the process exit code.
pub async fn run(cli: &Cli, config: &ProviderConfig) -> Result<i32> {
    match &cli.command {
        Commands::Schema => {
            emit(&fleet_schema().describe(), cli.output)?;
            Ok(0)
        }
        Commands::Validate(args) => {
            let document = load_document(&args.file)?;
            match check_document(&document) {
                Ok(_) => {
                    eprintln!("{}: valid", args.file.display());
                    Ok(0)
                }
                Err(errors) => {
                    for error in &errors {
                        eprintln!("{}: {}", args.file.display(), error);
                    }
                    Ok(1)
                }
            }
        }
        Commands::Expand(args) => {
            let document = load_document(&args.file)?;
            let fleet_config = match check_document(&document) {
                Ok(fleet_config) => fleet_config,
                Err(errors) => {
                    for error in &errors {
                        eprintln!("{}: {}", args.file.display(), error);
                    }
                    return Ok(1);
                }
            };
            match expand_fleet(&fleet_config) {
                Ok(fleet) => {
                    let mut body = serde_json::to_value(&fleet)?;
                    strip_nulls(&mut body);
                    emit(&body, cli.output)?;
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(e.exit_code())
                }
            }
        }
        Commands::Read(args) => {
            let id = match FleetId::parse(&args.id) {
                Ok(id) => id,
                Err(e) => {
                    eprintln!("{}", e);
                    return Ok(e.exit_code());
                }
            };
            let client = Arc::new(config.fleets_client()?);
            let resource = FleetResource::from_config(client, config);
            let mut data: ResourceData = resource.data(Value::Null).with_id(id.to_string());

            if let Err(e) = resource.read(&mut data).await {
                eprintln!("{}", e);
                return Ok(e.exit_code());
            }
            if data.is_gone() {
                eprintln!("{} was not found", id);
                return Ok(4);
            }

            let mut state = data.state().clone();
            resource.schema().redact(&mut state);
            emit(&state, cli.output)?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["azurefleet", "validate", "fleet.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["azurefleet", "-vvvv", "schema"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_output_format() {
        let cli = Cli::try_parse_from(["azurefleet", "--output", "yaml", "schema"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Yaml);
    }

    #[test]
    fn test_check_document_reports_schema_errors() {
        let errors = check_document(&json!({ "name": "fleet1" })).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("\"resource_group_name\" is required")));
    }
}
