// crates/celldb-cli/src/main.rs
// ============================================================================
// Module: CellDB CLI Entry Point
// Description: Command dispatcher over a SQLite-backed CellDB store.
// Purpose: Initialize stores, write expression data, and read matrices.
// Dependencies: clap, celldb-config, celldb-core, celldb-store-sqlite, serde_json
// ============================================================================

//! ## Overview
//! Every command loads `celldb.toml` (explicit `--config`, then
//! `CELLDB_CONFIG`, then the working directory), opens the configured `SQLite`
//! store, and prints one JSON document on stdout. Errors go to stderr with a
//! failure exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use celldb_config::CellDbConfig;
use celldb_core::CellDb;
use celldb_core::CellDbError;
use celldb_core::ExpressionValue;
use celldb_core::FeatureId;
use celldb_core::PageRequest;
use celldb_core::SampleId;
use celldb_store_sqlite::SqliteExecutor;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "celldb", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (overrides `CELLDB_CONFIG` and `./celldb.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the row store and feature catalog.
    Init,
    /// Record features in the catalog without adding columns.
    RegisterFeatures(RegisterFeaturesCommand),
    /// Add feature columns and catalog entries.
    UpsertFeatures(RegisterFeaturesCommand),
    /// Write one sample's cells.
    UpsertSample(UpsertSampleCommand),
    /// Read a sample × feature sub-matrix.
    Matrix(MatrixCommand),
    /// Page through catalog feature ids.
    ListFeatures(ListFeaturesCommand),
    /// Page through stored sample ids.
    ListSamples(PageArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Feature ids with optional parallel names.
#[derive(Args, Debug)]
struct RegisterFeaturesCommand {
    /// Feature id (repeatable).
    #[arg(long = "feature", value_name = "ID", required = true)]
    features: Vec<String>,
    /// Display name, one per `--feature` when given.
    #[arg(long = "name", value_name = "NAME")]
    names: Vec<String>,
}

/// Arguments for `upsert-sample`.
#[derive(Args, Debug)]
struct UpsertSampleCommand {
    /// Sample id.
    #[arg(long, value_name = "ID")]
    sample: String,
    /// Cell as `FEATURE=VALUE` (repeatable).
    #[arg(long = "cell", value_name = "FEATURE=VALUE")]
    cells: Vec<String>,
    /// Fail on features without a column instead of adding them.
    #[arg(long)]
    no_evolve: bool,
}

/// Arguments for `matrix`.
#[derive(Args, Debug)]
struct MatrixCommand {
    /// Sample id (repeatable, request order is kept).
    #[arg(long = "sample", value_name = "ID")]
    samples: Vec<String>,
    /// Feature id (repeatable, column order is kept).
    #[arg(long = "feature", value_name = "ID")]
    features: Vec<String>,
}

/// Arguments for `list-features`.
#[derive(Args, Debug)]
struct ListFeaturesCommand {
    /// Paging window.
    #[command(flatten)]
    page: PageArgs,
    /// Include display names.
    #[arg(long)]
    with_names: bool,
}

/// Paging window; the limit defaults to the configured page size.
#[derive(Args, Debug)]
struct PageArgs {
    /// Maximum entries to return.
    #[arg(long)]
    limit: Option<u64>,
    /// Entries to skip.
    #[arg(long, default_value_t = 0)]
    offset: u64,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config, then print it back.
    Validate,
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// `config validate` report.
#[derive(Serialize)]
struct ConfigSummary<'a> {
    /// Database path.
    store_path: &'a Path,
    /// Feature column SQL type.
    column_type: String,
    /// Default feature page size.
    feature_page_limit: u64,
    /// Default sample page size.
    sample_page_limit: u64,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    let config = CellDbConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    match cli.command {
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&config),
        Commands::Init => {
            let report = open_store(&config)?.initialize();
            write_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::RegisterFeatures(command) => {
            let (feature_ids, names) = parse_feature_args(&command)?;
            open_store(&config)?
                .register_features(&feature_ids, names)
                .map_err(|err| CliError::new(format!("register-features failed: {err}")))?;
            write_json(&feature_ids)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::UpsertFeatures(command) => {
            let (feature_ids, names) = parse_feature_args(&command)?;
            let outcome = open_store(&config)?
                .upsert_features(&feature_ids, names)
                .map_err(|err| CliError::new(format!("upsert-features failed: {err}")))?;
            write_json(&outcome)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::UpsertSample(command) => command_upsert_sample(&config, &command),
        Commands::Matrix(command) => {
            let sample_ids = SampleId::parse_all(&command.samples)
                .map_err(|err| CliError::new(format!("invalid sample id: {err}")))?;
            let feature_ids = parse_feature_ids(&command.features)?;
            let rows = open_store(&config)?
                .matrix(&sample_ids, &feature_ids)
                .map_err(|err| CliError::new(format!("matrix failed: {err}")))?;
            write_json(&rows)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::ListFeatures(command) => {
            let page = resolve_page(&command.page, config.listing.feature_page_limit);
            let store = open_store(&config)?;
            let failed = |err: CellDbError| CliError::new(format!("list-features failed: {err}"));
            if command.with_names {
                write_json(&store.list_feature_records(page).map_err(failed)?)?;
            } else {
                write_json(&store.list_features(page).map_err(failed)?)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::ListSamples(page) => {
            let page = resolve_page(&page, config.listing.sample_page_limit);
            let samples = open_store(&config)?
                .list_samples(page)
                .map_err(|err| CliError::new(format!("list-samples failed: {err}")))?;
            write_json(&samples)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `config validate`.
fn command_config_validate(config: &CellDbConfig) -> CliResult<ExitCode> {
    let schema = config.schema_config().map_err(|err| CliError::new(err.to_string()))?;
    write_json(&ConfigSummary {
        store_path: &config.store.path,
        column_type: schema.column_type.sql_type(),
        feature_page_limit: config.listing.feature_page_limit,
        sample_page_limit: config.listing.sample_page_limit,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `upsert-sample`.
fn command_upsert_sample(
    config: &CellDbConfig,
    command: &UpsertSampleCommand,
) -> CliResult<ExitCode> {
    let sample_id = SampleId::new(command.sample.as_str())
        .map_err(|err| CliError::new(format!("invalid sample id: {err}")))?;
    let cells = command.cells.iter().map(|cell| parse_cell(cell)).collect::<CliResult<Vec<_>>>()?;
    let (feature_ids, values): (Vec<FeatureId>, Vec<ExpressionValue>) = cells.into_iter().unzip();
    let report = open_store(config)?
        .upsert_sample(&sample_id, &feature_ids, &values, !command.no_evolve)
        .map_err(|err| CliError::new(format!("upsert-sample failed: {err}")))?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens the configured store with the configured schema and audit sink.
fn open_store(config: &CellDbConfig) -> CliResult<CellDb<SqliteExecutor>> {
    let schema = config.schema_config().map_err(|err| CliError::new(err.to_string()))?;
    let audit = config.audit.build_sink().map_err(|err| CliError::new(err.to_string()))?;
    let executor = SqliteExecutor::new(&config.store.executor_config())
        .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
    Ok(CellDb::new(executor, schema).with_audit(audit))
}

/// Parses `FEATURE=VALUE`.
fn parse_cell(raw: &str) -> CliResult<(FeatureId, ExpressionValue)> {
    let (feature, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::new(format!("cell must be FEATURE=VALUE: {raw}")))?;
    let feature_id = FeatureId::new(feature.trim())
        .map_err(|err| CliError::new(format!("invalid feature id: {err}")))?;
    let value = value
        .parse::<ExpressionValue>()
        .map_err(|err| CliError::new(format!("invalid value for {feature_id}: {err}")))?;
    Ok((feature_id, value))
}

/// Parses feature ids.
fn parse_feature_ids(raw: &[String]) -> CliResult<Vec<FeatureId>> {
    FeatureId::parse_all(raw).map_err(|err| CliError::new(format!("invalid feature id: {err}")))
}

/// Parses `--feature`/`--name` lists; names are omitted when none were given.
fn parse_feature_args(
    command: &RegisterFeaturesCommand,
) -> CliResult<(Vec<FeatureId>, Option<&[String]>)> {
    let feature_ids = parse_feature_ids(&command.features)?;
    let names = if command.names.is_empty() { None } else { Some(command.names.as_slice()) };
    Ok((feature_ids, names))
}

/// Applies the configured default limit when `--limit` is absent.
fn resolve_page(args: &PageArgs, default_limit: u64) -> PageRequest {
    PageRequest::new(args.limit.unwrap_or(default_limit), args.offset)
}

/// Writes one JSON document to stdout.
fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let payload = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("failed to encode output: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
