//! Tessera CLI - discover, fuse and aggregate building-model data
//!
//! Usage:
//!   tessera discover --model <model.json>
//!   tessera catalog --model <model.json>
//!   tessera sync --model <model.json> [--output <dataset.json>]
//!   tessera aggregate --model <model.json> --group <attr> [--sum <attr>] [--filter <attr=op=value>]
//!
//! Examples:
//!   tessera discover --model tower.json
//!   tessera sync --model tower.json --config tessera.toml --output fused.json
//!   tessera aggregate --model tower.json --group Category --sum Cost --filter Material=contains=steel

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tessera::aggregate::{AggregationQuery, CachedPrefilter};
use tessera::cache::CatalogCache;
use tessera::chart::AggregationKind;
use tessera::config::Settings;
use tessera::model::{ElementId, FilterCondition, LogicalOperator, SyncStatus};
use tessera::provider::InMemoryModel;
use tessera::source::CsvSourceLoader;
use tessera::Workspace;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Tessera - property discovery and data fusion for building models")]
#[command(version)]
struct Cli {
    /// Path to the JSON model document
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    /// Settings file (defaults to TESSERA_CONFIG, ./tessera.toml, ~/.tessera/tessera.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the model's attribute names
    Discover,

    /// List every selectable field: model attributes, source headers and calculations
    Catalog,

    /// Refresh sources, build the master dataset and report per-source stats
    Sync {
        /// Write the fused dataset as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate elements and print the table projection
    Aggregate {
        /// Attribute to group by (repeat for tuple grouping)
        #[arg(short, long = "group", required = true)]
        group: Vec<String>,

        /// Attribute to sum per group
        #[arg(short, long)]
        sum: Option<String>,

        /// Filter condition as attr=op=value (op: equals, contains, not_equals)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filter: Vec<FilterCondition>,

        /// Combine filters with OR instead of AND
        #[arg(long)]
        or: bool,

        /// Restrict to these element ids
        #[arg(long, value_delimiter = ',')]
        scope: Option<Vec<ElementId>>,

        /// Sync first and aggregate the fused dataset
        #[arg(long)]
        synced: bool,

        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Aligned text table
    Table,
    /// Table rows as JSON
    Json,
    /// Chart series as JSON (sums when --sum is given)
    Chart,
}

fn parse_filter(s: &str) -> Result<FilterCondition, String> {
    let mut parts = s.splitn(3, '=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(attr), Some(op), Some(value)) if !attr.is_empty() => {
            Ok(FilterCondition::new(attr, op.parse()?, value))
        }
        _ => Err(format!("expected attr=op=value, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings.logging.filter);

    let Some(model_path) = cli.model else {
        eprintln!("Error: --model <model.json> is required");
        return ExitCode::FAILURE;
    };

    let mut workspace = match open_workspace(&model_path, &settings).await {
        Ok(ws) => ws,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Discover => cmd_discover(&mut workspace).await,
        Commands::Catalog => cmd_catalog(&mut workspace).await,
        Commands::Sync { output } => cmd_sync(&mut workspace, output).await,
        Commands::Aggregate {
            group,
            sum,
            filter,
            or,
            scope,
            synced,
            format,
        } => {
            let query = AggregationQuery {
                group_by: group,
                filters: filter,
                logic: if or {
                    LogicalOperator::Or
                } else {
                    LogicalOperator::And
                },
                sum_attribute: sum,
                scope,
            };
            cmd_aggregate(&mut workspace, query, synced, format).await
        }
    }
}

/// Logging goes to stderr; `RUST_LOG` overrides the configured filter.
fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn open_workspace(model_path: &Path, settings: &Settings) -> Result<Workspace, String> {
    let model = InMemoryModel::load(model_path)
        .await
        .map_err(|e| format!("Error reading model '{}': {}", model_path.display(), e))?;

    let workspace = Workspace::new(
        Arc::new(model),
        Arc::new(CsvSourceLoader::new()),
        settings,
    )
    .map_err(|e| format!("Configuration error: {}", e))?;

    if !settings.discovery.cache_enabled {
        return Ok(workspace);
    }

    match CatalogCache::open() {
        Ok(cache) => Ok(workspace.with_cache(cache)),
        Err(e) => {
            tracing::warn!(error = %e, "catalog cache unavailable");
            Ok(workspace)
        }
    }
}

async fn cmd_discover(workspace: &mut Workspace) -> ExitCode {
    let catalog = workspace.refresh_catalog().await;

    if catalog.is_empty() {
        eprintln!("No properties discovered.");
        return ExitCode::SUCCESS;
    }

    for name in catalog.iter() {
        println!("{}", name);
    }
    ExitCode::SUCCESS
}

async fn cmd_catalog(workspace: &mut Workspace) -> ExitCode {
    workspace.refresh_catalog().await;

    // Headers are only known once the sources have been read.
    if !workspace.sources().is_empty() {
        let report = workspace.sync().await;
        if let Some(err) = report.error {
            eprintln!("Warning: {}", err);
        }
    }

    for name in workspace.catalog().iter() {
        println!("{}", name);
    }
    ExitCode::SUCCESS
}

async fn cmd_sync(workspace: &mut Workspace, output: Option<PathBuf>) -> ExitCode {
    let report = workspace.sync().await;

    if let Some(err) = &report.error {
        eprintln!("Sync failed: {}", err);
        return ExitCode::FAILURE;
    }

    println!("Records: {}", report.record_count);
    if !workspace.sources().is_empty() {
        println!();
        println!("Sources:");
        for source in workspace.sources() {
            let status = match &source.sync_status {
                SyncStatus::Pending => "pending".to_string(),
                SyncStatus::Success { matches } => format!("ok ({} matches)", matches),
                SyncStatus::Warning(msg) => format!("warning: {}", msg),
                SyncStatus::Error(msg) => format!("error: {}", msg),
            };
            println!("  - {} [{}]", source.file_name, status);
        }
    }

    if let Some(path) = output {
        let dataset = workspace.dataset();
        let json = match serde_json::to_string_pretty(dataset.records()) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("Error serializing dataset: {}", e);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = tokio::fs::write(&path, json).await {
            eprintln!("Error writing '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        println!();
        println!("Wrote {}", path.display());
    }

    ExitCode::SUCCESS
}

async fn cmd_aggregate(
    workspace: &mut Workspace,
    query: AggregationQuery,
    synced: bool,
    format: OutputFormat,
) -> ExitCode {
    if synced {
        let report = workspace.sync().await;
        if let Some(err) = report.error {
            eprintln!("Sync failed: {}", err);
            return ExitCode::FAILURE;
        }
    }

    match format {
        OutputFormat::Table => {
            let rows = workspace.table(&query, &CachedPrefilter::none()).await;
            if rows.is_empty() {
                println!("No matching elements.");
                return ExitCode::SUCCESS;
            }

            let header = query.group_by.join(" / ");
            let width = rows
                .iter()
                .map(|r| r.values.join(" / ").len())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0);

            let sum_column = query.sum_attribute.as_deref();

            print!("{:<width$}  {:>7}  {:>7}", header, "count", "%", width = width);
            if let Some(attribute) = sum_column {
                print!("  {:>12}", format!("sum({})", attribute));
            }
            println!();

            for row in &rows {
                print!(
                    "{:<width$}  {:>7}  {:>7.1}",
                    row.values.join(" / "),
                    row.count,
                    row.percentage,
                    width = width
                );
                if sum_column.is_some() {
                    match row.sum {
                        Some(sum) => print!("  {:>12.2}", sum),
                        None => print!("  {:>12}", "-"),
                    }
                }
                println!();
            }
            ExitCode::SUCCESS
        }
        OutputFormat::Json => {
            let rows = workspace.table(&query, &CachedPrefilter::none()).await;
            print_json(&rows)
        }
        OutputFormat::Chart => {
            let kind = if query.sum_attribute.is_some() {
                AggregationKind::Sum
            } else {
                AggregationKind::Count
            };
            let chart = workspace.chart(&query, kind).await;
            print_json(&chart)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}
