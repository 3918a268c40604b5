use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use sqlweave::config::{self, DatabasesConfig, EngineConfig};
use sqlweave::model::ColumnMapping;
use sqlweave::sql_generator::{
    significant_filters, FilterCriterion, PageSpec, PreparedQuery, SortDirection, SqlGenError,
    TemplateCache,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// sqlweave - render the SQL a paged, filtered query would run
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database type: sqlserver, mysql or postgresql
    #[arg(long)]
    dialect: Option<String>,

    /// Table to query
    #[arg(long)]
    table: String,

    /// Comma-separated columns of the select list (default: *)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Primary key column, used as the default order on SQL Server
    #[arg(long, default_value = "Id")]
    key_column: String,

    /// Filter as column:operator[:value], e.g. Name:like:ab (repeatable)
    #[arg(long = "filter")]
    filters: Vec<FilterCriterion>,

    #[arg(long, default_value_t = 1)]
    page_number: u32,

    #[arg(long, default_value_t = 10)]
    page_size: u32,

    #[arg(long)]
    order_by: Option<String>,

    /// asc or desc
    #[arg(long, default_value = "asc")]
    sort: SortDirection,

    /// Schema to qualify the table with
    #[arg(long)]
    schema: Option<String>,

    /// single_batch or separate_round_trips
    #[arg(long)]
    paging_strategy: Option<String>,

    /// Keep filters whose value looks unset (0, empty text, minimum date)
    #[arg(long)]
    keep_unset: bool,

    /// Build templates without the process-wide cache
    #[arg(long)]
    no_template_cache: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// YAML file with a `databases` table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database entry of --config to take dialect and schema from
    #[arg(long, requires = "config")]
    database: Option<String>,
}

impl From<&Cli> for config::CliConfig {
    fn from(cli: &Cli) -> Self {
        config::CliConfig {
            dialect: cli.dialect.clone(),
            schema: cli.schema.clone(),
            paging_strategy: cli.paging_strategy.clone(),
            no_template_cache: cli.no_template_cache,
        }
    }
}

fn base_config(cli: &Cli) -> Result<EngineConfig> {
    let (Some(path), Some(name)) = (&cli.config, &cli.database) else {
        return Ok(EngineConfig::from_env()?);
    };
    let databases = DatabasesConfig::from_yaml_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let database = databases
        .get(name)
        .ok_or_else(|| SqlGenError::KeyNotFound(name.clone()))?;
    Ok(EngineConfig::from_database(database))
}

fn render_text(engine: &EngineConfig, query: &PreparedQuery) {
    println!(
        "-- {} (paging: {:?})",
        engine.dialect,
        engine.effective_paging_strategy()
    );
    for statement in query.template.statements() {
        println!("{}", statement);
    }
    if !query.params.is_empty() {
        println!("-- parameters");
        for (name, value) in query.params.iter() {
            println!("@{} = {}", name, value);
        }
    }
}

fn render_json(engine: &EngineConfig, query: &PreparedQuery) -> Result<()> {
    let mut parameters = serde_json::Map::new();
    for (name, value) in query.params.iter() {
        parameters.insert(name.to_string(), serde_json::to_value(value)?);
    }
    let output = json!({
        "dialect": engine.dialect,
        "paging_strategy": engine.effective_paging_strategy(),
        "count_sql": query.template.statement(0),
        "data_sql": query.template.statement(1),
        "batch": query.sql(),
        "parameters": parameters,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let engine = base_config(&cli)?
        .with_cli(config::CliConfig::from(&cli))
        .context("invalid configuration")?;
    let ctx = engine
        .build_context()
        .with_cache(TemplateCache::new(engine.template_cache_config()).shared());

    let mapping = ColumnMapping::from_columns(cli.table.as_str(), &cli.key_column, cli.columns.iter());
    let filters = if cli.keep_unset {
        cli.filters.clone()
    } else {
        significant_filters(&cli.filters)
    };

    let mut page = PageSpec::new(cli.page_number, cli.page_size);
    match &cli.order_by {
        Some(column) => page = page.order_by(column.as_str(), cli.sort),
        None => page.sort_direction = cli.sort,
    }

    let table = ctx.qualified_table(&cli.table);
    log::debug!("Rendering paged query for {}", table);
    let query = ctx
        .assembler()
        .count_and_page_for(&mapping, &table, &filters, &page)?;

    match cli.format {
        OutputFormat::Text => render_text(&engine, &query),
        OutputFormat::Json => render_json(&engine, &query)?,
    }
    Ok(())
}
