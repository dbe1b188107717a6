//! sqlcompose: build a SELECT from flags and render or run it.
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a dialect
//! sqlcompose --table users --alias u --column u.name --where "u.age >= 21" --dialect mysql
//!
//! # Execute against a database
//! sqlcompose --table users --limit 10 --database-url sqlite://app.db
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use sqlcompose::config::Config;
use sqlcompose::engine::QueryEngine;
use sqlcompose::parser::{parse_condition, parse_order_item, parse_select_item};
use sqlcompose::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlcompose")]
#[command(version)]
#[command(about = "Compose a SELECT statement and render it per dialect", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlcompose --table users --column id --column name --where \"active = TRUE\"
    sqlcompose --table orders --alias o --column \"COUNT(*) AS n\" --group-by o.user_id --dialect postgres
    sqlcompose --table users --order \"name DESC\" --limit 5 --offset 10 --dry-run")]
struct Cli {
    /// Table to select from
    #[arg(short, long)]
    table: String,

    /// Alias for the table
    #[arg(short, long)]
    alias: Option<String>,

    /// Select-list entry (repeatable): `*`, `t.*`, `col`, `t.col AS x`, `COUNT(*)`
    #[arg(short, long = "column")]
    columns: Vec<String>,

    /// WHERE condition (repeatable, AND-ed)
    #[arg(short = 'w', long = "where")]
    conditions: Vec<String>,

    /// GROUP BY column (repeatable)
    #[arg(long)]
    group_by: Vec<String>,

    /// HAVING condition (repeatable, AND-ed)
    #[arg(long)]
    having: Vec<String>,

    /// ORDER BY entry (repeatable): `col [ASC|DESC]`
    #[arg(short, long)]
    order: Vec<String>,

    #[arg(short, long)]
    limit: Option<u64>,

    #[arg(long)]
    offset: Option<u64>,

    #[arg(long)]
    distinct: bool,

    /// SQL dialect (defaults to the database URL's, then the config file's)
    #[arg(short, long)]
    dialect: Option<String>,

    /// Database connection URL
    #[arg(long, env = "SQLCOMPOSE_DATABASE_URL")]
    database_url: Option<String>,

    /// Don't execute, just show the generated SQL
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dialect = cli
        .dialect
        .as_deref()
        .map(str::parse::<Dialect>)
        .transpose()
        .context("invalid --dialect")?;
    let config = Config::load()
        .context("failed to load configuration")?
        .merge(dialect, cli.database_url.clone());

    init_tracing(&config.log_filter);

    let select = build_select(&cli)?;
    let sql = select.build_with_dialect(config.dialect);

    let url = match (&config.database_url, cli.dry_run) {
        (Some(url), false) => url.clone(),
        (url, _) => {
            print_sql(&sql, &select, config.dialect);
            if url.is_none() && !cli.dry_run {
                println!();
                println!(
                    "{}",
                    "⚠ No database URL. Use --database-url or set SQLCOMPOSE_DATABASE_URL".yellow()
                );
            }
            return Ok(());
        }
    };

    let engine = QueryEngine::connect(&url)
        .await
        .with_context(|| format!("failed to connect to {}", url))?;
    let results = engine.fetch_all(&select).await?;
    format_output(&results, &cli.format);
    Ok(())
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_select(cli: &Cli) -> Result<Select> {
    let mut select = match &cli.alias {
        Some(alias) => Select::select_as(&cli.table, alias)?,
        None => Select::select(cli.table.as_str())?,
    };
    select.distinct(cli.distinct);

    let columns = cli
        .columns
        .iter()
        .map(|c| parse_select_item(c).with_context(|| format!("in --column '{}'", c)))
        .collect::<Result<Vec<_>>>()?;
    select.add_columns(columns)?;

    for condition in &cli.conditions {
        let expr = parse_condition(condition).with_context(|| format!("in --where '{}'", condition))?;
        select.and_where(expr)?;
    }
    for group in &cli.group_by {
        let expr = parse_select_item(group).with_context(|| format!("in --group-by '{}'", group))?;
        select.group_by(expr)?;
    }
    for condition in &cli.having {
        let expr = parse_condition(condition).with_context(|| format!("in --having '{}'", condition))?;
        select.and_having(expr)?;
    }
    for order in &cli.order {
        let (expr, direction) =
            parse_order_item(order).with_context(|| format!("in --order '{}'", order))?;
        select.order_by_direction(expr, direction)?;
    }
    if let Some(n) = cli.limit {
        select.limit(n);
    }
    if let Some(n) = cli.offset {
        select.offset(n);
    }
    select.validate()?;
    Ok(select)
}

fn print_sql(sql: &str, select: &Select, dialect: Dialect) {
    println!("{} {}", "Generated SQL".green().bold(), format!("({})", dialect).dimmed());
    println!("{}", sql.white());

    let arguments = select.arguments();
    if !arguments.is_empty() {
        println!();
        println!("{}", "Arguments:".cyan());
        for (placeholder, value) in arguments {
            println!("  {} = {}", placeholder, value.to_string().yellow());
        }
    }
}

fn format_output(results: &[HashMap<String, serde_json::Value>], format: &OutputFormat) {
    if results.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results).unwrap_or_default());
        }
        OutputFormat::Table => {
            let table = TextTable::from_rows(results);
            println!("{}", table.header().white().bold());
            println!("{}", table.separator().dimmed());
            for line in table.lines() {
                println!("{}", line);
            }
            println!();
            println!("{} row(s) returned", results.len().to_string().cyan());
        }
    }
}

/// Rows laid out as padded text cells, columns sorted by name.
struct TextTable {
    columns: Vec<String>,
    widths: Vec<usize>,
    cells: Vec<Vec<String>>,
}

impl TextTable {
    fn from_rows(rows: &[HashMap<String, serde_json::Value>]) -> Self {
        let columns: Vec<String> = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        let widths = columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .fold(c.chars().count(), usize::max)
            })
            .collect();

        Self { columns, widths, cells }
    }

    fn pad(&self, values: &[String]) -> String {
        values
            .iter()
            .zip(&self.widths)
            .map(|(v, w)| format!("{:width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" │ ")
    }

    fn header(&self) -> String {
        self.pad(&self.columns)
    }

    fn separator(&self) -> String {
        self.widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─")
    }

    fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.iter().map(|row| self.pad(row))
    }
}

/// Display text of a decoded value; nested JSON stays JSON.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
