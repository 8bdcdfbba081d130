//! sheetflat CLI - flatten stacked headers and total metrics per date
//!
//! # Commands
//!
//! ```bash
//! sheetflat parse report.xlsx -t Qliq -t Qoil -d data1=2023-01-10 -d data2=2023-01-20
//! sheetflat export report.xlsx --config run.json   # xlsx + SQLite table
//! sheetflat headers report.xlsx -d data1=2023-01-10 # show flattened column names
//! ```

use clap::{Args, Parser, Subcommand};
use sheetflat::config::{DEFAULT_DATE_FORMAT, DEFAULT_DB, DEFAULT_TABLE};
use sheetflat::{
    load, normalize, parse, parse_date_tags, write_json, write_table, write_xlsx, ParseOptions,
    ParseResult, RunConfig,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetflat")]
#[command(about = "Flatten three-row spreadsheet headers and total metrics per date", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input and parse options shared by every command.
#[derive(Args)]
struct InputArgs {
    /// Input file (xlsx, xls, ods, csv)
    input: PathBuf,

    /// Attribute to total, repeatable (e.g. -t Qliq -t Qoil)
    #[arg(short, long = "target")]
    targets: Vec<String>,

    /// Date tag as tag=YYYY-MM-DD, repeatable
    #[arg(short, long = "date")]
    dates: Vec<String>,

    /// strftime format of date tokens in headers
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// JSON run file with targets, dates and sheet
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worksheet name (default: first sheet)
    #[arg(short, long)]
    sheet: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and output records as JSON
    Parse {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a file and write the records to xlsx and SQLite
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Table name
        #[arg(long, env = "SHEETFLAT_TABLE", default_value = DEFAULT_TABLE)]
        table: String,

        /// SQLite database file
        #[arg(long, env = "SHEETFLAT_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        /// xlsx output file (default: <table>.xlsx)
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Skip the SQLite table
        #[arg(long)]
        no_db: bool,
    },

    /// Show how each column header flattens
    Headers {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Export {
            input,
            table,
            db,
            xlsx,
            no_db,
        } => cmd_export(&input, &table, &db, xlsx.as_deref(), no_db),

        Commands::Headers { input } => cmd_headers(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_options(args: &InputArgs) -> Result<ParseOptions, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    let dates = parse_date_tags(&args.dates, &args.date_format)?;

    Ok(config.merge(args.targets.clone(), dates, args.sheet.clone()))
}

fn run_parse(args: &InputArgs) -> Result<ParseResult, Box<dyn std::error::Error>> {
    let options = build_options(args)?;

    eprintln!("📄 Parsing: {}", args.input.display());
    if options.targets.is_empty() || options.dates.is_empty() {
        eprintln!("   ⚠️  No targets or dates given, no totals will be added");
    }

    let grid = load(&args.input, options.sheet.as_deref())?;
    eprintln!("   Columns: {}", grid.column_count());
    eprintln!("   Rows: {}", grid.row_count());

    let result = parse(grid, &options.targets, &options.dates)?;

    let totals = result.total_keys();
    eprintln!("✅ Parsed {} records", result.records.len());
    if !totals.is_empty() {
        eprintln!("   Totals: {}", totals.join(", "));
    }

    Ok(result)
}

fn cmd_parse(args: &InputArgs, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let result = run_parse(args)?;

    write_json(&result.records, output)?;
    if let Some(p) = output {
        eprintln!("💾 Output written to: {}", p.display());
    }

    Ok(())
}

fn cmd_export(
    args: &InputArgs,
    table: &str,
    db: &Path,
    xlsx: Option<&Path>,
    no_db: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = run_parse(args)?;

    let xlsx_path = xlsx
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.xlsx", table)));
    write_xlsx(&result.records, &xlsx_path)?;
    eprintln!("💾 Spreadsheet written to: {}", xlsx_path.display());

    if !no_db {
        let count = write_table(&result.records, db, table)?;
        eprintln!("💾 {} rows written to {}:{}", count, db.display(), table);
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_headers(args: &InputArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(args)?;
    let grid = load(&args.input, options.sheet.as_deref())?;
    let names = normalize(&grid.headers, &options.dates)?;

    eprintln!("📋 {} columns:", names.len());
    for (i, (header, name)) in grid.headers.iter().zip(&names).enumerate() {
        println!("[{:2}] {} -> {}", i + 1, header, name);
    }

    if let Err(e) = sheetflat::ensure_unique(&names) {
        eprintln!("   ⚠️  {}", e);
    }
    let totals = sheetflat::total_keys(&options.targets, &options.dates);
    if let Err(e) = sheetflat::ensure_not_reserved(&names, &totals) {
        eprintln!("   ⚠️  {}", e);
    }

    Ok(())
}
