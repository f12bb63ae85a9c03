use clap::{Parser, Subcommand};
use sheetport::api::{run_api_server, server::ApiConfig};
use sheetport::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetport")]
#[command(about = "Bulk import and export of records against .xls/.xlsx spreadsheets")]
#[command(long_about = "Sheetport - records ⇄ spreadsheets

COMMANDS:
  export   - JSON/YAML records to .xlsx, under a header spec
  import   - .xls/.xlsx to JSON/YAML records, through a field map
  columns  - Print spreadsheet column labels (A, B, ..., AA, ...)
  serve    - Run the HTTP API server

EXAMPLES:
  sheetport export users.json --job export.yaml -o users.xlsx
  sheetport import users.xlsx --job import.yaml -o users.yaml
  sheetport columns 30")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Export records to an .xlsx workbook.

The job file (YAML) maps header labels to record fields, in column order:

  header:
    Name: name
    Phone: phone
  start_write_line: 2        # first data row (>= 2)
  template: template.xlsx    # optional; its header row is kept as-is
  sheet_name: Users          # optional

Every data cell is written as text, so codes like 007 keep their zeros.")]
    /// Export JSON/YAML records to .xlsx
    Export {
        /// Records file (.json, .yaml or .yml): an array of objects
        input: PathBuf,

        /// Export job file (YAML)
        #[arg(short, long)]
        job: PathBuf,

        /// Output Excel file path (.xlsx)
        #[arg(short, long)]
        output: PathBuf,

        /// Show verbose export steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Import rows from the first sheet of an .xls/.xlsx workbook.

The job file (YAML) maps header cell text to output keys. Columns whose
header is not listed are dropped, and rows left empty are skipped:

  fields:
    Name: name
    Phone: phone
  start_read_line: 1         # header row (>= 1)
  chunk_size: 500            # optional batch delivery
  duplicate_headers: reject  # or last_wins (default)

Without --output the records are printed as JSON. With chunk_size set,
each batch is streamed as it arrives, one JSON object per line, to stdout
or to --output.")]
    /// Import .xls/.xlsx rows as JSON/YAML records
    Import {
        /// Path to Excel file (.xls or .xlsx)
        input: PathBuf,

        /// Import job file (YAML)
        #[arg(short, long)]
        job: PathBuf,

        /// Output records file (.json, .yaml or .yml; JSON lines when chunked)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show verbose import steps
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the first COUNT column labels
    Columns {
        /// Number of labels to print
        count: usize,
    },

    /// Run the HTTP API server
    Serve {
        /// Host address to bind to (use 0.0.0.0 for all interfaces)
        #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SHEETPORT_HOST")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "SHEETPORT_PORT")]
        port: u16,

        /// Directory that request file paths are confined to
        #[arg(long, default_value = ".", env = "SHEETPORT_DATA_ROOT")]
        data_root: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetport=info".into()),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            job,
            output,
            verbose,
        } => {
            init_tracing();
            cli::export(input, job, output, verbose)?
        }

        Commands::Import {
            input,
            job,
            output,
            verbose,
        } => {
            init_tracing();
            cli::import(input, job, output, verbose)?
        }

        Commands::Columns { count } => cli::columns(count)?,

        Commands::Serve {
            host,
            port,
            data_root,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_api_server(ApiConfig {
                host,
                port,
                data_root,
            }))?
        }
    }

    Ok(())
}
