use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use school_finder::enrichment::{
    DirectionsClient, DirectionsOptions, EnrichmentOptions, MemoryCache, CACHE_SWEEP_INTERVAL, TracingEnrichmentObserver,
    TransitEnricher, TransitLookup, TravelMode,
};
use school_finder::error::LookupError;
use school_finder::ingestion::{CsvDirSource, DataSource, SheetsApiOptions, SheetsApiSource, TracingSourceObserver};
use school_finder::processing::{
    sort_rows, write_csv, write_csv_to_path, FilterCriteria, SortDirection, DEFAULT_EXPORT_FILE,
};
use school_finder::{server, SchoolFinder};

#[derive(Parser)]
#[command(name = "school-finder")]
#[command(about = "Filter NYC public high schools and rank them by transit time", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    transit: TransitArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Workbook holding the Data, Bullying Survey Data and School Links sheets
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,
    /// Directory holding one CSV export per sheet
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,
    /// Spreadsheet id for the Sheets API source
    #[arg(long, global = true, env = "SHEET_ID")]
    sheet_id: Option<String>,
    #[arg(long, global = true, env = "GOOGLE_SHEETS_API_KEY", hide_env_values = true)]
    sheets_api_key: Option<String>,
}

#[derive(Args)]
struct TransitArgs {
    #[arg(long, global = true, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    maps_api_key: Option<String>,
    /// Schools looked up concurrently per batch
    #[arg(long, global = true, default_value_t = 10)]
    batch_size: usize,
    /// Pause between batches, in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    batch_delay_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one filter request and print the matching schools
    Search {
        /// Borough to include (repeatable); omit for all boroughs
        #[arg(long = "borough")]
        boroughs: Vec<String>,
        #[arg(long)]
        school_type: Option<String>,
        /// Minimum graduation rate
        #[arg(long)]
        grad_rate: Option<f64>,
        /// Minimum freshman 10-credit accumulation rate
        #[arg(long)]
        credit_rate: Option<f64>,
        /// "Yes" keeps open-admissions schools only; any other value imposes no constraint
        #[arg(long)]
        admissions_type: Option<String>,
        /// Origin address for transit times
        #[arg(long)]
        address: Option<String>,
        /// Output column to sort by
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, requires = "sort")]
        ascending: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Output file; `-` is stdout. CSV defaults to nyc_high_schools.csv, JSON to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Serve POST /api/filterSchools
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// Stand-in lookup when no Maps key is configured.
struct DisabledLookup;

#[async_trait]
impl TransitLookup for DisabledLookup {
    async fn duration(&self, _origin: &str, _destination: &str, _mode: TravelMode) -> Result<Duration, LookupError> {
        Err(LookupError::Status {
            status: "REQUEST_DENIED".to_string(),
            message: Some("no maps api key configured".to_string()),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let source = open_source(&cli.source)?;
    let enricher = build_enricher(&cli.transit)?;
    let finder = SchoolFinder::new(source, enricher).with_source_observer(Arc::new(TracingSourceObserver));

    match cli.command {
        Commands::Search {
            boroughs,
            school_type,
            grad_rate,
            credit_rate,
            admissions_type,
            address,
            sort,
            ascending,
            format,
            out,
        } => {
            let criteria = FilterCriteria {
                boroughs,
                school_type: non_blank(school_type),
                grad_rate,
                credit_rate,
                admissions_type: non_blank(admissions_type),
                address: non_blank(address),
            };

            let mut rows = finder
                .find_schools(&criteria)
                .await
                .context("failed to load school data")?;

            if let Some(column) = sort {
                let direction = if ascending {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                };
                sort_rows(&mut rows, &column, direction);
            }

            match (format, output_path(format, out)) {
                (OutputFormat::Json, None) => {
                    let mut stdout = std::io::stdout().lock();
                    serde_json::to_writer_pretty(&mut stdout, &rows)?;
                    writeln!(stdout)?;
                }
                (OutputFormat::Json, Some(path)) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    serde_json::to_writer_pretty(file, &rows)?;
                }
                (OutputFormat::Csv, None) => write_csv(&rows, std::io::stdout().lock())?,
                (OutputFormat::Csv, Some(path)) => {
                    write_csv_to_path(&rows, &path).with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "csv written");
                }
            }
            tracing::info!(rows = rows.len(), "search finished");
        }
        Commands::Serve { host, port } => {
            server::serve(Arc::new(finder), SocketAddr::new(host, port))
                .await
                .context("server failed")?;
        }
    }

    Ok(())
}

fn open_source(args: &SourceArgs) -> anyhow::Result<Arc<dyn DataSource>> {
    if let Some(path) = &args.workbook {
        return open_workbook(path);
    }
    if let Some(dir) = &args.csv_dir {
        if !dir.is_dir() {
            bail!("csv directory {} does not exist", dir.display());
        }
        return Ok(Arc::new(CsvDirSource::new(dir.clone())));
    }
    if let Some(sheet_id) = &args.sheet_id {
        let key = args
            .sheets_api_key
            .clone()
            .context("GOOGLE_SHEETS_API_KEY must be set to read the spreadsheet")?;
        let source = SheetsApiSource::new(SheetsApiOptions::new(sheet_id.clone(), key))
            .context("failed to build sheets api client")?;
        return Ok(Arc::new(source));
    }
    bail!("no data source: pass --workbook, --csv-dir or --sheet-id (SHEET_ID)")
}

#[cfg(feature = "excel")]
fn open_workbook(path: &std::path::Path) -> anyhow::Result<Arc<dyn DataSource>> {
    if !path.is_file() {
        bail!("workbook {} does not exist", path.display());
    }
    Ok(Arc::new(school_finder::ingestion::WorkbookSource::new(path)))
}

#[cfg(not(feature = "excel"))]
fn open_workbook(_path: &std::path::Path) -> anyhow::Result<Arc<dyn DataSource>> {
    bail!("workbook sources need the `excel` feature")
}

fn build_enricher(args: &TransitArgs) -> anyhow::Result<TransitEnricher> {
    if args.batch_size == 0 {
        bail!("--batch-size must be at least 1");
    }

    let lookup: Arc<dyn TransitLookup> = match args.maps_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => Arc::new(
            DirectionsClient::new(DirectionsOptions::new(key)).context("failed to build directions client")?,
        ),
        None => {
            tracing::warn!("GOOGLE_MAPS_API_KEY not set; transit times will be N/A");
            Arc::new(DisabledLookup)
        }
    };

    let opts = EnrichmentOptions {
        batch_size: args.batch_size,
        batch_delay: Duration::from_millis(args.batch_delay_ms),
        ..EnrichmentOptions::default()
    };

    let cache = Arc::new(MemoryCache::new());
    cache.spawn_sweeper(CACHE_SWEEP_INTERVAL);

    Ok(TransitEnricher::new(lookup, cache, opts).with_observer(Arc::new(TracingEnrichmentObserver)))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// File to write, or `None` for stdout.
fn output_path(format: OutputFormat, out: Option<PathBuf>) -> Option<PathBuf> {
    match out {
        Some(path) if path.as_os_str() == "-" => None,
        Some(path) => Some(path),
        None => match format {
            OutputFormat::Csv => Some(PathBuf::from(DEFAULT_EXPORT_FILE)),
            OutputFormat::Json => None,
        },
    }
}
