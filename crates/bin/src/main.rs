//! Riskscape CLI binary.
//!
//! Computes risk metrics, embeddings, clusters and risk predictions for a
//! list of symbols measured against a benchmark.

mod fetch;

use clap::{Parser, Subcommand, ValueEnum};
use fetch::{Loaded, PriceSource, load_benchmark, load_symbols};
use riskscape::output::{
    ExportFormat, Exporter, FailureRecord, PriceRecord, QuoteRecord, Report, ReportBuilder,
};
use riskscape::records::{
    cluster_points, prediction_records, price_records, projection_points, quote_record,
    risk_records,
};
use riskscape::risk::RiskBatch;
use riskscape::{Pipeline, PipelineConfig, batch_features};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riskscape")]
#[command(about = "Riskscape: market risk, embeddings and clusters for equities", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Benchmark symbol
    #[arg(long, global = true)]
    benchmark: Option<String>,

    /// Years of history to fetch
    #[arg(long, global = true)]
    years: Option<u32>,

    /// Read `<SYMBOL>.csv` files from this directory instead of Yahoo Finance
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,

    /// Reindex prices onto business days
    #[arg(long, global = true)]
    business_days: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write output to a file instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Log pipeline details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Volatility, beta and idiosyncratic risk per symbol
    Risk {
        /// Stock symbols
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Standardized 2-D embedding with k-means clusters
    Cluster {
        /// Stock symbols
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Number of clusters
        #[arg(long, short)]
        clusters: Option<usize>,

        /// Random seed for centroid initialization
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Unscaled 2-D projection of (volatility, beta)
    Project {
        /// Stock symbols
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Predict idiosyncratic risk from (volatility, beta) with ridge regression
    Predict {
        /// Stock symbols
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Regularization strength
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Last two closes and the change between them
    Quote {
        /// Stock symbols
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Daily closes reindexed onto business days
    History {
        /// Stock symbols
        #[arg(required = true)]
        symbols: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
    Markdown,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(benchmark) = &cli.benchmark {
        config.benchmark = benchmark.trim().to_uppercase();
    }
    if let Some(years) = cli.years {
        config.history_years = years;
    }
    if cli.business_days {
        config.business_days = true;
    }
    config.validate()?;

    let source = PriceSource::new(cli.csv_dir.clone())?;

    let output = match cli.command {
        Commands::Risk { ref symbols } => {
            let pipeline = Pipeline::new(config);
            let (batch, failures) = run_batch(&source, &pipeline, symbols).await?;
            let report = report_for(&pipeline, &batch, failures).build();
            render(&report, &report.risks, cli.format)?
        }
        Commands::Cluster {
            ref symbols,
            clusters,
            seed,
        } => {
            if let Some(k) = clusters {
                config.kmeans.n_clusters = k;
            }
            if let Some(seed) = seed {
                config.kmeans.seed = seed;
            }
            let pipeline = Pipeline::new(config);
            let (batch, failures) = run_batch(&source, &pipeline, symbols).await?;
            let (features, _) = batch_features(&batch)?;
            let embedding = pipeline.embed_and_cluster(&features)?;
            let report = report_for(&pipeline, &batch, failures)
                .clusters(cluster_points(&features, &embedding))
                .build();
            render(&report, &report.clusters, cli.format)?
        }
        Commands::Project { ref symbols } => {
            let pipeline = Pipeline::new(config);
            let (batch, failures) = run_batch(&source, &pipeline, symbols).await?;
            let (features, _) = batch_features(&batch)?;
            let points = pipeline.project(&features)?;
            let report = report_for(&pipeline, &batch, failures)
                .projections(projection_points(&features, &points))
                .build();
            render(&report, &report.projections, cli.format)?
        }
        Commands::Predict { ref symbols, alpha } => {
            if let Some(alpha) = alpha {
                config.ridge.alpha = alpha;
            }
            let pipeline = Pipeline::new(config);
            let (batch, failures) = run_batch(&source, &pipeline, symbols).await?;
            let (features, targets) = batch_features(&batch)?;
            let predicted = pipeline.fit_risk_model(&features, &targets)?;
            let report = report_for(&pipeline, &batch, failures)
                .predictions(prediction_records(&features, &targets, &predicted))
                .build();
            render(&report, &report.predictions, cli.format)?
        }
        Commands::Quote { ref symbols } => {
            let pipeline = Pipeline::new(config);
            let loaded = load_symbols(&source, &pipeline, symbols).await?;
            let (quotes, failures) = quotes(loaded);
            render_quotes(&quotes, &failures, cli.format)?
        }
        Commands::History { ref symbols } => {
            config.business_days = true;
            let pipeline = Pipeline::new(config);
            let loaded = load_symbols(&source, &pipeline, symbols).await?;
            let failures: Vec<FailureRecord> = loaded
                .failures
                .into_iter()
                .map(|(symbol, e)| FailureRecord::new(symbol, &e))
                .collect();
            let prices: Vec<PriceRecord> = loaded.series.iter().flat_map(price_records).collect();
            render_history(&prices, &failures, cli.format)?
        }
    };

    match cli.output {
        Some(path) => {
            std::fs::write(&path, output)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{output}"),
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "riskscape=debug,warn" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load benchmark and symbols, then estimate risk for every loaded symbol.
async fn run_batch(
    source: &PriceSource,
    pipeline: &Pipeline,
    symbols: &[String],
) -> Result<(RiskBatch, Vec<FailureRecord>), Box<dyn std::error::Error>> {
    let benchmark = load_benchmark(source, pipeline).await?;
    let Loaded { series, failures } = load_symbols(source, pipeline, symbols).await?;

    let failures = failures
        .into_iter()
        .map(|(symbol, e)| FailureRecord::new(symbol, &e))
        .collect();
    let batch = pipeline.batch(&series, &benchmark)?;
    Ok((batch, failures))
}

fn report_for(
    pipeline: &Pipeline,
    batch: &RiskBatch,
    mut failures: Vec<FailureRecord>,
) -> ReportBuilder {
    let (risks, batch_failures) = risk_records(batch);
    failures.extend(batch_failures);
    ReportBuilder::new()
        .benchmark(batch.benchmark())
        .period_years(pipeline.config().history_years)
        .risks(risks)
        .failures(failures)
}

/// Render a report; CSV carries only the command's own records.
fn render(
    report: &Report,
    records: &dyn Exporter,
    format: Format,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        Format::Text => report.to_ascii_table(),
        Format::Json => report.to_json()?,
        Format::Markdown => report.to_markdown(),
        Format::Csv => {
            for failure in &report.failures {
                eprintln!("Warning: skipped {}: {}", failure.symbol, failure.error);
            }
            records.export_to_string(ExportFormat::Csv)?
        }
    })
}

fn quotes(loaded: Loaded) -> (Vec<QuoteRecord>, Vec<FailureRecord>) {
    let mut failures: Vec<FailureRecord> = loaded
        .failures
        .into_iter()
        .map(|(symbol, e)| FailureRecord::new(symbol, &e))
        .collect();
    let mut quotes = Vec::with_capacity(loaded.series.len());
    for series in &loaded.series {
        match series.latest_change() {
            Some(change) => quotes.push(quote_record(series.symbol(), change)),
            None => failures.push(FailureRecord::new(
                series.symbol().to_string(),
                &"need at least two closes",
            )),
        }
    }
    (quotes, failures)
}

fn render_quotes(
    quotes: &[QuoteRecord],
    failures: &[FailureRecord],
    format: Format,
) -> Result<String, Box<dyn std::error::Error>> {
    for failure in failures {
        eprintln!("Warning: skipped {}: {}", failure.symbol, failure.error);
    }

    let mut out = String::new();
    match format {
        Format::Json => out = quotes.export_to_string(ExportFormat::PrettyJson)?,
        Format::Csv => out = quotes.export_to_string(ExportFormat::Csv)?,
        Format::Text => {
            writeln!(
                out,
                "{:<10} {:>12} {:>12} {:>10} {:>9}",
                "Symbol", "Previous", "Latest", "Change", "Change%"
            )?;
            out.push_str(&"-".repeat(57));
            out.push('\n');
            for q in quotes {
                writeln!(
                    out,
                    "{:<10} {:>12.2} {:>12.2} {:>+10.2} {:>9}",
                    q.symbol,
                    q.last_close,
                    q.latest_close,
                    q.change,
                    fmt_pct(q.change_pct)
                )?;
            }
        }
        Format::Markdown => {
            out.push_str("| Symbol | Previous | Latest | Change | Change% |\n");
            out.push_str("|--------|----------|--------|--------|---------|\n");
            for q in quotes {
                writeln!(
                    out,
                    "| {} | {:.2} | {:.2} | {:+.2} | {} |",
                    q.symbol,
                    q.last_close,
                    q.latest_close,
                    q.change,
                    fmt_pct(q.change_pct)
                )?;
            }
        }
    }
    Ok(out)
}

fn render_history(
    prices: &[PriceRecord],
    failures: &[FailureRecord],
    format: Format,
) -> Result<String, Box<dyn std::error::Error>> {
    for failure in failures {
        eprintln!("Warning: skipped {}: {}", failure.symbol, failure.error);
    }

    let mut out = String::new();
    match format {
        Format::Json => out = prices.export_to_string(ExportFormat::PrettyJson)?,
        Format::Csv => out = prices.export_to_string(ExportFormat::Csv)?,
        Format::Text => {
            writeln!(out, "{:<10} {:<12} {:>12}", "Symbol", "Date", "Close")?;
            out.push_str(&"-".repeat(36));
            out.push('\n');
            for p in prices {
                writeln!(
                    out,
                    "{:<10} {:<12} {:>12.2}",
                    p.symbol,
                    p.date.to_string(),
                    p.close
                )?;
            }
        }
        Format::Markdown => {
            out.push_str("| Symbol | Date | Close |\n");
            out.push_str("|--------|------|------:|\n");
            for p in prices {
                writeln!(out, "| {} | {} | {:.2} |", p.symbol, p.date, p.close)?;
            }
        }
    }
    Ok(out)
}

fn fmt_pct(pct: Option<f64>) -> String {
    pct.map_or_else(|| "n/a".to_string(), |p| format!("{:+.2}%", p * 100.0))
}
