//! Vehicle locator utility

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, error, info};

use vehicle_locator::{
    codec,
    config::AppConfig,
    errors::LocatorError,
    nearest::NearestFinder,
    report::{self, OutputFormat},
};

/// Find the recorded vehicle positions nearest to a set of reference points
#[derive(Parser, Debug)]
#[command(name = "vehicle-locator", version)]
struct Cli {
    /// Configuration file, layered over config/default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Binary position log to read
    #[arg(long)]
    input: Option<PathBuf>,

    /// Number of nearest records per reference point
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

fn main() -> Result<(), LocatorError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = &result {
        error!("Vehicle locator failed: {}", e);
    }
    result
}

fn run(cli: Cli) -> Result<(), LocatorError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    // Command line flags take precedence over configuration
    if let Some(input) = cli.input {
        config.input.path = input;
    }
    if let Some(count) = cli.count {
        config.query.count = count;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    config.validate()?;
    debug!("Using configuration: {:?}", config);

    let records = codec::decode_file(&config.input.path)?;
    info!(
        "Decoded {} position records from {}",
        records.len(),
        config.input.path.display()
    );

    let finder = NearestFinder::new(&records);
    let results = finder.query_all(&config.query.references, config.query.count)?;
    info!(
        "Resolved {} reference points against {} records, {} nearest each",
        results.len(),
        finder.len(),
        config.query.count
    );

    let mut stdout = io::stdout().lock();
    report::render(&mut stdout, &results, config.output.format)?;
    stdout.flush()?;

    Ok(())
}
