//! Command line front end for walk-time coverage analysis.

mod config;
mod coverage;
mod optimize;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use walkcover_core::loading::{load_demand, load_equity_flags, join_risk_layer};
use walkcover_core::{
    AnalysisConfig, DemandPoint, NetworkSource, OsmPbfSource, RawNetwork, WeightBuilder,
    WeightSource,
};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "walkcover")]
#[command(about = "Walking-time coverage and facility siting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report coverage of a fixed site set
    Coverage(coverage::CoverageArgs),
    /// Pick the k candidates that add the most weighted coverage
    Optimize(optimize::OptimizeArgs),
}

/// Options shared by every subcommand
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Demand tracts (GeoJSON polygons)
    #[arg(long)]
    pub tracts: PathBuf,

    /// OpenStreetMap PBF extract to build the walk network from
    #[arg(long, required_unless_present = "network", conflicts_with = "network")]
    pub osm: Option<PathBuf>,

    /// Pre-extracted walk network (JSON nodes and edges)
    #[arg(long)]
    pub network: Option<PathBuf>,

    /// Walking time budget in minutes
    #[arg(long)]
    pub minutes: Option<u32>,

    /// Walking speed in meters per minute
    #[arg(long)]
    pub speed: Option<f64>,

    /// Buffer around reached street nodes in meters
    #[arg(long)]
    pub node_buffer: Option<f64>,

    /// Output directory
    #[arg(long, default_value = "outputs")]
    pub out: PathBuf,

    /// Replace artifacts left by an earlier run
    #[arg(long)]
    pub overwrite: bool,

    /// TOML file with an [analysis] table
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Worker threads for isochrone sweeps (defaults to all cores)
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum WeightBy {
    Hvi,
    Risk,
}

impl From<WeightBy> for WeightSource {
    fn from(value: WeightBy) -> Self {
        match value {
            WeightBy::Hvi => WeightSource::Vulnerability,
            WeightBy::Risk => WeightSource::Risk,
        }
    }
}

/// Weighting options shared by every subcommand
#[derive(Args, Debug)]
pub struct WeightArgs {
    /// Indicator used as demand weight
    #[arg(long, value_enum, default_value = "hvi")]
    pub weight_by: WeightBy,

    /// GeoJSON layer with modeled risk per tract, joined by id
    #[arg(long)]
    pub risk: Option<PathBuf>,

    /// CSV of tracts flagged for environmental justice (GEOID, ej)
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,

    /// Multiplier applied to flagged tracts
    #[arg(long, default_value_t = 1.0, requires = "equity_csv")]
    pub equity_weight: f64,
}

impl RunArgs {
    /// Configuration file values with command-line overrides applied
    pub fn analysis_config(&self) -> CliResult<AnalysisConfig> {
        let mut analysis = config::load(self.config.as_deref())?.analysis;
        if let Some(minutes) = self.minutes {
            analysis.isochrone.minutes = minutes;
        }
        if let Some(speed) = self.speed {
            analysis.network.walking_speed_m_per_min = speed;
        }
        if let Some(buffer) = self.node_buffer {
            analysis.isochrone.node_buffer_m = buffer;
        }
        analysis.validate()?;
        Ok(analysis)
    }

    pub fn network_source(&self) -> CliResult<Box<dyn NetworkSource>> {
        match (&self.osm, &self.network) {
            (Some(pbf), _) => Ok(Box::new(OsmPbfSource::new(pbf))),
            (None, Some(json)) => Ok(Box::new(RawNetwork::from_json_path(json)?)),
            (None, None) => Err("either --osm or --network is required".into()),
        }
    }

    pub fn demand(&self, weights: &WeightArgs) -> CliResult<Vec<DemandPoint>> {
        let mut demand = load_demand(&self.tracts)?;
        if let Some(risk) = &weights.risk {
            join_risk_layer(&mut demand, risk)?;
        }
        Ok(demand)
    }
}

impl WeightArgs {
    pub fn builder(&self) -> CliResult<WeightBuilder> {
        let builder = WeightBuilder::new(self.weight_by.into());
        Ok(match &self.equity_csv {
            Some(path) => builder.with_equity(load_equity_flags(path)?, self.equity_weight),
            None => builder,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn configure_threads(threads: Option<usize>) -> CliResult<()> {
    if let Some(threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }
    Ok(())
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Coverage(args) => {
            configure_threads(args.run.threads)?;
            coverage::run(&args)
        }
        Commands::Optimize(args) => {
            configure_threads(args.run.threads)?;
            optimize::run(&args)
        }
    }
}
