use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GeoSarovar - Water-intelligence analyses over a region of interest
#[derive(Parser, Debug)]
#[command(name = "sarovar")]
#[command(about = "Water-intelligence analyses over a region of interest", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Compute backend to use (memory or http)
    #[arg(long, global = true, default_value = "memory")]
    pub backend: BackendChoice,

    /// Fixture for the memory backend (defaults to the bundled demo data)
    #[arg(long, global = true, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Configuration file (defaults to ./sarovar.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Compute backend endpoint (overrides config and environment)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Project id used in permission remediation links
    #[arg(long, global = true)]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Compute backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendChoice {
    /// Scripted in-memory backend (default, offline)
    Memory,
    /// Remote compute service over HTTP
    Http,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List analysis modules and their parameters
    Modules(ModulesArgs),

    /// Resolve an ROI and report the region it falls in
    Resolve(ResolveArgs),

    /// Run one analysis module over an ROI
    Run(RunArgs),

    /// Step through a session with prompts
    Interactive(InteractiveArgs),

    /// Show the effective configuration and where each value came from
    Config,

    /// Run health checks against the configured backend
    Doctor(DoctorArgs),
}

#[derive(Parser, Debug)]
pub struct ModulesArgs {
    /// Region name used to tune defaults (e.g., "Rajasthan")
    #[arg(long)]
    pub region: Option<String>,

    /// Also list every parameter with its default and bounds
    #[arg(long)]
    pub params: bool,
}

/// The three ways of giving an ROI; exactly one is required
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct RoiArgs {
    /// KML boundary file
    #[arg(long, value_name = "FILE")]
    pub boundary: Option<PathBuf>,

    /// Point as "lat,lon"; buffered by --radius
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub point: Option<String>,

    /// GeoJSON geometry or feature, inline or as a file path
    #[arg(long, value_name = "GEOJSON")]
    pub shape: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub roi: RoiArgs,

    /// Buffer radius in meters for --point
    #[arg(long, default_value = "1000")]
    pub radius: f64,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Module id (rainfall, rwh, encroachment, flood, water-quality)
    pub module: String,

    #[command(flatten)]
    pub roi: RoiArgs,

    /// Buffer radius in meters for --point
    #[arg(long, default_value = "1000")]
    pub radius: f64,

    /// Parameter override as name=value (repeatable)
    #[arg(long = "param", short = 'p', value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Start an export of the result to storage
    #[arg(long)]
    pub export: bool,

    /// Also prepare a static map of the result
    #[arg(long)]
    pub static_map: bool,

    /// Date used for date-dependent defaults (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,
}

#[derive(Parser, Debug)]
pub struct InteractiveArgs {
    /// Date used for date-dependent defaults (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,
}

#[derive(Parser, Debug)]
pub struct DoctorArgs {
    /// Show detailed diagnostic information
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "sarovar", "--json", "run", "flood", "--point", "26.3,73.0", "--radius", "2000", "-p",
            "threshold=1.3", "--today", "2024-03-01",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.backend, BackendChoice::Memory);
        let Commands::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.module, "flood");
        assert_eq!(args.roi.point.as_deref(), Some("26.3,73.0"));
        assert_eq!(args.radius, 2000.0);
        assert_eq!(args.params, vec!["threshold=1.3"]);
        assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_roi_modes_are_exclusive() {
        assert!(Cli::try_parse_from(["sarovar", "resolve"]).is_err());
        assert!(Cli::try_parse_from([
            "sarovar", "resolve", "--point", "1,2", "--boundary", "area.kml"
        ])
        .is_err());
    }
}
