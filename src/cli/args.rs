use crate::models::Scale;
use crate::processors::MissingRasterPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prism-extractor")]
#[command(about = "Extract PRISM climate rasters into station time series and weather files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Only log warnings and errors")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Settings file [default: ./prism.toml if present]")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Inclusive year range shared by most commands
#[derive(Args, Debug, Clone)]
pub struct YearRange {
    #[arg(long, help = "First year to process")]
    pub start_year: i32,

    #[arg(long, help = "Last year to process (inclusive)")]
    pub end_year: i32,
}

impl YearRange {
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and unpack PRISM raster archives
    Download {
        #[arg(short, long, help = "Data root holding zips/ and variables/")]
        root: PathBuf,

        #[arg(short = 'a', long = "variable", required = true, help = "PRISM variable, e.g. ppt, tmin, tmax")]
        variables: Vec<String>,

        #[arg(short, long, default_value = "daily")]
        scale: Scale,

        #[command(flatten)]
        years: YearRange,

        #[arg(long, help = "Archive service URL [default: from settings]")]
        base_url: Option<String>,
    },

    /// Copy files of yearly monthly archives into per-month folders
    SplitMonthly {
        #[arg(short, long)]
        root: PathBuf,

        #[arg(short = 'a', long)]
        variable: String,

        #[arg(short, long, default_value = "monthly")]
        scale: Scale,

        #[command(flatten)]
        years: YearRange,
    },

    /// Sample rasters at station locations into Prism_<var>_<year>.csv tables
    Extract {
        #[arg(short, long, help = "Data root holding variables/")]
        root: PathBuf,

        #[arg(short, long, help = "Directory for the per-year tables")]
        output_dir: PathBuf,

        #[arg(short = 'a', long = "variable", required = true)]
        variables: Vec<String>,

        #[arg(short, long, default_value = "daily")]
        scale: Scale,

        #[command(flatten)]
        years: YearRange,

        #[arg(long, help = "Station list CSV [default: the list shipped with the archives]")]
        stations: Option<PathBuf>,

        #[arg(long, help = "Date key of the archive whose station list is used")]
        catalog_date_key: Option<String>,

        #[arg(long, value_enum, help = "What to do when a date has no raster")]
        missing_raster_policy: Option<MissingRasterPolicy>,

        #[arg(long, help = "Dates between table checkpoints (0 = only at the end)")]
        checkpoint_every: Option<usize>,
    },

    /// Concatenate per-year tables into multi-year daily tables per state
    Assemble {
        #[arg(short, long, help = "Directory holding <state>/Prism_<var>_<year>.csv")]
        data_dir: PathBuf,

        #[arg(short, long)]
        output_dir: PathBuf,

        #[arg(long = "state", required = true)]
        states: Vec<String>,

        #[arg(short = 'a', long = "variable", required = true)]
        variables: Vec<String>,

        #[command(flatten)]
        years: YearRange,
    },

    /// Write per-station CSV and .dly weather files from the daily tables
    BuildStations {
        #[arg(short, long, help = "Directory holding PRISM_<start>_<end>_daily_<var>.csv")]
        input_dir: PathBuf,

        #[arg(short, long)]
        output_dir: PathBuf,

        #[command(flatten)]
        years: YearRange,
    },

    /// Write the WDLYLIST.DAT station directory
    StationList {
        #[arg(short, long, help = "Station catalog CSV")]
        catalog: PathBuf,

        #[arg(short, long, help = "Output file [default: WDLYLIST.DAT]")]
        output: Option<PathBuf>,
    },

    /// Restrict station catalogs to a bounding box and merge them
    FilterStations {
        #[arg(short, long = "catalog", required = true)]
        catalogs: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, allow_hyphen_values = true, default_value_t = -180.0)]
        west: f64,

        #[arg(long, allow_hyphen_values = true, default_value_t = -90.0)]
        south: f64,

        #[arg(long, allow_hyphen_values = true, default_value_t = 180.0)]
        east: f64,

        #[arg(long, allow_hyphen_values = true, default_value_t = 90.0)]
        north: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::parse_from([
            "prism-extractor",
            "--verbose",
            "extract",
            "--root",
            "data",
            "--output-dir",
            "out",
            "-a",
            "ppt",
            "-a",
            "tmax",
            "--start-year",
            "1981",
            "--end-year",
            "1982",
            "--missing-raster-policy",
            "abort",
        ]);

        assert_eq!(cli.get_log_level(), "debug");
        match cli.command {
            Commands::Extract {
                variables,
                scale,
                years,
                missing_raster_policy,
                ..
            } => {
                assert_eq!(variables, vec!["ppt", "tmax"]);
                assert_eq!(scale, Scale::Daily);
                assert_eq!(years.years(), 1981..=1982);
                assert_eq!(missing_raster_policy, Some(MissingRasterPolicy::Abort));
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_negative_bounds() {
        let cli = Cli::parse_from([
            "prism-extractor",
            "filter-stations",
            "-c",
            "a.csv",
            "-o",
            "b.csv",
            "--west",
            "-91.5",
            "--east",
            "-88",
        ]);
        match cli.command {
            Commands::FilterStations { west, east, south, .. } => {
                assert_eq!(west, -91.5);
                assert_eq!(east, -88.0);
                assert_eq!(south, -90.0);
            }
            _ => panic!("expected filter-stations"),
        }
    }
}
