pub mod report;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for ucdm
#[derive(Parser, Debug)]
#[command(name = "ucdm")]
#[command(about = "Scan DICOM tags once, group files into units and extract per-unit attributes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory for tags and write the scan table as CSV
    Scan {
        /// Directory containing DICOM files
        #[arg(value_name = "DIRECTORY")]
        directory: PathBuf,

        /// Tags to scan: keywords, tag strings (0020|000e), aliases
        /// (:multivol:) or .tags files listing them
        #[arg(short, long, num_args = 1.., required = true)]
        tags: Vec<String>,

        /// Output CSV file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Group files into units and extract one row of attributes per unit
    Extract {
        #[command(flatten)]
        input: InputArgs,

        /// Tags defining a unit, outermost first
        #[arg(short, long, num_args = 1.., default_value = "SeriesInstanceUID")]
        unit: Vec<String>,

        /// Tags whose single per-unit value becomes a column
        #[arg(short, long, num_args = 1..)]
        lookup: Vec<String>,

        /// Add a column with the number of files per unit
        #[arg(long)]
        slices: bool,

        /// Add subseries detection columns (units must be single series)
        #[arg(long)]
        subseries: bool,

        /// Run each top-level subdirectory as an independent partition
        #[arg(long, conflicts_with = "index")]
        parallel: bool,

        /// Leave failed partitions out instead of aborting
        #[arg(long, requires = "parallel")]
        skip_failed: bool,

        /// Output CSV file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Report subseries axes of every series
    Subseries {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Where the scan table comes from
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Directory containing DICOM files
    #[arg(value_name = "DIRECTORY", required_unless_present = "index")]
    pub directory: Option<PathBuf>,

    /// Re-use a scan table written by `ucdm scan` instead of scanning
    #[arg(long, conflicts_with = "directory")]
    pub index: Option<PathBuf>,
}

/// Options shared by all commands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// JSON file of tag aliases ({"name": "Keyword" | ["tag", ...]})
    #[arg(long, value_name = "FILE")]
    pub tag_config: Option<PathBuf>,

    /// Drop unreadable files with a warning instead of failing
    #[arg(long)]
    pub skip_unreadable: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::parse_from([
            "ucdm", "extract", "data", "-u", "SeriesInstanceUID", "AcquisitionNumber", "-l",
            "Modality", "--slices", "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Extract {
                input,
                unit,
                lookup,
                slices,
                parallel,
                ..
            } => {
                assert_eq!(input.directory, Some(PathBuf::from("data")));
                assert_eq!(unit, vec!["SeriesInstanceUID", "AcquisitionNumber"]);
                assert_eq!(lookup, vec!["Modality"]);
                assert!(slices);
                assert!(!parallel);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_unit_and_index_input() {
        let cli = Cli::parse_from(["ucdm", "extract", "--index", "scan.csv"]);
        match cli.command {
            Commands::Extract { input, unit, .. } => {
                assert_eq!(input.directory, None);
                assert_eq!(input.index, Some(PathBuf::from("scan.csv")));
                assert_eq!(unit, vec!["SeriesInstanceUID"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_input() {
        assert!(Cli::try_parse_from(["ucdm", "subseries"]).is_err());
        assert!(Cli::try_parse_from(["ucdm", "scan", "data"]).is_err());
        assert!(Cli::try_parse_from(["ucdm", "extract", "data", "--skip-failed"]).is_err());
    }
}
