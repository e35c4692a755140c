/// Command-line arguments.
use crate::render::DisplayConfig;
use clap::Parser;
use diskmapper_core::config::SMALL_FILE_THRESHOLD;
use diskmapper_core::MaterializeConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "diskmapper", version, about = "Show what is using space under a folder")]
pub struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Levels below the root to print
    #[arg(short, long, default_value_t = 2)]
    pub depth: usize,

    /// Files smaller than this many bytes are grouped together
    #[arg(long, value_name = "BYTES", default_value_t = SMALL_FILE_THRESHOLD)]
    pub threshold: u64,

    /// List small files individually instead of grouping them
    #[arg(long)]
    pub no_bucket: bool,

    /// Show each entry's share of its parent as a bar
    #[arg(short, long)]
    pub relative: bool,

    /// Print the tree as JSON
    #[arg(long)]
    pub json: bool,

    /// Cancel the scan after this many seconds and show partial results
    #[arg(long, value_name = "SECS")]
    pub time_limit: Option<u64>,

    /// Log every skipped directory
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn materialize_config(&self) -> MaterializeConfig {
        MaterializeConfig {
            small_file_threshold: self.threshold,
            bucket_small_files: !self.no_bucket,
        }
    }

    pub fn display_config(&self) -> DisplayConfig {
        DisplayConfig {
            depth: self.depth,
            show_relative: self.relative,
        }
    }
}
