use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, DEFAULT_ENCODING_LABEL, DOWNLOAD_URL};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "zipch")]
#[command(version)]
#[command(about = "Swiss zipcodes, cantons and municipalities", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipch location 1003            show the locality with zipcode 1003\n  \
  zipch canton GE                list the zipcodes of canton Geneva\n  \
  zipch download --force         fetch a fresh copy of the register")]
pub struct Cli {
    /// Local copy of the zipcodes CSV, downloaded when missing
    #[arg(short = 'f', long = "file", value_name = "FILE", default_value = "PLZO_CSV_LV95.csv")]
    pub file: PathBuf,

    /// URL of the ZIP archive to download
    #[arg(long, value_name = "URL", default_value = DOWNLOAD_URL)]
    pub url: String,

    /// Read the ZIP archive from a local path instead of downloading it
    #[arg(long, value_name = "ZIP", conflicts_with = "url")]
    pub archive: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Attempts on connection errors and timeouts
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub retries: u32,

    /// Encoding of the CSV table
    #[arg(long, value_name = "LABEL", default_value = DEFAULT_ENCODING_LABEL)]
    pub encoding: String,

    /// Quiet mode, only print warnings and results
    #[arg(short = 'q')]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the register if it is missing
    Download {
        /// Download even if the file already exists
        #[arg(long)]
        force: bool,
    },
    /// Show the locality for a zipcode
    Location {
        zipcode: u32,
        /// Also print WGS84 coordinates
        #[arg(long)]
        wgs84: bool,
    },
    /// List the zipcodes of a canton
    Canton { canton: String },
    /// List the zipcodes of a municipality
    Municipality { name: String },
    /// List all cantons
    Cantons,
    /// List all municipalities
    Municipalities,
}

impl Cli {
    pub fn config(&self) -> Result<Config> {
        Config::default()
            .with_url(&self.url)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_retry(self.retries)
            .with_encoding_label(&self.encoding)
    }

    pub fn log_level(&self) -> &'static str {
        if self.quiet { "warn" } else { "info" }
    }
}
