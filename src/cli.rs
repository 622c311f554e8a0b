//! Command-line arguments for the `docket-dl` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::error::Result;
use crate::types::Dataset;

/// Download every file of a regulations.gov docket from the mirrulations bucket
#[derive(Debug, Parser)]
#[command(name = "docket-dl")]
#[command(version)]
pub struct Cli {
    /// Agency code, e.g. EPA
    pub agency: String,

    /// Docket identifier, e.g. EPA-HQ-OW-2020-0001
    pub docket_id: String,

    /// Folder the docket directory is created in [default: .]
    #[arg(long = "output-folder", value_name = "DIR")]
    pub output_folder: Option<PathBuf>,

    /// Also download binary attachments when the docket has any
    #[arg(long = "include-binary")]
    pub include_binary: bool,

    /// JSON configuration file; flags given here take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bucket to download from [default: mirrulations]
    #[arg(long, env = "DOCKET_DL_BUCKET")]
    pub bucket: Option<String>,

    /// S3-compatible endpoint to use instead of AWS (path-style addressing)
    #[arg(long, env = "DOCKET_DL_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Maximum number of concurrent downloads, at most 8 [default: 8]
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Split into the dataset to download and the effective configuration.
    ///
    /// Flags override values loaded from `--config`, which override defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the agency or docket id is unsafe, the config
    /// file cannot be loaded, or the merged configuration fails validation.
    pub fn into_parts(self) -> Result<(Dataset, Config)> {
        let dataset = Dataset::new(self.agency, self.docket_id)?;

        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(output_folder) = self.output_folder {
            config.download.output_folder = output_folder;
        }
        if self.include_binary {
            config.download.include_binary = true;
        }
        if let Some(bucket) = self.bucket {
            config.store.bucket = bucket;
        }
        if let Some(endpoint) = self.endpoint {
            config.store.endpoint = Some(endpoint);
        }
        if let Some(workers) = self.workers {
            config.download.max_workers = workers;
        }
        config.validate()?;

        Ok((dataset, config))
    }
}
