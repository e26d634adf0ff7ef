// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::{JobConfig, DEFAULT_CONFIG_PATH};
use crate::error::ConfigError;
use crate::file_loader::InputSource;
use clap::Args;
use std::path::PathBuf;

/// Command-line options shared by every word-count binary
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Number of workers, the coordinator included
    #[arg(short = 'n', long)]
    pub workers: Option<usize>,

    /// JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory receiving the execution report
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,

    /// Do not print the word table on the console
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Files to count
    #[arg(long, num_args = 1..)]
    pub files: Vec<String>,

    /// Count every regular file of this directory
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Count the files listed, one per line, in this index file
    #[arg(long)]
    pub index: Option<PathBuf>,
}

impl JobArgs {
    pub fn input_source(&self) -> InputSource {
        match (&self.input.directory, &self.input.index) {
            (Some(directory), _) => InputSource::Directory(directory.clone()),
            (None, Some(index)) => InputSource::IndexFile(index.clone()),
            (None, None) => InputSource::Files(self.input.files.clone()),
        }
    }

    /// Loads the configuration file and applies the command-line overrides
    pub fn resolve_config(&self) -> Result<JobConfig, ConfigError> {
        let mut config = JobConfig::load_or_default(&self.config);

        if let Some(workers) = self.workers {
            config.workers_count = workers;
        }
        if let Some(logs_dir) = &self.logs_dir {
            config.logs_dir = logs_dir.clone();
        }
        if self.quiet {
            config.print_results = false;
        }

        config.validate()?;
        Ok(config)
    }
}
