// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use clap::Parser;
use std::path::PathBuf;
use work_dispatch_core::{CoordinatorConfig, CoordinatorError};

/// Distributes a list of work units to connecting workers
#[derive(Parser, Debug)]
#[command(
    name = "work-dispatch",
    version,
    after_help = "EXAMPLES:\n    \
        work-dispatch filelist.csv 4242\n    \
        cat filelist.csv | work-dispatch - 4242 --timeout-ms 5000"
)]
pub struct Cli {
    /// File with one work unit per line, or `-` for stdin
    #[arg(value_name = "WORK_LIST")]
    pub work_list: PathBuf,

    /// Port workers connect to
    #[arg(value_name = "PORT")]
    pub port: u16,

    /// JSON file with coordinator settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Maximum concurrent workers
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Tear down a worker silent for this long
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Longest single wait for socket readiness
    #[arg(long, value_name = "MS")]
    pub wait_ms: Option<u64>,
}

impl Cli {
    /// Config file values, overridden by whatever was given on the command line
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, CoordinatorError> {
        let mut config = match &self.config {
            Some(path) => CoordinatorConfig::load(path)?,
            None => CoordinatorConfig::default(),
        };

        config.port = self.port;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.inactivity_timeout_ms = timeout_ms;
        }
        if let Some(wait_ms) = self.wait_ms {
            config.wait_interval_ms = wait_ms;
        }

        config.validate()?;
        Ok(config)
    }
}
