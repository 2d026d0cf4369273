// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod cli;
mod work_list;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use work_dispatch_core::Coordinator;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(total_bytes) => {
            println!("{}", total_bytes);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("work-dispatch: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u64> {
    let config = cli.coordinator_config()?;
    let units = work_list::load(&cli.work_list)?;
    info!(units = units.len(), port = config.port, "work list loaded");

    let report = Coordinator::bind(config, units)?.run()?;
    info!(
        requeued = report.requeued,
        workers = report.connections_accepted,
        "coordinator finished"
    );
    Ok(report.total_bytes)
}
