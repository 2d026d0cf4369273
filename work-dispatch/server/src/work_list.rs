// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use work_dispatch_core::WorkUnit;

/// Reads one unit per line from `path`, or from stdin when `path` is `-`
pub fn load(path: &Path) -> Result<Vec<WorkUnit>> {
    let units = if path == Path::new("-") {
        parse(io::stdin().lock()).context("failed to read work list from stdin")?
    } else {
        let file = File::open(path)
            .with_context(|| format!("failed to open work list {}", path.display()))?;
        parse(BufReader::new(file))
            .with_context(|| format!("failed to read work list {}", path.display()))?
    };

    if units.is_empty() {
        bail!("work list {} contains no units", path.display());
    }
    Ok(units)
}

/// Blank lines are skipped and `\r\n` endings tolerated
pub fn parse(reader: impl BufRead) -> io::Result<Vec<WorkUnit>> {
    let mut units = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim_end_matches('\r');
        if !id.trim().is_empty() {
            units.push(WorkUnit::from(id));
        }
    }
    Ok(units)
}
