// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Running totals folded in by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    total_units: usize,
    outstanding: usize,
    total_bytes: u64,
}

impl Progress {
    pub fn new(total_units: usize) -> Self {
        Self {
            total_units,
            outstanding: total_units,
            total_bytes: 0,
        }
    }

    /// Folds in one successfully completed unit
    pub fn record(&mut self, bytes: u64) {
        debug_assert!(self.outstanding > 0, "more completions than units");
        self.outstanding = self.outstanding.saturating_sub(1);
        self.total_bytes = self.total_bytes.saturating_add(bytes);
    }

    pub fn total_units(&self) -> usize {
        self.total_units
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn completed(&self) -> usize {
        self.total_units - self.outstanding
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn is_done(&self) -> bool {
        self.outstanding == 0
    }
}
