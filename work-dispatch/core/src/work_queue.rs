// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::WorkUnit;

/// Units that are neither in flight nor completed
///
/// The queue is a stack: the last listed unit is dispatched first and
/// requeued units are pushed on top. No external contract depends on the
/// order.
#[derive(Debug, Default)]
pub struct WorkQueue {
    units: Vec<WorkUnit>,
}

impl WorkQueue {
    pub fn new(units: impl IntoIterator<Item = WorkUnit>) -> Self {
        Self {
            units: units.into_iter().collect(),
        }
    }

    /// Takes the next unit to dispatch
    pub fn pop(&mut self) -> Option<WorkUnit> {
        self.units.pop()
    }

    /// Returns a unit whose dispatch or connection failed
    pub fn requeue(&mut self, unit: WorkUnit) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
