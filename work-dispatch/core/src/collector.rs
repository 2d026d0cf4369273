// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::wire::{self, Transfer};
use crate::{Connection, Progress, WireError, WorkUnit};
use std::io::Read;
use std::time::Instant;

#[derive(Debug)]
pub enum CollectOutcome {
    /// Connection not readable
    Skipped,
    /// Readable flag was stale; cleared
    NotReady,
    Completed { unit: WorkUnit, bytes: u64 },
    Failed(WireError),
}

/// Receives one result record and folds it into the running totals
///
/// On success the connection returns to idle and can be offered a new
/// unit without reconnecting.
pub fn collect<S: Read>(
    connection: &mut Connection<S>,
    progress: &mut Progress,
    now: Instant,
) -> CollectOutcome {
    if !connection.readiness.readable {
        return CollectOutcome::Skipped;
    }

    match wire::read_result(connection.stream_mut()) {
        Ok(Transfer::NotReady) => {
            connection.readiness.readable = false;
            CollectOutcome::NotReady
        }
        Ok(Transfer::Done(bytes)) => match connection.take_assigned() {
            Some(unit) => {
                progress.record(bytes);
                connection.touch(now);
                CollectOutcome::Completed { unit, bytes }
            }
            None => CollectOutcome::Failed(WireError::Unsolicited),
        },
        Err(e) => CollectOutcome::Failed(e),
    }
}
