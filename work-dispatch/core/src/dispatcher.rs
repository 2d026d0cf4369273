// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::wire::{self, Transfer};
use crate::{Connection, WireError, WorkQueue};
use std::io::Write;
use std::time::Instant;

#[derive(Debug)]
pub enum DispatchOutcome {
    /// Connection busy, not writable, or no queued work
    Skipped,
    /// Socket refused the frame without taking any byte; unit went back
    NotReady,
    Dispatched,
    /// The unit stays attached to the connection so teardown requeues it
    Failed(WireError),
}

/// Hands the next queued unit to an idle, writable connection
pub fn dispatch<S: Write>(
    connection: &mut Connection<S>,
    queue: &mut WorkQueue,
    now: Instant,
) -> DispatchOutcome {
    if !connection.is_idle() || !connection.readiness.writable {
        return DispatchOutcome::Skipped;
    }
    let Some(unit) = queue.pop() else {
        return DispatchOutcome::Skipped;
    };

    match wire::write_assignment(connection.stream_mut(), &unit) {
        Ok(Transfer::Done(())) => {
            connection.assign(unit);
            connection.touch(now);
            DispatchOutcome::Dispatched
        }
        Ok(Transfer::NotReady) => {
            connection.readiness.writable = false;
            queue.requeue(unit);
            DispatchOutcome::NotReady
        }
        Err(e) => {
            connection.assign(unit);
            DispatchOutcome::Failed(e)
        }
    }
}
