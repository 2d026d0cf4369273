// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Connection, ConnectionRegistry, Multiplexer, WireError, WorkQueue};
use mio::event::Source;
use mio::Token;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum FailureReason {
    HungUp,
    TimedOut { idle: Duration },
    Wire(WireError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::HungUp => write!(f, "peer hung up"),
            FailureReason::TimedOut { idle } => write!(f, "inactive for {}ms", idle.as_millis()),
            FailureReason::Wire(e) => write!(f, "{}", e),
        }
    }
}

/// What a teardown released
#[derive(Debug, PartialEq, Eq)]
pub struct Teardown {
    pub token: Token,
    pub requeued: bool,
}

/// Decides whether a connection is presumed dead
///
/// Hangup wins over staleness. There is no heartbeat: a worker that is
/// slow but alive past `timeout` is treated as dead too.
pub fn inspect<S>(
    connection: &Connection<S>,
    now: Instant,
    timeout: Duration,
) -> Option<FailureReason> {
    if connection.readiness().hung_up {
        return Some(FailureReason::HungUp);
    }
    let idle = connection.idle_for(now);
    (idle > timeout).then_some(FailureReason::TimedOut { idle })
}

/// Removes a connection, requeues its in-flight unit and closes the socket
///
/// Returns `None` when the token is no longer registered, so a second
/// teardown of the same connection does nothing.
pub fn teardown<S: Source>(
    registry: &mut ConnectionRegistry<S>,
    multiplexer: &Multiplexer,
    queue: &mut WorkQueue,
    token: Token,
    reason: &FailureReason,
) -> Option<Teardown> {
    let mut connection = registry.remove(token)?;
    let peer = connection.peer();

    if let Err(e) = multiplexer.deregister(connection.stream_mut()) {
        debug!(token = token.0, error = %e, "deregister failed");
    }

    let requeued = match connection.take_assigned() {
        Some(unit) => {
            warn!(token = token.0, ?peer, %unit, %reason, "worker lost, requeueing unit");
            queue.requeue(unit);
            true
        }
        None => {
            debug!(token = token.0, ?peer, %reason, "idle worker dropped");
            false
        }
    };

    drop(connection.into_stream());
    Some(Teardown { token, requeued })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplexer::Readiness;
    use crate::test_support::MockStream;
    use crate::WorkUnit;
    use assert_matches::assert_matches;

    const TIMEOUT: Duration = Duration::from_millis(2000);

    fn connection(token: usize, created: Instant) -> Connection<MockStream> {
        Connection::new(Token(token), MockStream::default(), None, created)
    }

    #[test]
    fn test_fresh_connection_is_alive() {
        let created = Instant::now();
        let connection = connection(1, created);

        assert!(inspect(&connection, created + TIMEOUT, TIMEOUT).is_none());
    }

    #[test]
    fn test_silent_connection_times_out_without_hangup() {
        let created = Instant::now();
        let connection = connection(1, created);

        let verdict = inspect(&connection, created + TIMEOUT + Duration::from_millis(1), TIMEOUT);

        assert_matches!(verdict, Some(FailureReason::TimedOut { .. }));
    }

    #[test]
    fn test_hangup_takes_precedence_over_timeout() {
        let created = Instant::now();
        let mut connection = connection(1, created);
        connection.observe(Readiness {
            hung_up: true,
            ..Readiness::default()
        });

        let verdict = inspect(&connection, created + TIMEOUT * 2, TIMEOUT);

        assert_matches!(verdict, Some(FailureReason::HungUp));
    }

    #[test]
    fn test_teardown_requeues_in_flight_unit_once() {
        let multiplexer = Multiplexer::new(4).unwrap();
        let mut registry = ConnectionRegistry::with_capacity(4);
        let mut queue = WorkQueue::default();
        let mut busy = connection(1, Instant::now());
        busy.assign(WorkUnit::from("a.csv"));
        registry.insert(busy).unwrap();

        let first = teardown(&mut registry, &multiplexer, &mut queue, Token(1), &FailureReason::HungUp);
        let second = teardown(&mut registry, &multiplexer, &mut queue, Token(1), &FailureReason::HungUp);

        assert_eq!(
            first,
            Some(Teardown {
                token: Token(1),
                requeued: true
            })
        );
        assert_eq!(second, None);
        assert_eq!(queue.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_teardown_of_idle_connection_requeues_nothing() {
        let multiplexer = Multiplexer::new(4).unwrap();
        let mut registry = ConnectionRegistry::with_capacity(4);
        let mut queue = WorkQueue::default();
        registry.insert(connection(2, Instant::now())).unwrap();

        let released = teardown(
            &mut registry,
            &multiplexer,
            &mut queue,
            Token(2),
            &FailureReason::TimedOut { idle: TIMEOUT },
        )
        .unwrap();

        assert!(!released.requeued);
        assert!(queue.is_empty());
    }
}
