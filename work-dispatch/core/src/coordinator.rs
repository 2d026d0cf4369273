// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::acceptor::AcceptOutcome;
use crate::collector::{self, CollectOutcome};
use crate::dispatcher::{self, DispatchOutcome};
use crate::failure_detector::{self, FailureReason};
use crate::listener::open_listener;
use crate::multiplexer::LISTENER;
use crate::wire::MAX_UNIT_LEN;
use crate::{
    Acceptor, Clock, ConnectionRegistry, CoordinatorConfig, CoordinatorError, MonotonicClock,
    Multiplexer, Progress, WorkQueue, WorkUnit,
};
use mio::event::Source;
use mio::net::TcpStream;
use mio::Token;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Totals reported once every unit has completed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub total_bytes: u64,
    pub units: usize,
    pub passes: u64,
    pub requeued: u64,
    pub connections_accepted: u64,
    pub connections_torn_down: u64,
}

/// Where every unit currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub queued: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub total_units: usize,
    pub connections: usize,
}

impl Snapshot {
    /// No unit lost or duplicated
    pub fn is_conserved(&self) -> bool {
        self.queued + self.in_flight + self.completed == self.total_units
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Running,
    Drained,
}

enum Serviced {
    Kept,
    TornDown,
}

/// Unit and connection bookkeeping touched by every pass
struct Ledger<S = TcpStream> {
    registry: ConnectionRegistry<S>,
    queue: WorkQueue,
    progress: Progress,
    report: RunReport,
}

impl<S: Read + Write + Source> Ledger<S> {
    fn new(units: Vec<WorkUnit>, capacity: usize) -> Self {
        Self {
            registry: ConnectionRegistry::with_capacity(capacity),
            progress: Progress::new(units.len()),
            queue: WorkQueue::new(units),
            report: RunReport::default(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            queued: self.queue.len(),
            in_flight: self.registry.in_flight(),
            completed: self.progress.completed(),
            total_units: self.progress.total_units(),
            connections: self.registry.len(),
        }
    }

    /// Collect, then check liveness, then dispatch
    fn service(
        &mut self,
        multiplexer: &Multiplexer,
        slot: usize,
        now: Instant,
        timeout: Duration,
    ) -> Serviced {
        let Some(connection) = self.registry.get_slot_mut(slot) else {
            return Serviced::Kept;
        };
        let token = connection.token();

        match collector::collect(connection, &mut self.progress, now) {
            CollectOutcome::Completed { unit, bytes } => {
                debug!(
                    token = token.0,
                    %unit,
                    bytes,
                    outstanding = self.progress.outstanding(),
                    "unit completed"
                );
            }
            CollectOutcome::Failed(e) => {
                self.tear_down(multiplexer, token, FailureReason::Wire(e));
                return Serviced::TornDown;
            }
            CollectOutcome::Skipped | CollectOutcome::NotReady => {}
        }

        if self.progress.is_done() {
            return Serviced::Kept;
        }

        if let Some(reason) = failure_detector::inspect(connection, now, timeout) {
            self.tear_down(multiplexer, token, reason);
            return Serviced::TornDown;
        }

        match dispatcher::dispatch(connection, &mut self.queue, now) {
            DispatchOutcome::Dispatched => {
                if let Some(unit) = connection.assigned() {
                    debug!(token = token.0, %unit, queued = self.queue.len(), "unit dispatched");
                }
            }
            DispatchOutcome::Failed(e) => {
                self.tear_down(multiplexer, token, FailureReason::Wire(e));
                return Serviced::TornDown;
            }
            DispatchOutcome::Skipped | DispatchOutcome::NotReady => {}
        }

        Serviced::Kept
    }

    fn tear_down(&mut self, multiplexer: &Multiplexer, token: Token, reason: FailureReason) {
        let released = failure_detector::teardown(
            &mut self.registry,
            multiplexer,
            &mut self.queue,
            token,
            &reason,
        );
        if let Some(released) = released {
            self.report.connections_torn_down += 1;
            if released.requeued {
                self.report.requeued += 1;
            }
        }
    }
}

/// Leader that hands work units to connecting workers until all are done
///
/// Single threaded: the only suspension point is the multiplexer wait.
/// Each pass accepts at most one worker and, for every connection in
/// registry order, attempts at most one receive and one send.
pub struct Coordinator<C: Clock = MonotonicClock> {
    config: CoordinatorConfig,
    acceptor: Acceptor,
    multiplexer: Multiplexer,
    ledger: Ledger,
    clock: C,
}

impl Coordinator<MonotonicClock> {
    pub fn bind(config: CoordinatorConfig, units: Vec<WorkUnit>) -> Result<Self, CoordinatorError> {
        Self::with_clock(config, units, MonotonicClock)
    }
}

impl<C: Clock> Coordinator<C> {
    pub fn with_clock(
        config: CoordinatorConfig,
        units: Vec<WorkUnit>,
        clock: C,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;
        if units.is_empty() {
            return Err(CoordinatorError::EmptyWorkList);
        }
        if let Some(unit) = units.iter().find(|unit| unit.len() > MAX_UNIT_LEN) {
            return Err(CoordinatorError::UnitTooLong {
                len: unit.len(),
                max: MAX_UNIT_LEN,
            });
        }

        let listener = open_listener(&config.host, config.port, config.capacity)?;
        let multiplexer = Multiplexer::new(config.capacity + 1).map_err(CoordinatorError::Poll)?;
        let mut acceptor = Acceptor::new(listener);
        multiplexer
            .register_listener(acceptor.listener_mut())
            .map_err(CoordinatorError::Register)?;

        Ok(Self {
            ledger: Ledger::new(units, config.capacity),
            config,
            acceptor,
            multiplexer,
            clock,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }

    pub fn progress(&self) -> Progress {
        self.ledger.progress
    }

    pub fn snapshot(&self) -> Snapshot {
        self.ledger.snapshot()
    }

    /// Runs passes until every unit has completed, then closes all sockets
    pub fn run(mut self) -> Result<RunReport, CoordinatorError> {
        info!(
            addr = ?self.local_addr().ok(),
            units = self.ledger.progress.total_units(),
            capacity = self.config.capacity,
            timeout_ms = self.config.inactivity_timeout_ms,
            "coordinator listening"
        );

        while self.poll_once()? == PassOutcome::Running {}

        Ok(self.shut_down())
    }

    /// Waits for readiness once and services every connection
    pub fn poll_once(&mut self) -> Result<PassOutcome, CoordinatorError> {
        if self.ledger.progress.is_done() {
            return Ok(PassOutcome::Drained);
        }

        let timeout = if self.can_progress_without_waiting() {
            Duration::ZERO
        } else {
            self.config.wait_interval()
        };
        let ready = self
            .multiplexer
            .wait(timeout)
            .map_err(CoordinatorError::Poll)?;

        for event in ready {
            if event.token == LISTENER {
                self.acceptor.mark_pending();
            } else if let Some(connection) = self.ledger.registry.get_mut(event.token) {
                connection.observe(event.readiness);
            }
        }
        self.ledger.report.passes += 1;

        let now = self.clock.now();
        self.accept(now);

        let timeout = self.config.inactivity_timeout();
        let mut slot = 0;
        while slot < self.ledger.registry.len() && !self.ledger.progress.is_done() {
            match self.ledger.service(&self.multiplexer, slot, now, timeout) {
                Serviced::Kept => slot += 1,
                Serviced::TornDown => {}
            }
        }

        debug_assert!(self.snapshot().is_conserved(), "unit lost or duplicated");

        Ok(if self.ledger.progress.is_done() {
            PassOutcome::Drained
        } else {
            PassOutcome::Running
        })
    }

    fn can_progress_without_waiting(&self) -> bool {
        if self.acceptor.can_progress(!self.ledger.registry.is_full()) {
            return true;
        }
        let work_queued = !self.ledger.queue.is_empty();
        self.ledger.registry.iter().any(|connection| {
            let readiness = connection.readiness();
            readiness.readable
                || readiness.hung_up
                || (readiness.writable && connection.is_idle() && work_queued)
        })
    }

    fn accept(&mut self, now: Instant) {
        match self
            .acceptor
            .accept_one(&mut self.ledger.registry, &self.multiplexer, now)
        {
            AcceptOutcome::Accepted { token, peer } => {
                self.ledger.report.connections_accepted += 1;
                let workers = self.ledger.registry.len();
                debug!(token = token.0, %peer, workers, "worker connected");
            }
            AcceptOutcome::Deferred => {
                trace!(workers = self.ledger.registry.len(), "at capacity, accept deferred");
            }
            AcceptOutcome::Failed(e) => warn!(error = %e, "accept failed"),
            AcceptOutcome::NothingPending => {}
        }
    }

    fn shut_down(mut self) -> RunReport {
        for mut connection in self.ledger.registry.drain() {
            let _ = self.multiplexer.deregister(connection.stream_mut());
        }

        let progress = self.ledger.progress;
        let report = RunReport {
            total_bytes: progress.total_bytes(),
            units: progress.total_units(),
            ..self.ledger.report
        };
        info!(
            total_bytes = report.total_bytes,
            units = report.units,
            passes = report.passes,
            requeued = report.requeued,
            "all units completed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockStream;
    use crate::Connection;

    const TIMEOUT: Duration = Duration::from_millis(2000);

    fn ledger(ids: &[&str]) -> Ledger<MockStream> {
        Ledger::new(ids.iter().map(|id| WorkUnit::from(*id)).collect(), 4)
    }

    fn worker(id: usize, stream: MockStream, last_activity: Instant) -> Connection<MockStream> {
        let mut connection = Connection::new(Token(id), stream, None, last_activity);
        connection.readiness.readable = true;
        connection.readiness.writable = true;
        connection
    }

    /// Moves the first queued unit onto `connection` as if it had been sent
    fn hand_out(ledger: &mut Ledger<MockStream>, mut connection: Connection<MockStream>) {
        if let Some(unit) = ledger.queue.pop() {
            connection.assign(unit);
        }
        ledger.registry.insert(connection).unwrap();
    }

    #[test]
    fn test_failed_dispatch_requeues_unit_and_drops_connection() {
        let multiplexer = Multiplexer::new(4).unwrap();
        let mut ledger = ledger(&["a.csv"]);
        let stream = MockStream {
            fail_io: true,
            ..MockStream::default()
        };
        let mut broken = worker(1, stream, Instant::now());
        broken.readiness.readable = false;
        ledger.registry.insert(broken).unwrap();

        let serviced = ledger.service(&multiplexer, 0, Instant::now(), TIMEOUT);

        assert!(matches!(serviced, Serviced::TornDown));
        assert!(ledger.registry.is_empty());
        assert_eq!(ledger.queue.pop(), Some(WorkUnit::from("a.csv")));
        assert_eq!(ledger.report.requeued, 1);
        assert_eq!(ledger.report.connections_torn_down, 1);
    }

    #[test]
    fn test_idle_connection_times_out_while_queue_is_empty() {
        let multiplexer = Multiplexer::new(4).unwrap();
        let mut ledger = ledger(&["a.csv"]);
        let start = Instant::now();
        let now = start + TIMEOUT + Duration::from_millis(1);
        let mut idle = worker(1, MockStream::default(), start);
        idle.readiness.readable = false;
        ledger.registry.insert(idle).unwrap();
        hand_out(&mut ledger, worker(2, MockStream::default(), now));

        let first = ledger.service(&multiplexer, 0, now, TIMEOUT);
        let second = ledger.service(&multiplexer, 0, now, TIMEOUT);

        assert!(matches!(first, Serviced::TornDown));
        assert!(matches!(second, Serviced::Kept));
        assert_eq!(ledger.registry.len(), 1);
        assert!(ledger.queue.is_empty());
        assert_eq!(ledger.report.requeued, 0);
        assert_eq!(ledger.report.connections_torn_down, 1);
        assert!(ledger.snapshot().is_conserved());
    }

    #[test]
    fn test_completed_connection_is_offered_next_unit_in_same_pass() {
        let multiplexer = Multiplexer::new(4).unwrap();
        let mut ledger = ledger(&["a.csv", "b.csv"]);
        let start = Instant::now();
        hand_out(&mut ledger, worker(1, MockStream::with_result(42), start));

        let serviced = ledger.service(&multiplexer, 0, start, TIMEOUT);

        assert!(matches!(serviced, Serviced::Kept));
        assert_eq!(ledger.progress.total_bytes(), 42);
        let connection = ledger.registry.get(Token(1)).unwrap();
        assert_eq!(connection.assigned(), Some(&WorkUnit::from("a.csv")));
        assert!(ledger.queue.is_empty());
        assert!(ledger.snapshot().is_conserved());
    }

    #[test]
    fn test_result_arriving_with_hangup_is_counted_before_teardown() {
        let multiplexer = Multiplexer::new(4).unwrap();
        let mut ledger = ledger(&["a.csv", "b.csv"]);
        let start = Instant::now();
        let stream = MockStream {
            peer_closed: true,
            ..MockStream::with_result(7)
        };
        let mut closing = worker(1, stream, start);
        closing.readiness.hung_up = true;
        hand_out(&mut ledger, closing);

        let serviced = ledger.service(&multiplexer, 0, start, TIMEOUT);

        assert!(matches!(serviced, Serviced::TornDown));
        assert_eq!(ledger.progress.total_bytes(), 7);
        assert_eq!(ledger.progress.outstanding(), 1);
        assert_eq!(ledger.queue.len(), 1);
        assert_eq!(ledger.report.requeued, 0);
        assert!(ledger.snapshot().is_conserved());
    }
}
