// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::multiplexer::Readiness;
use crate::WorkUnit;
use mio::net::TcpStream;
use mio::Token;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One worker connection and the unit it is working on
///
/// Readiness is cached because the multiplexer only reports transitions:
/// a flag stays set until an operation on the stream returns `WouldBlock`.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    token: Token,
    peer: Option<SocketAddr>,
    stream: S,
    assigned: Option<WorkUnit>,
    last_activity: Instant,
    pub(crate) readiness: Readiness,
}

impl<S> Connection<S> {
    pub fn new(token: Token, stream: S, peer: Option<SocketAddr>, now: Instant) -> Self {
        Self {
            token,
            peer,
            stream,
            assigned: None,
            last_activity: now,
            readiness: Readiness::default(),
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn assigned(&self) -> Option<&WorkUnit> {
        self.assigned.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.assigned.is_none()
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Time since the last successful send or receive
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub(crate) fn observe(&mut self, readiness: Readiness) {
        self.readiness.merge(readiness);
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub(crate) fn assign(&mut self, unit: WorkUnit) {
        debug_assert!(self.assigned.is_none(), "connection already has a unit");
        self.assigned = Some(unit);
    }

    pub(crate) fn take_assigned(&mut self) -> Option<WorkUnit> {
        self.assigned.take()
    }

    pub(crate) fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub(crate) fn into_stream(self) -> S {
        self.stream
    }
}
