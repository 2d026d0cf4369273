// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mio::event::{Event, Source};
use mio::{Events, Interest, Poll, Token};
use std::io::{self, ErrorKind};
use std::time::Duration;

/// Token reserved for the accept socket
pub const LISTENER: Token = Token(0);

/// Readiness flags for one handle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub readable: bool,
    pub writable: bool,
    pub hung_up: bool,
}

impl Readiness {
    pub fn merge(&mut self, other: Readiness) {
        self.readable |= other.readable;
        self.writable |= other.writable;
        self.hung_up |= other.hung_up;
    }
}

impl From<&Event> for Readiness {
    fn from(event: &Event) -> Self {
        Self {
            readable: event.is_readable(),
            writable: event.is_writable(),
            hung_up: event.is_read_closed() || event.is_write_closed() || event.is_error(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyEvent {
    pub token: Token,
    pub readiness: Readiness,
}

/// Waits on the accept socket and every worker socket at once
pub struct Multiplexer {
    poll: Poll,
    events: Events,
}

impl Multiplexer {
    /// `capacity` bounds the number of events returned by one wait
    pub fn new(capacity: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(capacity.max(1)),
        })
    }

    pub fn register_listener<S: Source>(&self, listener: &mut S) -> io::Result<()> {
        self.poll
            .registry()
            .register(listener, LISTENER, Interest::READABLE)
    }

    pub fn register<S: Source>(&self, stream: &mut S, token: Token) -> io::Result<()> {
        self.poll
            .registry()
            .register(stream, token, Interest::READABLE | Interest::WRITABLE)
    }

    pub fn deregister<S: Source>(&self, stream: &mut S) -> io::Result<()> {
        self.poll.registry().deregister(stream)
    }

    /// Blocks up to `timeout` and returns the handles that became ready
    ///
    /// An expired wait returns an empty set. A signal interrupting the wait
    /// is treated the same way.
    pub fn wait(&mut self, timeout: Duration) -> io::Result<Vec<ReadyEvent>> {
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(Vec::new()),
            Err(e) => return Err(e),
        }

        Ok(self
            .events
            .iter()
            .map(|event| ReadyEvent {
                token: event.token(),
                readiness: Readiness::from(event),
            })
            .collect())
    }
}
