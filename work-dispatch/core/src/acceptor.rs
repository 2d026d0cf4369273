// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::wire::MAX_FRAME_LEN;
use crate::{Connection, ConnectionRegistry, Multiplexer};
use mio::event::Source;
use mio::net::{TcpListener, TcpStream};
use mio::Token;
use socket2::SockRef;
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::debug;

/// Kernel send buffer requested for every worker socket
///
/// Room for two whole frames, so the single write attempt a dispatch
/// makes on an idle connection is never cut short.
pub const SEND_BUFFER_LEN: usize = 2 * MAX_FRAME_LEN;

/// Source of new worker connections
pub trait Listener: Source {
    type Stream: Source;

    fn accept(&mut self) -> io::Result<(Self::Stream, SocketAddr)>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Listener for TcpListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = TcpListener::accept(self)?;
        if let Err(e) = SockRef::from(&stream).set_send_buffer_size(SEND_BUFFER_LEN) {
            debug!(%peer, error = %e, "could not size send buffer");
        }
        Ok((stream, peer))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

#[derive(Debug)]
pub enum AcceptOutcome {
    NothingPending,
    /// Registry at capacity; the connection waits in the OS backlog
    Deferred,
    Accepted { token: Token, peer: SocketAddr },
    Failed(io::Error),
}

/// Turns accept readiness into registered idle connections
///
/// The listener only signals when new connections arrive, so the pending
/// flag is kept until `accept` reports `WouldBlock`.
pub struct Acceptor<L = TcpListener> {
    listener: L,
    pending: bool,
    failed: bool,
    next_token: usize,
}

impl<L: Listener> Acceptor<L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            pending: false,
            failed: false,
            next_token: 1,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn mark_pending(&mut self) {
        self.pending = true;
        self.failed = false;
    }

    /// Whether another accept can make progress without waiting
    ///
    /// After a failed accept the acceptor waits for the next pass instead
    /// of spinning on the error.
    pub fn can_progress(&self, has_room: bool) -> bool {
        self.pending && !self.failed && has_room
    }

    /// Accepts at most one pending connection
    pub fn accept_one(
        &mut self,
        registry: &mut ConnectionRegistry<L::Stream>,
        multiplexer: &Multiplexer,
        now: Instant,
    ) -> AcceptOutcome {
        if !self.pending {
            return AcceptOutcome::NothingPending;
        }
        if registry.is_full() {
            return AcceptOutcome::Deferred;
        }

        let (mut stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                self.pending = false;
                return AcceptOutcome::NothingPending;
            }
            Err(e) => {
                self.failed = true;
                return AcceptOutcome::Failed(e);
            }
        };
        self.failed = false;

        let token = Token(self.next_token);
        self.next_token += 1;

        if let Err(e) = multiplexer.register(&mut stream, token) {
            return AcceptOutcome::Failed(e);
        }
        if registry
            .insert(Connection::new(token, stream, Some(peer), now))
            .is_err()
        {
            return AcceptOutcome::Deferred;
        }
        AcceptOutcome::Accepted { token, peer }
    }
}
