// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{wire, WireError, WorkUnit};
use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Blocking worker side of the dispatch protocol
pub struct WorkerClient {
    stream: TcpStream,
}

impl WorkerClient {
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    /// Waits for the next unit; `None` once the coordinator hangs up
    pub fn next_assignment(&mut self) -> Result<Option<WorkUnit>, WireError> {
        wire::read_assignment(&mut self.stream)
    }

    pub fn report(&mut self, bytes: u64) -> Result<(), WireError> {
        wire::write_result(&mut self.stream, bytes)
    }

    /// Processes units until the coordinator closes the connection
    ///
    /// Returns the number of units reported.
    pub fn serve<F>(mut self, mut process: F) -> Result<usize, WireError>
    where
        F: FnMut(&WorkUnit) -> u64,
    {
        let mut reported = 0;
        while let Some(unit) = self.next_assignment()? {
            let bytes = process(&unit);
            self.report(bytes)?;
            reported += 1;
        }
        Ok(reported)
    }

    /// Closes both directions, signalling a hangup to the coordinator
    pub fn disconnect(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
