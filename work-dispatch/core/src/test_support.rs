// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mio::event::Source;
use mio::{Interest, Registry, Token};
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};

/// In-memory stand-in for a non-blocking worker socket
#[derive(Debug, Default)]
pub struct MockStream {
    pub inbound: VecDeque<u8>,
    pub outbound: Vec<u8>,
    /// Bytes accepted by the next write; `None` accepts everything
    pub write_limit: Option<usize>,
    pub peer_closed: bool,
    pub fail_io: bool,
}

impl MockStream {
    pub fn with_result(bytes: u64) -> Self {
        Self {
            inbound: bytes.to_be_bytes().into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_io {
            return Err(io::Error::from(ErrorKind::ConnectionReset));
        }
        if self.inbound.is_empty() {
            return if self.peer_closed {
                Ok(0)
            } else {
                Err(io::Error::from(ErrorKind::WouldBlock))
            };
        }
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_io {
            return Err(io::Error::from(ErrorKind::BrokenPipe));
        }
        let n = match self.write_limit {
            Some(0) => return Err(io::Error::from(ErrorKind::WouldBlock)),
            Some(limit) => limit.min(buf.len()),
            None => buf.len(),
        };
        self.outbound.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Source for MockStream {
    fn register(&mut self, _: &Registry, _: Token, _: Interest) -> io::Result<()> {
        Ok(())
    }

    fn reregister(&mut self, _: &Registry, _: Token, _: Interest) -> io::Result<()> {
        Ok(())
    }

    fn deregister(&mut self, _: &Registry) -> io::Result<()> {
        Ok(())
    }
}
