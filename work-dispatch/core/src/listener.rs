// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::CoordinatorError;
use mio::net::TcpListener;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, ToSocketAddrs};
use tracing::debug;

/// Resolves `host:port` and listens on the first address that binds
pub fn open_listener(host: &str, port: u16, backlog: usize) -> Result<TcpListener, CoordinatorError> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| CoordinatorError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;

    let mut last_error = None;
    for addr in addrs {
        match bind(addr, backlog) {
            Ok(listener) => return Ok(TcpListener::from_std(listener)),
            Err(e) => {
                debug!(%addr, error = %e, "bind attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(CoordinatorError::Bind {
        host: host.to_string(),
        port,
        source: last_error
            .unwrap_or_else(|| io::Error::new(ErrorKind::AddrNotAvailable, "no address resolved")),
    })
}

fn bind(addr: SocketAddr, backlog: usize) -> io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SockAddr::from(addr))?;
    socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}
