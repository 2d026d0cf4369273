// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the coordinator before or during the run
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The listening host/port could not be resolved
    #[error("failed to resolve listen address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// None of the resolved addresses could be bound and listened on
    #[error("failed to listen on {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The readiness multiplexer itself failed
    #[error("readiness poll failed: {0}")]
    Poll(#[source] io::Error),

    /// The listening socket could not be registered with the multiplexer
    #[error("failed to register listener: {0}")]
    Register(#[source] io::Error),

    #[error("work list is empty")]
    EmptyWorkList,

    #[error("work unit of {len} bytes exceeds the {max} byte limit")]
    UnitTooLong { len: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-connection protocol failures
///
/// These never escape a loop pass: they are resolved by tearing the
/// connection down and requeueing its unit.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("peer closed the connection")]
    Closed,

    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("short read: {read} of {expected} bytes")]
    ShortRead { read: usize, expected: usize },

    #[error("unsolicited data on an idle connection")]
    Unsolicited,

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("work unit is not valid UTF-8")]
    InvalidUnit,

    #[error(transparent)]
    Io(#[from] io::Error),
}
