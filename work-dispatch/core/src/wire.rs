// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Framing between coordinator and workers
//!
//! Assignment: `u32` big-endian length followed by the UTF-8 identifier.
//! Result: a single `u64` big-endian byte count.
//!
//! The coordinator side is non-blocking and makes a single attempt per
//! call. The worker side blocks until a whole frame has been transferred.

use crate::{WireError, WorkUnit};
use std::io::{ErrorKind, Read, Write};

pub const LENGTH_PREFIX_LEN: usize = 4;
pub const RESULT_LEN: usize = 8;

/// Longest identifier accepted on either side of the wire
pub const MAX_UNIT_LEN: usize = 8 * 1024;

/// Largest assignment frame, prefix included
pub const MAX_FRAME_LEN: usize = LENGTH_PREFIX_LEN + MAX_UNIT_LEN;

/// Outcome of one non-blocking transfer attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Transfer<T> {
    Done(T),
    /// Nothing was transferred, the socket is not ready
    NotReady,
}

pub fn encode_assignment(unit: &WorkUnit) -> Result<Vec<u8>, WireError> {
    let len = unit.len();
    if len > MAX_UNIT_LEN {
        return Err(WireError::FrameTooLarge {
            len,
            max: MAX_UNIT_LEN,
        });
    }

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + len);
    frame.extend_from_slice(&(len as u32).to_be_bytes());
    frame.extend_from_slice(unit.as_bytes());
    Ok(frame)
}

/// Writes a whole assignment frame in one attempt
///
/// A partial write is an error: the frame cannot be resumed later without
/// corrupting the stream.
pub fn write_assignment<W: Write>(
    writer: &mut W,
    unit: &WorkUnit,
) -> Result<Transfer<()>, WireError> {
    let frame = encode_assignment(unit)?;
    loop {
        match writer.write(&frame) {
            Ok(n) if n == frame.len() => return Ok(Transfer::Done(())),
            Ok(0) => return Err(WireError::Closed),
            Ok(n) => {
                return Err(WireError::ShortWrite {
                    written: n,
                    expected: frame.len(),
                })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(Transfer::NotReady),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Reads one result record in one attempt
///
/// Returns `NotReady` only when no byte at all was available. A record
/// that stops midway is a short read.
pub fn read_result<R: Read>(reader: &mut R) -> Result<Transfer<u64>, WireError> {
    let mut buf = [0u8; RESULT_LEN];
    let mut filled = 0;
    loop {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Err(WireError::Closed),
            Ok(0) => {
                return Err(WireError::ShortRead {
                    read: filled,
                    expected: RESULT_LEN,
                })
            }
            Ok(n) => {
                filled += n;
                if filled == RESULT_LEN {
                    return Ok(Transfer::Done(u64::from_be_bytes(buf)));
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock && filled == 0 => {
                return Ok(Transfer::NotReady)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                return Err(WireError::ShortRead {
                    read: filled,
                    expected: RESULT_LEN,
                })
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Blocks until the next assignment arrives
///
/// Returns `Ok(None)` when the coordinator closed the connection between
/// frames.
pub fn read_assignment<R: Read>(reader: &mut R) -> Result<Option<WorkUnit>, WireError> {
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    match reader.read_exact(&mut prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_UNIT_LEN {
        return Err(WireError::FrameTooLarge {
            len,
            max: MAX_UNIT_LEN,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => WireError::Closed,
        _ => WireError::Io(e),
    })?;

    let id = String::from_utf8(payload).map_err(|_| WireError::InvalidUnit)?;
    Ok(Some(WorkUnit::new(id)))
}

pub fn write_result<W: Write>(writer: &mut W, bytes: u64) -> Result<(), WireError> {
    writer.write_all(&bytes.to_be_bytes())?;
    writer.flush()?;
    Ok(())
}
