// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use assert_matches::assert_matches;
use std::io::{self, Cursor, ErrorKind, Read, Write};
use work_dispatch_core::wire::{
    encode_assignment, read_assignment, read_result, write_assignment, Transfer, MAX_UNIT_LEN,
};
use work_dispatch_core::{WireError, WorkUnit};

/// Scripted stream returning one canned response per call
struct Scripted {
    reads: Vec<io::Result<Vec<u8>>>,
    write_limit: Option<usize>,
    written: Vec<u8>,
}

impl Scripted {
    fn reads(mut reads: Vec<io::Result<Vec<u8>>>) -> Self {
        reads.reverse();
        Self {
            reads,
            write_limit: None,
            written: Vec::new(),
        }
    }

    fn accepting(limit: usize) -> Self {
        Self {
            reads: Vec::new(),
            write_limit: Some(limit),
            written: Vec::new(),
        }
    }
}

impl Read for Scripted {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop() {
            Some(Ok(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Err(e)) => Err(e),
            None => Err(io::Error::from(ErrorKind::WouldBlock)),
        }
    }
}

impl Write for Scripted {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.write_limit {
            Some(0) => Err(io::Error::from(ErrorKind::WouldBlock)),
            Some(limit) => {
                let n = limit.min(buf.len());
                self.written.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_assignment_frame_carries_length_prefix() {
    let frame = encode_assignment(&WorkUnit::from("a.csv")).unwrap();

    assert_eq!(&frame[..4], &[0, 0, 0, 5]);
    assert_eq!(&frame[4..], b"a.csv");
}

#[test]
fn test_worker_reads_back_dispatched_unit() {
    let mut stream = Scripted::accepting(usize::MAX);
    let sent = write_assignment(&mut stream, &WorkUnit::from("http://host/b.csv")).unwrap();
    assert_eq!(sent, Transfer::Done(()));

    let unit = read_assignment(&mut Cursor::new(stream.written)).unwrap();
    assert_eq!(unit, Some(WorkUnit::from("http://host/b.csv")));
}

#[test]
fn test_partial_write_is_a_failure() {
    let mut stream = Scripted::accepting(3);

    let result = write_assignment(&mut stream, &WorkUnit::from("a.csv"));

    assert_matches!(
        result,
        Err(WireError::ShortWrite {
            written: 3,
            expected: 9
        })
    );
}

#[test]
fn test_write_would_block_transfers_nothing() {
    let mut stream = Scripted::accepting(0);

    let result = write_assignment(&mut stream, &WorkUnit::from("a.csv"));

    assert_matches!(result, Ok(Transfer::NotReady));
    assert!(stream.written.is_empty());
}

#[test]
fn test_zero_length_write_means_closed() {
    let mut stream = Scripted::reads(Vec::new());

    let result = write_assignment(&mut stream, &WorkUnit::from("a.csv"));

    assert_matches!(result, Err(WireError::Closed));
}

#[test]
fn test_result_split_across_reads_is_reassembled() {
    let bytes = 100u64.to_be_bytes();
    let mut stream = Scripted::reads(vec![Ok(bytes[..3].to_vec()), Ok(bytes[3..].to_vec())]);

    assert_eq!(read_result(&mut stream).unwrap(), Transfer::Done(100));
}

#[test]
fn test_result_not_ready_when_nothing_arrived() {
    let mut stream = Scripted::reads(Vec::new());

    assert_eq!(read_result(&mut stream).unwrap(), Transfer::NotReady);
}

#[test]
fn test_truncated_result_is_a_short_read() {
    let mut stream = Scripted::reads(vec![Ok(vec![0, 0, 0])]);

    assert_matches!(
        read_result(&mut stream),
        Err(WireError::ShortRead {
            read: 3,
            expected: 8
        })
    );
}

#[test]
fn test_end_of_stream_before_result_means_closed() {
    let mut stream = Scripted::reads(vec![Ok(Vec::new())]);

    assert_matches!(read_result(&mut stream), Err(WireError::Closed));
}

#[test]
fn test_oversized_assignment_is_rejected_by_worker() {
    let prefix = ((MAX_UNIT_LEN + 1) as u32).to_be_bytes();

    let result = read_assignment(&mut Cursor::new(prefix.to_vec()));

    assert_matches!(result, Err(WireError::FrameTooLarge { .. }));
}

#[test]
fn test_clean_close_between_assignments_ends_the_stream() {
    assert_matches!(read_assignment(&mut Cursor::new(Vec::new())), Ok(None));
}

#[test]
fn test_truncated_assignment_payload_means_closed() {
    let mut frame = encode_assignment(&WorkUnit::from("a.csv")).unwrap();
    frame.truncate(6);

    assert_matches!(
        read_assignment(&mut Cursor::new(frame)),
        Err(WireError::Closed)
    );
}
