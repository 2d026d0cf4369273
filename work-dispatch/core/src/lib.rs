// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod error;
pub use error::{CoordinatorError, WireError};

mod work_unit;
pub use work_unit::WorkUnit;

mod work_queue;
pub use work_queue::WorkQueue;

mod progress;
pub use progress::Progress;

pub mod clock;
pub use clock::{Clock, MonotonicClock};

pub mod config;
pub use config::CoordinatorConfig;

pub mod wire;

mod connection;
pub use connection::Connection;

pub mod connection_registry;
pub use connection_registry::ConnectionRegistry;

pub mod multiplexer;
pub use multiplexer::Multiplexer;

pub mod listener;

pub mod acceptor;
pub use acceptor::Acceptor;

pub mod dispatcher;

pub mod collector;

pub mod failure_detector;

mod coordinator;
pub use coordinator::{Coordinator, PassOutcome, RunReport, Snapshot};

mod worker_client;
pub use worker_client::WorkerClient;

#[cfg(test)]
mod test_support;
