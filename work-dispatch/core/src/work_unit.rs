// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::fmt;

/// Identifier of one piece of work, typically a URL
///
/// Units are moved, never copied: a unit lives either in the work queue or
/// in exactly one connection's assignment.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct WorkUnit(String);

impl WorkUnit {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkUnit {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for WorkUnit {
    fn from(id: String) -> Self {
        Self(id)
    }
}
