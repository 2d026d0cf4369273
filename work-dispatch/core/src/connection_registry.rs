// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Connection;
use mio::net::TcpStream;
use mio::Token;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionError {
    Full,
}

/// Live worker connections, bounded by the configured capacity
///
/// Connections are stored densely and visited in slot order. Removal
/// moves the last connection into the freed slot, so it is O(1) and
/// tokens never need to be contiguous.
#[derive(Debug)]
pub struct ConnectionRegistry<S = TcpStream> {
    connections: Vec<Connection<S>>,
    slots: HashMap<Token, usize>,
    capacity: usize,
}

impl<S> ConnectionRegistry<S> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            connections: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn insert(&mut self, connection: Connection<S>) -> Result<(), CollectionError> {
        if self.is_full() {
            return Err(CollectionError::Full);
        }
        self.slots.insert(connection.token(), self.connections.len());
        self.connections.push(connection);
        Ok(())
    }

    /// Removes a connection; a second removal of the same token is a no-op
    pub fn remove(&mut self, token: Token) -> Option<Connection<S>> {
        let slot = self.slots.remove(&token)?;
        let removed = self.connections.swap_remove(slot);
        if let Some(moved) = self.connections.get(slot) {
            self.slots.insert(moved.token(), slot);
        }
        Some(removed)
    }

    pub fn get(&self, token: Token) -> Option<&Connection<S>> {
        self.slots.get(&token).map(|&slot| &self.connections[slot])
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut Connection<S>> {
        let slot = *self.slots.get(&token)?;
        self.connections.get_mut(slot)
    }

    pub fn get_slot_mut(&mut self, slot: usize) -> Option<&mut Connection<S>> {
        self.connections.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection<S>> {
        self.connections.iter()
    }

    /// Number of connections holding an in-flight unit
    pub fn in_flight(&self) -> usize {
        self.connections.iter().filter(|c| !c.is_idle()).count()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Connection<S>> + '_ {
        self.slots.clear();
        self.connections.drain(..)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.connections.len() >= self.capacity
    }
}
