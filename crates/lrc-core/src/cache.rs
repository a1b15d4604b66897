//! Per-instance field cache.
//!
//! Every field of a resource instance moves through three states:
//! uncomputed (no cell), computing (a [`Cell::Pending`] claim held by one
//! writer) and cached (a valid [`CacheEntry`] holding either a value or the
//! error that computing it produced).

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    time::SystemTime,
};

use crate::{error::FieldError, value::Value};

/// A cached field result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    result: Result<Value, FieldError>,
    valid: bool,
    timestamp: SystemTime,
}

impl CacheEntry {
    pub fn new(result: Result<Value, FieldError>) -> Self {
        Self {
            result,
            valid: true,
            timestamp: SystemTime::now(),
        }
    }

    pub fn value(value: Value) -> Self {
        Self::new(Ok(value))
    }

    pub fn error(err: FieldError) -> Self {
        Self::new(Err(err))
    }

    pub fn result(&self) -> &Result<Value, FieldError> {
        &self.result
    }

    pub fn into_result(self) -> Result<Value, FieldError> {
        self.result
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

/// Outcome of trying to become the writer of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the field and must store or release it.
    Acquired,
    /// Another writer is computing the field.
    InFlight,
    /// A valid entry is already cached.
    Present,
}

#[derive(Debug)]
enum Cell {
    Pending,
    Done(CacheEntry),
}

/// Field cache shared by all handles to one resource instance.
#[derive(Debug, Default)]
pub struct Cache {
    cells: RwLock<HashMap<String, Cell>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry for `field` if one is present and valid.
    pub fn load(&self, field: &str) -> Option<CacheEntry> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        match cells.get(field) {
            Some(Cell::Done(entry)) if entry.valid => Some(entry.clone()),
            _ => None,
        }
    }

    /// Whether a valid entry exists for `field`.
    pub fn contains(&self, field: &str) -> bool {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        matches!(cells.get(field), Some(Cell::Done(entry)) if entry.valid)
    }

    pub fn is_pending(&self, field: &str) -> bool {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        matches!(cells.get(field), Some(Cell::Pending))
    }

    /// Store an entry, replacing any claim or previous entry.
    pub fn store(&self, field: &str, entry: CacheEntry) {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        cells.insert(field.to_string(), Cell::Done(entry));
    }

    /// Claim `field` for computation unless it is cached or in flight.
    pub fn claim(&self, field: &str) -> Claim {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        match cells.get(field) {
            Some(Cell::Pending) => Claim::InFlight,
            Some(Cell::Done(entry)) if entry.valid => Claim::Present,
            _ => {
                cells.insert(field.to_string(), Cell::Pending);
                Claim::Acquired
            }
        }
    }

    /// Claim `field` for recomputation, discarding any cached entry.
    ///
    /// Only an in-flight computation blocks the claim.
    pub fn reclaim(&self, field: &str) -> Claim {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(Cell::Pending) = cells.get(field) {
            return Claim::InFlight;
        }
        cells.insert(field.to_string(), Cell::Pending);
        Claim::Acquired
    }

    /// Drop a pending claim without storing anything.
    pub fn release(&self, field: &str) {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(Cell::Pending) = cells.get(field) {
            cells.remove(field);
        }
    }

    /// Mark the entry for `field` stale.
    ///
    /// Returns `true` when a valid entry was invalidated.
    pub fn invalidate(&self, field: &str) -> bool {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        match cells.get_mut(field) {
            Some(Cell::Done(entry)) if entry.valid => {
                entry.valid = false;
                true
            }
            _ => false,
        }
    }

    /// Number of fields with a valid entry.
    pub fn len(&self) -> usize {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells
            .values()
            .filter(|cell| matches!(cell, Cell::Done(entry) if entry.valid))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
