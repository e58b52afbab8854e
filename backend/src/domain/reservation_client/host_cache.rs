//! Station number to remote host id cache.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::ports::{HostId, HostRecord};

/// How long a populated cache stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheExpiry {
    /// Populated once per process.
    #[default]
    Never,
    /// Repopulate after the given age.
    After(Duration),
}

/// Lazily populated mapping from station number to host id.
///
/// `generation` increases on every population so callers can tell whether a
/// refresh happened between two reads.
#[derive(Debug, Clone, Default)]
pub struct HostCache {
    entries: HashMap<i64, HostId>,
    populated_at: Option<DateTime<Utc>>,
    generation: u64,
    expiry: CacheExpiry,
}

impl HostCache {
    pub fn new(expiry: CacheExpiry) -> Self {
        Self {
            expiry,
            ..Self::default()
        }
    }

    /// Whether the cache holds a population that has not expired at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let Some(populated_at) = self.populated_at else {
            return false;
        };
        match self.expiry {
            CacheExpiry::Never => true,
            CacheExpiry::After(ttl) => match chrono::Duration::from_std(ttl) {
                Ok(ttl) => now.signed_duration_since(populated_at) < ttl,
                Err(_) => true,
            },
        }
    }

    /// Replace the mapping with `records`, skipping entries missing either a
    /// number or an id. Returns how many entries were stored.
    pub fn populate(&mut self, records: &[HostRecord], now: DateTime<Utc>) -> usize {
        self.entries = records
            .iter()
            .filter_map(|record| match (record.number, record.id) {
                (Some(number), Some(id)) => Some((number, HostId::new(id))),
                _ => None,
            })
            .collect();
        self.populated_at = Some(now);
        self.generation = self.generation.saturating_add(1);
        self.entries.len()
    }

    pub fn get(&self, station: i64) -> Option<HostId> {
        self.entries.get(&station).copied()
    }

    /// Drop the population; the next lookup repopulates.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.populated_at = None;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
