//! Active request registry
//!
//! Bounded, time-windowed, in-memory store of processed requests. Records
//! older than the TTL are purged on access; when full, the oldest record is
//! evicted. Identifier allocation lives here so that "next sequence, then
//! insert" happens under one lock.

use crate::request::{ConciergeResponse, ResidentRequest};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Lifecycle tag of an active record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Active,
}

/// A processed request and its response
#[derive(Debug, Clone)]
pub struct ActiveRequestRecord {
    pub request: ResidentRequest,
    pub response: ConciergeResponse,
    pub processed_at: DateTime<Utc>,
    pub status: RequestStatus,
    /// Maintenance work order reference, if one was opened
    pub work_order: Option<String>,
}

#[derive(Debug)]
struct Entry {
    record: ActiveRequestRecord,
    inserted: Instant,
}

/// Registry state; wrap in a mutex for shared use
#[derive(Debug)]
pub struct Registry {
    prefix: String,
    capacity: usize,
    ttl: Duration,
    entries: HashMap<String, Entry>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
    day: Option<NaiveDate>,
    sequence: u32,
}

impl Registry {
    pub fn new(prefix: impl Into<String>, capacity: usize, ttl: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            capacity,
            ttl,
            entries: HashMap::new(),
            order: VecDeque::new(),
            day: None,
            sequence: 0,
        }
    }

    /// Allocate the next identifier for `today`
    ///
    /// Format `<PREFIX>-<YYYYMMDD>-<NNNN>`. The sequence restarts at 1 only
    /// when the date moves forward; a date at or before the current day keeps
    /// counting on the current day, so an id is never issued twice. Past 9999
    /// the number simply widens.
    pub fn next_id(&mut self, today: NaiveDate) -> String {
        let day = match self.day {
            Some(current) if today <= current => current,
            _ => {
                self.day = Some(today);
                self.sequence = 0;
                today
            }
        };
        self.sequence += 1;
        format!(
            "{}-{}-{:04}",
            self.prefix,
            day.format("%Y%m%d"),
            self.sequence
        )
    }

    /// Insert a record, purging expired entries and evicting the oldest
    /// when at capacity. Returns the number of records removed.
    pub fn insert(&mut self, request_id: String, record: ActiveRequestRecord, now: Instant) -> u64 {
        let mut removed = self.purge_expired(now);

        // Replacing a live id must not leave a second order slot behind
        if self.entries.remove(&request_id).is_some() {
            self.order.retain(|id| id != &request_id);
        }

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    if self.entries.remove(&oldest).is_some() {
                        tracing::debug!(request_id = %oldest, "Evicted oldest active request");
                        removed += 1;
                    }
                }
                None => break,
            }
        }

        self.order.push_back(request_id.clone());
        self.entries.insert(
            request_id,
            Entry {
                record,
                inserted: now,
            },
        );
        removed
    }

    /// Look up a live record
    pub fn get(&mut self, request_id: &str, now: Instant) -> (Option<ActiveRequestRecord>, u64) {
        let removed = self.purge_expired(now);
        (
            self.entries.get(request_id).map(|e| e.record.clone()),
            removed,
        )
    }

    /// Drop records older than the TTL, returning how many were removed
    pub fn purge_expired(&mut self, now: Instant) -> u64 {
        let mut removed = 0;
        while let Some(oldest) = self.order.front() {
            let expired = match self.entries.get(oldest) {
                Some(entry) => now.saturating_duration_since(entry.inserted) >= self.ttl,
                // Stale order slot
                None => true,
            };
            if !expired {
                break;
            }
            if let Some(id) = self.order.pop_front() {
                if self.entries.remove(&id).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestType;

    fn record() -> ActiveRequestRecord {
        ActiveRequestRecord {
            request: ResidentRequest::new("R1", "304", RequestType::GeneralInquiry, "hi"),
            response: ConciergeResponse::new(
                "hello".to_string(),
                "x".to_string(),
                "Within 2 hours".to_string(),
                false,
                false,
            ),
            processed_at: Utc::now(),
            status: RequestStatus::Active,
            work_order: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_ids_increment_per_day() {
        let mut registry = Registry::new("AVT", 10, Duration::from_secs(60));
        assert_eq!(registry.next_id(day(1)), "AVT-20250101-0001");
        assert_eq!(registry.next_id(day(1)), "AVT-20250101-0002");
        assert_eq!(registry.next_id(day(2)), "AVT-20250102-0001");
    }

    #[test]
    fn test_earlier_date_after_rollover_keeps_counting() {
        // A caller that read the clock before midnight but took the lock
        // after one that read it past midnight
        let mut registry = Registry::new("AVT", 10, Duration::from_secs(60));
        let ids = [
            registry.next_id(day(1)),
            registry.next_id(day(2)),
            registry.next_id(day(1)),
            registry.next_id(day(2)),
        ];
        assert_eq!(
            ids,
            [
                "AVT-20250101-0001",
                "AVT-20250102-0001",
                "AVT-20250102-0002",
                "AVT-20250102-0003",
            ]
        );
    }

    #[test]
    fn test_reinserted_id_keeps_single_order_slot() {
        let mut registry = Registry::new("AVT", 2, Duration::from_secs(60));
        let now = Instant::now();
        registry.insert("a".to_string(), record(), now);
        registry.insert("b".to_string(), record(), now);
        registry.insert("a".to_string(), record(), now);
        assert_eq!(registry.order.len(), 2);

        // "b" is now the oldest and goes first
        registry.insert("c".to_string(), record(), now);
        assert!(registry.get("a", now).0.is_some());
        assert!(registry.get("b", now).0.is_none());
        assert!(registry.get("c", now).0.is_some());
    }

    #[test]
    fn test_ids_not_reused_after_eviction() {
        let mut registry = Registry::new("AVT", 1, Duration::from_secs(60));
        let now = Instant::now();
        let first = registry.next_id(day(1));
        registry.insert(first.clone(), record(), now);
        let second = registry.next_id(day(1));
        assert_eq!(registry.insert(second.clone(), record(), now), 1);
        assert_ne!(first, second);
        assert_eq!(registry.next_id(day(1)), "AVT-20250101-0003");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut registry = Registry::new("AVT", 2, Duration::from_secs(60));
        let now = Instant::now();
        for id in ["a", "b", "c"] {
            registry.insert(id.to_string(), record(), now);
        }
        assert_eq!(registry.len(), 2);
        assert!(registry.get("a", now).0.is_none());
        assert!(registry.get("b", now).0.is_some());
        assert!(registry.get("c", now).0.is_some());
    }

    #[test]
    fn test_expired_records_purged_on_access() {
        let mut registry = Registry::new("AVT", 10, Duration::from_secs(60));
        let start = Instant::now();
        registry.insert("old".to_string(), record(), start);
        registry.insert(
            "new".to_string(),
            record(),
            start + Duration::from_secs(30),
        );

        let later = start + Duration::from_secs(61);
        let (old, removed) = registry.get("old", later);
        assert!(old.is_none());
        assert_eq!(removed, 1);
        assert!(registry.get("new", later).0.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_id_is_none() {
        let mut registry = Registry::new("AVT", 10, Duration::from_secs(60));
        assert!(registry.get("AVT-20250101-9999", Instant::now()).0.is_none());
        assert!(registry.is_empty());
    }
}
