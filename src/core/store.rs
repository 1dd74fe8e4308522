//! In-memory record store.
//!
//! Four independent entity tables keyed by a unique string. Each table keeps
//! rows in insertion order and indexes them by key, so scans are stable and
//! lookups/updates by key are O(1). Rows are never removed.

use crate::core::event::EventTime;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A row addressable by its unique entity key.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub key: String,
    pub event_time: EventTime,
    pub last_name: Option<String>,
    pub adr_city: Option<String>,
    pub adr_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub key: String,
    pub event_time: EventTime,
    pub customer_id: String,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub key: String,
    pub event_time: EventTime,
    pub customer_id: String,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteVisit {
    pub key: String,
    pub event_time: EventTime,
    pub customer_id: String,
}

macro_rules! keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.key
            }
        })*
    };
}

keyed!(Customer, Order, Image, SiteVisit);

/// Insertion-ordered table with a key index.
#[derive(Debug, Clone)]
pub struct Table<R> {
    rows: Vec<R>,
    index: FxHashMap<String, usize>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<R: Keyed> Table<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.index.get(key).map(|&pos| &self.rows[pos])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut R> {
        match self.index.get(key) {
            Some(&pos) => self.rows.get_mut(pos),
            None => None,
        }
    }

    /// Append a row. Returns `false` and leaves the table untouched if the
    /// key is already present.
    pub fn insert(&mut self, row: R) -> bool {
        if self.index.contains_key(row.key()) {
            return false;
        }
        self.index.insert(row.key().to_string(), self.rows.len());
        self.rows.push(row);
        true
    }

    /// Apply `f` to the row stored under `key`. Returns `false` if absent.
    pub fn update<F: FnOnce(&mut R)>(&mut self, key: &str, f: F) -> bool {
        match self.get_mut(key) {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub customers: Table<Customer>,
    pub orders: Table<Order>,
    pub images: Table<Image>,
    pub site_visits: Table<SiteVisit>,
    size: usize,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store size as of the last [`RecordStore::refresh_size`].
    pub fn size(&self) -> usize {
        self.size
    }

    /// Live sum of the four table row counts.
    pub fn row_count(&self) -> usize {
        self.customers.len() + self.orders.len() + self.images.len() + self.site_visits.len()
    }

    pub fn refresh_size(&mut self) -> usize {
        self.size = self.row_count();
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(key: &str, customer: &str, day: &str) -> SiteVisit {
        SiteVisit {
            key: key.to_string(),
            event_time: EventTime::parse(day).unwrap(),
            customer_id: customer.to_string(),
        }
    }

    #[test]
    fn test_insert_rejects_existing_key() {
        let mut table = Table::default();
        assert!(table.insert(visit("v1", "c1", "2021-01-01")));
        assert!(!table.insert(visit("v1", "c2", "2021-02-01")));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("v1").unwrap().customer_id, "c1");
    }

    #[test]
    fn test_update_by_key_keeps_position() {
        let mut table = Table::default();
        table.insert(visit("v1", "c1", "2021-01-01"));
        table.insert(visit("v2", "c1", "2021-01-02"));
        assert!(table.update("v1", |row| row.customer_id = "c9".to_string()));
        assert!(!table.update("missing", |row| row.customer_id = "x".to_string()));

        let keys: Vec<&str> = table.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["v1", "v2"]);
        assert_eq!(table.get("v1").unwrap().customer_id, "c9");
    }

    #[test]
    fn test_size_is_refreshed_explicitly() {
        let mut store = RecordStore::new();
        store.site_visits.insert(visit("v1", "c1", "2021-01-01"));
        assert_eq!(store.size(), 0);
        assert_eq!(store.row_count(), 1);
        assert_eq!(store.refresh_size(), 1);
        assert_eq!(store.size(), 1);
    }
}
