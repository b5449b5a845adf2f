//!
//! The Index module contains the in-memory indexes that map record keys to slot offsets in the
//! backing file.  Nothing from here should be re-exported.
//!
//! Indexes are owned by exactly one store, rebuilt from the file whenever it is opened, and never
//! persisted.
//!

use std::collections::{BTreeMap, HashMap};
use std::collections::hash_map::Entry;

use chrono::{Datelike, NaiveDate};

use crate::property::FieldValue;
use crate::records::{Record, RecordID};
use crate::slot::SlotHeader;
use crate::unicode_string_helpers::unicode_upper;

/// Normalizes a first or last name for use as an index key
pub fn normalize_name(name : &str) -> String {
    unicode_upper(name)
}

/// Normalizes a date for use as an index key, as `year/month/day`
pub fn normalize_date(date : NaiveDate) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day())
}

/// A multi-valued index from a normalized key to the offsets of every slot with that key
///
/// A key's bucket is deleted as soon as it becomes empty, so the number of keys always equals the
/// number of distinct values among live records.
#[derive(Debug, Default)]
pub struct OffsetIndex {
    buckets : HashMap<String, Vec<u64>>,
}

impl OffsetIndex {

    pub fn insert(&mut self, key : String, offset : u64) {
        let bucket = self.buckets.entry(key).or_default();
        if !bucket.contains(&offset) {
            bucket.push(offset);
        }
    }

    pub fn remove(&mut self, key : &str, offset : u64) {
        if let Entry::Occupied(mut entry) = self.buckets.entry(key.to_string()) {
            entry.get_mut().retain(|existing| *existing != offset);
            if entry.get().is_empty() {
                entry.remove();
            }
        }
    }

    /// Returns the offsets under a key, in insertion order
    pub fn get(&self, key : &str) -> &[u64] {
        self.buckets.get(key).map(|bucket| &bucket[..]).unwrap_or(&[])
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

/// The normalized index keys of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeys {
    pub id : RecordID,
    pub first_name : String,
    pub last_name : String,
    pub date_of_birth : String,
}

impl IndexKeys {
    pub fn from_header(header : &SlotHeader) -> Self {
        Self {
            id : header.id,
            first_name : normalize_name(&header.first_name),
            last_name : normalize_name(&header.last_name),
            date_of_birth : normalize_date(header.date_of_birth),
        }
    }
    pub fn from_record(record : &Record) -> Self {
        Self {
            id : record.id,
            first_name : normalize_name(&record.first_name),
            last_name : normalize_name(&record.last_name),
            date_of_birth : normalize_date(record.date_of_birth),
        }
    }
}

/// The four indexes of a file store: the unique id index, and the three secondary indexes
#[derive(Debug, Default)]
pub struct RecordIndexes {
    ids : BTreeMap<RecordID, u64>,
    first_names : OffsetIndex,
    last_names : OffsetIndex,
    dates_of_birth : OffsetIndex,
}

impl RecordIndexes {

    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a live slot to every index
    pub fn insert(&mut self, keys : IndexKeys, offset : u64) {
        self.ids.insert(keys.id, offset);
        self.first_names.insert(keys.first_name, offset);
        self.last_names.insert(keys.last_name, offset);
        self.dates_of_birth.insert(keys.date_of_birth, offset);
    }

    /// Strips a slot from every index, using the keys it was indexed under
    pub fn remove(&mut self, keys : &IndexKeys, offset : u64) {
        self.ids.remove(&keys.id);
        self.first_names.remove(&keys.first_name, offset);
        self.last_names.remove(&keys.last_name, offset);
        self.dates_of_birth.remove(&keys.date_of_birth, offset);
    }

    /// Moves a slot between buckets of the secondary indexes whose key changed.  Buckets of
    /// unchanged keys aren't touched.
    pub fn update(&mut self, old_keys : &IndexKeys, new_keys : IndexKeys, offset : u64) {
        if old_keys.first_name != new_keys.first_name {
            self.first_names.remove(&old_keys.first_name, offset);
            self.first_names.insert(new_keys.first_name, offset);
        }
        if old_keys.last_name != new_keys.last_name {
            self.last_names.remove(&old_keys.last_name, offset);
            self.last_names.insert(new_keys.last_name, offset);
        }
        if old_keys.date_of_birth != new_keys.date_of_birth {
            self.dates_of_birth.remove(&old_keys.date_of_birth, offset);
            self.dates_of_birth.insert(new_keys.date_of_birth, offset);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.first_names.clear();
        self.last_names.clear();
        self.dates_of_birth.clear();
    }

    pub fn offset_of(&self, id : RecordID) -> Option<u64> {
        self.ids.get(&id).copied()
    }

    pub fn contains(&self, id : RecordID) -> bool {
        self.ids.contains_key(&id)
    }

    /// The number of live records
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The largest live id, or [RecordID::NULL] when there is none
    pub fn max_id(&self) -> RecordID {
        self.ids.keys().next_back().copied().unwrap_or(RecordID::NULL)
    }

    /// Every live slot offset, in id order
    pub fn offsets_by_id(&self) -> impl Iterator<Item=u64> + '_ {
        self.ids.values().copied()
    }

    pub fn by_first_name(&self, first_name : &str) -> &[u64] {
        self.first_names.get(&normalize_name(first_name))
    }

    pub fn by_last_name(&self, last_name : &str) -> &[u64] {
        self.last_names.get(&normalize_name(last_name))
    }

    pub fn by_date_of_birth(&self, date_of_birth : NaiveDate) -> &[u64] {
        self.dates_of_birth.get(&normalize_date(date_of_birth))
    }

    /// Returns the offsets of every slot matching an indexed value, or `None` if the value's
    /// property has no index
    pub fn lookup(&self, value : &FieldValue) -> Option<Vec<u64>> {
        match value {
            FieldValue::Id(id) => Some(self.offset_of(*id).into_iter().collect()),
            FieldValue::FirstName(name) => Some(self.by_first_name(name).to_vec()),
            FieldValue::LastName(name) => Some(self.by_last_name(name).to_vec()),
            FieldValue::DateOfBirth(date) => Some(self.by_date_of_birth(*date).to_vec()),
            _ => None,
        }
    }

    /// Returns the number of distinct keys in each secondary index: first names, last names, and
    /// dates of birth
    pub fn key_counts(&self) -> (usize, usize, usize) {
        (self.first_names.key_count(), self.last_names.key_count(), self.dates_of_birth.key_count())
    }
}
