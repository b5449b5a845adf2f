//!
//! The MemoryStore module contains the [MemoryStore], a [RecordStore] that lives entirely in memory
//!

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{StoreError, ValidationError};
use crate::filter::Filter;
use crate::index::normalize_name;
use crate::perf_counters::{PerfCounters, PerfCounterFields};
use crate::records::{Record, RecordArgs, RecordID};
use crate::snapshot::Snapshot;
use crate::store::{RecordStore, RecordIter, Stat, PurgeReport};
use crate::validation::ValidationConfig;

/// A [RecordStore] that keeps its records in a `Vec`, in insertion order
///
/// Results of filtered queries are cached under the filter's [cache_key](Filter::cache_key).  The
/// cache is never evicted; instead it is dropped wholesale by any operation that changes a record.
///
/// A memory store never holds tombstones, so [purge](RecordStore::purge) always returns `None`.
pub struct MemoryStore<ConfigT : ValidationConfig> {
    config : ConfigT,
    records : Vec<Record>,
    cache : HashMap<String, Vec<Record>>,
    max_id : RecordID,
    perf_counters : PerfCounters,
}

impl <ConfigT : ValidationConfig>MemoryStore<ConfigT> {

    pub fn new(config : ConfigT) -> Self {
        Self {
            config,
            records : vec![],
            cache : HashMap::new(),
            max_id : RecordID::NULL,
            perf_counters : PerfCounters::new(),
        }
    }

    pub fn config(&self) -> &ConfigT {
        &self.config
    }

    /// The number of filtered query results currently cached
    pub fn cached_query_count(&self) -> usize {
        self.cache.len()
    }

    fn position_of(&self, id : RecordID) -> Result<usize, StoreError> {
        self.records.iter().position(|record| record.id == id).ok_or(StoreError::NotFound(id))
    }

    fn invalidate_cache(&mut self) {
        if !self.cache.is_empty() {
            debug!("dropping {} cached query results", self.cache.len());
            self.cache.clear();
        }
    }

    /// Inserts a record with a given id, or overwrites the record already holding it
    fn upsert(&mut self, record : &Record) -> Result<(), StoreError> {
        ConfigT::validate_record(record)?;
        match self.records.iter().position(|existing| existing.id == record.id) {
            Some(idx) => self.records[idx] = record.clone(),
            None => self.records.push(record.clone()),
        }
        if record.id > self.max_id {
            self.max_id = record.id;
        }
        Ok(())
    }

    fn matching<'a, F : Fn(&Record) -> bool + 'a>(&'a self, predicate : F) -> RecordIter<'a> {
        Box::new(self.records.iter().filter(move |record| predicate(*record)).map(|record| Ok(record.clone())))
    }

    /// Resets all values in the performance counters
    pub fn reset_perf_counters(&self) {
        self.perf_counters.reset();
    }

    /// Returns the values in the performance counters, which should reflect all activity since the previous call
    /// to [reset_perf_counters](MemoryStore::reset_perf_counters)
    pub fn get_perf_counters(&self) -> PerfCounterFields {
        self.perf_counters.get()
    }
}

impl <ConfigT : ValidationConfig>RecordStore for MemoryStore<ConfigT> {

    fn create(&mut self, args : &RecordArgs) -> Result<RecordID, StoreError> {

        ConfigT::validate(args)?;

        let id = if args.id.is_null() {
            let next_id = self.max_id.0.checked_add(1).ok_or_else(|| ValidationError::Range {
                field : "id",
                value : format!("{} + 1", self.max_id),
                min : "1".to_string(),
                max : i32::MAX.to_string(),
            })?;
            RecordID(next_id)
        } else {
            if self.records.iter().any(|record| record.id == args.id) {
                return Err(StoreError::DuplicateId(args.id));
            }
            args.id
        };

        let record = args.to_record(id);
        ConfigT::validate_record(&record)?;
        self.records.push(record);
        if id > self.max_id {
            self.max_id = id;
        }
        self.invalidate_cache();

        debug!("created record {id}");
        Ok(id)
    }

    fn edit(&mut self, args : &RecordArgs) -> Result<(), StoreError> {
        ConfigT::validate(args)?;
        let idx = self.position_of(args.id)?;
        self.records[idx] = args.to_record(args.id);
        self.invalidate_cache();
        debug!("edited record {}", args.id);
        Ok(())
    }

    fn remove(&mut self, id : RecordID) -> Result<(), StoreError> {
        let idx = self.position_of(id)?;
        self.records.remove(idx);
        self.invalidate_cache();
        debug!("removed record {id}");
        Ok(())
    }

    fn get_records(&mut self, filter : Option<&Filter>) -> Result<Vec<Record>, StoreError> {

        let filter = match filter {
            None => return Ok(self.records.clone()),
            Some(filter) => filter,
        };

        if let Some(cached) = self.cache.get(filter.cache_key()) {
            self.perf_counters.update(|fields| fields.cache_hit_count += 1);
            debug!("filter '{}' answered from cache", filter.text());
            return Ok(cached.clone());
        }
        self.perf_counters.update(|fields| fields.cache_miss_count += 1);

        let results : Vec<Record> = self.records.iter().filter(|record| filter.matches(record)).cloned().collect();
        self.cache.insert(filter.cache_key().to_string(), results.clone());

        debug!("filter '{}' matched {} records", filter.text(), results.len());
        Ok(results)
    }

    fn find_by_first_name(&self, first_name : &str) -> Result<RecordIter<'_>, StoreError> {
        let key = normalize_name(first_name);
        Ok(self.matching(move |record| normalize_name(&record.first_name) == key))
    }

    fn find_by_last_name(&self, last_name : &str) -> Result<RecordIter<'_>, StoreError> {
        let key = normalize_name(last_name);
        Ok(self.matching(move |record| normalize_name(&record.last_name) == key))
    }

    fn find_by_date_of_birth(&self, date_of_birth : NaiveDate) -> Result<RecordIter<'_>, StoreError> {
        Ok(self.matching(move |record| record.date_of_birth == date_of_birth))
    }

    fn stat(&self) -> Stat {
        Stat{ live : self.records.len(), deleted : 0 }
    }

    fn restore(&mut self, snapshot : &Snapshot) -> Result<usize, StoreError> {

        let mut restored = 0;
        for record in snapshot {
            match self.upsert(record) {
                Ok(()) => restored += 1,
                Err(StoreError::Validation(err)) => {
                    warn!("skipping record {} during restore: {err}", record.id);
                },
                Err(err) => return Err(err),
            }
        }

        if restored > 0 {
            self.records.sort_by_key(|record| record.id);
            self.invalidate_cache();
        }

        info!("restored {restored} of {} records into memory", snapshot.len());
        Ok(restored)
    }

    fn purge(&mut self) -> Result<Option<PurgeReport>, StoreError> {
        Ok(None)
    }
}
