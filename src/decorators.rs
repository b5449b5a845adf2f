//!
//! The Decorators module contains wrappers that add timing and logging around any [RecordStore].
//! Each wrapper is itself a RecordStore, so they can be stacked.
//!

use core::cell::RefCell;
use core::fmt::{Debug, Display};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::filter::Filter;
use crate::records::{Record, RecordArgs, RecordID};
use crate::snapshot::Snapshot;
use crate::store::{RecordStore, RecordIter, Stat, PurgeReport};

/// The number of calls to one operation and the total time they took
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationTiming {
    pub calls : usize,
    pub total : Duration,
}

impl OperationTiming {
    /// The mean duration of a call, or zero if there were no calls
    pub fn average(&self) -> Duration {
        match self.calls {
            0 => Duration::ZERO,
            calls => match u32::try_from(calls) {
                Ok(calls) => self.total / calls,
                Err(_) => self.total.div_f64(calls as f64),
            },
        }
    }
}

/// Per-operation timings collected by a [TimedStore], keyed by operation name
#[derive(Debug, Clone, Default)]
pub struct OperationTimings {
    operations : BTreeMap<&'static str, OperationTiming>,
}

impl OperationTimings {

    pub fn record(&mut self, operation : &'static str, elapsed : Duration) {
        let timing = self.operations.entry(operation).or_default();
        timing.calls += 1;
        timing.total += elapsed;
    }

    /// Returns the timing for an operation, which is all zeros if it was never called
    pub fn get(&self, operation : &str) -> OperationTiming {
        self.operations.get(operation).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item=(&'static str, OperationTiming)> + '_ {
        self.operations.iter().map(|(operation, timing)| (*operation, *timing))
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}

/// A [RecordStore] that forwards to an inner store, measuring how long each call takes
///
/// NOTE: The secondary lookups return lazy iterators, so their timings only cover starting the
/// lookup, not decoding the records it yields.
pub struct TimedStore<S : RecordStore> {
    inner : S,
    timings : RefCell<OperationTimings>,
}

impl <S : RecordStore>TimedStore<S> {

    pub fn new(inner : S) -> Self {
        Self{ inner, timings : RefCell::new(OperationTimings::default()) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Returns a copy of the timings collected so far
    pub fn timings(&self) -> OperationTimings {
        self.timings.borrow().clone()
    }

    pub fn reset_timings(&self) {
        self.timings.borrow_mut().clear();
    }

    fn measure<T>(&self, operation : &'static str, start : Instant, result : T) -> T {
        let elapsed = start.elapsed();
        self.timings.borrow_mut().record(operation, elapsed);
        debug!("{operation} took {elapsed:?}");
        result
    }
}

impl <S : RecordStore>RecordStore for TimedStore<S> {

    fn create(&mut self, args : &RecordArgs) -> Result<RecordID, StoreError> {
        let start = Instant::now();
        let result = self.inner.create(args);
        self.measure("create", start, result)
    }

    fn edit(&mut self, args : &RecordArgs) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self.inner.edit(args);
        self.measure("edit", start, result)
    }

    fn remove(&mut self, id : RecordID) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self.inner.remove(id);
        self.measure("remove", start, result)
    }

    fn get_records(&mut self, filter : Option<&Filter>) -> Result<Vec<Record>, StoreError> {
        let start = Instant::now();
        let result = self.inner.get_records(filter);
        self.measure("get_records", start, result)
    }

    fn find_by_first_name(&self, first_name : &str) -> Result<RecordIter<'_>, StoreError> {
        let start = Instant::now();
        let result = self.inner.find_by_first_name(first_name);
        self.measure("find_by_first_name", start, result)
    }

    fn find_by_last_name(&self, last_name : &str) -> Result<RecordIter<'_>, StoreError> {
        let start = Instant::now();
        let result = self.inner.find_by_last_name(last_name);
        self.measure("find_by_last_name", start, result)
    }

    fn find_by_date_of_birth(&self, date_of_birth : NaiveDate) -> Result<RecordIter<'_>, StoreError> {
        let start = Instant::now();
        let result = self.inner.find_by_date_of_birth(date_of_birth);
        self.measure("find_by_date_of_birth", start, result)
    }

    fn stat(&self) -> Stat {
        let start = Instant::now();
        let result = self.inner.stat();
        self.measure("stat", start, result)
    }

    fn make_snapshot(&self, records : Vec<Record>) -> Snapshot {
        let start = Instant::now();
        let result = self.inner.make_snapshot(records);
        self.measure("make_snapshot", start, result)
    }

    fn restore(&mut self, snapshot : &Snapshot) -> Result<usize, StoreError> {
        let start = Instant::now();
        let result = self.inner.restore(snapshot);
        self.measure("restore", start, result)
    }

    fn purge(&mut self) -> Result<Option<PurgeReport>, StoreError> {
        let start = Instant::now();
        let result = self.inner.purge();
        self.measure("purge", start, result)
    }
}

/// A [RecordStore] that forwards to an inner store, logging every call and its outcome at the
/// `info` level
pub struct LoggedStore<S : RecordStore> {
    inner : S,
}

impl <S : RecordStore>LoggedStore<S> {

    pub fn new(inner : S) -> Self {
        Self{ inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn log_outcome<T : Debug, E : Display>(operation : &str, result : &Result<T, E>) {
    match result {
        Ok(value) => info!("{operation} returned {value:?}"),
        Err(err) => info!("{operation} failed: {err}"),
    }
}

fn log_lookup(operation : &str, result : &Result<RecordIter<'_>, StoreError>) {
    match result {
        Ok(_) => info!("{operation} started"),
        Err(err) => info!("{operation} failed: {err}"),
    }
}

impl <S : RecordStore>RecordStore for LoggedStore<S> {

    fn create(&mut self, args : &RecordArgs) -> Result<RecordID, StoreError> {
        info!("create {args:?}");
        let result = self.inner.create(args);
        log_outcome("create", &result);
        result
    }

    fn edit(&mut self, args : &RecordArgs) -> Result<(), StoreError> {
        info!("edit {args:?}");
        let result = self.inner.edit(args);
        log_outcome("edit", &result);
        result
    }

    fn remove(&mut self, id : RecordID) -> Result<(), StoreError> {
        info!("remove {id}");
        let result = self.inner.remove(id);
        log_outcome("remove", &result);
        result
    }

    fn get_records(&mut self, filter : Option<&Filter>) -> Result<Vec<Record>, StoreError> {
        info!("get_records {:?}", filter.map(|filter| filter.text()));
        let result = self.inner.get_records(filter);
        log_outcome("get_records", &result.as_ref().map(|records| records.len()));
        result
    }

    fn find_by_first_name(&self, first_name : &str) -> Result<RecordIter<'_>, StoreError> {
        info!("find_by_first_name {first_name:?}");
        let result = self.inner.find_by_first_name(first_name);
        log_lookup("find_by_first_name", &result);
        result
    }

    fn find_by_last_name(&self, last_name : &str) -> Result<RecordIter<'_>, StoreError> {
        info!("find_by_last_name {last_name:?}");
        let result = self.inner.find_by_last_name(last_name);
        log_lookup("find_by_last_name", &result);
        result
    }

    fn find_by_date_of_birth(&self, date_of_birth : NaiveDate) -> Result<RecordIter<'_>, StoreError> {
        info!("find_by_date_of_birth {date_of_birth}");
        let result = self.inner.find_by_date_of_birth(date_of_birth);
        log_lookup("find_by_date_of_birth", &result);
        result
    }

    fn stat(&self) -> Stat {
        let stat = self.inner.stat();
        info!("stat returned {stat:?}");
        stat
    }

    fn make_snapshot(&self, records : Vec<Record>) -> Snapshot {
        info!("make_snapshot of {} records", records.len());
        self.inner.make_snapshot(records)
    }

    fn restore(&mut self, snapshot : &Snapshot) -> Result<usize, StoreError> {
        info!("restore of {} records", snapshot.len());
        let result = self.inner.restore(snapshot);
        log_outcome("restore", &result);
        result
    }

    fn purge(&mut self) -> Result<Option<PurgeReport>, StoreError> {
        info!("purge");
        let result = self.inner.purge();
        log_outcome("purge", &result);
        result
    }
}
