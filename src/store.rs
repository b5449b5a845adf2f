//!
//! The Store module contains the [RecordStore] contract shared by every backend and decorator,
//! and the small report types its operations return.  Everything here is re-exported.
//!

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::filter::Filter;
use crate::records::{Record, RecordArgs, RecordID};
use crate::snapshot::Snapshot;

/// The number of live and tombstoned records in a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub live : usize,
    pub deleted : usize,
}

/// The outcome of a compaction: how many tombstones were dropped, out of how many slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub purged : usize,
    pub total : usize,
}

/// A lazily-decoded sequence of records returned by the secondary lookups
pub type RecordIter<'a> = Box<dyn Iterator<Item=Result<Record, StoreError>> + 'a>;

/// The contract every record store implements
///
/// Every mutating operation validates its input against the store's
/// [ValidationConfig](crate::ValidationConfig) before it changes anything, so a failed operation
/// leaves the store exactly as it was.
pub trait RecordStore {

    /// Creates a record and returns its id
    ///
    /// If `args.id` is [RecordID::NULL], the store assigns one greater than the largest id it has
    /// ever held.  Otherwise the supplied id is used, and must not belong to a live record.
    fn create(&mut self, args : &RecordArgs) -> Result<RecordID, StoreError>;

    /// Overwrites every field of the record with id `args.id`
    fn edit(&mut self, args : &RecordArgs) -> Result<(), StoreError>;

    /// Removes a record
    fn remove(&mut self, id : RecordID) -> Result<(), StoreError>;

    /// Returns every record accepted by the filter, or every record if there is no filter
    fn get_records(&mut self, filter : Option<&Filter>) -> Result<Vec<Record>, StoreError>;

    /// Returns the records whose first name matches, ignoring case
    fn find_by_first_name(&self, first_name : &str) -> Result<RecordIter<'_>, StoreError>;

    /// Returns the records whose last name matches, ignoring case
    fn find_by_last_name(&self, last_name : &str) -> Result<RecordIter<'_>, StoreError>;

    fn find_by_date_of_birth(&self, date_of_birth : NaiveDate) -> Result<RecordIter<'_>, StoreError>;

    fn stat(&self) -> Stat;

    /// Wraps records into a [Snapshot] for export
    fn make_snapshot(&self, records : Vec<Record>) -> Snapshot {
        Snapshot::new(records)
    }

    /// Applies every valid record of a snapshot, creating unseen ids and overwriting existing
    /// ones.  Invalid records are logged and skipped.  Returns the number of records applied.
    fn restore(&mut self, snapshot : &Snapshot) -> Result<usize, StoreError>;

    /// Physically drops tombstoned records.  Returns `None` if there was nothing to drop, or if
    /// the store doesn't keep tombstones at all.
    fn purge(&mut self) -> Result<Option<PurgeReport>, StoreError>;
}

impl <S : RecordStore + ?Sized>RecordStore for Box<S> {
    fn create(&mut self, args : &RecordArgs) -> Result<RecordID, StoreError> {
        (**self).create(args)
    }
    fn edit(&mut self, args : &RecordArgs) -> Result<(), StoreError> {
        (**self).edit(args)
    }
    fn remove(&mut self, id : RecordID) -> Result<(), StoreError> {
        (**self).remove(id)
    }
    fn get_records(&mut self, filter : Option<&Filter>) -> Result<Vec<Record>, StoreError> {
        (**self).get_records(filter)
    }
    fn find_by_first_name(&self, first_name : &str) -> Result<RecordIter<'_>, StoreError> {
        (**self).find_by_first_name(first_name)
    }
    fn find_by_last_name(&self, last_name : &str) -> Result<RecordIter<'_>, StoreError> {
        (**self).find_by_last_name(last_name)
    }
    fn find_by_date_of_birth(&self, date_of_birth : NaiveDate) -> Result<RecordIter<'_>, StoreError> {
        (**self).find_by_date_of_birth(date_of_birth)
    }
    fn stat(&self) -> Stat {
        (**self).stat()
    }
    fn make_snapshot(&self, records : Vec<Record>) -> Snapshot {
        (**self).make_snapshot(records)
    }
    fn restore(&mut self, snapshot : &Snapshot) -> Result<usize, StoreError> {
        (**self).restore(snapshot)
    }
    fn purge(&mut self) -> Result<Option<PurgeReport>, StoreError> {
        (**self).purge()
    }
}
