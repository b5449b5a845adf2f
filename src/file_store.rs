//!
//! The FileStore module contains the [FileStore], the [RecordStore] backed by a file of
//! fixed-size slots
//!

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{StoreError, ValidationError};
use crate::filter::Filter;
use crate::index::{IndexKeys, RecordIndexes};
use crate::perf_counters::{PerfCounters, PerfCounterFields};
use crate::records::{Record, RecordArgs, RecordID};
use crate::slot::{*};
use crate::snapshot::Snapshot;
use crate::store::{RecordStore, RecordIter, Stat, PurgeReport};
use crate::validation::ValidationConfig;

/// A [RecordStore] that keeps every record in a fixed-size slot of a binary file
///
/// The slot layout is documented on the `slot` module.  Because every slot has the same size, a
/// record is addressed directly by its offset, and edits overwrite it in place.  Removing a record
/// only sets the deleted bit in its status word; the slot is reclaimed by [purge](RecordStore::purge).
///
/// Four in-memory indexes map the id, first name, last name and date of birth of every live record
/// to its offset.  They are rebuilt by scanning the file when it is opened.
///
/// The store holds the file open for its whole lifetime and assumes nothing else writes to it.
///
/// ```
/// use record_cabinet::{*};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = FileStore::open(dir.path().join("cabinet.db"), DefaultValidationConfig()).unwrap();
/// assert_eq!(store.stat(), Stat{ live : 0, deleted : 0 });
/// assert_eq!(store.purge().unwrap(), None);
/// ```
pub struct FileStore<ConfigT : ValidationConfig> {
    file : File,
    path : PathBuf,
    config : ConfigT,
    indexes : RecordIndexes,
    slot_count : usize,
    deleted_count : usize,
    max_id : RecordID,
    perf_counters : PerfCounters,
}

impl <ConfigT : ValidationConfig>FileStore<ConfigT> {

    /// Opens the store backed by the file at the path provided, creating an empty file if there
    /// is none, and rebuilds the indexes from its contents
    ///
    /// Fails with [StoreError::CorruptFile] if the file isn't a whole number of slots, or if two live
    /// slots hold the same id.
    pub fn open<P : AsRef<Path>>(path : P, config : ConfigT) -> Result<Self, StoreError> {

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&path)?;

        let file_len = file.metadata()?.len();
        if file_len % SLOT_SIZE as u64 != 0 {
            return Err(StoreError::CorruptFile {
                path : path.display().to_string(),
                details : format!("length {file_len} is not a multiple of the slot size {SLOT_SIZE}"),
            });
        }

        let mut store = Self {
            file,
            path,
            config,
            indexes : RecordIndexes::new(),
            slot_count : (file_len / SLOT_SIZE as u64) as usize,
            deleted_count : 0,
            max_id : RecordID::NULL,
            perf_counters : PerfCounters::new(),
        };
        store.load_indexes()?;

        info!("opened {} with {} live and {} deleted records ({} validation)",
            store.path.display(), store.indexes.len(), store.deleted_count, ConfigT::NAME);

        Ok(store)
    }

    /// Scans every slot header, indexing the live slots and counting the deleted ones
    fn load_indexes(&mut self) -> Result<(), StoreError> {

        for slot_idx in 0..self.slot_count {
            let offset = (slot_idx * SLOT_SIZE) as u64;
            let header = self.read_header(offset)?;

            if header.is_deleted() {
                self.deleted_count += 1;
                continue;
            }

            if self.indexes.contains(header.id) {
                return Err(StoreError::CorruptFile {
                    path : self.path.display().to_string(),
                    details : format!("id {} is held by more than one live slot", header.id),
                });
            }
            if header.id > self.max_id {
                self.max_id = header.id;
            }
            self.indexes.insert(IndexKeys::from_header(&header), offset);
        }

        Ok(())
    }

    /// Resets the store, discarding every record and truncating the file to zero length
    ///
    /// The store stays open and id assignment starts again from 1.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.file.set_len(0)?;
        self.indexes.clear();
        self.slot_count = 0;
        self.deleted_count = 0;
        self.max_id = RecordID::NULL;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ConfigT {
        &self.config
    }

    /// The number of slots in the file, live and deleted
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// The number of distinct keys in the first name, last name, and date of birth indexes
    pub fn secondary_key_counts(&self) -> (usize, usize, usize) {
        self.indexes.key_counts()
    }

    fn read_header(&self, offset : u64) -> Result<SlotHeader, StoreError> {
        let bytes = read_at(&self.file, offset, HEADER_SIZE)?;
        self.perf_counters.update(|fields| fields.slot_read_count += 1);
        decode_header(&bytes).map_err(|details| StoreError::CorruptSlot{ offset, details })
    }

    fn read_record(&self, offset : u64) -> Result<Record, StoreError> {
        let bytes = read_at(&self.file, offset, SLOT_SIZE)?;
        self.perf_counters.update(|fields| fields.slot_read_count += 1);
        let (_status, record) = decode_slot(&bytes).map_err(|details| StoreError::CorruptSlot{ offset, details })?;
        Ok(record)
    }

    /// Appends a slot for the record at the end of the file and indexes it
    ///
    /// This is the write path shared by create, restore, and purge.
    fn append_slot(&mut self, record : &Record) -> Result<u64, StoreError> {

        //Encode before touching the file, so an unrepresentable record changes nothing
        let bytes = encode_slot(0, record)?;
        let offset = (self.slot_count * SLOT_SIZE) as u64;
        write_at(&self.file, offset, &bytes)?;
        self.perf_counters.update(|fields| fields.slot_write_count += 1);

        self.slot_count += 1;
        self.indexes.insert(IndexKeys::from_record(record), offset);
        if record.id > self.max_id {
            self.max_id = record.id;
        }

        debug!("wrote record {} to new slot at offset {offset}", record.id);
        Ok(offset)
    }

    /// Overwrites the live slot at `offset` in place, and moves it between the buckets of any
    /// secondary index whose key changed
    fn overwrite_slot(&mut self, offset : u64, record : &Record) -> Result<(), StoreError> {

        let old_header = self.read_header(offset)?;
        let bytes = encode_slot(old_header.status, record)?;
        write_at(&self.file, offset, &bytes)?;
        self.perf_counters.update(|fields| fields.slot_write_count += 1);

        self.indexes.update(&IndexKeys::from_header(&old_header), IndexKeys::from_record(record), offset);

        debug!("overwrote record {} in slot at offset {offset}", record.id);
        Ok(())
    }

    fn offset_of(&self, id : RecordID) -> Result<u64, StoreError> {
        self.perf_counters.update(|fields| fields.index_lookup_count += 1);
        self.indexes.offset_of(id).ok_or(StoreError::NotFound(id))
    }

    /// Inserts a record with a given id, or overwrites the record already holding it
    fn upsert(&mut self, record : &Record) -> Result<(), StoreError> {
        ConfigT::validate_record(record)?;
        match self.indexes.offset_of(record.id) {
            Some(offset) => self.overwrite_slot(offset, record),
            None => self.append_slot(record).map(|_| ()),
        }
    }

    /// Decodes the records at a set of offsets, in the order supplied
    fn records_at(&self, offsets : Vec<u64>) -> RecordIter<'_> {
        Box::new(offsets.into_iter().map(move |offset| self.read_record(offset)))
    }

    /// Resets all values in the performance counters, so the information returned by [get_perf_counters](FileStore::get_perf_counters) only
    /// reflects activity since the last call to `reset_perf_counters`
    pub fn reset_perf_counters(&self) {
        self.perf_counters.reset();
    }

    /// Returns the values in the performance counters, which should reflect all activity since the previous call
    /// to [reset_perf_counters](FileStore::reset_perf_counters)
    pub fn get_perf_counters(&self) -> PerfCounterFields {
        self.perf_counters.get()
    }
}

impl <ConfigT : ValidationConfig>RecordStore for FileStore<ConfigT> {

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
            if self.indexes.contains(args.id) {
                return Err(StoreError::DuplicateId(args.id));
            }
            args.id
        };

        let record = args.to_record(id);
        ConfigT::validate_record(&record)?;
        self.append_slot(&record)?;
        Ok(id)
    }

    fn edit(&mut self, args : &RecordArgs) -> Result<(), StoreError> {
        ConfigT::validate(args)?;
        let offset = self.offset_of(args.id)?;
        self.overwrite_slot(offset, &args.to_record(args.id))
    }

    fn remove(&mut self, id : RecordID) -> Result<(), StoreError> {

        let offset = self.offset_of(id)?;
        let header = self.read_header(offset)?;

        write_status(&self.file, offset, mark_deleted(header.status))?;
        self.indexes.remove(&IndexKeys::from_header(&header), offset);
        self.deleted_count += 1;

        if id == self.max_id {
            self.max_id = self.indexes.max_id();
        }

        debug!("marked record {id} deleted in slot at offset {offset}");
        Ok(())
    }

    fn get_records(&mut self, filter : Option<&Filter>) -> Result<Vec<Record>, StoreError> {

        let filter = match filter {
            None => return self.records_at(self.indexes.offsets_by_id().collect()).collect(),
            Some(filter) => filter,
        };

        //Narrow the candidates through an index when the filter allows it, otherwise visit
        //every live record
        let hinted_offsets = filter.index_hint().and_then(|hint| self.indexes.lookup(hint));
        let narrowed = hinted_offsets.is_some();
        let offsets = match hinted_offsets {
            Some(offsets) => {
                self.perf_counters.update(|fields| fields.index_lookup_count += 1);
                offsets
            },
            None => self.indexes.offsets_by_id().collect(),
        };

        let mut records = vec![];
        for record in self.records_at(offsets) {
            let record = record?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        if narrowed {
            records.sort_by_key(|record| record.id);
        }

        debug!("filter '{}' matched {} records", filter.text(), records.len());
        Ok(records)
    }

    fn find_by_first_name(&self, first_name : &str) -> Result<RecordIter<'_>, StoreError> {
        self.perf_counters.update(|fields| fields.index_lookup_count += 1);
        Ok(self.records_at(self.indexes.by_first_name(first_name).to_vec()))
    }

    fn find_by_last_name(&self, last_name : &str) -> Result<RecordIter<'_>, StoreError> {
        self.perf_counters.update(|fields| fields.index_lookup_count += 1);
        Ok(self.records_at(self.indexes.by_last_name(last_name).to_vec()))
    }

    fn find_by_date_of_birth(&self, date_of_birth : NaiveDate) -> Result<RecordIter<'_>, StoreError> {
        self.perf_counters.update(|fields| fields.index_lookup_count += 1);
        Ok(self.records_at(self.indexes.by_date_of_birth(date_of_birth).to_vec()))
    }

    fn stat(&self) -> Stat {
        Stat{ live : self.indexes.len(), deleted : self.deleted_count }
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

        info!("restored {restored} of {} records into {}", snapshot.len(), self.path.display());
        Ok(restored)
    }

    fn purge(&mut self) -> Result<Option<PurgeReport>, StoreError> {

        if self.deleted_count == 0 {
            return Ok(None);
        }

        let report = PurgeReport{ purged : self.deleted_count, total : self.slot_count };

        //Pull every live record into memory before the rewrite starts clobbering slots
        let live_records : Vec<Record> = self.records_at(self.indexes.offsets_by_id().collect()).collect::<Result<_, _>>()?;

        self.indexes.clear();
        self.slot_count = 0;
        self.deleted_count = 0;
        self.max_id = RecordID::NULL;

        for record in live_records.iter() {
            self.append_slot(record)?;
        }
        self.file.set_len((self.slot_count * SLOT_SIZE) as u64)?;

        info!("purged {} of {} slots from {}", report.purged, report.total, self.path.display());
        Ok(Some(report))
    }
}
