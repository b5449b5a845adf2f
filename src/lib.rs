//! # record_cabinet Overview
//!
//! A small record-management engine for personnel-style records, with two interchangeable
//! backends: an in-memory store with a query cache, and a persistent store that keeps every record
//! in a fixed-size slot of a binary file.
//!
//! ## Records
//!
//! A [Record] holds an id, a first and last name, a date of birth, a zip code, a city and street,
//! a salary and a one-character gender.  Every store assigns each record a unique positive
//! [RecordID].  Writes are described by a [RecordArgs], which carries the same fields; passing
//! [RecordID::NULL] as its id asks the store to assign the next one.
//!
//! ## Usage Example
//!
//! ```
//! use record_cabinet::{*};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! //Create a store that keeps its records in memory
//! let mut store = MemoryStore::new(DefaultValidationConfig());
//!
//! //Create a record, letting the store pick its id
//! let ann = store.create(&RecordArgs {
//!     id : RecordID::NULL,
//!     first_name : "Ann".to_string(),
//!     last_name : "Berg".to_string(),
//!     date_of_birth : NaiveDate::from_ymd_opt(1990, 5, 14).unwrap(),
//!     zip_code : 150,
//!     city : "Oslo".to_string(),
//!     street : "Storgata 1".to_string(),
//!     salary : Decimal::new(52000, 0),
//!     gender : 'F',
//! }).unwrap();
//!
//! //Find it again with a filter.  Strings compare ignoring case
//! let filter = Filter::parse::<DefaultValidationConfig>("firstname = 'ann' and city = 'OSLO'").unwrap();
//! let found = store.get_records(Some(&filter)).unwrap();
//! assert_eq!(found[0].id, ann);
//!
//! //Move everyone matching the filter to Bergen
//! let setters = Setters::parse::<DefaultValidationConfig>("city = 'Bergen'").unwrap();
//! let moved = update::<DefaultValidationConfig, _>(&mut store, &setters, &filter).unwrap();
//! assert_eq!(moved, vec![ann]);
//! assert_eq!(store.find_by_last_name("BERG").unwrap().next().unwrap().unwrap().city, "Bergen");
//! ```
//!
//! Additional usage examples can be found in the tests, located at the bottom of the `src/lib.rs` file.
//!
//! ## Stores
//!
//! Both backends implement the [RecordStore] trait, so code written against the trait works with
//! either of them, and with the [TimedStore] and [LoggedStore] wrappers that decorate any store.
//!
//! - [MemoryStore] keeps its records in a `Vec`.  Filtered queries are cached by the normalized
//! filter text until the next change to any record.
//! - [FileStore] keeps each record in a slot of [SLOT_SIZE] bytes.  Removing a record only marks its
//! slot deleted, leaving a tombstone; [purge](RecordStore::purge) rewrites the file without them.
//! Indexes on the id, first name, last name and date of birth are rebuilt each time the file is opened.
//!
//! ## Validation Configuration
//!
//! Every store is generic over a [ValidationConfig], which bounds each field of a record.
//! [DefaultValidationConfig] and [CustomValidationConfig] are zero-sized types implementing the two
//! stock rule sets.  A config is passed to the store's constructor, and the same config type is passed
//! to [Filter::parse] and [Setters::parse] so literals are held to the same rules as stored records.
//!
//! ## Filters, Selections and Setters
//!
//! A [Filter] is a list of `property = 'literal'` clauses joined by `and` or by `or`.  The first
//! combinator decides the join for the whole list.
//! A [Selection] names the properties a [select] query projects, and [Setters] names the assignments
//! an [update] query makes.  Property names ignore case and underscores.
//!
//! ## Snapshots
//!
//! A [Snapshot] is an ordered batch of records, made from a store with [make_snapshot](RecordStore::make_snapshot)
//! and applied to a store with [restore](RecordStore::restore).  [Record] derives serde's traits with
//! its fields in canonical order, so a snapshot may be assembled by any serde-based codec.  A snapshot
//! can also be dumped to bytes through a [Coder], selected with the `bitcode` (default), `bincode` or
//! `msgpack` features.
//!
//! ## Performance Counters
//!
//! Enabling the `perf_counters` feature makes [FileStore::get_perf_counters] and
//! [MemoryStore::get_perf_counters] report slot reads and writes, index lookups and cache hits.
//! Without the feature the counters always read zero and cost nothing.
//!
//! ## Logging
//!
//! The crate logs through [tracing](https://docs.rs/tracing): `info` for opening, restoring and purging,
//! `debug` for each operation, and `warn` for records skipped during a restore.  No subscriber is installed.
//!

mod unicode_string_helpers;
mod error;
pub use error::{StoreError, FilterError, ValidationError};
mod records;
pub use records::{RecordID, Record, RecordArgs};
mod validation;
pub use validation::{ValidationConfig, DefaultValidationConfig, CustomValidationConfig, MAX_STRING_LENGTH};
mod converters;
pub use converters::DATE_FORMATS;
mod property;
pub use property::{Property, FieldValue};
mod filter;
pub use filter::{Filter, Combinator};
mod selection;
pub use selection::{Selection, Setters, Projection};
mod slot;
pub use slot::SLOT_SIZE;
mod index;
mod perf_counters;
pub use perf_counters::PerfCounterFields;
mod encode_decode;
pub use encode_decode::Coder;
#[cfg(feature = "bitcode")]
pub use encode_decode::bitcode_interface::BitcodeCoder;
#[cfg(feature = "bincode")]
pub use encode_decode::bincode_interface::BincodeCoder;
#[cfg(feature = "msgpack")]
pub use encode_decode::msgpack_interface::MsgPackCoder;
#[cfg(any(feature = "bitcode", feature = "bincode", feature = "msgpack"))]
pub use encode_decode::DefaultCoder;
mod snapshot;
pub use snapshot::Snapshot;
mod store;
pub use store::{RecordStore, RecordIter, Stat, PurgeReport};
mod memory_store;
pub use memory_store::MemoryStore;
mod file_store;
pub use file_store::FileStore;
mod decorators;
pub use decorators::{TimedStore, LoggedStore, OperationTimings, OperationTiming};
mod query;
pub use query::{select, update, delete};

#[cfg(test)]
mod tests {
    use std::fs;
    use std::str::FromStr;

    use chrono::NaiveDate;
    use csv::ReaderBuilder;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use crate::{*};

    fn date(y : i32, m : u32, d : u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn person(first_name : &str, last_name : &str, date_of_birth : NaiveDate, city : &str) -> RecordArgs {
        RecordArgs {
            id : RecordID::NULL,
            first_name : first_name.to_string(),
            last_name : last_name.to_string(),
            date_of_birth,
            zip_code : 1234,
            city : city.to_string(),
            street : "Main Street 7".to_string(),
            salary : Decimal::from_str("41250.50").unwrap(),
            gender : 'F',
        }
    }

    /// The five records most of the tests start from, with ids 1 through 5
    fn people() -> Vec<RecordArgs> {
        vec![
            person("Ann", "Berg", date(1990, 5, 14), "Oslo"),
            person("Bjorn", "Dahl", date(1985, 1, 2), "Bergen"),
            person("Cecilie", "Eik", date(1977, 11, 30), "Oslo"),
            person("Dag", "Berg", date(1990, 5, 14), "Tromso"),
            person("Eva", "Fjell", date(2001, 7, 4), "Bergen"),
        ]
    }

    fn fill<S : RecordStore>(store : &mut S) -> Vec<RecordID> {
        people().iter().map(|args| store.create(args).unwrap()).collect()
    }

    fn first_name_ids<S : RecordStore>(store : &S, first_name : &str) -> Vec<RecordID> {
        store.find_by_first_name(first_name).unwrap().map(|record| record.unwrap().id).collect()
    }

    fn last_name_ids<S : RecordStore>(store : &S, last_name : &str) -> Vec<RecordID> {
        store.find_by_last_name(last_name).unwrap().map(|record| record.unwrap().id).collect()
    }

    fn open_store(dir : &TempDir) -> FileStore<DefaultValidationConfig> {
        FileStore::open(dir.path().join("cabinet.db"), DefaultValidationConfig()).unwrap()
    }

    /// Checks the parts of the store contract that both backends share
    fn check_contract<S : RecordStore>(store : &mut S) {

        //Ids are assigned in increasing order
        let ids = fill(store);
        assert_eq!(ids, vec![RecordID(1), RecordID(2), RecordID(3), RecordID(4), RecordID(5)]);
        assert_eq!(store.stat().live, 5);

        //An explicit id is honored, but only once
        let explicit = store.create(&person("Frida", "Lund", date(1999, 3, 3), "Oslo").with_id(RecordID(40))).unwrap();
        assert_eq!(explicit, RecordID(40));
        assert!(matches!(store.create(&person("Frida", "Lund", date(1999, 3, 3), "Oslo").with_id(RecordID(40))), Err(StoreError::DuplicateId(RecordID(40)))));
        assert_eq!(store.create(&person("Gro", "Moe", date(1960, 8, 8), "Bodo")).unwrap(), RecordID(41));
        assert_eq!(store.stat().live, 7);

        //Secondary lookups ignore case
        assert_eq!(last_name_ids(store, "berg"), vec![RecordID(1), RecordID(4)]);
        assert_eq!(first_name_ids(store, "CECILIE"), vec![RecordID(3)]);
        let same_birthday : Vec<RecordID> = store.find_by_date_of_birth(date(1990, 5, 14)).unwrap().map(|record| record.unwrap().id).collect();
        assert_eq!(same_birthday, vec![RecordID(1), RecordID(4)]);

        //An edit is visible through get_records, and moves the record between lookup keys
        let mut args = person("Anna", "Vik", date(1991, 6, 15), "Oslo").with_id(RecordID(1));
        store.edit(&args).unwrap();
        let records = store.get_records(None).unwrap();
        let edited = records.iter().find(|record| record.id == RecordID(1)).unwrap();
        assert_eq!(edited.first_name, "Anna");
        assert_eq!(edited.last_name, "Vik");
        assert!(first_name_ids(store, "Ann").is_empty());
        assert_eq!(first_name_ids(store, "anna"), vec![RecordID(1)]);
        assert_eq!(last_name_ids(store, "Berg"), vec![RecordID(4)]);
        assert_eq!(last_name_ids(store, "Vik"), vec![RecordID(1)]);

        //An invalid edit changes nothing
        args.zip_code = 0;
        assert!(matches!(store.edit(&args), Err(StoreError::Validation(ValidationError::Range{ field : "zip code", .. }))));
        let records = store.get_records(None).unwrap();
        assert_eq!(records.iter().find(|record| record.id == RecordID(1)).unwrap().zip_code, 1234);

        //An invalid create changes nothing either
        let mut bad = person("Hans", "Nes", date(1970, 1, 1), "Oslo");
        bad.gender = 'Q';
        assert!(matches!(store.create(&bad), Err(StoreError::Validation(_))));
        bad.gender = 'M';
        bad.first_name = "   ".to_string();
        assert!(matches!(store.create(&bad), Err(StoreError::Validation(ValidationError::Blank{ .. }))));
        assert_eq!(store.stat().live, 7);

        //Editing or removing something absent fails
        assert!(matches!(store.edit(&person("Ida", "Ost", date(1980, 2, 2), "Oslo").with_id(RecordID(99))), Err(StoreError::NotFound(RecordID(99)))));
        store.remove(RecordID(2)).unwrap();
        assert!(matches!(store.remove(RecordID(2)), Err(StoreError::NotFound(RecordID(2)))));
        assert!(matches!(store.edit(&person("Bjorn", "Dahl", date(1985, 1, 2), "Bergen").with_id(RecordID(2))), Err(StoreError::NotFound(RecordID(2)))));
        assert!(first_name_ids(store, "Bjorn").is_empty());
        assert_eq!(store.stat().live, 6);

        //Filters
        let filter = Filter::parse::<DefaultValidationConfig>("lastname = 'berg' or city = 'bergen'").unwrap();
        let ids : Vec<RecordID> = store.get_records(Some(&filter)).unwrap().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![RecordID(4), RecordID(5)]);
    }

    #[test]
    fn memory_store_test() {

        let mut store = MemoryStore::new(DefaultValidationConfig());
        check_contract(&mut store);

        //No tombstones are ever kept
        assert_eq!(store.stat(), Stat{ live : 6, deleted : 0 });
        assert_eq!(store.purge().unwrap(), None);
    }

    #[test]
    fn memory_store_cache_test() {

        let mut store = MemoryStore::new(DefaultValidationConfig());
        fill(&mut store);

        //Filters that differ only in whitespace share a cache entry
        let filter = Filter::parse::<DefaultValidationConfig>("city = 'Oslo'").unwrap();
        let respaced = Filter::parse::<DefaultValidationConfig>("  city='Oslo'  ").unwrap();
        let first = store.get_records(Some(&filter)).unwrap();
        assert_eq!(store.cached_query_count(), 1);
        assert_eq!(store.get_records(Some(&respaced)).unwrap(), first);
        assert_eq!(store.cached_query_count(), 1);

        //Literals that differ in their inner whitespace don't
        let other = Filter::parse::<DefaultValidationConfig>("street = 'Main Street 7'").unwrap();
        let squashed = Filter::parse::<DefaultValidationConfig>("street = 'MainStreet 7'").unwrap();
        assert_eq!(store.get_records(Some(&other)).unwrap().len(), 5);
        assert_eq!(store.get_records(Some(&squashed)).unwrap().len(), 0);
        assert_eq!(store.cached_query_count(), 3);

        //Any change clears the cache, so the next query sees it
        store.create(&person("Oda", "Rud", date(1995, 9, 9), "Oslo")).unwrap();
        assert_eq!(store.cached_query_count(), 0);
        assert_eq!(store.get_records(Some(&filter)).unwrap().len(), first.len() + 1);

        //A failed change leaves it alone
        assert!(store.remove(RecordID(77)).is_err());
        assert_eq!(store.cached_query_count(), 1);

        //So does a restore that applies nothing
        let mut broken = first[0].clone();
        broken.zip_code = 0;
        let snapshot = store.make_snapshot(vec![broken]);
        assert_eq!(store.restore(&snapshot).unwrap(), 0);
        assert_eq!(store.cached_query_count(), 1);

        //While a restore that applies a record clears it
        let mut moved = first[0].clone();
        moved.city = "Tromso".to_string();
        let snapshot = store.make_snapshot(vec![moved]);
        assert_eq!(store.restore(&snapshot).unwrap(), 1);
        assert_eq!(store.cached_query_count(), 0);
        assert_eq!(store.get_records(Some(&filter)).unwrap().len(), first.len());

        #[cfg(feature = "perf_counters")]
        {
            store.reset_perf_counters();
            store.get_records(Some(&filter)).unwrap();
            store.get_records(Some(&filter)).unwrap();
            assert_eq!(store.get_perf_counters().cache_hit_count, 2);
            assert_eq!(store.get_perf_counters().cache_miss_count, 0);
        }
    }

    #[test]
    fn file_store_test() {

        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        check_contract(&mut store);

        //The removal left a tombstone behind
        assert_eq!(store.stat(), Stat{ live : 6, deleted : 1 });
        assert_eq!(store.slot_count(), 7);
        assert_eq!(fs::metadata(store.path()).unwrap().len(), (7 * SLOT_SIZE) as u64);
    }

    #[test]
    fn file_store_reset_test() {

        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        fill(&mut store);
        store.remove(RecordID(2)).unwrap();

        store.reset().unwrap();
        assert_eq!(store.stat(), Stat{ live : 0, deleted : 0 });
        assert_eq!(store.slot_count(), 0);
        assert_eq!(fs::metadata(store.path()).unwrap().len(), 0);
        assert!(first_name_ids(&store, "Ann").is_empty());

        //Ids start over, and the new record lands in the first slot
        assert_eq!(store.create(&person("Ann", "Berg", date(1990, 5, 14), "Oslo")).unwrap(), RecordID(1));
        assert_eq!(fs::metadata(store.path()).unwrap().len(), SLOT_SIZE as u64);
        drop(store);

        //The truncated file reopens with just that record
        let store = open_store(&dir);
        assert_eq!(store.stat(), Stat{ live : 1, deleted : 0 });
        assert_eq!(first_name_ids(&store, "Ann"), vec![RecordID(1)]);
    }

    #[test]
    fn file_store_reopen_test() {

        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        fill(&mut store);
        store.remove(RecordID(5)).unwrap();
        store.remove(RecordID(2)).unwrap();
        store.edit(&person("Cecilie", "Hauge", date(1977, 11, 30), "Oslo").with_id(RecordID(3))).unwrap();

        let records = store.get_records(None).unwrap();
        let stat = store.stat();
        let key_counts = store.secondary_key_counts();
        drop(store);

        //Reopening rebuilds the same indexes, counts and watermark
        let mut store = open_store(&dir);
        assert_eq!(store.get_records(None).unwrap(), records);
        assert_eq!(store.stat(), stat);
        assert_eq!(store.stat(), Stat{ live : 3, deleted : 2 });
        assert_eq!(store.secondary_key_counts(), key_counts);
        assert_eq!(last_name_ids(&store, "hauge"), vec![RecordID(3)]);
        assert!(last_name_ids(&store, "eik").is_empty());
        assert_eq!(store.create(&person("Oda", "Rud", date(1995, 9, 9), "Oslo")).unwrap(), RecordID(5));
    }

    #[test]
    fn file_store_purge_test() {

        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        fill(&mut store);

        //Nothing to purge yet
        assert_eq!(store.purge().unwrap(), None);

        store.remove(RecordID(3)).unwrap();
        assert_eq!(store.stat(), Stat{ live : 4, deleted : 1 });

        assert_eq!(store.purge().unwrap(), Some(PurgeReport{ purged : 1, total : 5 }));
        assert_eq!(store.stat(), Stat{ live : 4, deleted : 0 });
        assert_eq!(store.purge().unwrap(), None);
        assert_eq!(fs::metadata(store.path()).unwrap().len(), (4 * SLOT_SIZE) as u64);

        //The removed record is gone for good, and the others are intact
        assert!(first_name_ids(&store, "Cecilie").is_empty());
        let ids : Vec<RecordID> = store.get_records(None).unwrap().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![RecordID(1), RecordID(2), RecordID(4), RecordID(5)]);
        assert_eq!(first_name_ids(&store, "eva"), vec![RecordID(5)]);

        //Several removals at once, and the purge survives a reopen
        store.remove(RecordID(1)).unwrap();
        store.remove(RecordID(4)).unwrap();
        assert_eq!(store.purge().unwrap(), Some(PurgeReport{ purged : 2, total : 4 }));
        drop(store);
        let store = open_store(&dir);
        assert_eq!(store.stat(), Stat{ live : 2, deleted : 0 });
        assert_eq!(last_name_ids(&store, "Berg"), vec![]);
    }

    #[test]
    fn corrupt_file_test() {

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cabinet.db");
        fs::write(&path, vec![0u8; SLOT_SIZE + 10]).unwrap();
        assert!(matches!(FileStore::open(&path, DefaultValidationConfig()), Err(StoreError::CorruptFile{ .. })));

        //A slot whose strings aren't valid UTF-8 is caught at open
        let mut slot = vec![0u8; SLOT_SIZE];
        slot[6] = 4;
        slot[8..12].copy_from_slice(&[0xFF, 0xFE, 0xFD, 0xFC]);
        fs::write(&path, slot).unwrap();
        assert!(matches!(FileStore::open(&path, DefaultValidationConfig()), Err(StoreError::CorruptSlot{ offset : 0, .. })));
    }

    #[test]
    fn restore_test() {

        let dir = TempDir::new().unwrap();
        let mut file_store = open_store(&dir);
        let mut memory_store = MemoryStore::new(DefaultValidationConfig());
        fill(&mut file_store);
        file_store.remove(RecordID(2)).unwrap();

        //Restoring a store's own snapshot changes nothing
        let records = file_store.get_records(None).unwrap();
        let snapshot = file_store.make_snapshot(records.clone());
        let key_counts = file_store.secondary_key_counts();
        assert_eq!(file_store.restore(&snapshot).unwrap(), 4);
        assert_eq!(file_store.get_records(None).unwrap(), records);
        assert_eq!(file_store.stat(), Stat{ live : 4, deleted : 1 });
        assert_eq!(file_store.slot_count(), 5);
        assert_eq!(file_store.secondary_key_counts(), key_counts);

        //The same snapshot populates a different backend, ids included
        assert_eq!(memory_store.restore(&snapshot).unwrap(), 4);
        assert_eq!(memory_store.get_records(None).unwrap(), records);
        assert_eq!(memory_store.restore(&snapshot).unwrap(), 4);
        assert_eq!(memory_store.get_records(None).unwrap(), records);

        //Restored ids push the watermark forward
        assert_eq!(memory_store.create(&person("Oda", "Rud", date(1995, 9, 9), "Oslo")).unwrap(), RecordID(6));

        //An updated record overwrites, an unseen one is created, and an invalid one is skipped
        let mut changed = records[0].clone();
        changed.city = "Hamar".to_string();
        let mut unseen = records[1].clone();
        unseen.id = RecordID(2);
        let mut invalid = records[2].clone();
        invalid.id = RecordID(-7);
        let snapshot = Snapshot::new(vec![changed.clone(), unseen.clone(), invalid]);
        assert_eq!(file_store.restore(&snapshot).unwrap(), 2);
        assert_eq!(file_store.stat(), Stat{ live : 5, deleted : 1 });
        let restored = file_store.get_records(None).unwrap();
        assert_eq!(restored[0], changed);
        assert_eq!(restored[1], unseen);
    }

    #[test]
    /// Snapshots come from an outside codec.  Here, CSV rows are deserialized straight into records
    fn csv_snapshot_test() {

        let csv_text = "\
id,first_name,last_name,date_of_birth,zip_code,city,street,salary,gender
12,Ingrid,Aas,1988-02-29,4010,Stavanger,Kirkegata 3,61000.00,F
7,Lars,Bakke,1969-10-01,7011,Trondheim,Olav Tryggvasons gate 12,58500.25,M
9,Nils,Holm,1972-04-18,9008,Tromso,Storgata 80,49999.99,Q
";
        let mut csv_parser = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());
        let snapshot : Snapshot = csv_parser.deserialize::<Record>().map(|result| result.unwrap()).collect();
        assert_eq!(snapshot.len(), 3);

        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        //The row with an unknown gender is skipped
        assert_eq!(store.restore(&snapshot).unwrap(), 2);
        let records = store.get_records(None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordID(7));
        assert_eq!(records[0].street, "Olav Tryggvasons gate 12");
        assert_eq!(records[1].salary, Decimal::from_str("61000.00").unwrap());
        assert_eq!(records[1].date_of_birth, date(1988, 2, 29));

        //New ids continue after the largest imported one
        assert_eq!(store.create(&person("Oda", "Rud", date(1995, 9, 9), "Oslo")).unwrap(), RecordID(13));
    }

    #[cfg(feature = "bitcode")]
    #[test]
    fn snapshot_coder_test() {

        let mut store = MemoryStore::new(DefaultValidationConfig());
        fill(&mut store);
        let records = store.get_records(None).unwrap();
        let snapshot = store.make_snapshot(records);

        let coder = BitcodeCoder::new();
        let bytes = snapshot.encode(&coder).unwrap();
        let decoded = Snapshot::decode(&coder, &bytes).unwrap();
        assert_eq!(decoded, snapshot);

        assert!(matches!(Snapshot::decode(&coder, &bytes[..bytes.len() / 2]), Err(StoreError::Codec(_))));
    }

    #[test]
    fn filter_test() {

        let mut store = MemoryStore::new(DefaultValidationConfig());
        let mut ann = person("ann", "Berg", date(1990, 5, 14), "OSLO");
        store.create(&ann).unwrap();
        ann.city = "Bergen".to_string();
        store.create(&ann).unwrap();

        let filter = Filter::parse::<DefaultValidationConfig>("firstname = 'Ann' and city = 'Oslo'").unwrap();
        let found = store.get_records(Some(&filter)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, RecordID(1));

        //The same filter over the file store, where the first name index narrows the candidates
        let dir = TempDir::new().unwrap();
        let mut file_store = open_store(&dir);
        let records = store.get_records(None).unwrap();
        file_store.restore(&store.make_snapshot(records)).unwrap();
        fill(&mut file_store);
        let ids : Vec<RecordID> = file_store.get_records(Some(&filter)).unwrap().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![RecordID(1), RecordID(3)]);

        //The id index
        let by_id = Filter::parse::<DefaultValidationConfig>("id = '4' or id = '6'").unwrap();
        let ids : Vec<RecordID> = file_store.get_records(Some(&by_id)).unwrap().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![RecordID(4), RecordID(6)]);

        //No match at all
        let nobody = Filter::parse::<DefaultValidationConfig>("lastname = 'Nobody'").unwrap();
        assert!(file_store.get_records(Some(&nobody)).unwrap().is_empty());

        //Invalid filters are rejected whole
        assert_eq!(Filter::parse::<DefaultValidationConfig>("city = 'Oslo' and zipcode = '0'").unwrap_err(),
            FilterError::Validation(ValidationError::Range{ field : "zip code", value : "0".to_string(), min : "1".to_string(), max : "65535".to_string() }));

        //The first combinator joins every clause
        let mixed = Filter::parse::<DefaultValidationConfig>("city = 'Bergen' or firstname = 'Dag' and lastname = 'Fjell'").unwrap();
        assert_eq!(mixed.combinator(), Combinator::Or);
        let ids : Vec<RecordID> = file_store.get_records(Some(&mixed)).unwrap().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![RecordID(2), RecordID(4), RecordID(6), RecordID(7)]);
    }

    #[test]
    fn query_test() {

        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        fill(&mut store);

        //Select projects the chosen properties
        let selection = Selection::parse("id, lastname").unwrap();
        let oslo = Filter::parse::<DefaultValidationConfig>("city = 'oslo'").unwrap();
        let rows = select(&mut store, &selection, Some(&oslo)).unwrap();
        assert_eq!(rows, vec![
            vec![FieldValue::Id(RecordID(1)), FieldValue::LastName("Berg".to_string())],
            vec![FieldValue::Id(RecordID(3)), FieldValue::LastName("Eik".to_string())],
        ]);
        assert_eq!(select(&mut store, &Selection::all(), None).unwrap().len(), 5);

        //Update rewrites every match
        let setters = Setters::parse::<DefaultValidationConfig>("city = 'Drammen', zipcode = '3015'").unwrap();
        assert_eq!(update::<DefaultValidationConfig, _>(&mut store, &setters, &oslo).unwrap(), vec![RecordID(1), RecordID(3)]);
        assert!(store.get_records(Some(&oslo)).unwrap().is_empty());
        let drammen = Filter::parse::<DefaultValidationConfig>("city = 'Drammen' and zipcode = '3015'").unwrap();
        assert_eq!(store.get_records(Some(&drammen)).unwrap().len(), 2);

        //An update that breaks a narrower policy changes nothing at all
        let bergen = Filter::parse::<DefaultValidationConfig>("city = 'Bergen'").unwrap();
        let setters = Setters::parse::<DefaultValidationConfig>("zipcode = '80'").unwrap();
        assert!(matches!(update::<CustomValidationConfig, _>(&mut store, &setters, &bergen), Err(StoreError::Validation(_))));
        assert!(store.get_records(Some(&bergen)).unwrap().iter().all(|record| record.zip_code == 1234));

        //Delete removes every match
        let berg = Filter::parse::<DefaultValidationConfig>("lastname = 'Berg'").unwrap();
        assert_eq!(delete(&mut store, &berg).unwrap(), vec![RecordID(1), RecordID(4)]);
        assert_eq!(store.stat(), Stat{ live : 3, deleted : 2 });
        assert!(delete(&mut store, &berg).unwrap().is_empty());
    }

    #[test]
    fn custom_config_test() {

        let mut store = MemoryStore::new(CustomValidationConfig());

        //Two-letter names are too short here
        let mut args = person("Bo", "Lie", date(1920, 1, 1), "Oslo");
        args.zip_code = 10500;
        assert!(matches!(store.create(&args), Err(StoreError::Validation(ValidationError::Length{ field : "first name", .. }))));

        //But 1920 is within range, as is gender 'X'
        args.first_name = "Bodil".to_string();
        args.gender = 'X';
        assert_eq!(store.create(&args).unwrap(), RecordID(1));

        //The default config would have refused both
        let mut default_store = MemoryStore::new(DefaultValidationConfig());
        assert!(default_store.create(&args).is_err());
    }

    #[test]
    fn decorators_test() {

        let dir = TempDir::new().unwrap();
        let mut store = TimedStore::new(LoggedStore::new(open_store(&dir)));
        fill(&mut store);
        store.remove(RecordID(2)).unwrap();
        assert!(store.remove(RecordID(2)).is_err());
        assert_eq!(first_name_ids(&store, "ann"), vec![RecordID(1)]);

        let timings = store.timings();
        assert_eq!(timings.get("create").calls, 5);
        assert_eq!(timings.get("remove").calls, 2);
        assert_eq!(timings.get("find_by_first_name").calls, 1);
        assert_eq!(timings.get("purge").calls, 0);
        assert_eq!(timings.iter().count(), 3);

        //Decorated stores are still stores
        assert_eq!(store.purge().unwrap(), Some(PurgeReport{ purged : 1, total : 5 }));
        assert_eq!(store.inner().inner().stat(), Stat{ live : 4, deleted : 0 });

        store.reset_timings();
        assert_eq!(store.timings().get("create").calls, 0);

        //And so are boxed ones
        let mut boxed : Box<dyn RecordStore> = Box::new(store.into_inner());
        assert_eq!(boxed.get_records(None).unwrap().len(), 4);
    }

    #[test]
    /// This tests the perf-counters
    fn perf_counters_test() {

        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        fill(&mut store);

        #[cfg(feature = "perf_counters")]
        {
            //A filter on an indexed property only reads the slots in the matching bucket
            let filter = Filter::parse::<DefaultValidationConfig>("lastname = 'Berg' and city = 'Tromso'").unwrap();
            store.reset_perf_counters();
            assert_eq!(store.get_records(Some(&filter)).unwrap().len(), 1);
            assert_eq!(store.get_perf_counters().slot_read_count, 2);
            assert_eq!(store.get_perf_counters().index_lookup_count, 1);

            //A filter on an unindexed property reads every slot
            let filter = Filter::parse::<DefaultValidationConfig>("city = 'Tromso'").unwrap();
            store.reset_perf_counters();
            assert_eq!(store.get_records(Some(&filter)).unwrap().len(), 1);
            assert_eq!(store.get_perf_counters().slot_read_count, 5);

            //Reopening reads one header per slot
            drop(store);
            let store = open_store(&dir);
            assert_eq!(store.get_perf_counters().slot_read_count, 5);
            assert_eq!(store.get_perf_counters().slot_write_count, 0);
        }

        #[cfg(not(feature = "perf_counters"))]
        {
            store.get_records(None).unwrap();
            assert_eq!(store.get_perf_counters(), PerfCounterFields::default());
            println!("perf_counters feature not enabled");
        }
    }
}
