//!
//! The Snapshot module contains the [Snapshot] object, the unit of bulk interchange between a
//! store and the import/export codecs.
//!

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::encode_decode::Coder;
use crate::error::StoreError;
use crate::records::Record;

/// An immutable, ordered batch of records
///
/// A snapshot is made from a store with [make_snapshot](crate::RecordStore::make_snapshot) and
/// handed to an export codec, or built by an import codec from the records it decoded and handed to
/// [restore](crate::RecordStore::restore).  It has no identity beyond the records it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    records : Vec<Record>,
}

impl Snapshot {

    pub fn new(records : Vec<Record>) -> Self {
        Self{ records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item=&Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Serializes the snapshot with a binary [Coder]
    pub fn encode<C : Coder>(&self, coder : &C) -> Result<Vec<u8>, StoreError> {
        let bytes = coder.encode_to_buf(self).map_err(StoreError::Codec)?;
        debug!("encoded {} records as {} bytes of {}", self.records.len(), bytes.len(), coder.format_name());
        Ok(bytes)
    }

    /// Reconstructs a snapshot serialized by [encode](Self::encode) with the same kind of coder
    pub fn decode<C : Coder>(coder : &C, bytes : &[u8]) -> Result<Self, StoreError> {
        let snapshot : Self = coder.decode_from_bytes(bytes).map_err(StoreError::Codec)?;
        debug!("decoded {} records from {} bytes of {}", snapshot.records.len(), bytes.len(), coder.format_name());
        Ok(snapshot)
    }
}

impl FromIterator<Record> for Snapshot {
    fn from_iter<I : IntoIterator<Item=Record>>(iter : I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl <'a>IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
