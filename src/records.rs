//!
//! The Records module contains the record model.  [RecordID], [Record] and [RecordArgs] are
//! re-exported to the public interface.
//!

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};

use crate::property::FieldValue;

/// A unique identifier for a record within a store
///
/// Live ids are always positive.  [RecordID::NULL] is never assigned to a record; when it is passed
/// inside [RecordArgs] to [create](crate::RecordStore::create) it asks the store to assign the next id.
#[derive(Copy, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, derive_more::Display, Serialize, Deserialize)]
pub struct RecordID(pub i32);
impl RecordID {
    pub const NULL : RecordID = RecordID(0);
}

impl RecordID {
    pub fn from(id : i32) -> Self {
        RecordID(id)
    }
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
    pub fn from_le_bytes(bytes : [u8; 4]) -> Self {
        RecordID(i32::from_le_bytes(bytes))
    }
}

/// A single record, as it is held by a store and exchanged through a [Snapshot](crate::Snapshot)
///
/// The field order is the canonical order used by the binary slot layout and by the import/export
/// codecs: id, first name, last name, date of birth, zip code, city, street, salary, gender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id : RecordID,
    pub first_name : String,
    pub last_name : String,
    pub date_of_birth : NaiveDate,
    pub zip_code : u16,
    pub city : String,
    pub street : String,
    #[serde(with = "rust_decimal::serde::str")]
    pub salary : Decimal,
    pub gender : char,
}

/// A transient write request used by [create](crate::RecordStore::create) and [edit](crate::RecordStore::edit)
///
/// Carries the same fields as a [Record].  An `id` of [RecordID::NULL] means "auto-assign" when
/// creating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordArgs {
    pub id : RecordID,
    pub first_name : String,
    pub last_name : String,
    pub date_of_birth : NaiveDate,
    pub zip_code : u16,
    pub city : String,
    pub street : String,
    pub salary : Decimal,
    pub gender : char,
}

impl RecordArgs {

    /// Returns a copy of the arguments addressed at a different id
    pub fn with_id(mut self, id : RecordID) -> Self {
        self.id = id;
        self
    }

    /// Overwrites the field named by the value's property
    ///
    /// NOTE: the id is deliberately writable here; [Setters](crate::Setters) rejects id assignments
    /// before they ever reach this point
    pub fn apply(&mut self, value : &FieldValue) {
        match value {
            FieldValue::Id(id) => self.id = *id,
            FieldValue::FirstName(name) => self.first_name = name.clone(),
            FieldValue::LastName(name) => self.last_name = name.clone(),
            FieldValue::DateOfBirth(date) => self.date_of_birth = *date,
            FieldValue::ZipCode(zip) => self.zip_code = *zip,
            FieldValue::City(city) => self.city = city.clone(),
            FieldValue::Street(street) => self.street = street.clone(),
            FieldValue::Salary(salary) => self.salary = *salary,
            FieldValue::Gender(gender) => self.gender = *gender,
        }
    }

    /// Builds the record these arguments describe, stamped with the supplied id
    pub fn to_record(&self, id : RecordID) -> Record {
        Record {
            id,
            first_name : self.first_name.clone(),
            last_name : self.last_name.clone(),
            date_of_birth : self.date_of_birth,
            zip_code : self.zip_code,
            city : self.city.clone(),
            street : self.street.clone(),
            salary : self.salary,
            gender : self.gender,
        }
    }
}

impl From<&Record> for RecordArgs {
    fn from(record : &Record) -> Self {
        Self {
            id : record.id,
            first_name : record.first_name.clone(),
            last_name : record.last_name.clone(),
            date_of_birth : record.date_of_birth,
            zip_code : record.zip_code,
            city : record.city.clone(),
            street : record.street.clone(),
            salary : record.salary,
            gender : record.gender,
        }
    }
}

impl From<Record> for RecordArgs {
    fn from(record : Record) -> Self {
        Self {
            id : record.id,
            first_name : record.first_name,
            last_name : record.last_name,
            date_of_birth : record.date_of_birth,
            zip_code : record.zip_code,
            city : record.city,
            street : record.street,
            salary : record.salary,
            gender : record.gender,
        }
    }
}
