//!
//! The Slot module contains the binary layout of a record in the backing file, and the functions
//! to pack and unpack it.  Nothing should be re-exported except the layout constants.
//!
//! Every record occupies one fixed-size slot.  All integers are little-endian.
//!
//! | Offset | Size | Field                                        |
//! |-------:|-----:|----------------------------------------------|
//! |      0 |    2 | status word (`u16` bitmask)                  |
//! |      2 |    4 | id (`i32`)                                   |
//! |      6 |  242 | first name (string sub-slot)                 |
//! |    248 |  242 | last name (string sub-slot)                  |
//! |    490 |   12 | date of birth: year, month, day (`i32` each) |
//! |    502 |    2 | zip code (`u16`)                             |
//! |    504 |  242 | city (string sub-slot)                       |
//! |    746 |  242 | street (string sub-slot)                     |
//! |    988 |   16 | salary (decimal, 16-byte binary form)        |
//! |   1004 |    2 | gender (`u16` UTF-16 code unit)              |
//!
//! A string sub-slot is a `u16` byte length followed by that many bytes of UTF-8, padded with
//! zeros to the sub-slot width.  The width fits [MAX_STRING_LENGTH] characters of any size.
//!

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::records::{Record, RecordID};
use crate::unicode_string_helpers::unicode_len;
use crate::validation::MAX_STRING_LENGTH;

/// The status bit marking a tombstoned slot
pub const STATUS_DELETED : u16 = 4;

/// The width of a string sub-slot: a length prefix, then room for the longest permitted string
/// at four UTF-8 bytes per char
pub const STRING_SLOT_SIZE : usize = 2 + 4 * MAX_STRING_LENGTH;

const STATUS_OFFSET : usize = 0;
const ID_OFFSET : usize = STATUS_OFFSET + 2;
const FIRST_NAME_OFFSET : usize = ID_OFFSET + 4;
const LAST_NAME_OFFSET : usize = FIRST_NAME_OFFSET + STRING_SLOT_SIZE;
const DATE_OF_BIRTH_OFFSET : usize = LAST_NAME_OFFSET + STRING_SLOT_SIZE;
const ZIP_CODE_OFFSET : usize = DATE_OF_BIRTH_OFFSET + 12;
const CITY_OFFSET : usize = ZIP_CODE_OFFSET + 2;
const STREET_OFFSET : usize = CITY_OFFSET + STRING_SLOT_SIZE;
const SALARY_OFFSET : usize = STREET_OFFSET + STRING_SLOT_SIZE;
const GENDER_OFFSET : usize = SALARY_OFFSET + 16;

/// The size in bytes of one record slot
pub const SLOT_SIZE : usize = GENDER_OFFSET + 2;

/// The size of the leading part of a slot that holds the indexed fields
pub const HEADER_SIZE : usize = ZIP_CODE_OFFSET;

/// The leading fields of a slot: everything the indexes need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotHeader {
    pub status : u16,
    pub id : RecordID,
    pub first_name : String,
    pub last_name : String,
    pub date_of_birth : NaiveDate,
}

impl SlotHeader {
    pub fn is_deleted(&self) -> bool {
        self.status & STATUS_DELETED != 0
    }
}

/// Packs a record into a slot-sized buffer
///
/// Fails if a value can't be represented in the layout, which a validated record never does.
pub fn encode_slot(status : u16, record : &Record) -> Result<Vec<u8>, ValidationError> {

    let mut buf = vec![0u8; SLOT_SIZE];

    buf[STATUS_OFFSET..ID_OFFSET].copy_from_slice(&status.to_le_bytes());
    buf[ID_OFFSET..FIRST_NAME_OFFSET].copy_from_slice(&record.id.to_le_bytes());
    put_string(&mut buf[FIRST_NAME_OFFSET..LAST_NAME_OFFSET], "first name", &record.first_name)?;
    put_string(&mut buf[LAST_NAME_OFFSET..DATE_OF_BIRTH_OFFSET], "last name", &record.last_name)?;

    let date = record.date_of_birth;
    buf[DATE_OF_BIRTH_OFFSET..DATE_OF_BIRTH_OFFSET+4].copy_from_slice(&date.year().to_le_bytes());
    buf[DATE_OF_BIRTH_OFFSET+4..DATE_OF_BIRTH_OFFSET+8].copy_from_slice(&(date.month() as i32).to_le_bytes());
    buf[DATE_OF_BIRTH_OFFSET+8..ZIP_CODE_OFFSET].copy_from_slice(&(date.day() as i32).to_le_bytes());

    buf[ZIP_CODE_OFFSET..CITY_OFFSET].copy_from_slice(&record.zip_code.to_le_bytes());
    put_string(&mut buf[CITY_OFFSET..STREET_OFFSET], "city", &record.city)?;
    put_string(&mut buf[STREET_OFFSET..SALARY_OFFSET], "street", &record.street)?;
    buf[SALARY_OFFSET..GENDER_OFFSET].copy_from_slice(&record.salary.serialize());

    //The gender must fit in a single UTF-16 code unit
    let mut units = [0u16; 2];
    let encoded = record.gender.encode_utf16(&mut units);
    if encoded.len() != 1 {
        return Err(ValidationError::Malformed{ field : "gender", value : record.gender.to_string() });
    }
    buf[GENDER_OFFSET..SLOT_SIZE].copy_from_slice(&units[0].to_le_bytes());

    Ok(buf)
}

/// Unpacks the leading fields of a slot.  `bytes` must hold at least [HEADER_SIZE] bytes
pub fn decode_header(bytes : &[u8]) -> Result<SlotHeader, String> {

    if bytes.len() < HEADER_SIZE {
        return Err(format!("slot header is {} bytes, expected {HEADER_SIZE}", bytes.len()));
    }

    Ok(SlotHeader {
        status : u16::from_le_bytes(fixed(&bytes[STATUS_OFFSET..ID_OFFSET])),
        id : RecordID::from_le_bytes(fixed(&bytes[ID_OFFSET..FIRST_NAME_OFFSET])),
        first_name : get_string(&bytes[FIRST_NAME_OFFSET..LAST_NAME_OFFSET], "first name")?,
        last_name : get_string(&bytes[LAST_NAME_OFFSET..DATE_OF_BIRTH_OFFSET], "last name")?,
        date_of_birth : get_date(&bytes[DATE_OF_BIRTH_OFFSET..ZIP_CODE_OFFSET])?,
    })
}

/// Unpacks a whole slot, returning its status word and the record it holds
pub fn decode_slot(bytes : &[u8]) -> Result<(u16, Record), String> {

    if bytes.len() < SLOT_SIZE {
        return Err(format!("slot is {} bytes, expected {SLOT_SIZE}", bytes.len()));
    }

    let header = decode_header(bytes)?;
    let gender_unit = u16::from_le_bytes(fixed(&bytes[GENDER_OFFSET..SLOT_SIZE]));
    let gender = char::from_u32(gender_unit as u32)
        .ok_or_else(|| format!("gender code unit {gender_unit:#06x} is not a char"))?;

    let record = Record {
        id : header.id,
        first_name : header.first_name,
        last_name : header.last_name,
        date_of_birth : header.date_of_birth,
        zip_code : u16::from_le_bytes(fixed(&bytes[ZIP_CODE_OFFSET..CITY_OFFSET])),
        city : get_string(&bytes[CITY_OFFSET..STREET_OFFSET], "city")?,
        street : get_string(&bytes[STREET_OFFSET..SALARY_OFFSET], "street")?,
        salary : Decimal::deserialize(fixed(&bytes[SALARY_OFFSET..GENDER_OFFSET])),
        gender,
    };

    Ok((header.status, record))
}

/// Returns the status word with the deleted bit set
pub fn mark_deleted(status : u16) -> u16 {
    status | STATUS_DELETED
}

fn fixed<const N : usize>(bytes : &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(&bytes[..N]);
    array
}

fn put_string(sub_slot : &mut [u8], field : &'static str, value : &str) -> Result<(), ValidationError> {
    let bytes = value.as_bytes();
    let len = unicode_len(value);
    if len > MAX_STRING_LENGTH || bytes.len() + 2 > sub_slot.len() {
        return Err(ValidationError::Length{ field, len, min : 0, max : MAX_STRING_LENGTH });
    }
    sub_slot[..2].copy_from_slice(&(bytes.len() as u16).to_le_bytes());
    sub_slot[2..2+bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn get_string(sub_slot : &[u8], field : &str) -> Result<String, String> {
    let len = u16::from_le_bytes(fixed(&sub_slot[..2])) as usize;
    if len + 2 > sub_slot.len() {
        return Err(format!("{field} length {len} overruns its sub-slot"));
    }
    String::from_utf8(sub_slot[2..2+len].to_vec()).map_err(|e| format!("{field} is not UTF-8: {e}"))
}

fn get_date(bytes : &[u8]) -> Result<NaiveDate, String> {
    let year = i32::from_le_bytes(fixed(&bytes[0..4]));
    let month = i32::from_le_bytes(fixed(&bytes[4..8]));
    let day = i32::from_le_bytes(fixed(&bytes[8..12]));
    if month < 1 || day < 1 {
        return Err(format!("invalid date {year}/{month}/{day}"));
    }
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| format!("invalid date {year}/{month}/{day}"))
}

/// Reads `len` bytes starting at `offset` from the file
pub fn read_at(mut file : &File, offset : u64, len : usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Writes the bytes at `offset` in the file
pub fn write_at(mut file : &File, offset : u64, bytes : &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(bytes)
}

/// Overwrites only the status word of the slot starting at `offset`
pub fn write_status(file : &File, offset : u64, status : u16) -> io::Result<()> {
    write_at(file, offset + STATUS_OFFSET as u64, &status.to_le_bytes())
}
