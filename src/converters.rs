//!
//! The Converters module turns user-supplied text into typed field values.  Interactive input,
//! filter literals and setter literals all go through these functions, so they all accept exactly
//! the same spellings.
//!

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::records::RecordID;

/// The date formats accepted for a date of birth, tried in order
pub const DATE_FORMATS : &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];

fn malformed(field : &'static str, value : &str) -> ValidationError {
    ValidationError::Malformed{ field, value : value.to_string() }
}

/// Converts a string field.  Surrounding whitespace is trimmed; the contents are otherwise kept,
/// except that control characters inside the text are rejected
pub fn convert_text(field : &'static str, literal : &str) -> Result<String, ValidationError> {
    let trimmed = literal.trim();
    if trimmed.chars().any(char::is_control) {
        return Err(malformed(field, literal));
    }
    Ok(trimmed.to_string())
}

pub fn convert_id(literal : &str) -> Result<RecordID, ValidationError> {
    let id = i32::from_str(literal.trim()).map_err(|_| malformed("id", literal))?;
    if id <= 0 {
        return Err(ValidationError::Range {
            field : "id",
            value : id.to_string(),
            min : "1".to_string(),
            max : i32::MAX.to_string(),
        });
    }
    Ok(RecordID(id))
}

pub fn convert_date_of_birth(literal : &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = literal.trim();
    DATE_FORMATS.iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| malformed("date of birth", literal))
}

pub fn convert_zip_code(literal : &str) -> Result<u16, ValidationError> {
    u16::from_str(literal.trim()).map_err(|_| malformed("zip code", literal))
}

pub fn convert_salary(literal : &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(literal.trim()).map_err(|_| malformed("salary", literal))
}

/// Converts a gender.  Exactly one non-whitespace character is accepted, and it's upper-cased
pub fn convert_gender(literal : &str) -> Result<char, ValidationError> {
    let mut chars = literal.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(the_char), None) => {
            let mut upper = the_char.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(upper_char), None) => Ok(upper_char),
                _ => Ok(the_char),
            }
        },
        _ => Err(malformed("gender", literal)),
    }
}
