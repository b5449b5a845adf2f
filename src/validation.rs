//!
//! The Validation module contains the parameters that bound every field of a record.  The
//! [ValidationConfig] trait and its two stock implementations are re-exported.
//!

use core::cmp::min;
use core::fmt::Display;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::records::{Record, RecordArgs};
use crate::unicode_string_helpers::unicode_len;

/// The maximum number of characters any string field may hold, regardless of the active
/// [ValidationConfig].  This determines the width of the string sub-slots in the binary file
/// layout, so raising it would make existing files unreadable.
pub const MAX_STRING_LENGTH : usize = 60;

/// The ValidationConfig trait specifies the permitted range of every record field
///
/// Every mutating store operation validates its arguments against the store's config before touching
/// any state.  The same bounds apply to literals in filters and setters, so a filter can never
/// look for a value the store would refuse to hold.
///
/// ## An example creating a store with a custom ValidationConfig
/// ```
/// use record_cabinet::{*};
///
/// struct Config();
/// impl ValidationConfig for Config {
///     const NAME : &'static str = "strict";
///     const MIN_NAME_LENGTH : usize = 3;
///     const MAX_NAME_LENGTH : usize = 20;
///     const PERMITTED_GENDERS : &'static [char] = &['F'];
/// }
/// let store = MemoryStore::new(Config());
/// assert_eq!(store.stat().live, 0);
/// ```
pub trait ValidationConfig {

    /// A short name for the config, used in log output
    const NAME : &'static str = "default";

    /// Bounds on the length, in characters, of the first and last names.  A maximum beyond
    /// [MAX_STRING_LENGTH] is capped.
    const MIN_NAME_LENGTH : usize = 2;
    const MAX_NAME_LENGTH : usize = MAX_STRING_LENGTH;

    /// Bounds on the length, in characters, of the city and street.  A maximum beyond
    /// [MAX_STRING_LENGTH] is capped.
    const MIN_ADDRESS_LENGTH : usize = 1;
    const MAX_ADDRESS_LENGTH : usize = MAX_STRING_LENGTH;

    /// The earliest permitted date of birth, as `(year, month, day)`
    const MIN_DATE_OF_BIRTH : (i32, u32, u32) = (1950, 1, 1);

    /// The latest permitted date of birth, as `(year, month, day)`.  `None` means "today".
    const MAX_DATE_OF_BIRTH : Option<(i32, u32, u32)> = None;

    const MIN_ZIP_CODE : u16 = 1;
    const MAX_ZIP_CODE : u16 = u16::MAX;

    /// Bounds on the salary, in whole currency units
    const MIN_SALARY : i64 = 0;
    const MAX_SALARY : i64 = 1_000_000;

    /// The characters a gender may hold.  Converters upper-case input before it is checked, so
    /// the entries here should be upper-case.
    const PERMITTED_GENDERS : &'static [char] = &['M', 'F'];

    fn validate_first_name(first_name : &str) -> Result<(), ValidationError> {
        check_text("first name", first_name, Self::MIN_NAME_LENGTH, Self::MAX_NAME_LENGTH)
    }

    fn validate_last_name(last_name : &str) -> Result<(), ValidationError> {
        check_text("last name", last_name, Self::MIN_NAME_LENGTH, Self::MAX_NAME_LENGTH)
    }

    fn validate_city(city : &str) -> Result<(), ValidationError> {
        check_text("city", city, Self::MIN_ADDRESS_LENGTH, Self::MAX_ADDRESS_LENGTH)
    }

    fn validate_street(street : &str) -> Result<(), ValidationError> {
        check_text("street", street, Self::MIN_ADDRESS_LENGTH, Self::MAX_ADDRESS_LENGTH)
    }

    fn validate_date_of_birth(date_of_birth : NaiveDate) -> Result<(), ValidationError> {
        let (min_date, max_date) = Self::date_of_birth_bounds();
        check_range("date of birth", date_of_birth, min_date, max_date)
    }

    fn validate_zip_code(zip_code : u16) -> Result<(), ValidationError> {
        check_range("zip code", zip_code, Self::MIN_ZIP_CODE, Self::MAX_ZIP_CODE)
    }

    fn validate_salary(salary : Decimal) -> Result<(), ValidationError> {
        check_range("salary", salary, Decimal::from(Self::MIN_SALARY), Decimal::from(Self::MAX_SALARY))
    }

    fn validate_gender(gender : char) -> Result<(), ValidationError> {
        if Self::PERMITTED_GENDERS.contains(&gender) {
            Ok(())
        } else {
            Err(ValidationError::NotPermitted {
                field : "gender",
                value : gender,
                permitted : Self::PERMITTED_GENDERS,
            })
        }
    }

    /// Validates every field of a write request.  The id is not checked here, because its
    /// meaning depends on the operation.
    fn validate(args : &RecordArgs) -> Result<(), ValidationError> {
        Self::validate_first_name(&args.first_name)?;
        Self::validate_last_name(&args.last_name)?;
        Self::validate_date_of_birth(args.date_of_birth)?;
        Self::validate_zip_code(args.zip_code)?;
        Self::validate_city(&args.city)?;
        Self::validate_street(&args.street)?;
        Self::validate_salary(args.salary)?;
        Self::validate_gender(args.gender)
    }

    /// Validates a complete record, as received through a [Snapshot](crate::Snapshot), including
    /// the requirement that its id is positive
    fn validate_record(record : &Record) -> Result<(), ValidationError> {
        if record.id.0 <= 0 {
            return Err(ValidationError::Range {
                field : "id",
                value : record.id.to_string(),
                min : "1".to_string(),
                max : i32::MAX.to_string(),
            });
        }
        Self::validate(&RecordArgs::from(record))
    }

    /// Returns the inclusive date-of-birth range, resolving "today" for an open upper bound
    fn date_of_birth_bounds() -> (NaiveDate, NaiveDate) {
        let (y, m, d) = Self::MIN_DATE_OF_BIRTH;
        let min_date = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
        let max_date = match Self::MAX_DATE_OF_BIRTH {
            Some((y, m, d)) => NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MAX),
            None => chrono::Utc::now().date_naive(),
        };
        (min_date, max_date)
    }
}

fn check_text(field : &'static str, value : &str, min_len : usize, max_len : usize) -> Result<(), ValidationError> {

    if value.trim().is_empty() {
        return Err(ValidationError::Blank{ field });
    }

    //Nothing longer than a string sub-slot can ever be stored
    let max_len = min(max_len, MAX_STRING_LENGTH);
    let len = unicode_len(value);
    if len < min_len || len > max_len {
        return Err(ValidationError::Length{ field, len, min : min_len, max : max_len });
    }
    Ok(())
}

fn check_range<T : PartialOrd + Display>(field : &'static str, value : T, min_value : T, max_value : T) -> Result<(), ValidationError> {
    if value < min_value || value > max_value {
        return Err(ValidationError::Range {
            field,
            value : value.to_string(),
            min : min_value.to_string(),
            max : max_value.to_string(),
        });
    }
    Ok(())
}

/// A struct that implements [ValidationConfig] with the default bounds
pub struct DefaultValidationConfig();

impl ValidationConfig for DefaultValidationConfig {}

/// A struct that implements [ValidationConfig] with the narrower "custom" bounds
pub struct CustomValidationConfig();

impl ValidationConfig for CustomValidationConfig {
    const NAME : &'static str = "custom";
    const MIN_NAME_LENGTH : usize = 3;
    const MAX_NAME_LENGTH : usize = 40;
    const MIN_ADDRESS_LENGTH : usize = 3;
    const MAX_ADDRESS_LENGTH : usize = 50;
    const MIN_DATE_OF_BIRTH : (i32, u32, u32) = (1900, 1, 1);
    const MIN_ZIP_CODE : u16 = 10000;
    const MAX_ZIP_CODE : u16 = 65000;
    const MIN_SALARY : i64 = 500;
    const MAX_SALARY : i64 = 250_000;
    const PERMITTED_GENDERS : &'static [char] = &['M', 'F', 'X'];
}
