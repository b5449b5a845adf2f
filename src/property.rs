//!
//! The Property module contains the closed set of record properties, and the typed values tagged
//! by property.  Filters, selectors, setters and the index maintenance all dispatch on these
//! instead of inspecting records dynamically.  [Property] and [FieldValue] are re-exported.
//!

use core::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::converters::{*};
use crate::error::{FilterError, ValidationError};
use crate::records::{Record, RecordID};
use crate::unicode_string_helpers::{unicode_eq_ignore_case, unicode_char_eq_ignore_case};
use crate::validation::ValidationConfig;

/// One of the properties of a [Record]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Id,
    FirstName,
    LastName,
    DateOfBirth,
    ZipCode,
    City,
    Street,
    Salary,
    Gender,
}

impl Property {

    /// Every property, in the canonical record order
    pub const ALL : [Property; 9] = [
        Property::Id,
        Property::FirstName,
        Property::LastName,
        Property::DateOfBirth,
        Property::ZipCode,
        Property::City,
        Property::Street,
        Property::Salary,
        Property::Gender,
    ];

    /// The name used to refer to the property in filters, selectors and setters
    pub fn name(&self) -> &'static str {
        match self {
            Property::Id => "id",
            Property::FirstName => "firstname",
            Property::LastName => "lastname",
            Property::DateOfBirth => "dateofbirth",
            Property::ZipCode => "zipcode",
            Property::City => "city",
            Property::Street => "street",
            Property::Salary => "salary",
            Property::Gender => "gender",
        }
    }

    /// Looks up a property by name.  Matching ignores case and underscores, so `FirstName`,
    /// `firstname` and `first_name` are all accepted
    pub fn from_name(name : &str) -> Result<Self, FilterError> {
        let normalized : String = name.chars()
            .filter(|the_char| *the_char != '_')
            .flat_map(|the_char| the_char.to_lowercase())
            .collect();
        Self::ALL.iter()
            .copied()
            .find(|property| property.name() == normalized)
            .ok_or_else(|| FilterError::UnknownProperty(name.to_string()))
    }

    /// Whether the file store keeps a secondary index for this property
    pub fn is_indexed(&self) -> bool {
        matches!(self, Property::Id | Property::FirstName | Property::LastName | Property::DateOfBirth)
    }

    /// Converts a literal to this property's type, and checks it against the validation config
    pub fn parse_value<V : ValidationConfig>(&self, literal : &str) -> Result<FieldValue, ValidationError> {
        let value = match self {
            Property::Id => FieldValue::Id(convert_id(literal)?),
            Property::FirstName => {
                let name = convert_text("first name", literal)?;
                V::validate_first_name(&name)?;
                FieldValue::FirstName(name)
            },
            Property::LastName => {
                let name = convert_text("last name", literal)?;
                V::validate_last_name(&name)?;
                FieldValue::LastName(name)
            },
            Property::DateOfBirth => {
                let date = convert_date_of_birth(literal)?;
                V::validate_date_of_birth(date)?;
                FieldValue::DateOfBirth(date)
            },
            Property::ZipCode => {
                let zip = convert_zip_code(literal)?;
                V::validate_zip_code(zip)?;
                FieldValue::ZipCode(zip)
            },
            Property::City => {
                let city = convert_text("city", literal)?;
                V::validate_city(&city)?;
                FieldValue::City(city)
            },
            Property::Street => {
                let street = convert_text("street", literal)?;
                V::validate_street(&street)?;
                FieldValue::Street(street)
            },
            Property::Salary => {
                let salary = convert_salary(literal)?;
                V::validate_salary(salary)?;
                FieldValue::Salary(salary)
            },
            Property::Gender => {
                let gender = convert_gender(literal)?;
                V::validate_gender(gender)?;
                FieldValue::Gender(gender)
            },
        };
        Ok(value)
    }

    /// Reads this property out of a record
    pub fn value_of(&self, record : &Record) -> FieldValue {
        match self {
            Property::Id => FieldValue::Id(record.id),
            Property::FirstName => FieldValue::FirstName(record.first_name.clone()),
            Property::LastName => FieldValue::LastName(record.last_name.clone()),
            Property::DateOfBirth => FieldValue::DateOfBirth(record.date_of_birth),
            Property::ZipCode => FieldValue::ZipCode(record.zip_code),
            Property::City => FieldValue::City(record.city.clone()),
            Property::Street => FieldValue::Street(record.street.clone()),
            Property::Salary => FieldValue::Salary(record.salary),
            Property::Gender => FieldValue::Gender(record.gender),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed value, tagged with the [Property] it belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Id(RecordID),
    FirstName(String),
    LastName(String),
    DateOfBirth(NaiveDate),
    ZipCode(u16),
    City(String),
    Street(String),
    Salary(Decimal),
    Gender(char),
}

impl FieldValue {

    pub fn property(&self) -> Property {
        match self {
            FieldValue::Id(_) => Property::Id,
            FieldValue::FirstName(_) => Property::FirstName,
            FieldValue::LastName(_) => Property::LastName,
            FieldValue::DateOfBirth(_) => Property::DateOfBirth,
            FieldValue::ZipCode(_) => Property::ZipCode,
            FieldValue::City(_) => Property::City,
            FieldValue::Street(_) => Property::Street,
            FieldValue::Salary(_) => Property::Salary,
            FieldValue::Gender(_) => Property::Gender,
        }
    }

    /// Tests the record's value of the same property against this value.  Strings and chars
    /// compare ignoring case, everything else by equality
    pub fn matches(&self, record : &Record) -> bool {
        match self {
            FieldValue::Id(id) => record.id == *id,
            FieldValue::FirstName(name) => unicode_eq_ignore_case(&record.first_name, name),
            FieldValue::LastName(name) => unicode_eq_ignore_case(&record.last_name, name),
            FieldValue::DateOfBirth(date) => record.date_of_birth == *date,
            FieldValue::ZipCode(zip) => record.zip_code == *zip,
            FieldValue::City(city) => unicode_eq_ignore_case(&record.city, city),
            FieldValue::Street(street) => unicode_eq_ignore_case(&record.street, street),
            FieldValue::Salary(salary) => record.salary == *salary,
            FieldValue::Gender(gender) => unicode_char_eq_ignore_case(record.gender, *gender),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Id(id) => write!(f, "{id}"),
            FieldValue::FirstName(s) | FieldValue::LastName(s) | FieldValue::City(s) | FieldValue::Street(s) => f.write_str(s),
            FieldValue::DateOfBirth(date) => write!(f, "{}", date.format("%Y-%b-%d")),
            FieldValue::ZipCode(zip) => write!(f, "{zip}"),
            FieldValue::Salary(salary) => write!(f, "{salary}"),
            FieldValue::Gender(gender) => write!(f, "{gender}"),
        }
    }
}
