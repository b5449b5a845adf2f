//!
//! The Error module contains the error types returned by the stores, the validation policy, and the
//! filter parser.  All of them are re-exported.
//!

use thiserror::Error;

use crate::records::RecordID;

/// A field value that is malformed or outside the range permitted by the active
/// [ValidationConfig](crate::ValidationConfig)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The value could not be converted to the field's type at all
    #[error("{field}: cannot convert '{value}'")]
    Malformed {
        field : &'static str,
        value : String,
    },

    /// A string field is shorter or longer than permitted
    #[error("{field}: length {len} is outside {min}..={max}")]
    Length {
        field : &'static str,
        len : usize,
        min : usize,
        max : usize,
    },

    /// A string field is empty or made only of whitespace
    #[error("{field}: must not be blank")]
    Blank {
        field : &'static str,
    },

    /// A scalar field is outside its permitted range
    #[error("{field}: {value} is outside {min}..={max}")]
    Range {
        field : &'static str,
        value : String,
        min : String,
        max : String,
    },

    /// A character field holds a character outside its permitted set
    #[error("{field}: '{value}' is not one of {permitted:?}")]
    NotPermitted {
        field : &'static str,
        value : char,
        permitted : &'static [char],
    },
}

/// Errors raised by [RecordStore](crate::RecordStore) operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("record not found: {0}")]
    NotFound(RecordID),

    #[error("record id already exists: {0}")]
    DuplicateId(RecordID),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The backing file can't be interpreted as a sequence of slots
    #[error("corrupt record file '{path}': {details}")]
    CorruptFile {
        path : String,
        details : String,
    },

    /// A single slot failed to decode
    #[error("corrupt slot at offset {offset}: {details}")]
    CorruptSlot {
        offset : u64,
        details : String,
    },

    #[error("snapshot codec error: {0}")]
    Codec(String),
}

/// Errors raised while parsing filters, selector lists, and setter lists
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("empty expression")]
    Empty,

    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    #[error("unexpected token '{found}', expected {expected}")]
    UnexpectedToken {
        found : String,
        expected : &'static str,
    },

    #[error("unexpected end of expression, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("unterminated literal starting at position {0}")]
    UnterminatedLiteral(usize),

    #[error("the id can't be assigned")]
    IdentityAssignment,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
