//!
//! The Selection module contains the parsers for the two lists that accompany queries: the
//! selector list naming the properties to project, and the setter list naming the assignments an
//! update makes.  [Selection], [Setters] and [Projection] are re-exported.
//!

use std::collections::BTreeMap;

use crate::error::FilterError;
use crate::filter::{tokenize, parse_assignment, Token};
use crate::property::{Property, FieldValue};
use crate::records::{Record, RecordArgs};
use crate::validation::ValidationConfig;

/// The values of the selected properties of one record, in selection order
pub type Projection = Vec<FieldValue>;

/// The set of properties a select query projects
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    properties : Vec<Property>,
}

impl Selection {

    /// Selects every property in canonical order
    pub fn all() -> Self {
        Self{ properties : Property::ALL.to_vec() }
    }

    /// Parses a comma-separated list of property names.  An empty list, or `*`, selects every
    /// property.  Repeated names are only projected once.
    pub fn parse(text : &str) -> Result<Self, FilterError> {

        let tokens = tokenize(text)?;
        if tokens.is_empty() || tokens == [Token::Star] {
            return Ok(Self::all());
        }

        let mut properties = vec![];
        let mut iter = tokens.iter();
        loop {
            let property = match iter.next() {
                Some(Token::Word(name)) => Property::from_name(name)?,
                Some(Token::Star) => return Err(FilterError::UnexpectedToken{ found : "*".to_string(), expected : "a property name" }),
                Some(Token::Literal(literal)) => return Err(FilterError::UnexpectedToken{ found : format!("'{literal}'"), expected : "a property name" }),
                Some(_) => return Err(FilterError::UnexpectedToken{ found : ",".to_string(), expected : "a property name" }),
                None => return Err(FilterError::UnexpectedEnd("a property name")),
            };
            if !properties.contains(&property) {
                properties.push(property);
            }

            match iter.next() {
                None => break,
                Some(Token::Comma) => {},
                Some(Token::Word(word)) => return Err(FilterError::UnexpectedToken{ found : word.clone(), expected : "','" }),
                Some(_) => return Err(FilterError::UnexpectedToken{ found : text.to_string(), expected : "','" }),
            }
        }

        Ok(Self{ properties })
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn project(&self, record : &Record) -> Projection {
        self.properties.iter().map(|property| property.value_of(record)).collect()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::all()
    }
}

/// The assignments an update query applies to every record it matches
///
/// ```
/// use record_cabinet::{*};
///
/// let setters = Setters::parse::<DefaultValidationConfig>("city = 'Bergen', zipcode = '5003'").unwrap();
/// assert_eq!(setters.len(), 2);
/// assert_eq!(Setters::parse::<DefaultValidationConfig>("id = '4'"), Err(FilterError::IdentityAssignment));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Setters {
    values : BTreeMap<Property, FieldValue>,
}

impl Setters {

    /// Parses a comma-separated list of `property = 'literal'` assignments.  When a property is
    /// assigned more than once, the last assignment wins.
    pub fn parse<V : ValidationConfig>(text : &str) -> Result<Self, FilterError> {

        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(FilterError::Empty);
        }

        let mut values = BTreeMap::new();
        let mut iter = tokens.iter().peekable();
        loop {
            //The id is the record's identity; it is never an assignable property
            if let Some(Token::Word(name)) = iter.peek() {
                if Property::from_name(name)? == Property::Id {
                    return Err(FilterError::IdentityAssignment);
                }
            }
            let value = parse_assignment::<V, _>(&mut iter)?;
            values.insert(value.property(), value);

            match iter.next() {
                None => break,
                Some(Token::Comma) => {},
                Some(Token::Word(word)) => return Err(FilterError::UnexpectedToken{ found : word.clone(), expected : "','" }),
                Some(_) => return Err(FilterError::UnexpectedToken{ found : text.to_string(), expected : "','" }),
            }
        }

        Ok(Self{ values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the assigned value for a property, if the property is assigned
    pub fn get(&self, property : Property) -> Option<&FieldValue> {
        self.values.get(&property)
    }

    pub fn values(&self) -> impl Iterator<Item=&FieldValue> {
        self.values.values()
    }

    /// Writes every assignment into a set of arguments
    pub fn apply_to(&self, args : &mut RecordArgs) {
        for value in self.values.values() {
            args.apply(value);
        }
    }
}
