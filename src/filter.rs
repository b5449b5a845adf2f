//!
//! The Filter module contains the tokenizer shared by all of the textual query expressions, and
//! the [Filter] object, which compiles a `where`-style expression into a test over a [Record].
//! [Filter] and [Combinator] are re-exported.
//!

use tracing::debug;

use crate::error::FilterError;
use crate::property::{Property, FieldValue};
use crate::records::Record;
use crate::validation::ValidationConfig;

/// A lexical token of a query expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    Word(String),
    Literal(String),
    Equals,
    Comma,
    Star,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Word(word) => word.clone(),
            Token::Literal(literal) => format!("'{literal}'"),
            Token::Equals => "=".to_string(),
            Token::Comma => ",".to_string(),
            Token::Star => "*".to_string(),
        }
    }
}

/// Splits an expression into tokens.  Literals are delimited by single quotes and keep their
/// contents verbatim, including whitespace.  There is no escape for the quote character.
pub(crate) fn tokenize(text : &str) -> Result<Vec<Token>, FilterError> {

    let mut tokens = vec![];
    let mut chars = text.char_indices().peekable();

    while let Some((pos, the_char)) = chars.next() {
        match the_char {
            c if c.is_whitespace() => {},
            '=' => tokens.push(Token::Equals),
            ',' => tokens.push(Token::Comma),
            '*' => tokens.push(Token::Star),
            '\'' => {
                let mut literal = String::new();
                let mut terminated = false;
                for (_, literal_char) in chars.by_ref() {
                    if literal_char == '\'' {
                        terminated = true;
                        break;
                    }
                    literal.push(literal_char);
                }
                if !terminated {
                    return Err(FilterError::UnterminatedLiteral(pos));
                }
                tokens.push(Token::Literal(literal));
            },
            _ => {
                let mut word = String::new();
                word.push(the_char);
                while let Some((_, next_char)) = chars.peek() {
                    if next_char.is_whitespace() || matches!(next_char, '=' | ',' | '*' | '\'') {
                        break;
                    }
                    word.push(*next_char);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    Ok(tokens)
}

/// Parses one `property = 'literal'` assignment from the front of a token stream
pub(crate) fn parse_assignment<'a, V : ValidationConfig, I : Iterator<Item=&'a Token>>(tokens : &mut I) -> Result<FieldValue, FilterError> {

    let property = match tokens.next() {
        Some(Token::Word(name)) => Property::from_name(name)?,
        Some(other) => return Err(FilterError::UnexpectedToken{ found : other.describe(), expected : "a property name" }),
        None => return Err(FilterError::UnexpectedEnd("a property name")),
    };

    match tokens.next() {
        Some(Token::Equals) => {},
        Some(other) => return Err(FilterError::UnexpectedToken{ found : other.describe(), expected : "'='" }),
        None => return Err(FilterError::UnexpectedEnd("'='")),
    }

    match tokens.next() {
        Some(Token::Literal(literal)) => Ok(property.parse_value::<V>(literal)?),
        Some(other) => Err(FilterError::UnexpectedToken{ found : other.describe(), expected : "a quoted literal" }),
        None => Err(FilterError::UnexpectedEnd("a quoted literal")),
    }
}

/// How the clauses of a [Filter] are joined
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn from_word(word : &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Combinator::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Combinator::Or)
        } else {
            None
        }
    }
}

/// A compiled filter expression
///
/// The grammar is a list of `property = 'literal'` clauses, joined uniformly by either `and` or
/// `or`.  The first combinator decides the join, so `a and b or c` is read as `a and b and c`.
/// For example:
///
/// ```
/// use record_cabinet::{*};
///
/// let filter = Filter::parse::<DefaultValidationConfig>("firstname = 'Ann' and city = 'Oslo'").unwrap();
/// assert_eq!(filter.combinator(), Combinator::And);
/// assert_eq!(filter.clauses().len(), 2);
/// ```
///
/// Each literal is converted and validated exactly as interactive input would be, so a filter is
/// either entirely valid or rejected.  A compiled filter is immutable plain data; it may be shared
/// between threads and evaluated any number of times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    text : String,
    cache_key : String,
    combinator : Combinator,
    clauses : Vec<FieldValue>,
}

impl Filter {

    /// Compiles a filter expression, validating the literals against the supplied config
    pub fn parse<V : ValidationConfig>(text : &str) -> Result<Self, FilterError> {

        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(FilterError::Empty);
        }

        let mut iter = tokens.iter().peekable();
        let mut clauses = vec![parse_assignment::<V, _>(&mut iter)?];
        let mut combinator = None;

        while let Some(token) = iter.next() {
            let next_combinator = match token {
                Token::Word(word) => Combinator::from_word(word),
                _ => None,
            }.ok_or_else(|| FilterError::UnexpectedToken{ found : token.describe(), expected : "'and' or 'or'" })?;

            //The first combinator decides for the whole expression, later ones only separate clauses
            match combinator {
                None => combinator = Some(next_combinator),
                Some(existing) if existing != next_combinator => debug!("'{next_combinator:?}' in '{text}' is joined as '{existing:?}'"),
                Some(_) => {},
            }

            clauses.push(parse_assignment::<V, _>(&mut iter)?);
        }

        Ok(Self {
            text : text.to_string(),
            cache_key : cache_key(&tokens),
            combinator : combinator.unwrap_or(Combinator::And),
            clauses,
        })
    }

    /// The expression this filter was compiled from
    pub fn text(&self) -> &str {
        &self.text
    }

    /// A normalized form of the expression, which is the same for any two spellings that differ
    /// only in whitespace between tokens
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn clauses(&self) -> &[FieldValue] {
        &self.clauses
    }

    /// Tests a record against the filter
    pub fn matches(&self, record : &Record) -> bool {
        match self.combinator {
            Combinator::And => self.clauses.iter().all(|clause| clause.matches(record)),
            Combinator::Or => self.clauses.iter().any(|clause| clause.matches(record)),
        }
    }

    /// Returns a clause on an indexed property that every accepted record must satisfy, if there
    /// is one.  A store may narrow its candidates to the records matching this clause before
    /// testing the whole filter.
    pub fn index_hint(&self) -> Option<&FieldValue> {
        if self.combinator == Combinator::Or && self.clauses.len() > 1 {
            return None;
        }
        //Prefer the id, which addresses at most one record
        self.clauses.iter()
            .find(|clause| clause.property() == Property::Id)
            .or_else(|| self.clauses.iter().find(|clause| clause.property().is_indexed()))
    }

    /// Consumes the filter, returning it as a plain predicate function
    pub fn into_predicate(self) -> impl Fn(&Record) -> bool + Send + Sync {
        move |record| self.matches(record)
    }
}

fn cache_key(tokens : &[Token]) -> String {
    let rendered : Vec<String> = tokens.iter().map(|token| token.describe()).collect();
    rendered.join(" ")
}
