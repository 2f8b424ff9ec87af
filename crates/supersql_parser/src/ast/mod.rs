pub mod expr;
pub use expr::*;
pub mod from;
pub use from::*;
pub mod select;
pub use select::*;
pub mod insert;
pub use insert::*;
pub mod update;
pub use update::*;
pub mod delete;
pub use delete::*;
pub mod misc;
pub use misc::*;

use std::fmt;

use supersql_error::{Result, SuperSqlError};

use crate::parser::Parser;
use crate::tokens::Token;

pub trait AstParseable: Sized {
    /// Parse an instance of Self from the provided parser.
    ///
    /// It's assumed that the parser is in the correct state for parsing Self,
    /// and if it isn't, an error should be returned.
    fn parse(parser: &mut Parser) -> Result<Self>;
}


#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident {
    pub value: String,
}

impl Ident {
    pub fn from_string(s: impl Into<String>) -> Self {
        Ident { value: s.into() }
    }
}

impl AstParseable for Ident {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let offset = parser.next_offset();
        let tok = match parser.next() {
            Some(tok) => &tok.token,
            None => {
                return Err(SuperSqlError::parse(
                    "Expected identifier, found end of statement",
                    offset,
                ));
            }
        };

        match tok {
            Token::Word(w) if w.keyword.is_none() => Ok(Ident {
                value: w.value.clone(),
            }),
            other => Err(SuperSqlError::parse(
                format!("Unexpected token: {other:?}. Expected an identifier."),
                offset,
            )),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Possibly qualified name, e.g. `col` or `alias.col`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectReference(pub Vec<Ident>);

impl ObjectReference {
    /// Create an object from an iterator of strings.
    pub fn from_strings<S>(strings: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        ObjectReference(strings.into_iter().map(Ident::from_string).collect())
    }

    pub fn base(&self) -> Result<&Ident> {
        self.0
            .last()
            .ok_or_else(|| SuperSqlError::unsupported("Empty object reference"))
    }

    /// Everything except the base, e.g. the table qualifier of a column.
    pub fn qualifier(&self) -> Option<&[Ident]> {
        match self.0.len() {
            0 | 1 => None,
            n => Some(&self.0[..n - 1]),
        }
    }
}

impl AstParseable for ObjectReference {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let mut idents = vec![Ident::parse(parser)?];
        // Compound identifiers.
        while parser.consume_token(&Token::Period) {
            idents.push(Ident::parse(parser)?);
        }
        Ok(ObjectReference(idents))
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strings: Vec<_> = self.0.iter().map(|ident| ident.value.as_str()).collect();
        write!(f, "{}", strings.join("."))
    }
}
