use supersql_error::Result;

use super::{AstParseable, Expr, Ident};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

/// How a table joins onto the tables before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// The first table in the FROM clause.
    Base,
    /// `FROM a, b`
    Comma,
    /// `[INNER] JOIN`
    Inner,
    /// `LEFT [OUTER] JOIN`
    Left,
    /// `RIGHT [OUTER] JOIN`
    Right,
    /// `CROSS JOIN`
    Cross,
}

/// A single table in the FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub table: Ident,
    pub alias: Option<Ident>,
    pub join: JoinKind,
    /// `ON <expr>`
    pub constraint: Option<Expr>,
}

impl FromItem {
    /// Parse a table name with its optional alias.
    fn parse_table(parser: &mut Parser, join: JoinKind) -> Result<Self> {
        let table = Ident::parse(parser)?;
        let alias = parser.parse_alias()?;
        let constraint = if join != JoinKind::Base && parser.parse_keyword(Keyword::ON) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };
        Ok(FromItem {
            table,
            alias,
            join,
            constraint,
        })
    }

    /// Name the table is referred to by inside the query.
    pub fn reference_name(&self) -> &str {
        match &self.alias {
            Some(alias) => &alias.value,
            None => &self.table.value,
        }
    }
}

/// Parse the full FROM list, i.e. everything following the FROM keyword.
pub fn parse_from_list(parser: &mut Parser) -> Result<Vec<FromItem>> {
    let mut items = vec![FromItem::parse_table(parser, JoinKind::Base)?];

    loop {
        let join = if parser.consume_token(&Token::Comma) {
            JoinKind::Comma
        } else if parser.parse_keyword_sequence(&[Keyword::CROSS, Keyword::JOIN]) {
            JoinKind::Cross
        } else if parser.parse_keyword_sequence(&[Keyword::INNER, Keyword::JOIN])
            || parser.parse_keyword(Keyword::JOIN)
        {
            JoinKind::Inner
        } else if parser.parse_keyword_sequence(&[Keyword::LEFT, Keyword::OUTER, Keyword::JOIN])
            || parser.parse_keyword_sequence(&[Keyword::LEFT, Keyword::JOIN])
        {
            JoinKind::Left
        } else if parser.parse_keyword_sequence(&[Keyword::RIGHT, Keyword::OUTER, Keyword::JOIN])
            || parser.parse_keyword_sequence(&[Keyword::RIGHT, Keyword::JOIN])
        {
            JoinKind::Right
        } else {
            break;
        };

        items.push(FromItem::parse_table(parser, join)?);
    }

    Ok(items)
}
