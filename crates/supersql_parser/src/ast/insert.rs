use supersql_error::Result;

use super::{AstParseable, Expr, Ident, ObjectReference, SelectNode};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// `VALUES (..), (..)`
    Values(Vec<Vec<Expr>>),
    /// `SELECT ...`
    Select(Box<SelectNode>),
}

/// `INSERT INTO <table> (<columns>) VALUES ... | SELECT ...`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertNode {
    pub table: Ident,
    /// Target columns. May be empty if no column list was given.
    pub columns: Vec<ObjectReference>,
    pub source: InsertSource,
}

impl AstParseable for InsertNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::INTO)?;
        let table = Ident::parse(parser)?;

        // Column list. A '(' followed by SELECT is the source, not a list.
        let has_columns = parser.peek().is_some_and(|t| t.token == Token::LeftParen)
            && !parser
                .peek_nth(1)
                .is_some_and(|t| t.is_keyword(Keyword::SELECT));
        let columns = if has_columns {
            parser.expect_token(&Token::LeftParen)?;
            let columns = parser.parse_comma_separated(ObjectReference::parse)?;
            parser.expect_token(&Token::RightParen)?;
            columns
        } else {
            Vec::new()
        };

        let source = if parser.parse_keyword(Keyword::VALUES) {
            InsertSource::Values(parser.parse_comma_separated(|parser| {
                parser.expect_token(&Token::LeftParen)?;
                let row = parser.parse_comma_separated(Expr::parse)?;
                parser.expect_token(&Token::RightParen)?;
                Ok(row)
            })?)
        } else if parser.parse_keyword(Keyword::SELECT) {
            InsertSource::Select(Box::new(SelectNode::parse(parser)?))
        } else if parser.consume_token(&Token::LeftParen) {
            parser.expect_keyword(Keyword::SELECT)?;
            let select = SelectNode::parse(parser)?;
            parser.expect_token(&Token::RightParen)?;
            InsertSource::Select(Box::new(select))
        } else {
            return Err(parser.error_here("Expected VALUES or SELECT"));
        };

        Ok(InsertNode {
            table,
            columns,
            source,
        })
    }
}
