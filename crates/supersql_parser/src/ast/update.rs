use supersql_error::Result;

use super::{AstParseable, Expr, Ident, ObjectReference};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

/// `<column> = <expr>`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: ObjectReference,
    pub value: Expr,
}

impl AstParseable for Assignment {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let column = ObjectReference::parse(parser)?;
        if !parser.consume_token(&Token::Eq) {
            parser.expect_token(&Token::DoubleEq)?;
        }
        let value = Expr::parse(parser)?;
        Ok(Assignment { column, value })
    }
}

/// `UPDATE <table> SET <assignments> [WHERE <expr>]`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateNode {
    pub table: Ident,
    pub assignments: Vec<Assignment>,
    pub where_expr: Option<Expr>,
}

impl AstParseable for UpdateNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let table = Ident::parse(parser)?;
        parser.expect_keyword(Keyword::SET)?;
        let assignments = parser.parse_comma_separated(Assignment::parse)?;
        let where_expr = if parser.parse_keyword(Keyword::WHERE) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };
        Ok(UpdateNode {
            table,
            assignments,
            where_expr,
        })
    }
}
