use supersql_error::Result;

use super::{AstParseable, Ident};
use crate::keywords::Keyword;
use crate::parser::Parser;

/// `TRUNCATE [TABLE] <table>`
#[derive(Debug, Clone, PartialEq)]
pub struct TruncateNode {
    pub table: Ident,
}

impl AstParseable for TruncateNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.parse_keyword(Keyword::TABLE);
        Ok(TruncateNode {
            table: Ident::parse(parser)?,
        })
    }
}

/// `SHOW <target>`, e.g. `SHOW TABLES`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowNode {
    pub target: Ident,
}

impl AstParseable for ShowNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        Ok(ShowNode {
            target: Ident::parse(parser)?,
        })
    }
}
