use supersql_error::Result;

use super::{AstParseable, Expr, Ident};
use crate::keywords::Keyword;
use crate::parser::Parser;

/// `DELETE FROM <table> [WHERE <expr>]`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteNode {
    pub table: Ident,
    pub where_expr: Option<Expr>,
}

impl AstParseable for DeleteNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::FROM)?;
        let table = Ident::parse(parser)?;
        let where_expr = if parser.parse_keyword(Keyword::WHERE) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };
        Ok(DeleteNode { table, where_expr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;

    #[test]
    fn delete_all_and_filtered() {
        let node: DeleteNode = parse_ast("from car").unwrap();
        assert!(node.where_expr.is_none());
        let node: DeleteNode = parse_ast("from car where owner = 1").unwrap();
        assert!(node.where_expr.is_some());
    }
}
