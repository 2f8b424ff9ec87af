use supersql_error::Result;

use super::{AstParseable, Expr, FromItem, Ident, parse_from_list};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::{Token, TokenWithLocation};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectNode {
    /// Projection list. May included wildcards.
    pub projections: Vec<SelectItem>,
    /// FROM, in join order. Empty if there's no FROM clause.
    pub from: Vec<FromItem>,
    /// WHERE
    pub where_expr: Option<Expr>,
    /// GROUP BY
    pub group_by: Vec<Expr>,
    /// HAVING
    pub having: Option<Expr>,
    /// ORDER BY
    pub order_by: Vec<OrderByNode>,
    /// LIMIT
    pub limit: Option<LimitNode>,
}

impl AstParseable for SelectNode {
    /// Parse a select body. Expects the SELECT keyword to already be consumed.
    fn parse(parser: &mut Parser) -> Result<Self> {
        // Select list
        let projections = parser.parse_comma_separated(SelectItem::parse)?;

        // FROM
        let from = if parser.parse_keyword(Keyword::FROM) {
            parse_from_list(parser)?
        } else {
            Vec::new()
        };

        // WHERE
        let where_expr = if parser.parse_keyword(Keyword::WHERE) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };

        // GROUP BY
        let group_by = if parser.parse_keyword_sequence(&[Keyword::GROUP, Keyword::BY]) {
            parser.parse_comma_separated(Expr::parse)?
        } else {
            Vec::new()
        };

        // HAVING
        let having = if parser.parse_keyword(Keyword::HAVING) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };

        // ORDER BY
        let order_by = if parser.parse_keyword_sequence(&[Keyword::ORDER, Keyword::BY]) {
            parser.parse_comma_separated(OrderByNode::parse)?
        } else {
            Vec::new()
        };

        // LIMIT
        let limit = if parser.parse_keyword(Keyword::LIMIT) {
            Some(LimitNode::parse(parser)?)
        } else {
            None
        };

        Ok(SelectNode {
            projections,
            from,
            where_expr,
            group_by,
            having,
            order_by,
            limit,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// An unqualifed wild card.
    Wildcard,
    /// A qualified wild card.
    ///
    /// `<alias>.*`
    QualifiedWildcard(Ident),
    /// An expression with an optional alias.
    ///
    /// `text` holds the source text of the expression which names the output
    /// column when there's no alias.
    Expr {
        expr: Expr,
        alias: Option<Ident>,
        text: String,
    },
}

impl SelectItem {
    /// Output column name for this item.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            SelectItem::Expr { alias: Some(alias), .. } => Some(&alias.value),
            SelectItem::Expr { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl AstParseable for SelectItem {
    fn parse(parser: &mut Parser) -> Result<Self> {
        if parser.consume_token(&Token::Mul) {
            return Ok(SelectItem::Wildcard);
        }

        let qualified_wildcard = matches!(
            (parser.peek(), parser.peek_nth(1), parser.peek_nth(2)),
            (
                Some(TokenWithLocation { token: Token::Word(_), .. }),
                Some(TokenWithLocation { token: Token::Period, .. }),
                Some(TokenWithLocation { token: Token::Mul, .. }),
            )
        );
        if qualified_wildcard {
            let ident = Ident::parse(parser)?;
            parser.expect_token(&Token::Period)?;
            parser.expect_token(&Token::Mul)?;
            return Ok(SelectItem::QualifiedWildcard(ident));
        }

        let start = parser.next_offset();
        let expr = Expr::parse(parser)?;
        let text = parser.source_text(start, parser.prev_end()).to_string();
        let alias = parser.parse_alias()?;

        Ok(SelectItem::Expr { expr, alias, text })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderByDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByNode {
    pub expr: Expr,
    pub direction: OrderByDirection,
}

impl AstParseable for OrderByNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let expr = Expr::parse(parser)?;
        let direction = match parser.parse_one_of_keywords(&[Keyword::ASC, Keyword::DESC]) {
            Some(Keyword::DESC) => OrderByDirection::Desc,
            _ => OrderByDirection::Asc,
        };
        Ok(OrderByNode { expr, direction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitNode {
    pub offset: usize,
    pub count: usize,
}

impl AstParseable for LimitNode {
    /// Parses `<count>`, `<offset>, <count>`, or `<count> OFFSET <offset>`.
    fn parse(parser: &mut Parser) -> Result<Self> {
        let first = parser.parse_unsigned()?;
        if parser.consume_token(&Token::Comma) {
            let count = parser.parse_unsigned()?;
            return Ok(LimitNode {
                offset: first,
                count,
            });
        }
        if parser.parse_keyword(Keyword::OFFSET) {
            let offset = parser.parse_unsigned()?;
            return Ok(LimitNode {
                offset,
                count: first,
            });
        }
        Ok(LimitNode {
            offset: 0,
            count: first,
        })
    }
}
