use std::fmt;

use supersql_error::{Result, SuperSqlError};

use super::{AstParseable, Ident, ObjectReference, SelectNode};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::{Token, TokenWithLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Plus, e.g. `+9`
    Plus,
    /// Minus, e.g. `-9`
    Minus,
    /// Not, e.g. `NOT(true)`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Plus, e.g. `a + b`
    Plus,
    /// Minus, e.g. `a - b`
    Minus,
    /// Multiply, e.g. `a * b`
    Multiply,
    /// Divide, e.g. `a / b`
    Divide,
    /// Modulo, e.g. `a % b`
    Modulo,
    /// Greater than, e.g. `a > b`
    Gt,
    /// Less than, e.g. `a < b`
    Lt,
    /// Greater equal, e.g. `a >= b`
    GtEq,
    /// Less equal, e.g. `a <= b`
    LtEq,
    /// Equal, e.g. `a = b` or `a == b`
    Eq,
    /// Not equal, e.g. `a <> b` or `a != b`
    NotEq,
    /// And, e.g. `a AND b`
    And,
    /// Or, e.g. `a OR b`
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Unparsed number literal.
    Number(String),
    /// String literal.
    SingleQuotedString(String),
    /// Boolean literal.
    Boolean(bool),
    /// Null literal
    Null,
}

/// Right hand side of `IS [NOT] ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsTarget {
    Null,
    True,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Max,
    Min,
    Avg,
}

impl AggregateFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "count" => AggregateFunction::Count,
            "sum" => AggregateFunction::Sum,
            "max" => AggregateFunction::Max,
            "min" => AggregateFunction::Min,
            "avg" => AggregateFunction::Avg,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Max => "max",
            AggregateFunction::Min => "min",
            AggregateFunction::Avg => "avg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateArg {
    /// `COUNT(*)`
    Wildcard,
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference, optionally qualified with a table name or alias.
    Column(ObjectReference),
    /// An expression literal,
    Literal(Literal),
    /// A parenthesized expression.
    Nested(Box<Expr>),
    /// A unary expression.
    UnaryExpr { op: UnaryOperator, expr: Box<Expr> },
    /// A binary expression.
    BinaryExpr {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// `<expr> [NOT] BETWEEN <low> AND <high>`
    Between {
        expr: Box<Expr>,
        negated: bool,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    /// `<expr> [NOT] IN (<list>)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    /// `<expr> [NOT] IN (SELECT ...)`
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<SelectNode>,
        negated: bool,
    },
    /// `<expr> IS [NOT] NULL|TRUE|FALSE`
    Is {
        expr: Box<Expr>,
        target: IsTarget,
        negated: bool,
    },
    /// A scalar function call.
    Function { name: Ident, args: Vec<Expr> },
    /// An aggregate function call.
    Aggregate {
        func: AggregateFunction,
        arg: AggregateArg,
    },
    /// Scalar subquery, `(SELECT ...)`.
    Subquery(Box<SelectNode>),
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Not => write!(f, "not "),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::GtEq => ">=",
            Self::LtEq => "<=",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::And => "and",
            Self::Or => "or",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::SingleQuotedString(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (idx, expr) in exprs.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{expr}")?;
    }
    Ok(())
}

/// Compact SQL rendering, used to name computed columns.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(reference) => write!(f, "{reference}"),
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Nested(expr) => write!(f, "({expr})"),
            Self::UnaryExpr { op, expr } => write!(f, "{op}{expr}"),
            Self::BinaryExpr { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let not = if *negated { "not " } else { "" };
                write!(f, "{expr} {not}between {low} and {high}")
            }
            Self::InList {
                expr,
                list,
                negated,
            } => {
                let not = if *negated { "not " } else { "" };
                write!(f, "{expr} {not}in (")?;
                write_list(f, list)?;
                write!(f, ")")
            }
            Self::InSubquery { expr, negated, .. } => {
                let not = if *negated { "not " } else { "" };
                write!(f, "{expr} {not}in (subquery)")
            }
            Self::Is {
                expr,
                target,
                negated,
            } => {
                let not = if *negated { "not " } else { "" };
                let target = match target {
                    IsTarget::Null => "null",
                    IsTarget::True => "true",
                    IsTarget::False => "false",
                };
                write!(f, "{expr} is {not}{target}")
            }
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Self::Aggregate { func, arg } => match arg {
                AggregateArg::Wildcard => write!(f, "{}(*)", func.name()),
                AggregateArg::Expr(expr) => write!(f, "{}({expr})", func.name()),
            },
            Self::Subquery(_) => write!(f, "(subquery)"),
        }
    }
}

impl AstParseable for Expr {
    fn parse(parser: &mut Parser) -> Result<Self> {
        Self::parse_subexpr(parser, 0)
    }
}

// Precdences, ordered low to high.
const PREC_OR: u8 = 10;
const PREC_AND: u8 = 20;
const PREC_NOT: u8 = 30;
const PREC_IS: u8 = 40;
const PREC_COMPARISON: u8 = 50; // <=, =, etc
const PREC_CONTAINMENT: u8 = 60; // BETWEEN, IN
const PREC_ADD_SUB: u8 = 80;
const PREC_MUL_DIV_MOD: u8 = 90;
const PREC_UNARY: u8 = 100;

impl Expr {
    /// Check if this expression contains an aggregate call anywhere outside of
    /// a subquery.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Column(_) | Expr::Literal(_) | Expr::Subquery(_) => false,
            Expr::Nested(e) | Expr::UnaryExpr { expr: e, .. } | Expr::Is { expr: e, .. } => {
                e.contains_aggregate()
            }
            Expr::BinaryExpr { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expr::Between {
                expr, low, high, ..
            } => expr.contains_aggregate() || low.contains_aggregate() || high.contains_aggregate(),
            Expr::InList { expr, list, .. } => {
                expr.contains_aggregate() || list.iter().any(|e| e.contains_aggregate())
            }
            Expr::InSubquery { expr, .. } => expr.contains_aggregate(),
            Expr::Function { args, .. } => args.iter().any(|e| e.contains_aggregate()),
        }
    }

    pub(crate) fn parse_subexpr(parser: &mut Parser, precendence: u8) -> Result<Self> {
        let mut expr = Expr::parse_prefix(parser)?;

        loop {
            let next_precedence = Self::get_infix_precedence(parser);
            if precendence >= next_precedence {
                break;
            }

            expr = Self::parse_infix(parser, expr, next_precedence)?;
        }

        Ok(expr)
    }

    fn parse_prefix(parser: &mut Parser) -> Result<Self> {
        let offset = parser.next_offset();
        let tok = match parser.next() {
            Some(tok) => tok.token.clone(),
            None => {
                return Err(SuperSqlError::parse(
                    "Expected prefix expression, found end of statement",
                    offset,
                ));
            }
        };

        let expr = match tok {
            Token::Word(w) => match w.keyword {
                Some(Keyword::TRUE) => Expr::Literal(Literal::Boolean(true)),
                Some(Keyword::FALSE) => Expr::Literal(Literal::Boolean(false)),
                Some(Keyword::NULL) => Expr::Literal(Literal::Null),
                Some(Keyword::NOT) => Expr::UnaryExpr {
                    op: UnaryOperator::Not,
                    expr: Box::new(Expr::parse_subexpr(parser, PREC_NOT)?),
                },
                Some(kw) => {
                    return Err(SuperSqlError::parse(
                        format!("Unexpected keyword {kw:?}. Expected expression."),
                        offset,
                    ));
                }
                None => {
                    let ident = Ident { value: w.value };
                    if parser.consume_token(&Token::LeftParen) {
                        Self::parse_function_call(parser, ident)?
                    } else if ident.value.eq_ignore_ascii_case("current_timestamp") {
                        // Allowed without parentheses.
                        Expr::Function {
                            name: ident,
                            args: Vec::new(),
                        }
                    } else {
                        let mut idents = vec![ident];
                        while parser.consume_token(&Token::Period) {
                            idents.push(Ident::parse(parser)?);
                        }
                        Expr::Column(ObjectReference(idents))
                    }
                }
            },
            Token::SingleQuotedString(s) => Expr::Literal(Literal::SingleQuotedString(s)),
            Token::Number(s) => Expr::Literal(Literal::Number(s)),
            Token::Minus => Expr::UnaryExpr {
                op: UnaryOperator::Minus,
                expr: Box::new(Expr::parse_subexpr(parser, PREC_UNARY)?),
            },
            Token::Plus => Expr::UnaryExpr {
                op: UnaryOperator::Plus,
                expr: Box::new(Expr::parse_subexpr(parser, PREC_UNARY)?),
            },
            Token::LeftParen => {
                let expr = if parser.parse_keyword(Keyword::SELECT) {
                    Expr::Subquery(Box::new(SelectNode::parse(parser)?))
                } else {
                    Expr::Nested(Box::new(Expr::parse(parser)?))
                };
                parser.expect_token(&Token::RightParen)?;
                expr
            }
            other => {
                return Err(SuperSqlError::parse(
                    format!("Unexpected token '{other:?}'. Expected expression."),
                    offset,
                ));
            }
        };

        Ok(expr)
    }

    /// Parse the arguments of a function call. Opening paren already consumed.
    fn parse_function_call(parser: &mut Parser, name: Ident) -> Result<Self> {
        if let Some(func) = AggregateFunction::from_name(&name.value) {
            let arg = if parser.consume_token(&Token::Mul) {
                AggregateArg::Wildcard
            } else {
                AggregateArg::Expr(Box::new(Expr::parse(parser)?))
            };
            parser.expect_token(&Token::RightParen)?;
            return Ok(Expr::Aggregate { func, arg });
        }

        let args = if parser.consume_token(&Token::RightParen) {
            Vec::new()
        } else {
            let args = parser.parse_comma_separated(Expr::parse)?;
            parser.expect_token(&Token::RightParen)?;
            args
        };

        Ok(Expr::Function { name, args })
    }

    fn parse_infix(parser: &mut Parser, prefix: Expr, precendence: u8) -> Result<Self> {
        let offset = parser.next_offset();
        let tok = match parser.next() {
            Some(tok) => tok.token.clone(),
            None => {
                return Err(SuperSqlError::parse(
                    "Expected infix expression, found end of statement",
                    offset,
                ));
            }
        };

        let bin_op: Option<BinaryOperator> = match &tok {
            Token::DoubleEq | Token::Eq => Some(BinaryOperator::Eq),
            Token::Neq => Some(BinaryOperator::NotEq),
            Token::Gt => Some(BinaryOperator::Gt),
            Token::GtEq => Some(BinaryOperator::GtEq),
            Token::Lt => Some(BinaryOperator::Lt),
            Token::LtEq => Some(BinaryOperator::LtEq),
            Token::Plus => Some(BinaryOperator::Plus),
            Token::Minus => Some(BinaryOperator::Minus),
            Token::Mul => Some(BinaryOperator::Multiply),
            Token::Div => Some(BinaryOperator::Divide),
            Token::Mod => Some(BinaryOperator::Modulo),
            Token::Word(w) => match w.keyword {
                Some(Keyword::AND) => Some(BinaryOperator::And),
                Some(Keyword::OR) => Some(BinaryOperator::Or),
                _ => None,
            },
            _ => None,
        };

        if let Some(op) = bin_op {
            return Ok(Expr::BinaryExpr {
                left: Box::new(prefix),
                op,
                right: Box::new(Expr::parse_subexpr(parser, precendence)?),
            });
        }

        match tok.keyword() {
            Some(Keyword::IS) => {
                let negated = parser.parse_keyword(Keyword::NOT);
                let target =
                    match parser.parse_one_of_keywords(&[Keyword::NULL, Keyword::TRUE, Keyword::FALSE]) {
                        Some(Keyword::NULL) => IsTarget::Null,
                        Some(Keyword::TRUE) => IsTarget::True,
                        Some(Keyword::FALSE) => IsTarget::False,
                        _ => return Err(parser.error_here("Expected NULL, TRUE, or FALSE after IS")),
                    };
                Ok(Expr::Is {
                    expr: Box::new(prefix),
                    target,
                    negated,
                })
            }
            Some(Keyword::NOT) => {
                match parser.parse_one_of_keywords(&[Keyword::IN, Keyword::BETWEEN]) {
                    Some(Keyword::IN) => Self::parse_in(parser, prefix, true),
                    Some(Keyword::BETWEEN) => Self::parse_between(parser, prefix, true),
                    _ => Err(parser.error_here("Expected IN or BETWEEN after NOT")),
                }
            }
            Some(Keyword::IN) => Self::parse_in(parser, prefix, false),
            Some(Keyword::BETWEEN) => Self::parse_between(parser, prefix, false),
            _ => Err(SuperSqlError::parse(
                format!("Unable to parse token {tok:?} as an expression"),
                offset,
            )),
        }
    }

    fn parse_in(parser: &mut Parser, expr: Expr, negated: bool) -> Result<Self> {
        parser.expect_token(&Token::LeftParen)?;
        let expr = if parser.parse_keyword(Keyword::SELECT) {
            Expr::InSubquery {
                expr: Box::new(expr),
                subquery: Box::new(SelectNode::parse(parser)?),
                negated,
            }
        } else {
            Expr::InList {
                expr: Box::new(expr),
                list: parser.parse_comma_separated(Expr::parse)?,
                negated,
            }
        };
        parser.expect_token(&Token::RightParen)?;
        Ok(expr)
    }

    fn parse_between(parser: &mut Parser, expr: Expr, negated: bool) -> Result<Self> {
        let low = Expr::parse_subexpr(parser, PREC_CONTAINMENT)?;
        parser.expect_keyword(Keyword::AND)?;
        let high = Expr::parse_subexpr(parser, PREC_CONTAINMENT)?;
        Ok(Expr::Between {
            expr: Box::new(expr),
            negated,
            low: Box::new(low),
            high: Box::new(high),
        })
    }

    /// Get the relative precedence of the next operator.
    ///
    /// Zero is returned when the next token doesn't continue the expression.
    fn get_infix_precedence(parser: &Parser) -> u8 {
        let tok = match parser.peek() {
            Some(TokenWithLocation { token, .. }) => token,
            None => return 0,
        };

        match tok {
            Token::Word(w) => match w.keyword {
                Some(Keyword::OR) => PREC_OR,
                Some(Keyword::AND) => PREC_AND,
                Some(Keyword::IS) => PREC_IS,
                Some(Keyword::IN) | Some(Keyword::BETWEEN) => PREC_CONTAINMENT,
                // Precedence depends on keyword following it.
                Some(Keyword::NOT) => match parser.peek_nth(1).and_then(|t| t.keyword()) {
                    Some(Keyword::IN) | Some(Keyword::BETWEEN) => PREC_CONTAINMENT,
                    _ => 0,
                },
                _ => 0,
            },

            // Equalities
            Token::Eq
            | Token::DoubleEq
            | Token::Neq
            | Token::Lt
            | Token::LtEq
            | Token::Gt
            | Token::GtEq => PREC_COMPARISON,

            // Numeric operators
            Token::Plus | Token::Minus => PREC_ADD_SUB,
            Token::Mul | Token::Div | Token::Mod => PREC_MUL_DIV_MOD,

            _ => 0,
        }
    }
}
