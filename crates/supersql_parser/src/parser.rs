use supersql_error::{Result, SuperSqlError};

use crate::ast::{
    AstParseable,
    DeleteNode,
    Ident,
    InsertNode,
    SelectNode,
    ShowNode,
    TruncateNode,
    UpdateNode,
};
use crate::keywords::Keyword;
use crate::statement::Statement;
use crate::tokens::{Token, TokenWithLocation, Tokenizer};

/// Parse a script containing one or more semicolon separated statements.
pub fn parse(sql: &str) -> Result<Vec<Statement>> {
    Parser::with_sql_string(sql)?.parse_statements()
}

/// Parse exactly one statement. A trailing semicolon is allowed.
pub fn parse_one(sql: &str) -> Result<Statement> {
    let mut statements = parse(sql)?;
    match statements.len() {
        1 => Ok(statements.remove(0)),
        0 => Err(SuperSqlError::parse("Empty SQL statement", 0)),
        n => Err(SuperSqlError::parse(
            format!("Expected a single statement, found {n}"),
            0,
        )),
    }
}

#[derive(Debug)]
pub struct Parser<'a> {
    sql: &'a str,
    toks: Vec<TokenWithLocation>,
    /// Index of token we should process next.
    idx: usize,
}

impl<'a> Parser<'a> {
    pub fn with_sql_string(sql: &'a str) -> Result<Self> {
        let toks = Tokenizer::new(sql).tokenize()?;
        Ok(Parser { sql, toks, idx: 0 })
    }

    pub fn parse_statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            while self.consume_token(&Token::SemiColon) {}
            if self.peek().is_none() {
                break;
            }

            statements.push(self.parse_statement()?);

            if self.peek().is_some() && !self.consume_token(&Token::SemiColon) {
                return Err(self.error_here("Expected end of statement"));
            }
        }
        Ok(statements)
    }

    pub fn parse_statement(&mut self) -> Result<Statement> {
        let offset = self.next_offset();
        let keyword = match self.next() {
            Some(tok) => match tok.keyword() {
                Some(kw) => kw,
                None => {
                    return Err(SuperSqlError::parse(
                        format!("Expected a keyword, got {:?}", tok.token),
                        offset,
                    ));
                }
            },
            None => return Err(SuperSqlError::parse("Empty SQL statement", offset)),
        };

        match keyword {
            Keyword::SELECT => Ok(Statement::Select(SelectNode::parse(self)?)),
            Keyword::INSERT => Ok(Statement::Insert(InsertNode::parse(self)?)),
            Keyword::UPDATE => Ok(Statement::Update(UpdateNode::parse(self)?)),
            Keyword::DELETE => Ok(Statement::Delete(DeleteNode::parse(self)?)),
            Keyword::TRUNCATE => Ok(Statement::Truncate(TruncateNode::parse(self)?)),
            Keyword::SHOW => Ok(Statement::Show(ShowNode::parse(self)?)),
            other => Err(SuperSqlError::parse(
                format!("Unexpected keyword: {other:?}"),
                offset,
            )),
        }
    }

    /// Parse a comma separated list using the provided function.
    pub(crate) fn parse_comma_separated<T>(
        &mut self,
        mut f: impl FnMut(&mut Parser<'a>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut values = Vec::new();
        loop {
            values.push(f(self)?);
            if !self.consume_token(&Token::Comma) {
                break;
            }
        }
        Ok(values)
    }

    /// Parse an optional alias, with or without a leading `AS`.
    pub(crate) fn parse_alias(&mut self) -> Result<Option<Ident>> {
        if self.parse_keyword(Keyword::AS) {
            return Ident::parse(self).map(Some);
        }

        let bare_word = matches!(
            self.peek(),
            Some(TokenWithLocation { token: Token::Word(w), .. }) if w.keyword.is_none()
        );
        if bare_word {
            Ident::parse(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Parse an unsigned integer, e.g. for LIMIT.
    pub(crate) fn parse_unsigned(&mut self) -> Result<usize> {
        let offset = self.next_offset();
        match self.next() {
            Some(TokenWithLocation {
                token: Token::Number(n),
                ..
            }) => n.parse::<usize>().map_err(|_| {
                SuperSqlError::parse(format!("Expected an unsigned integer, got {n}"), offset)
            }),
            Some(tok) => Err(SuperSqlError::parse(
                format!("Expected an unsigned integer, got {:?}", tok.token),
                offset,
            )),
            None => Err(SuperSqlError::parse(
                "Expected an unsigned integer, found end of statement",
                offset,
            )),
        }
    }

    /// Parse a single keyword.
    pub(crate) fn parse_keyword(&mut self, keyword: Keyword) -> bool {
        let idx = self.idx;
        if let Some(tok) = self.next() {
            if tok.is_keyword(keyword) {
                return true;
            }
        }

        // Keyword doesn't match. Reset index and return.
        self.idx = idx;
        false
    }

    /// Parse an exact sequence of keywords.
    ///
    /// If the sequence doesn't match, idx is not changed, and false is
    /// returned.
    pub(crate) fn parse_keyword_sequence(&mut self, keywords: &[Keyword]) -> bool {
        let idx = self.idx;
        for keyword in keywords {
            if let Some(tok) = self.next() {
                if tok.is_keyword(*keyword) {
                    continue;
                }
            }

            self.idx = idx;
            return false;
        }
        true
    }

    /// Parse any of the provided keywords, returning which one matched.
    pub(crate) fn parse_one_of_keywords(&mut self, keywords: &[Keyword]) -> Option<Keyword> {
        let idx = self.idx;
        let kw = self.next()?.keyword();
        match kw {
            Some(kw) if keywords.contains(&kw) => Some(kw),
            _ => {
                self.idx = idx;
                None
            }
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.parse_keyword(keyword) {
            return Ok(());
        }
        Err(self.error_here(format!("Expected keyword {keyword:?}")))
    }

    pub(crate) fn expect_token(&mut self, expected: &Token) -> Result<()> {
        if self.consume_token(expected) {
            return Ok(());
        }
        Err(self.error_here(format!("Expected {expected:?}")))
    }

    /// Consume the next token if it matches.
    pub(crate) fn consume_token(&mut self, expected: &Token) -> bool {
        let idx = self.idx;
        if let Some(tok) = self.next() {
            if &tok.token == expected {
                return true;
            }
        }

        self.idx = idx;
        false
    }

    /// Get the next non-whitespace token.
    pub(crate) fn next(&mut self) -> Option<&TokenWithLocation> {
        loop {
            if self.idx >= self.toks.len() {
                return None;
            }

            let tok = &self.toks[self.idx];
            self.idx += 1;

            if matches!(&tok.token, Token::Whitespace) {
                continue;
            }

            return Some(tok);
        }
    }

    /// Get the next non-whitespace token without advancing.
    pub(crate) fn peek(&self) -> Option<&TokenWithLocation> {
        self.peek_nth(0)
    }

    /// Get the nth non-whitespace token without advancing.
    pub(crate) fn peek_nth(&self, n: usize) -> Option<&TokenWithLocation> {
        self.toks[self.idx.min(self.toks.len())..]
            .iter()
            .filter(|t| !matches!(t.token, Token::Whitespace))
            .nth(n)
    }

    /// Byte offset of the next non-whitespace token, or the end of input.
    pub(crate) fn next_offset(&self) -> usize {
        self.peek().map(|t| t.start).unwrap_or(self.sql.len())
    }

    /// Byte offset just after the last consumed non-whitespace token.
    pub(crate) fn prev_end(&self) -> usize {
        self.toks[..self.idx.min(self.toks.len())]
            .iter()
            .rev()
            .find(|t| !matches!(t.token, Token::Whitespace))
            .map(|t| t.end)
            .unwrap_or(0)
    }

    /// Source text between two byte offsets.
    pub(crate) fn source_text(&self, start: usize, end: usize) -> &'a str {
        self.sql.get(start..end).unwrap_or("")
    }

    pub(crate) fn error_here(&self, msg: impl Into<String>) -> SuperSqlError {
        let found = match self.peek() {
            Some(tok) => format!("{:?}", tok.token),
            None => "end of statement".to_string(),
        };
        SuperSqlError::parse(
            format!("{}, found {found}", msg.into()),
            self.next_offset(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Literal, SelectItem};

    #[test]
    fn multiple_statements() {
        let statements = parse("select 1; select 2;;").unwrap();
        assert_eq!(2, statements.len());
    }

    #[test]
    fn parse_one_rejects_scripts() {
        let err = parse_one("select 1; select 2").unwrap_err();
        assert!(matches!(err, SuperSqlError::Parse { .. }));
    }

    #[test]
    fn missing_separator_errors_with_offset() {
        let err = parse("select 1 select 2").unwrap_err();
        match err {
            SuperSqlError::Parse { offset, .. } => assert_eq!(9, offset),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_leading_word() {
        assert!(parse("frobnicate the table").is_err());
        assert!(parse_one("").is_err());
    }

    #[test]
    fn select_without_from() {
        let statement = parse_one("select 1").unwrap();
        let Statement::Select(select) = statement else {
            panic!("expected select");
        };
        assert!(select.from.is_empty());
        assert_eq!(
            SelectItem::Expr {
                expr: Expr::Literal(Literal::Number("1".to_string())),
                alias: None,
                text: "1".to_string(),
            },
            select.projections[0]
        );
    }
}
