use std::iter::Peekable;
use std::str::CharIndices;

use supersql_error::{Result, SuperSqlError};

use crate::keywords::{Keyword, keyword_from_str};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(Word),
    /// Quoted string literal, either `'...'` or `"..."`.
    SingleQuotedString(String),
    /// Unparsed number literal.
    Number(String),
    /// Whitespace and comments.
    Whitespace,
    /// `.`
    Period,
    /// `,`
    Comma,
    /// `;`
    SemiColon,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `=`
    Eq,
    /// `==`
    DoubleEq,
    /// `!=` or `<>`
    Neq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl Token {
    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            Token::Word(w) => w.keyword,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub value: String,
    /// Quote character for backtick identifiers.
    pub quote: Option<char>,
    /// Set when the unquoted word is a keyword.
    pub keyword: Option<Keyword>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLocation {
    pub token: Token,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl TokenWithLocation {
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.token.keyword() == Some(kw)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        self.token.keyword()
    }
}

#[derive(Debug)]
pub struct Tokenizer<'a> {
    query: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(query: &'a str) -> Self {
        Tokenizer {
            query,
            chars: query.char_indices().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithLocation>> {
        let mut toks = Vec::new();
        while let Some(&(start, _)) = self.chars.peek() {
            let token = self.next_token(start)?;
            let end = self.pos();
            toks.push(TokenWithLocation { token, start, end });
        }
        Ok(toks)
    }

    /// Current byte offset into the query.
    fn pos(&mut self) -> usize {
        match self.chars.peek() {
            Some(&(idx, _)) => idx,
            None => self.query.len(),
        }
    }

    /// Peek the character after the next one.
    fn peek_second(&self, start: usize) -> Option<char> {
        let mut rest = self.query[start..].chars();
        rest.next();
        rest.next()
    }

    fn next_token(&mut self, start: usize) -> Result<Token> {
        let c = match self.chars.peek() {
            Some(&(_, c)) => c,
            None => return Err(SuperSqlError::parse("Unexpected end of input", start)),
        };

        let tok = match c {
            c if c.is_whitespace() => {
                self.take_while(|c| c.is_whitespace());
                Token::Whitespace
            }
            '-' if self.peek_second(start) == Some('-') => {
                self.take_while(|c| c != '\n');
                Token::Whitespace
            }
            '/' if self.peek_second(start) == Some('*') => {
                self.chars.next();
                self.chars.next();
                let mut prev = '\0';
                loop {
                    match self.chars.next() {
                        Some((_, '/')) if prev == '*' => break,
                        Some((_, c)) => prev = c,
                        None => {
                            return Err(SuperSqlError::parse("Unterminated block comment", start));
                        }
                    }
                }
                Token::Whitespace
            }
            '\'' | '"' => {
                self.chars.next();
                Token::SingleQuotedString(self.quoted(c, start)?)
            }
            '`' => {
                self.chars.next();
                Token::Word(Word {
                    value: self.quoted('`', start)?,
                    quote: Some('`'),
                    keyword: None,
                })
            }
            c if c.is_ascii_digit() => self.number(),
            '.' if self.peek_second(start).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            c if c.is_alphabetic() || c == '_' => {
                let value = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
                let keyword = keyword_from_str(&value);
                Token::Word(Word {
                    value,
                    quote: None,
                    keyword,
                })
            }
            _ => {
                self.chars.next();
                match c {
                    '.' => Token::Period,
                    ',' => Token::Comma,
                    ';' => Token::SemiColon,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Mul,
                    '/' => Token::Div,
                    '%' => Token::Mod,
                    '=' => {
                        if self.next_if('=') {
                            Token::DoubleEq
                        } else {
                            Token::Eq
                        }
                    }
                    '!' => {
                        if self.next_if('=') {
                            Token::Neq
                        } else {
                            return Err(SuperSqlError::parse("Expected '=' after '!'", start));
                        }
                    }
                    '<' => {
                        if self.next_if('=') {
                            Token::LtEq
                        } else if self.next_if('>') {
                            Token::Neq
                        } else {
                            Token::Lt
                        }
                    }
                    '>' => {
                        if self.next_if('=') {
                            Token::GtEq
                        } else {
                            Token::Gt
                        }
                    }
                    other => {
                        return Err(SuperSqlError::parse(
                            format!("Unexpected character '{other}'"),
                            start,
                        ));
                    }
                }
            }
        };

        Ok(tok)
    }

    fn next_if(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut s = String::new();
        while let Some((_, c)) = self.chars.next_if(|&(_, c)| pred(c)) {
            s.push(c);
        }
        s
    }

    fn number(&mut self) -> Token {
        let mut s = self.take_while(|c| c.is_ascii_digit());
        if self.next_if('.') {
            s.push('.');
            s.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }

        // Exponent, only when digits follow.
        if let Some(&(idx, c)) = self.chars.peek() {
            if c == 'e' || c == 'E' {
                let rest = &self.query[idx + 1..];
                let digits_at = if rest.starts_with('+') || rest.starts_with('-') {
                    1
                } else {
                    0
                };
                if rest[digits_at..].starts_with(|c: char| c.is_ascii_digit()) {
                    self.chars.next();
                    s.push(c);
                    if digits_at == 1 {
                        if let Some((_, sign)) = self.chars.next() {
                            s.push(sign);
                        }
                    }
                    s.push_str(&self.take_while(|c| c.is_ascii_digit()));
                }
            }
        }

        Token::Number(s)
    }

    /// Read the body of a quoted string. Opening quote already consumed.
    ///
    /// A doubled quote character produces a single quote. Backslash escapes
    /// the next character.
    fn quoted(&mut self, quote: char, start: usize) -> Result<String> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => {
                    if self.next_if(quote) {
                        s.push(quote);
                    } else {
                        return Ok(s);
                    }
                }
                Some((_, '\\')) if quote != '`' => match self.chars.next() {
                    Some((_, 'n')) => s.push('\n'),
                    Some((_, 't')) => s.push('\t'),
                    Some((_, 'r')) => s.push('\r'),
                    Some((_, '0')) => s.push('\0'),
                    Some((_, c)) => s.push(c),
                    None => break,
                },
                Some((_, c)) => s.push(c),
                None => break,
            }
        }
        Err(SuperSqlError::parse("Unterminated quoted string", start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<Token> {
        Tokenizer::new(s)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .filter(|t| t != &Token::Whitespace)
            .collect()
    }

    fn word(s: &str, keyword: Option<Keyword>) -> Token {
        Token::Word(Word {
            value: s.to_string(),
            quote: None,
            keyword,
        })
    }

    #[test]
    fn simple_select() {
        let toks = tokens("select a, 1.5 from t where b <> 'x'");
        let expected = vec![
            word("select", Some(Keyword::SELECT)),
            word("a", None),
            Token::Comma,
            Token::Number("1.5".to_string()),
            word("from", Some(Keyword::FROM)),
            word("t", None),
            word("where", Some(Keyword::WHERE)),
            word("b", None),
            Token::Neq,
            Token::SingleQuotedString("x".to_string()),
        ];
        assert_eq!(expected, toks);
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(
            vec![Token::SingleQuotedString("it's".to_string())],
            tokens("'it''s'")
        );
        assert_eq!(
            vec![Token::SingleQuotedString("say \"hi\"".to_string())],
            tokens(r#""say \"hi\"""#)
        );
    }

    #[test]
    fn comments_are_whitespace() {
        let toks = tokens("a -- trailing\n/* block */ b");
        assert_eq!(vec![word("a", None), word("b", None)], toks);
    }

    #[test]
    fn backtick_identifier_is_never_keyword() {
        let toks = tokens("`select`");
        assert_eq!(
            vec![Token::Word(Word {
                value: "select".to_string(),
                quote: Some('`'),
                keyword: None,
            })],
            toks
        );
    }

    #[test]
    fn operators() {
        let toks = tokens("= == != <> < <= > >= + - * / %");
        let expected = vec![
            Token::Eq,
            Token::DoubleEq,
            Token::Neq,
            Token::Neq,
            Token::Lt,
            Token::LtEq,
            Token::Gt,
            Token::GtEq,
            Token::Plus,
            Token::Minus,
            Token::Mul,
            Token::Div,
            Token::Mod,
        ];
        assert_eq!(expected, toks);
    }

    #[test]
    fn number_exponent_and_period() {
        assert_eq!(vec![Token::Number("1e-3".to_string())], tokens("1e-3"));
        assert_eq!(
            vec![word("t", None), Token::Period, word("id", None)],
            tokens("t.id")
        );
        assert_eq!(vec![Token::Number(".5".to_string())], tokens(".5"));
    }

    #[test]
    fn offsets_are_recorded() {
        let toks = Tokenizer::new("ab  cd").tokenize().unwrap();
        assert_eq!((0, 2), (toks[0].start, toks[0].end));
        assert_eq!((4, 6), (toks[2].start, toks[2].end));
    }

    #[test]
    fn unterminated_string_errors() {
        let err = Tokenizer::new("select 'abc").tokenize().unwrap_err();
        assert!(matches!(err, SuperSqlError::Parse { offset: 7, .. }));
    }
}
