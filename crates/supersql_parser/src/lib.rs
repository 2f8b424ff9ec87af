//! SQL parser for the MySQL flavored dialect supersql accepts.
pub mod ast;
pub mod keywords;
pub mod parser;
pub mod statement;
pub mod tokens;

pub use parser::{parse, parse_one};
