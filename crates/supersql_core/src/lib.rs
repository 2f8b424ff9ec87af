//! In-process SQL execution over host registered virtual tables.
//!
//! Tables are backed by provider callbacks registered on an
//! [`EngineRegistry`]. Statements are evaluated entirely in memory, and
//! mutations are forwarded to host registered sinks.
pub mod cache;
pub mod config;
pub mod engine;
pub mod expr;
pub mod format;
pub mod group;
pub mod join;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod row;
pub mod sort;
pub mod source;
pub mod value;

pub use config::EngineConfig;
pub use engine::{QueryOutput, execute, execute_script, execute_statement};
pub use registry::EngineRegistry;
pub use row::{RawRow, Row, Table};
pub use supersql_error::{ErrorKind, Result, SuperSqlError};
pub use value::Value;
