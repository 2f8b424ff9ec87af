//! Errors shared by every supersql crate.
use std::fmt;

pub type Result<T, E = SuperSqlError> = std::result::Result<T, E>;

/// The statement kind that needed a host callback for some table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Select => "SELECT FROM",
            Operation::Insert => "INSERT INTO",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE FROM",
            Operation::Truncate => "TRUNCATE TABLE",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SuperSqlError {
    /// No provider or sink registered for the table.
    #[error("{operation} is not defined for table '{table}'")]
    UndefinedTable { operation: Operation, table: String },

    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("Column '{0}' is ambiguous")]
    AmbiguousColumn(String),

    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    #[error("Table or alias '{0}' does not exist")]
    UnknownTableOrAlias(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Column list length ({columns}) doesn't match value list length ({values})")]
    ArityMismatch { columns: usize, values: usize },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Parse error at offset {offset}: {message}")]
    Parse { message: String, offset: usize },

    /// Placeholder substitution failed.
    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(String),

    /// A host supplied callback (provider, sink, augmenter) failed.
    #[error("{0}")]
    Callback(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Payload-free discriminant of [`SuperSqlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UndefinedTable,
    UnknownColumn,
    AmbiguousColumn,
    UnknownAlias,
    UnknownTableOrAlias,
    UnsupportedExpression,
    ArityMismatch,
    UnknownFunction,
    Parse,
    ParameterMismatch,
    Callback,
    Io,
    Json,
}

impl SuperSqlError {
    pub fn undefined_table(operation: Operation, table: impl Into<String>) -> Self {
        SuperSqlError::UndefinedTable {
            operation,
            table: table.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        SuperSqlError::UnsupportedExpression(msg.into())
    }

    pub fn parse(msg: impl Into<String>, offset: usize) -> Self {
        SuperSqlError::Parse {
            message: msg.into(),
            offset,
        }
    }

    /// Error for host callbacks to return.
    pub fn callback(msg: impl Into<String>) -> Self {
        SuperSqlError::Callback(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SuperSqlError::UndefinedTable { .. } => ErrorKind::UndefinedTable,
            SuperSqlError::UnknownColumn(_) => ErrorKind::UnknownColumn,
            SuperSqlError::AmbiguousColumn(_) => ErrorKind::AmbiguousColumn,
            SuperSqlError::UnknownAlias(_) => ErrorKind::UnknownAlias,
            SuperSqlError::UnknownTableOrAlias(_) => ErrorKind::UnknownTableOrAlias,
            SuperSqlError::UnsupportedExpression(_) => ErrorKind::UnsupportedExpression,
            SuperSqlError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            SuperSqlError::UnknownFunction(_) => ErrorKind::UnknownFunction,
            SuperSqlError::Parse { .. } => ErrorKind::Parse,
            SuperSqlError::ParameterMismatch(_) => ErrorKind::ParameterMismatch,
            SuperSqlError::Callback(_) => ErrorKind::Callback,
            SuperSqlError::Io(_) => ErrorKind::Io,
            SuperSqlError::Json(_) => ErrorKind::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_table_message_names_operation() {
        let err = SuperSqlError::undefined_table(Operation::Insert, "car");
        assert_eq!("INSERT INTO is not defined for table 'car'", err.to_string());
        assert_eq!(ErrorKind::UndefinedTable, err.kind());
    }

    #[test]
    fn io_errors_convert() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert_eq!(ErrorKind::Io, open().unwrap_err().kind());
    }
}
