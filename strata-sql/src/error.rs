use strata::error::StrataError;
use thiserror::Error;

use crate::dialect::DialectKind;

/// Errors raised while lowering a provider tree to SQL or translating it to text.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlError {
    /// The target dialect has no way to express a construct.
    #[error("{construct} is not supported by {dialect}")]
    Unsupported {
        dialect: DialectKind,
        construct: String,
    },
    #[error("malformed sql tree: {0}")]
    Malformed(String),
    /// A literal read back from SQL text is not valid for its type.
    #[error("can't read {dialect} literal {text:?}: {message}")]
    Literal {
        dialect: DialectKind,
        text: String,
        message: String,
    },
    #[error(transparent)]
    Core(#[from] StrataError),
}

pub type SqlResult<T> = Result<T, SqlError>;

impl SqlError {
    pub fn unsupported<S: Into<String>>(dialect: DialectKind, construct: S) -> Self {
        SqlError::Unsupported {
            dialect,
            construct: construct.into(),
        }
    }

    pub fn literal<T: Into<String>, M: Into<String>>(
        dialect: DialectKind,
        text: T,
        message: M,
    ) -> Self {
        SqlError::Literal {
            dialect,
            text: text.into(),
            message: message.into(),
        }
    }
}
