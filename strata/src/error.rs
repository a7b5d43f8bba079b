use crate::operator::ProviderKind;
use crate::utils::NodePath;
use thiserror::Error;

/// Errors raised while building or rewriting a provider tree.
///
/// None of these are recoverable inside the compiler: rewriting is a pure function of its
/// input, so retrying produces the same failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrataError {
    /// A rewrite produced a tree whose column bookkeeping is inconsistent, e.g. a parent
    /// demanded a column its child no longer produces.
    #[error("invariant violated in {kind} at {path}: {message}")]
    InvariantViolation {
        kind: ProviderKind,
        path: NodePath,
        message: String,
    },
    /// An order-sensitive consumer can't be given the order it depends on.
    #[error("ordering of {kind} at {path} can't be preserved: {message}")]
    OrderingViolation {
        kind: ProviderKind,
        path: NodePath,
        message: String,
    },
    /// An operator was constructed with inconsistent arity or column references.
    #[error("malformed {kind}: {message}")]
    Malformed { kind: ProviderKind, message: String },
}

pub type StrataResult<T> = Result<T, StrataError>;

impl StrataError {
    pub fn malformed<S: Into<String>>(kind: ProviderKind, message: S) -> Self {
        StrataError::Malformed {
            kind,
            message: message.into(),
        }
    }

    pub fn invariant<S: Into<String>>(kind: ProviderKind, path: &NodePath, message: S) -> Self {
        StrataError::InvariantViolation {
            kind,
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn ordering<S: Into<String>>(kind: ProviderKind, path: &NodePath, message: S) -> Self {
        StrataError::OrderingViolation {
            kind,
            path: path.clone(),
            message: message.into(),
        }
    }
}

/// Bails out of the current function with a [`StrataError::Malformed`].
#[macro_export]
macro_rules! malformed {
    ($kind:expr, $($arg:tt)*) => {
        return Err($crate::error::StrataError::malformed($kind, format!($($arg)*)))
    };
}
