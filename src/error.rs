use crate::types::Type;

/// Errors reported by the expression manager.
///
/// `InvalidField` and `TypeMismatch` mean the API was used wrong while building
/// an expression. `InternalInvariant` means a transformation reached a state
/// its own invariants rule out, i.e. a bug in the library.
///
/// Types are carried as their rendering so the error is `Send + Sync`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid field '{field}' for object type '{object}'")]
    InvalidField { object: String, field: String },

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    #[error("no value assigned to arbitrary '{0}'")]
    UnassignedArbitrary(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl Error {
    pub(crate) fn mismatch(context: &'static str, expected: impl ToString, found: &Type) -> Self {
        Error::TypeMismatch {
            context,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidField { .. } | Error::TypeMismatch { .. } | Error::UnassignedArbitrary(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::IntType;

    fn assert_send_sync<T: Send + Sync + 'static>() {}

    #[test]
    fn test_error_is_thread_safe() {
        assert_send_sync::<Error>();
    }

    #[test]
    fn test_mismatch_message() {
        let err = Error::mismatch("sum", "integer", &Type::list(Type::Int(IntType::U8)));
        assert_eq!(err.to_string(), "type mismatch in sum: expected integer, found list<u8>");
        assert!(err.is_usage_error());
        assert!(!Error::InternalInvariant("x".to_string()).is_usage_error());
    }
}
