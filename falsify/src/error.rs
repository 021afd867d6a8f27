//! Error and signal types shared by the runners.

use std::any::Any;
use std::fmt;

/// Outcome signals and failures raised by properties, generators, and the
/// runner itself.
///
/// The first four variants are control-flow signals: a property body raises
/// them through the assertion macros (as panic payloads) and the runner
/// recovers them at its boundary. `Unexpected` and `Exhausted` are terminal
/// for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// An assertion macro fired inside the property body.
    AssertFailed {
        file: &'static str,
        line: u32,
        message: String,
    },

    /// The property predicate returned `false`.
    Falsified,

    /// The iteration should be skipped and redrawn.
    Discard,

    /// The iteration passes unconditionally.
    Success,

    /// A panic that was not one of our signals; reported verbatim and never
    /// shrunk.
    Unexpected(String),

    /// A retry cap was hit (discards, filtered draws, set element draws).
    Exhausted {
        what: &'static str,
        attempts: u32,
        limit: u32,
    },
}

impl PropertyError {
    /// Create an assertion failure carrying its source location.
    pub fn assert_failed(file: &'static str, line: u32, message: impl Into<String>) -> Self {
        PropertyError::AssertFailed {
            file,
            line,
            message: message.into(),
        }
    }

    /// Create an exhaustion failure for the named retry cap.
    pub fn exhausted(what: &'static str, attempts: u32, limit: u32) -> Self {
        PropertyError::Exhausted {
            what,
            attempts,
            limit,
        }
    }

    /// Whether this value describes a failing run (as opposed to a
    /// control-flow signal).
    pub fn is_failure(&self) -> bool {
        match self {
            PropertyError::AssertFailed { .. }
            | PropertyError::Falsified
            | PropertyError::Unexpected(_)
            | PropertyError::Exhausted { .. } => true,
            PropertyError::Discard | PropertyError::Success => false,
        }
    }
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::AssertFailed {
                file,
                line,
                message,
            } => {
                write!(f, "{} ({}:{})", message, file, line)
            }
            PropertyError::Falsified => write!(f, "property returned false"),
            PropertyError::Discard => write!(f, "iteration discarded"),
            PropertyError::Success => write!(f, "iteration passed unconditionally"),
            PropertyError::Unexpected(message) => write!(f, "unexpected error: {}", message),
            PropertyError::Exhausted {
                what,
                attempts,
                limit,
            } => {
                write!(f, "exhausted after {} {} (limit: {})", attempts, what, limit)
            }
        }
    }
}

impl std::error::Error for PropertyError {}

/// Recover a `PropertyError` from a caught panic payload.
///
/// Assertion macros and generator caps panic with a `PropertyError` payload;
/// anything else becomes `Unexpected` with the panic message when one can be
/// extracted.
pub fn classify_panic(payload: Box<dyn Any + Send>) -> PropertyError {
    match payload.downcast::<PropertyError>() {
        Ok(error) => *error,
        Err(payload) => match payload.downcast::<String>() {
            Ok(message) => PropertyError::Unexpected(*message),
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => PropertyError::Unexpected((*message).to_string()),
                Err(_) => PropertyError::Unexpected("panic with non-string payload".to_string()),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let error = PropertyError::assert_failed("prop.rs", 17, "a == b");
        assert_eq!(format!("{}", error), "a == b (prop.rs:17)");
    }

    #[test]
    fn display_exhausted() {
        let error = PropertyError::exhausted("discards", 1000, 1000);
        assert_eq!(
            format!("{}", error),
            "exhausted after 1000 discards (limit: 1000)"
        );
    }

    #[test]
    fn signals_are_not_failures() {
        assert!(!PropertyError::Discard.is_failure());
        assert!(!PropertyError::Success.is_failure());
        assert!(PropertyError::Falsified.is_failure());
        assert!(PropertyError::Unexpected("boom".to_string()).is_failure());
    }

    #[test]
    fn classify_recovers_signal_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(PropertyError::Discard);
        assert_eq!(classify_panic(payload), PropertyError::Discard);

        let payload: Box<dyn Any + Send> = Box::new("plain panic");
        assert_eq!(
            classify_panic(payload),
            PropertyError::Unexpected("plain panic".to_string())
        );
    }
}
