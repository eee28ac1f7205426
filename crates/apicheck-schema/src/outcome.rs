//! Result of one validation call.
//!
//! Validation never returns an error to its caller. The three things that
//! can happen are folded into [`ValidationOutcome`], which also converts to
//! the `(is_valid, message)` pair test collaborators expect:
//!
//! | Outcome | Pair |
//! |---|---|
//! | schema found, body conforms | `(true, None)` |
//! | no schema for the key | `(true, Some("schema not found: …"))` |
//! | schema found, body violates it (or the schema is broken) | `(false, Some(…))` |

use std::fmt;

use crate::validate::Violation;

/// Outcome of validating one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// A schema was found and the body conforms to it.
    Passed,
    /// No schema covers this call. Not a failure.
    Skipped { message: String },
    /// The body does not conform, or the schema could not be applied.
    Failed {
        message: String,
        /// Empty when the schema itself was at fault.
        violations: Vec<Violation>,
    },
}

impl ValidationOutcome {
    /// `false` only for [`Failed`](Self::Failed).
    pub fn is_valid(&self) -> bool {
        !self.is_failed()
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Diagnostic text; `None` only for [`Passed`](Self::Passed).
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Skipped { message } | Self::Failed { message, .. } => Some(message),
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Failed { violations, .. } => violations,
            _ => &[],
        }
    }

    /// The `(is_valid, message)` pair.
    pub fn into_pair(self) -> (bool, Option<String>) {
        match self {
            Self::Passed => (true, None),
            Self::Skipped { message } => (true, Some(message)),
            Self::Failed { message, .. } => (false, Some(message)),
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Skipped { message } => write!(f, "skipped: {message}"),
            Self::Failed { message, .. } => write!(f, "failed: {message}"),
        }
    }
}
