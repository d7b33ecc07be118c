//! Error types for observable containers.
//!
//! Every fallible operation in the workspace returns [`ObservableError`].
//! Lookup failures mirror what the underlying primitive would report, and
//! observer failures are carried through untouched so callers can recover
//! the error their own callback produced.

use thiserror::Error;

use crate::observable::{ObservableId, Phase};

/// Error type returned by observer callbacks.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by observer callbacks.
pub type ObserverResult = std::result::Result<(), ObserverError>;

/// Errors raised by observable containers.
#[derive(Debug, Error)]
pub enum ObservableError {
    /// An observer handle was removed that was never registered.
    #[error("Observer not registered in the {phase} list")]
    ObserverNotFound {
        /// The list that was searched.
        phase: Phase,
    },

    /// A value was unbound from an observable it was never bound to.
    #[error("Not bound to observable {target}")]
    BindingNotFound {
        /// The observable the binding was expected to point at.
        target: ObservableId,
    },

    /// Binding target is not an observable value of the same type.
    #[error("Type constraint violated: expected {expected}")]
    TypeConstraint {
        /// Name of the type that was expected.
        expected: &'static str,
    },

    /// Index is outside the bounds of a list.
    #[error("Index out of range: {index} (length {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the list at the time of the lookup.
        len: usize,
    },

    /// Key is not present in a dictionary.
    #[error("Key not found: {key}")]
    KeyNotFound {
        /// Debug rendering of the key.
        key: String,
    },

    /// Attribute is not present on an object.
    #[error("Attribute not found: '{name}'")]
    AttributeNotFound {
        /// The attribute name.
        name: String,
    },

    /// Value is not present in a list.
    #[error("Value not found in list")]
    ValueNotFound,

    /// Container is empty.
    #[error("Container is empty")]
    EmptyContainer,

    /// An observer callback failed. Display and source are those of the
    /// callback's own error.
    #[error(transparent)]
    Observer(ObserverError),
}

impl ObservableError {
    /// Build a `KeyNotFound` error from any debuggable key.
    pub fn key_not_found(key: &impl std::fmt::Debug) -> Self {
        ObservableError::KeyNotFound {
            key: format!("{:?}", key),
        }
    }

    /// Check if this error came from an observer callback.
    pub fn is_observer_failure(&self) -> bool {
        matches!(self, ObservableError::Observer(_))
    }

    /// Convert into an error suitable for returning from an observer.
    ///
    /// Observer failures are unwrapped so that an error raised deep inside a
    /// chain of bound values reaches the outermost caller as it was raised.
    pub fn into_observer_error(self) -> ObserverError {
        match self {
            ObservableError::Observer(inner) => inner,
            other => Box::new(other),
        }
    }
}

/// Result type alias for observable operations.
pub type ObservableResult<T> = std::result::Result<T, ObservableError>;
