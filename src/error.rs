//! Error types for chardev.

use thiserror::Error;

/// Main error type for chardev operations.
#[derive(Error, Debug)]
pub enum ChardevError {
    /// Write payload meets or exceeds the buffer capacity.
    ///
    /// The bound is strict: a payload of `capacity - 1` bytes is the
    /// largest accepted write. There is no partial write; the caller
    /// must shrink the payload and retry.
    #[error("payload too large: {len} bytes (capacity {capacity})")]
    TooLarge { len: usize, capacity: usize },

    /// A load-time registration step failed.
    ///
    /// Steps completed before the failure have already been rolled back;
    /// the device never became visible.
    #[error("registration failed at {stage:?} stage")]
    RegistrationFailed {
        stage: crate::device::RegistrationStage,
        #[source]
        source: crate::device::RegistrarError,
    },

    /// Copying bytes in or out of the device buffer failed.
    #[error("access fault: {0}")]
    AccessFault(String),

    /// Session with the given ID was not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type for chardev operations.
pub type Result<T> = std::result::Result<T, ChardevError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{RegistrarError, RegistrationStage};

    #[test]
    fn test_too_large_display() {
        let err = ChardevError::TooLarge {
            len: 300,
            capacity: 256,
        };
        assert!(err.to_string().contains("300"));
        assert!(err.to_string().contains("256"));
    }

    #[test]
    fn test_session_not_found_display() {
        let err = ChardevError::SessionNotFound("sess-00000001".into());
        assert!(err.to_string().contains("sess-00000001"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_registration_failed_display() {
        let err = ChardevError::RegistrationFailed {
            stage: RegistrationStage::Node,
            source: RegistrarError::NameInUse("chardev".into()),
        };
        assert!(err.to_string().contains("Node"));
    }

    #[test]
    fn test_registration_failed_source() {
        use std::error::Error;

        let err = ChardevError::RegistrationFailed {
            stage: RegistrationStage::Class,
            source: RegistrarError::NameInUse("char_class".into()),
        };
        let source = err.source().expect("registrar error attached");
        assert!(source.to_string().contains("char_class"));
    }

    #[test]
    fn test_access_fault_display() {
        let err = ChardevError::AccessFault("buffer lock poisoned".into());
        assert!(err.to_string().contains("access fault"));
        assert!(err.to_string().contains("poisoned"));
    }
}
