//! Unified error handling at the UI boundary.
//!
//! Every storefront and admin operation returns [`AppError`]. The
//! embedding UI shows [`AppError::user_message`]; no failure propagates
//! past this boundary.

use thiserror::Error;

use crate::admin::ImportError;
use crate::store::StoreError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Item store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// Admin operation attempted without an admin session.
    #[error("unauthorized")]
    Unauthorized,

    /// Caller input rejected before any mutation was attempted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Import payload failed schema validation; the catalog is untouched.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message suitable for direct display to the user.
    ///
    /// Transport details stay in the logs. The partial-replace state gets
    /// its own wording: the collection was left empty or partially
    /// restored, and the operator needs to recover it rather than retry.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(StoreError::ReplaceIncomplete {
                inserted, expected, ..
            }) => format!(
                "The catalog was cleared but only {inserted} of {expected} items were restored. \
                 Import the file again or reset to defaults to recover."
            ),
            Self::Store(StoreError::Unavailable(_)) => {
                "The store is unreachable right now. Please try again.".to_string()
            }
            Self::Store(StoreError::NotFound(_)) => "That item no longer exists.".to_string(),
            Self::Store(StoreError::Validation(msg)) | Self::Validation(msg) => msg.clone(),
            Self::NotSignedIn => "Please sign in first.".to_string(),
            Self::Unauthorized => "This action needs an admin account.".to_string(),
            Self::Import(err) => err.to_string(),
            Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use crafty_spinx_core::ItemId;

    use super::*;

    #[test]
    fn test_partial_replace_message_is_distinct() {
        let partial = AppError::Store(StoreError::ReplaceIncomplete {
            inserted: 3,
            expected: 16,
            source: Box::new(StoreError::Unavailable("connection reset".to_string())),
        });
        let plain = AppError::Store(StoreError::Unavailable("connection reset".to_string()));

        assert!(partial.user_message().contains("3 of 16"));
        assert_ne!(partial.user_message(), plain.user_message());
    }

    #[test]
    fn test_transport_details_do_not_leak() {
        let err = AppError::Store(StoreError::Unavailable(
            "tcp connect error 10.0.0.7:5432".to_string(),
        ));
        assert!(!err.user_message().contains("10.0.0.7"));
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = AppError::Validation("name cannot be empty".to_string());
        assert_eq!(err.user_message(), "name cannot be empty");
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::Store(StoreError::NotFound(ItemId::new(9)));
        assert_eq!(err.user_message(), "That item no longer exists.");
    }
}
