// Error type for the Payload adapter.
//
// Store-facing failures are wrapped with operation/model/collection context
// before propagating; configuration defects surface as `Config` and are not
// recoverable at runtime.

/// Unified error type for adapter and generator operations.
#[derive(Debug, thiserror::Error)]
pub enum PayloadAuthError {
    /// Configuration or schema defect (unknown model, bad field mapping).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The store's not-found signal for point lookups. Operations that
    /// expect absence (find_one, delete) normalize this to a non-error.
    #[error("Document not found")]
    NotFound,

    /// A store operation failed. Carries the failing operation and the
    /// model/collection it ran against.
    #[error("{operation} failed on model '{model}' (collection '{collection}'): {source}")]
    Store {
        operation: &'static str,
        model: String,
        collection: String,
        #[source]
        source: Box<PayloadAuthError>,
    },

    /// Raw store-level failure (validation, constraint, connectivity).
    #[error("Store error: {0}")]
    Database(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl PayloadAuthError {
    /// Whether this error is (or wraps) the store's not-found signal.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound => true,
            Self::Store { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Wrap a store error with operation context.
    pub fn in_operation(
        self,
        operation: &'static str,
        model: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self::Store {
            operation,
            model: model.into(),
            collection: collection.into(),
            source: Box::new(self),
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, PayloadAuthError>;
