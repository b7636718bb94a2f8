//! Error types for wallet operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`WalletError`].
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors that can occur during wallet operations.
///
/// Every variant maps to a stable wire code (see [`WalletError::code`]) so a
/// host application can branch on failures without parsing messages.
#[derive(Debug, Error)]
pub enum WalletError {
    /// A required argument was missing or had the wrong type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The pass file does not exist or is not a regular file.
    #[error("file does not exist: {0}")]
    FileNotFound(String),

    /// The pass file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    FileReadError {
        /// Path that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Downloading a pass failed at the transport or HTTP level.
    #[error("download failed: {0}")]
    DownloadError(String),

    /// The download succeeded but carried no body.
    #[error("no data received from {0}")]
    NoData(String),

    /// The platform rejected the pass content.
    #[error("invalid pass format: {0}")]
    InvalidPassFormat(String),

    /// The pass is already stored in the wallet.
    #[error("pass already exists in wallet: {0}")]
    PassAlreadyExists(String),

    /// The platform declined to show the add-pass UI.
    #[error("cannot present add-pass UI: {0}")]
    CannotPresent(String),

    /// No stored pass matches the serial number.
    #[error("pass not found: {0}")]
    PassNotFound(String),

    /// The platform exposes no view URL for the pass.
    #[error("no view URL available for pass: {0}")]
    NoViewUrl(String),

    /// Another add-flow is already in flight.
    #[error("an add-pass flow is already in progress")]
    AddInProgress,

    /// The requested operation is not implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The add-flow was abandoned before the user answered.
    #[error("operation cancelled")]
    Cancelled,

    /// Backend operation failed with context.
    #[error("{backend}: {operation} {item}: {source}")]
    BackendOperation {
        /// Backend name
        backend: String,
        /// Operation name (list, parse, present, etc.)
        operation: String,
        /// Subject of the operation (serial number, path, ...)
        item: String,
        /// Underlying error
        #[source]
        source: Box<WalletError>,
    },

    /// Failure reported by a platform bridge.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WalletError {
    /// Creates a backend operation error with context.
    ///
    /// # Example
    ///
    /// ```
    /// use walletmux::WalletError;
    ///
    /// let err = WalletError::PassNotFound("ABC123".to_string());
    /// let wrapped = WalletError::backend_op("passkit", "view", "ABC123", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "passkit: view ABC123: pass not found: ABC123"
    /// );
    /// assert_eq!(wrapped.code(), "PASS_NOT_FOUND");
    /// ```
    pub fn backend_op(
        backend: impl Into<String>,
        operation: impl Into<String>,
        item: impl Into<String>,
        err: WalletError,
    ) -> Self {
        Self::BackendOperation {
            backend: backend.into(),
            operation: operation.into(),
            item: item.into(),
            source: Box::new(err),
        }
    }

    /// Returns the stable wire code for this error.
    ///
    /// Context wrappers report the code of the error they wrap.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::FileReadError { .. } => "FILE_READ_ERROR",
            Self::DownloadError(_) => "DOWNLOAD_ERROR",
            Self::NoData(_) => "NO_DATA",
            Self::InvalidPassFormat(_) => "INVALID_PASS_FORMAT",
            Self::PassAlreadyExists(_) => "PASS_ALREADY_EXISTS",
            Self::CannotPresent(_) => "CANNOT_PRESENT",
            Self::PassNotFound(_) => "PASS_NOT_FOUND",
            Self::NoViewUrl(_) => "NO_VIEW_URL",
            Self::AddInProgress => "ADD_IN_PROGRESS",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::Cancelled => "CANCELLED",
            Self::BackendOperation { source, .. } => source.code(),
            Self::Other(_) => "PLATFORM_ERROR",
        }
    }

    /// Converts this error into the payload handed back to the host.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Error shape returned across the host boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable error code (e.g. `FILE_NOT_FOUND`)
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl From<WalletError> for ErrorPayload {
    fn from(err: WalletError) -> Self {
        err.to_payload()
    }
}
