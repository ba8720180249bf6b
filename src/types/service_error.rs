//! Coded service errors.
//!
//! A [`ServiceError`] is the structured unit every chain in this crate reports:
//! a [`ServiceErrorCode`] that upstream layers map onto transport status codes,
//! plus a human-readable message.
//!
//! # Examples
//!
//! ```
//! use service_rail::types::{ServiceError, ServiceErrorCode};
//!
//! let err = ServiceError::not_found("Exercise");
//! assert_eq!(err.code(), ServiceErrorCode::NotFound);
//! assert_eq!(err.message(), "Exercise not found");
//! ```
use core::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fallback message used when a chain fails without a recorded error.
pub const VALIDATION_FAILED: &str = "Validation failed";

/// Fallback message used when an operation fails without a recorded error.
pub const OPERATION_FAILED: &str = "Operation failed";

/// Fallback message used when a transactional entity chain fails without a recorded error.
pub const TRANSACTION_FAILED: &str = "Transaction failed";

/// Kind of failure carried by a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ServiceErrorCode {
    /// A precondition expressed through `ensure*` did not hold.
    ValidationFailed,
    /// An existence check failed.
    NotFound,
    /// A uniqueness check failed.
    AlreadyExists,
    /// An unexpected failure was converted into a soft error.
    InternalError,
    /// An identifier or value did not have the expected shape.
    InvalidFormat,
    Unauthorized,
    InsufficientPermissions,
    ConcurrencyConflict,
    DependencyExists,
    DependencyFailure,
    DuplicateName,
}

impl ServiceErrorCode {
    /// Returns the stable identifier of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "ValidationFailed",
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::InternalError => "InternalError",
            Self::InvalidFormat => "InvalidFormat",
            Self::Unauthorized => "Unauthorized",
            Self::InsufficientPermissions => "InsufficientPermissions",
            Self::ConcurrencyConflict => "ConcurrencyConflict",
            Self::DependencyExists => "DependencyExists",
            Self::DependencyFailure => "DependencyFailure",
            Self::DuplicateName => "DuplicateName",
        }
    }
}

impl Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable coded error produced by validation and transactional chains.
///
/// Equality is by value: two errors are equal when both code and message match.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[error("{message}")]
pub struct ServiceError {
    code: ServiceErrorCode,
    message: String,
}

impl ServiceError {
    /// Creates an error with an explicit code and message.
    #[inline]
    pub fn new<S: Into<String>>(code: ServiceErrorCode, message: S) -> Self {
        Self { code, message: message.into() }
    }

    /// A failed precondition. The message is used verbatim.
    ///
    /// # Examples
    ///
    /// ```
    /// use service_rail::types::{ServiceError, ServiceErrorCode};
    ///
    /// let err = ServiceError::validation_failed("Name is required");
    /// assert_eq!(err.code(), ServiceErrorCode::ValidationFailed);
    /// assert_eq!(err.to_string(), "Name is required");
    /// ```
    #[inline]
    pub fn validation_failed<S: Into<String>>(message: S) -> Self {
        Self::new(ServiceErrorCode::ValidationFailed, message)
    }

    /// `"{entity_name} not found"`.
    #[inline]
    pub fn not_found(entity_name: &str) -> Self {
        Self::new(ServiceErrorCode::NotFound, format!("{entity_name} not found"))
    }

    /// `"{entity_name} with value '{value}' already exists"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use service_rail::types::ServiceError;
    ///
    /// let err = ServiceError::already_exists("Equipment", "Barbell");
    /// assert_eq!(err.message(), "Equipment with value 'Barbell' already exists");
    /// ```
    #[inline]
    pub fn already_exists(entity_name: &str, value: &str) -> Self {
        Self::new(
            ServiceErrorCode::AlreadyExists,
            format!("{entity_name} with value '{value}' already exists"),
        )
    }

    /// An unexpected failure, message used verbatim.
    #[inline]
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::new(ServiceErrorCode::InternalError, message)
    }

    /// `"Invalid {field} format. Expected format: {expected}"`.
    #[inline]
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ServiceErrorCode::InvalidFormat,
            format!("Invalid {field} format. Expected format: {expected}"),
        )
    }

    /// Returns the error code.
    #[inline]
    pub fn code(&self) -> ServiceErrorCode {
        self.code
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the error carries the given code.
    #[inline]
    pub fn is(&self, code: ServiceErrorCode) -> bool {
        self.code == code
    }

    /// Consumes the error, returning its message.
    #[inline]
    pub fn into_message(self) -> String {
        self.message
    }
}
