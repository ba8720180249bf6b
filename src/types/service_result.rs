//! The uniform return type of service operations.
use crate::types::service_error::{ServiceError, VALIDATION_FAILED};
use crate::types::ErrorVec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Success-with-value or failure-with-errors.
///
/// A failure still carries a value: the caller-supplied *empty* sentinel, so
/// consumers never observe a missing value. Exactly one of the two states holds:
/// a success has no errors, a failure has at least one.
///
/// # Examples
///
/// ```
/// use service_rail::types::{ServiceError, ServiceResult};
///
/// let ok = ServiceResult::success(42);
/// assert!(ok.is_success());
/// assert_eq!(*ok.value(), 42);
///
/// let failed = ServiceResult::failure(0, ServiceError::not_found("Exercise"));
/// assert!(failed.is_failure());
/// assert_eq!(failed.errors().collect::<Vec<_>>(), vec!["Exercise not found"]);
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServiceResult<T> {
    value: T,
    errors: ErrorVec<ServiceError>,
}

impl<T> ServiceResult<T> {
    /// Creates a successful result.
    #[inline]
    pub fn success(value: T) -> Self {
        Self { value, errors: ErrorVec::new() }
    }

    /// Creates a failed result with a single error.
    #[inline]
    pub fn failure(empty: T, error: ServiceError) -> Self {
        let mut errors = ErrorVec::new();
        errors.push(error);
        Self { value: empty, errors }
    }

    /// Creates a failed result from several errors, preserving their order.
    ///
    /// An empty iterator still produces a failure, carrying a generic
    /// `ValidationFailed` error.
    pub fn failure_many<I>(empty: T, errors: I) -> Self
    where
        I: IntoIterator<Item = ServiceError>,
    {
        let mut errors: ErrorVec<ServiceError> = errors.into_iter().collect();
        if errors.is_empty() {
            errors.push(ServiceError::validation_failed(VALIDATION_FAILED));
        }
        Self { value: empty, errors }
    }

    /// Creates a failed result from plain messages; each becomes a `ValidationFailed` error.
    pub fn failure_messages<I, S>(empty: T, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::failure_many(empty, messages.into_iter().map(ServiceError::validation_failed))
    }

    /// Returns `true` for a success.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` for a failure.
    #[inline]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The success value, or the empty sentinel of a failure.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the result, returning the success value or the empty sentinel.
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Error messages in recording order.
    #[inline]
    pub fn errors(&self) -> impl Iterator<Item = &str> + '_ {
        self.errors.iter().map(ServiceError::message)
    }

    /// Structured errors in recording order.
    #[inline]
    pub fn structured_errors(&self) -> &[ServiceError] {
        &self.errors
    }

    /// The first recorded error, if any.
    #[inline]
    pub fn first_error(&self) -> Option<&ServiceError> {
        self.errors.first()
    }

    /// Splits the result into its value and errors.
    #[inline]
    pub fn into_parts(self) -> (T, ErrorVec<ServiceError>) {
        (self.value, self.errors)
    }

    /// Converts into a `Result`, dropping the sentinel of a failure.
    #[inline]
    pub fn into_result(self) -> Result<T, ErrorVec<ServiceError>> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(self.errors)
        }
    }
}
