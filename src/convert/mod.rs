//! Conversion helpers between `Result`, [`ServiceResult`] and [`ValidationResult`].
//!
//! These adapters let service code built on plain `Result`s feed a chain, and
//! let chain outcomes be handed to code that expects a `Result`.
//!
//! # Examples
//!
//! ```
//! use service_rail::convert::*;
//! use service_rail::types::{ServiceError, ServiceResult};
//!
//! let result: Result<String, ServiceError> = Err(ServiceError::not_found("Exercise"));
//! let service = result_to_service_result(result);
//! assert!(service.is_failure());
//! assert_eq!(service.value(), "");
//!
//! let validation = service_result_to_validation_result(&service);
//! assert_eq!(validation.errors(), ["Exercise not found"]);
//! ```

use crate::traits::Empty;
use crate::types::{ErrorVec, ServiceError, ServiceResult, ValidationResult};

/// Converts a `Result` into a [`ServiceResult`], using the empty sentinel on error.
///
/// # Examples
///
/// ```
/// use service_rail::convert::result_to_service_result;
/// use service_rail::types::ServiceError;
///
/// let ok: Result<u32, ServiceError> = Ok(7);
/// assert_eq!(*result_to_service_result(ok).value(), 7);
/// ```
#[inline]
pub fn result_to_service_result<T, E>(result: Result<T, E>) -> ServiceResult<T>
where
    T: Empty,
    E: Into<ServiceError>,
{
    match result {
        Ok(value) => ServiceResult::success(value),
        Err(error) => ServiceResult::failure(T::empty(), error.into()),
    }
}

/// Converts a [`ServiceResult`] into a `Result`, dropping the sentinel of a failure.
#[inline]
pub fn service_result_to_result<T>(result: ServiceResult<T>) -> Result<T, ErrorVec<ServiceError>> {
    result.into_result()
}

/// Converts a [`ServiceResult`] into a `Result` carrying only its first error.
///
/// # Examples
///
/// ```
/// use service_rail::convert::service_result_to_first_error;
/// use service_rail::types::{ServiceError, ServiceErrorCode, ServiceResult};
///
/// let failed = ServiceResult::failure_many(
///     String::new(),
///     [ServiceError::not_found("Exercise"), ServiceError::validation_failed("Name is required")],
/// );
/// let error = service_result_to_first_error(failed).unwrap_err();
/// assert_eq!(error.code(), ServiceErrorCode::NotFound);
/// ```
pub fn service_result_to_first_error<T>(result: ServiceResult<T>) -> Result<T, ServiceError> {
    match result.into_result() {
        Ok(value) => Ok(value),
        Err(errors) => Err(errors
            .into_iter()
            .next()
            .unwrap_or_else(|| ServiceError::validation_failed(crate::types::VALIDATION_FAILED))),
    }
}

/// Projects a [`ServiceResult`] onto a [`ValidationResult`].
///
/// Every message is kept; the first structured error becomes the result's
/// structured error.
pub fn service_result_to_validation_result<T>(result: &ServiceResult<T>) -> ValidationResult {
    if result.is_success() {
        return ValidationResult::success();
    }
    ValidationResult::from_parts(
        result.errors().map(str::to_owned).collect(),
        result.first_error().cloned(),
    )
}

/// Converts a [`ValidationResult`] into a `Result` of its structured errors.
#[inline]
pub fn validation_result_to_result(result: &ValidationResult) -> Result<(), Vec<ServiceError>> {
    if result.is_valid() {
        Ok(())
    } else {
        Err(result.to_service_errors())
    }
}

/// Continues from a [`ValidationResult`]: `factory` runs only when it is valid.
///
/// # Examples
///
/// ```
/// use service_rail::convert::validation_result_to_service_result;
/// use service_rail::types::ValidationResult;
///
/// let failed = ValidationResult::failure(["Name is required"]);
/// let result = validation_result_to_service_result(&failed, || String::from("created"));
/// assert!(result.is_failure());
/// assert_eq!(result.value(), "");
/// ```
pub fn validation_result_to_service_result<T, F>(
    result: &ValidationResult,
    factory: F,
) -> ServiceResult<T>
where
    T: Empty,
    F: FnOnce() -> T,
{
    match validation_result_to_result(result) {
        Ok(()) => ServiceResult::success(factory()),
        Err(errors) => ServiceResult::failure_many(T::empty(), errors),
    }
}

/// Collects `ServiceResult`s into one, accumulating every error.
///
/// Succeeds with all values in order only if every input succeeded.
///
/// # Examples
///
/// ```
/// use service_rail::convert::collect_service_results;
/// use service_rail::types::{ServiceError, ServiceResult};
///
/// let results = vec![
///     ServiceResult::success(1),
///     ServiceResult::failure(0, ServiceError::not_found("Exercise")),
///     ServiceResult::failure(0, ServiceError::not_found("Equipment")),
/// ];
/// let collected = collect_service_results(results);
/// assert!(collected.is_failure());
/// assert_eq!(collected.structured_errors().len(), 2);
/// ```
pub fn collect_service_results<T, I>(results: I) -> ServiceResult<Vec<T>>
where
    I: IntoIterator<Item = ServiceResult<T>>,
{
    let mut values = Vec::new();
    let mut errors = ErrorVec::new();
    for result in results {
        match result.into_result() {
            Ok(value) => values.push(value),
            Err(failed) => errors.extend(failed),
        }
    }
    if errors.is_empty() {
        ServiceResult::success(values)
    } else {
        ServiceResult::failure_many(Vec::new(), errors)
    }
}
