//! Result and error types shared by every chain.
//!
//! # Examples
//!
//! ```
//! use service_rail::types::{ServiceError, ServiceErrorCode, ServiceResult};
//!
//! let result: ServiceResult<String> =
//!     ServiceResult::failure(String::new(), ServiceError::not_found("Equipment"));
//!
//! assert!(result.is_failure());
//! assert_eq!(result.first_error().map(|e| e.code()), Some(ServiceErrorCode::NotFound));
//! ```
use smallvec::SmallVec;

pub mod accumulator;
pub mod rule_error;
pub mod service_error;
pub mod service_result;
pub mod validation_result;

pub use accumulator::ErrorAccumulator;
pub use rule_error::RuleError;
pub use service_error::{
    ServiceError, ServiceErrorCode, OPERATION_FAILED, TRANSACTION_FAILED, VALIDATION_FAILED,
};
pub use service_result::ServiceResult;
pub use validation_result::ValidationResult;

/// SmallVec-backed collection used for accumulating errors.
///
/// Uses inline storage for a single element; most failing chains record one error.
pub type ErrorVec<E> = SmallVec<[E; 1]>;
