//! Composable validation chains and transactional service pipelines.
//!
//! Service operations built with this crate validate their input, load and
//! mutate entities through repositories and answer with a uniform
//! [`ServiceResult`](types::ServiceResult). Failures are data: every chain
//! accumulates [`ServiceError`](types::ServiceError)s and hands them to a terminal
//! operation instead of returning early through `?` or panicking.
//!
//! Each submodule re-exports its public surface from here, so consumers can
//! simply depend on `service_rail::prelude::*` or pick focused pieces as needed.
//!
//! # Examples
//!
//! ## Eager Validation
//!
//! ```
//! use service_rail::prelude::*;
//!
//! let result = ServiceValidate::of::<String>()
//!     .ensure_not_whitespace("", "Name is required")
//!     .ensure_email("nobody", "Email is invalid")
//!     .on_success(|| "created".to_string());
//!
//! assert_eq!(
//!     result.errors().collect::<Vec<_>>(),
//!     vec!["Name is required", "Email is invalid"]
//! );
//! ```
//!
//! ## Conditional Validation
//!
//! ```
//! use service_rail::prelude::*;
//!
//! let result = ServiceValidate::plain()
//!     .ensure_not_whitespace("", "Name is required")
//!     .then_ensure(|| unreachable!(), "never evaluated")
//!     .into_validation_result();
//!
//! assert_eq!(result.errors(), ["Name is required"]);
//! ```
//!
//! ## Deferred Async Checks
//!
//! ```
//! use service_rail::prelude::*;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let result = ServiceValidate::build_plain()
//!     .ensure_not_whitespace("Barbell", "Name is required")
//!     .ensure_name_is_unique_async(|| async { true }, "Equipment", "Barbell")
//!     .to_validation_result_async()
//!     .await;
//!
//! assert!(result.is_valid());
//! # });
//! ```

/// Scoped key/value storage shared by chain steps
pub mod context;
/// Conversions between `Result`, `ServiceResult` and `ValidationResult`
pub mod convert;
/// Debugging keys for context entries
pub mod naming;
/// Repository and unit-of-work ports
pub mod persistence;
/// Convenience re-exports for quick starts
pub mod prelude;
/// Capabilities and canned validators shared by every chain
pub mod traits;
/// Chains bound to a writable unit of work
pub mod transaction;
/// Result and error types
pub mod types;
/// Non-transactional validation chains
pub mod validation;

/// Future adapters for asynchronous steps
pub mod async_ext;

pub use context::{ContextError, DynamicChainContext};
pub use naming::NamingEngine;
pub use types::{ErrorVec, ServiceError, ServiceErrorCode, ServiceResult, ValidationResult};
pub use validation::ServiceValidate;
