//! Validation chains that accumulate failures and terminate in a
//! [`ServiceResult`](crate::types::ServiceResult) or a
//! [`ValidationResult`](crate::types::ValidationResult).
//!
//! # Key Components
//!
//! - [`ServiceValidation`] - eager accumulator of synchronous rules
//! - [`ValidationWithData`] - a validation carrying loaded data
//! - [`ServiceValidationBuilder`] - synchronous rules plus deferred async checks
//! - [`ChainedServiceValidationBuilder`] - data-carrying pipeline over a builder
//! - [`ServiceValidate`] - entry points for all of the above
//!
//! # Examples
//!
//! ```
//! use service_rail::prelude::*;
//!
//! let result = ServiceValidate::plain()
//!     .ensure_not_whitespace("  ", "Name is required")
//!     .ensure_email("not-an-email", "Email is invalid")
//!     .into_validation_result();
//!
//! assert!(!result.is_valid());
//! assert_eq!(result.errors(), ["Name is required", "Email is invalid"]);
//! ```
pub mod builder;
pub mod chained;
pub mod core;
pub mod with_data;

pub use self::builder::{PlainValidationBuilder, ServiceValidationBuilder};
pub use self::chained::{ChainLink, ChainedServiceValidationBuilder};
pub use self::core::{PlainValidation, ServiceValidation};
pub use self::with_data::ValidationWithData;

use crate::persistence::UnitOfWorkProvider;
use crate::transaction::TransactionalServiceValidationBuilder;

/// Entry points for every validation chain.
#[derive(Debug, Clone, Copy)]
pub struct ServiceValidate;

impl ServiceValidate {
    /// Eager validation terminating in a `ServiceResult<T>`.
    #[inline]
    pub fn of<T>() -> ServiceValidation<T> {
        ServiceValidation::new()
    }

    /// Validation with deferred async checks terminating in a `ServiceResult<T>`.
    #[inline]
    pub fn build<'a, T>() -> ServiceValidationBuilder<'a, T> {
        ServiceValidationBuilder::new()
    }

    /// Eager validation terminating in a `ValidationResult`.
    #[inline]
    pub fn plain() -> PlainValidation {
        ServiceValidation::new()
    }

    /// Deferred validation terminating in a `ValidationResult`.
    #[inline]
    pub fn build_plain<'a>() -> PlainValidationBuilder<'a> {
        ServiceValidationBuilder::new()
    }

    /// Transactional chain drawing units of work from `provider`.
    #[inline]
    pub fn transaction<P: UnitOfWorkProvider, T>(
        provider: P,
    ) -> TransactionalServiceValidationBuilder<P, T> {
        TransactionalServiceValidationBuilder::new(provider)
    }
}
