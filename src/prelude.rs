//! Convenience re-exports for common usage patterns.
//!
//! Import everything with:
//!
//! ```
//! use service_rail::prelude::*;
//! ```
//!
//! # What's Included
//!
//! - **Entry point**: [`ServiceValidate`]
//! - **Results**: [`ServiceResult`], [`ValidationResult`], [`ServiceError`], [`ServiceErrorCode`]
//! - **Chains**: [`ServiceValidation`], [`ServiceValidationBuilder`],
//!   [`ChainedServiceValidationBuilder`], [`TransactionalServiceValidationBuilder`],
//!   [`TransactionalEntityChain`]
//! - **Traits**: [`EnsureRules`], [`ConditionalRules`], [`Empty`], [`IntoRuleError`]
//! - **Persistence ports**: [`Repository`], [`EntityRepository`], [`ReadOnlyUnitOfWork`],
//!   [`WritableUnitOfWork`], [`UnitOfWorkProvider`]
//!
//! # Examples
//!
//! ```
//! use service_rail::prelude::*;
//!
//! fn create_equipment(name: &str) -> ServiceResult<String> {
//!     ServiceValidate::of::<String>()
//!         .ensure_not_whitespace(name, "Equipment name is required")
//!         .ensure_max_length(name, 100, "Equipment name is too long")
//!         .on_success(|| name.trim().to_string())
//! }
//!
//! assert!(create_equipment("Barbell").is_success());
//! assert_eq!(
//!     create_equipment(" ").errors().collect::<Vec<_>>(),
//!     vec!["Equipment name is required"]
//! );
//! ```

pub use crate::context::{ContextError, Disposable, DisposeError, DynamicChainContext};
pub use crate::naming::{DataKey, NamingEngine};
pub use crate::persistence::{
    EntityRepository, PersistenceError, PersistenceResult, ReadOnlyUnitOfWork, Repository,
    UnitOfWorkProvider, WritableUnitOfWork,
};
pub use crate::traits::{ConditionalRules, Empty, EnsureRules, IntoRuleError};
pub use crate::transaction::{TransactionalEntityChain, TransactionalServiceValidationBuilder};
pub use crate::types::{RuleError, ServiceError, ServiceErrorCode, ServiceResult, ValidationResult};
pub use crate::validation::{
    ChainedServiceValidationBuilder, PlainValidation, PlainValidationBuilder, ServiceValidate,
    ServiceValidation, ServiceValidationBuilder, ValidationWithData,
};
