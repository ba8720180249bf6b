//! Conversion of rule failures into [`RuleError`].
//!
//! Every `ensure*` operation accepts either a plain message or a structured
//! [`ServiceError`]. This trait is the seam that lets one method take both.
//!
//! # Examples
//!
//! ```
//! use service_rail::traits::IntoRuleError;
//! use service_rail::types::{RuleError, ServiceError};
//!
//! assert_eq!("Name is required".into_rule_error().message(), "Name is required");
//!
//! let structured = ServiceError::not_found("Exercise").into_rule_error();
//! assert!(matches!(structured, RuleError::Service(_)));
//! ```
use crate::types::rule_error::RuleError;
use crate::types::service_error::ServiceError;

/// Converts a value into the failure recorded by a validation rule.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a validation error",
    label = "this type does not implement `IntoRuleError`",
    note = "pass a message (`&str` or `String`) or a `ServiceError`"
)]
pub trait IntoRuleError {
    fn into_rule_error(self) -> RuleError;
}

impl IntoRuleError for &str {
    #[inline]
    fn into_rule_error(self) -> RuleError {
        RuleError::Message(self.to_owned())
    }
}

impl IntoRuleError for String {
    #[inline]
    fn into_rule_error(self) -> RuleError {
        RuleError::Message(self)
    }
}

impl IntoRuleError for &String {
    #[inline]
    fn into_rule_error(self) -> RuleError {
        RuleError::Message(self.clone())
    }
}

impl IntoRuleError for ServiceError {
    #[inline]
    fn into_rule_error(self) -> RuleError {
        RuleError::Service(self)
    }
}

impl IntoRuleError for RuleError {
    #[inline]
    fn into_rule_error(self) -> RuleError {
        self
    }
}
