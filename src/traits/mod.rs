//! Capabilities shared across chain types.
//!
//! - [`Empty`]: the sentinel carried by failed results
//! - [`IntoRuleError`]: accepts either a message or a [`ServiceError`](crate::types::ServiceError)
//! - [`EnsureRules`] / [`ConditionalRules`]: canned validators and their conditional forms
//!
//! # Examples
//!
//! ```
//! use service_rail::traits::{Empty, IntoRuleError};
//!
//! assert!(Empty::is_empty(&String::empty()));
//! assert_eq!("boom".into_rule_error().message(), "boom");
//! ```

pub mod empty;
pub mod into_rule_error;
pub mod rules;

pub use empty::Empty;
pub use into_rule_error::IntoRuleError;
pub use rules::{is_valid_email, ConditionalRules, EnsureRules};
