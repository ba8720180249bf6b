//! Canned validation rules shared by every synchronous accumulator.
//!
//! [`EnsureRules`] has one required method, [`ensure`](EnsureRules::ensure),
//! which evaluates its predicate immediately and records the error when it
//! does not hold. Every canned validator is expressed through it, so each
//! implementor decides once whether failing rules accumulate (validations and
//! builders) or short-circuit (transactional builders).
//!
//! [`ConditionalRules`] adds the `then_ensure*` family, which skips evaluation
//! entirely once any error has been recorded.
//!
//! # Examples
//!
//! ```
//! use service_rail::prelude::*;
//!
//! let validation = ServiceValidate::of::<String>()
//!     .ensure_not_whitespace("", "Name is required")
//!     .ensure_max_length("abcdef", 3, "Name is too long")
//!     .then_ensure(|| unreachable!(), "never evaluated");
//!
//! assert_eq!(validation.errors(), vec!["Name is required", "Name is too long"]);
//! ```
use std::sync::LazyLock;

use regex::Regex;

use crate::traits::empty::Empty;
use crate::traits::into_rule_error::IntoRuleError;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Returns `true` if `value` looks like an e-mail address.
pub fn is_valid_email(value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }
    EMAIL_PATTERN.as_ref().is_some_and(|pattern| pattern.is_match(value))
}

/// Synchronous rule evaluation with canned validators.
pub trait EnsureRules: Sized {
    /// Records `error` unless `predicate` holds.
    fn ensure<E: IntoRuleError>(self, predicate: impl FnOnce() -> bool, error: E) -> Self;

    /// Fails when `value` is `None`.
    fn ensure_not_null<V, E: IntoRuleError>(self, value: Option<&V>, error: E) -> Self {
        self.ensure(|| value.is_some(), error)
    }

    /// Fails when `value` is empty or only whitespace.
    fn ensure_not_whitespace<E: IntoRuleError>(self, value: &str, error: E) -> Self {
        self.ensure(|| !value.trim().is_empty(), error)
    }

    /// Fails when `value` is its type's empty sentinel.
    fn ensure_not_empty<V: Empty, E: IntoRuleError>(self, value: &V, error: E) -> Self {
        self.ensure(|| !value.is_empty(), error)
    }

    /// Fails when `value` is missing or empty.
    fn ensure_valid_id<V: Empty, E: IntoRuleError>(self, value: Option<&V>, error: E) -> Self {
        self.ensure(|| value.is_some_and(|id| !id.is_empty()), error)
    }

    /// Fails unless the character count of `value` lies in `min..=max`.
    fn ensure_length<E: IntoRuleError>(
        self,
        value: &str,
        min: usize,
        max: usize,
        error: E,
    ) -> Self {
        self.ensure(|| (min..=max).contains(&value.chars().count()), error)
    }

    fn ensure_min_length<E: IntoRuleError>(self, value: &str, min: usize, error: E) -> Self {
        self.ensure(|| value.chars().count() >= min, error)
    }

    fn ensure_max_length<E: IntoRuleError>(self, value: &str, max: usize, error: E) -> Self {
        self.ensure(|| value.chars().count() <= max, error)
    }

    /// Fails unless `min <= value <= max`.
    fn ensure_number_between<N: PartialOrd, E: IntoRuleError>(
        self,
        value: N,
        min: N,
        max: N,
        error: E,
    ) -> Self {
        self.ensure(|| value >= min && value <= max, error)
    }

    fn ensure_min_value<N: PartialOrd, E: IntoRuleError>(self, value: N, min: N, error: E) -> Self {
        self.ensure(|| value >= min, error)
    }

    fn ensure_has_items<I, E: IntoRuleError>(self, items: &[I], error: E) -> Self {
        self.ensure(|| !items.is_empty(), error)
    }

    fn ensure_min_count<I, E: IntoRuleError>(self, items: &[I], min: usize, error: E) -> Self {
        self.ensure(|| items.len() >= min, error)
    }

    /// Fails unless `value` equals one of `allowed`.
    fn ensure_one_of<V: PartialEq, E: IntoRuleError>(
        self,
        value: &V,
        allowed: &[V],
        error: E,
    ) -> Self {
        self.ensure(|| allowed.contains(value), error)
    }

    fn ensure_email<E: IntoRuleError>(self, value: &str, error: E) -> Self {
        self.ensure(|| is_valid_email(value), error)
    }
}

/// Rules that are only evaluated while no error has been recorded.
///
/// Contrast with [`EnsureRules::ensure`], which always evaluates.
pub trait ConditionalRules: EnsureRules {
    /// Returns `true` once any rule has failed.
    fn has_errors(&self) -> bool;

    fn then_ensure<E: IntoRuleError>(self, predicate: impl FnOnce() -> bool, error: E) -> Self {
        if self.has_errors() {
            tracing::trace!("skipping conditional rule on invalid chain");
            return self;
        }
        self.ensure(predicate, error)
    }

    fn then_ensure_not_whitespace<E: IntoRuleError>(self, value: &str, error: E) -> Self {
        self.then_ensure(|| !value.trim().is_empty(), error)
    }

    fn then_ensure_email_is_valid<E: IntoRuleError>(self, value: &str, error: E) -> Self {
        self.then_ensure(|| is_valid_email(value), error)
    }

    fn then_ensure_not_empty<V: Empty, E: IntoRuleError>(self, value: &V, error: E) -> Self {
        self.then_ensure(|| !value.is_empty(), error)
    }
}
