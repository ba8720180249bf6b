use crate::types::rule_error::RuleError;
use crate::types::service_error::ServiceError;
use crate::types::validation_result::ValidationResult;
use crate::types::ErrorVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered collection of failed rules shared by every validation chain.
///
/// Wraps [`ErrorVec`] so that the common single-failure case stays inline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErrorAccumulator {
    items: ErrorVec<RuleError>,
}

impl ErrorAccumulator {
    #[inline]
    pub fn new() -> Self {
        Self { items: ErrorVec::new() }
    }

    /// Records a failed rule.
    #[inline]
    pub fn push(&mut self, item: impl Into<RuleError>) {
        self.items.push(item.into());
    }

    #[inline]
    pub fn extend<I: IntoIterator<Item = RuleError>>(&mut self, iter: I) {
        self.items.extend(iter);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, RuleError> {
        self.items.iter()
    }

    /// Messages of every recorded failure, in order.
    pub fn messages(&self) -> Vec<String> {
        self.items.iter().map(|item| item.message().to_owned()).collect()
    }

    /// The most recently recorded structured error.
    pub fn last_service_error(&self) -> Option<&ServiceError> {
        self.items.iter().rev().find_map(RuleError::as_service_error)
    }

    /// The first recorded structured error.
    pub fn first_service_error(&self) -> Option<&ServiceError> {
        self.items.iter().find_map(RuleError::as_service_error)
    }

    /// One [`ServiceError`] per recorded failure, in order.
    pub fn to_service_errors(&self) -> ErrorVec<ServiceError> {
        self.items.iter().cloned().map(RuleError::into_service_error).collect()
    }

    /// Consumes the accumulator, returning one [`ServiceError`] per failure.
    pub fn into_service_errors(self) -> ErrorVec<ServiceError> {
        self.items.into_iter().map(RuleError::into_service_error).collect()
    }

    /// Folds the failures into a [`ValidationResult`].
    ///
    /// All messages are kept in order. When a structured error was recorded, the
    /// result carries its code with every message joined by `"; "`.
    pub fn to_validation_result(&self) -> ValidationResult {
        if self.items.is_empty() {
            return ValidationResult::success();
        }
        let messages = self.messages();
        let service_error = self.first_service_error().map(|first| {
            if messages.len() == 1 {
                first.clone()
            } else {
                ServiceError::new(first.code(), messages.join("; "))
            }
        });
        ValidationResult::from_parts(messages, service_error)
    }

    #[inline]
    pub fn into_inner(self) -> ErrorVec<RuleError> {
        self.items
    }
}

impl From<ErrorVec<RuleError>> for ErrorAccumulator {
    fn from(items: ErrorVec<RuleError>) -> Self {
        Self { items }
    }
}

impl FromIterator<RuleError> for ErrorAccumulator {
    fn from_iter<I: IntoIterator<Item = RuleError>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

impl IntoIterator for ErrorAccumulator {
    type Item = RuleError;
    type IntoIter = smallvec::IntoIter<[RuleError; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorAccumulator {
    type Item = &'a RuleError;
    type IntoIter = core::slice::Iter<'a, RuleError>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
