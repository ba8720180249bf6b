use core::future::Future;
use core::marker::PhantomData;

use crate::traits::{ConditionalRules, Empty, EnsureRules, IntoRuleError};
use crate::types::{
    ErrorAccumulator, ErrorVec, RuleError, ServiceError, ServiceResult, ValidationResult,
};
use crate::validation::with_data::ValidationWithData;

/// Eager validation accumulator that terminates in a [`ServiceResult<T>`].
///
/// Every [`ensure`](EnsureRules::ensure) is evaluated, even after an earlier one
/// failed, so a failing chain reports all of its problems at once. The
/// `then_ensure*` variants of [`ConditionalRules`] are the exception: they are
/// skipped once any error exists.
///
/// A validation is built, consumed once by a terminal operation
/// ([`on_success`](Self::on_success), [`on_failure`](Self::on_failure),
/// [`match_with`](Self::match_with) or their async forms), and discarded.
///
/// # Examples
///
/// ```
/// use service_rail::prelude::*;
///
/// let result = ServiceValidate::of::<String>()
///     .ensure(|| true, "unused")
///     .ensure(|| false, "Name is required")
///     .ensure(|| false, ServiceError::already_exists("Equipment", "Barbell"))
///     .on_success(|| "created".to_string());
///
/// assert!(result.is_failure());
/// assert_eq!(
///     result.errors().collect::<Vec<_>>(),
///     vec!["Name is required", "Equipment with value 'Barbell' already exists"]
/// );
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceValidation<T> {
    errors: ErrorAccumulator,
    service_error: Option<ServiceError>,
    _result: PhantomData<fn() -> T>,
}

/// Validation that produces no value and terminates in a [`ValidationResult`].
pub type PlainValidation = ServiceValidation<()>;

impl<T> Default for ServiceValidation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ServiceValidation<T> {
    /// Creates an empty validation.
    #[inline]
    pub fn new() -> Self {
        Self {
            errors: ErrorAccumulator::new(),
            service_error: None,
            _result: PhantomData,
        }
    }

    /// Returns `true` once any rule has failed.
    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Failure messages in recording order.
    #[inline]
    pub fn errors(&self) -> Vec<String> {
        self.errors.messages()
    }

    /// The most recently recorded structured error.
    #[inline]
    pub fn service_error(&self) -> Option<&ServiceError> {
        self.service_error.as_ref()
    }

    /// One structured error per failed rule; plain messages become `ValidationFailed`.
    #[inline]
    pub fn structured_errors(&self) -> ErrorVec<ServiceError> {
        self.errors.to_service_errors()
    }

    pub(crate) fn accumulated(&self) -> &ErrorAccumulator {
        &self.errors
    }

    pub(crate) fn record(&mut self, error: RuleError) {
        if let RuleError::Service(service_error) = &error {
            self.service_error = Some(service_error.clone());
        }
        self.errors.push(error);
    }

    pub(crate) fn into_failure(self, empty: T) -> ServiceResult<T> {
        ServiceResult::failure_many(empty, self.errors.into_service_errors())
    }

    /// Awaits `predicate` and records `error` unless it resolves to `true`.
    ///
    /// Evaluated regardless of earlier failures, like [`ensure`](EnsureRules::ensure).
    pub async fn ensure_async<F, Fut, E>(mut self, predicate: F, error: E) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
        E: IntoRuleError,
    {
        if !predicate().await {
            self.record(error.into_rule_error());
        }
        self
    }

    /// Like [`ensure_async`](Self::ensure_async), but skipped once any error exists.
    pub async fn then_ensure_async<F, Fut, E>(self, predicate: F, error: E) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
        E: IntoRuleError,
    {
        if self.has_errors() {
            tracing::trace!("skipping conditional async rule on invalid chain");
            return self;
        }
        self.ensure_async(predicate, error).await
    }

    /// Folds the outcome of another validation into this one.
    ///
    /// A structured error is recorded as such; otherwise every message is recorded.
    pub fn validate_with(mut self, result: &ValidationResult) -> Self {
        if result.is_valid() {
            return self;
        }
        match result.service_error() {
            Some(error) => self.record(RuleError::Service(error.clone())),
            None => {
                for message in result.errors() {
                    self.record(RuleError::Message(message.clone()));
                }
            }
        }
        self
    }

    /// Awaits a service call and records its errors when it fails.
    ///
    /// Skipped entirely once any error exists.
    pub async fn ensure_service_result_async<F, Fut, D>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<D>>,
    {
        if self.has_errors() {
            return self;
        }
        let result = producer().await;
        self.absorb(result);
        self
    }

    /// Awaits a service call and carries its value forward.
    ///
    /// On failure the call's errors are recorded and no data is carried.
    pub async fn with_service_result_async<F, Fut, D>(
        mut self,
        producer: F,
    ) -> ValidationWithData<T, D>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<D>>,
    {
        if self.has_errors() {
            return ValidationWithData::new(self, None);
        }
        let data = self.absorb(producer().await);
        ValidationWithData::new(self, data)
    }

    /// Loads an entity and records `error` if the load fails or yields the empty sentinel.
    pub async fn ensure_entity_exists_async<F, Fut, D, E>(
        mut self,
        loader: F,
        error: E,
    ) -> ValidationWithData<T, D>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<D>>,
        D: Empty,
        E: IntoRuleError,
    {
        if self.has_errors() {
            return ValidationWithData::new(self, None);
        }
        let loaded = loader().await;
        match loaded.into_result() {
            Ok(entity) if !entity.is_empty() => ValidationWithData::new(self, Some(entity)),
            _ => {
                self.record(error.into_rule_error());
                ValidationWithData::new(self, None)
            }
        }
    }

    fn absorb<D>(&mut self, result: ServiceResult<D>) -> Option<D> {
        match result.into_result() {
            Ok(value) => Some(value),
            Err(errors) => {
                for error in errors {
                    self.record(RuleError::Service(error));
                }
                None
            }
        }
    }

    /// Forces a failure carrying `empty`, whether or not errors were recorded.
    ///
    /// Without recorded errors the failure carries a generic `ValidationFailed`.
    pub fn on_failure(self, empty: T) -> ServiceResult<T> {
        self.into_failure(empty)
    }

    /// Explicit two-branch dispatch; `when_invalid` receives the messages in order.
    pub fn match_with<V, I>(self, when_valid: V, when_invalid: I) -> ServiceResult<T>
    where
        V: FnOnce() -> ServiceResult<T>,
        I: FnOnce(&[String]) -> ServiceResult<T>,
    {
        if self.has_errors() {
            return when_invalid(&self.errors());
        }
        when_valid()
    }

    /// Async form of [`match_with`](Self::match_with).
    pub async fn match_async<V, Fut, I>(self, when_valid: V, when_invalid: I) -> ServiceResult<T>
    where
        V: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
        I: FnOnce(&[String]) -> ServiceResult<T>,
    {
        if self.has_errors() {
            return when_invalid(&self.errors());
        }
        when_valid().await
    }

    /// Folds the recorded failures into a [`ValidationResult`].
    pub fn to_validation_result(&self) -> ValidationResult {
        self.errors.to_validation_result()
    }
}

impl<T: Empty> ServiceValidation<T> {
    /// Wraps `factory()` in a success, or fails with every recorded error.
    ///
    /// The factory is never invoked on a failing validation.
    pub fn on_success<F>(self, factory: F) -> ServiceResult<T>
    where
        F: FnOnce() -> T,
    {
        if self.has_errors() {
            return self.into_failure(T::empty());
        }
        ServiceResult::success(factory())
    }

    pub async fn on_success_async<F, Fut>(self, factory: F) -> ServiceResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.has_errors() {
            return self.into_failure(T::empty());
        }
        ServiceResult::success(factory().await)
    }

    /// Runs `when_valid`, or fails with the empty sentinel and every recorded error.
    pub fn match_or_fail<V>(self, when_valid: V) -> ServiceResult<T>
    where
        V: FnOnce() -> ServiceResult<T>,
    {
        if self.has_errors() {
            return self.into_failure(T::empty());
        }
        when_valid()
    }

    pub async fn match_or_fail_async<V, Fut>(self, when_valid: V) -> ServiceResult<T>
    where
        V: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        if self.has_errors() {
            return self.into_failure(T::empty());
        }
        when_valid().await
    }
}

impl PlainValidation {
    /// Terminates a value-less validation.
    pub fn into_validation_result(self) -> ValidationResult {
        self.to_validation_result()
    }
}

impl<T> EnsureRules for ServiceValidation<T> {
    fn ensure<E: IntoRuleError>(mut self, predicate: impl FnOnce() -> bool, error: E) -> Self {
        if !predicate() {
            self.record(error.into_rule_error());
        }
        self
    }
}

impl<T> ConditionalRules for ServiceValidation<T> {
    #[inline]
    fn has_errors(&self) -> bool {
        ServiceValidation::has_errors(self)
    }
}
