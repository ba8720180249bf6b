use core::future::Future;

use futures_core::future::BoxFuture;

use crate::async_ext::StepFutureExt;
use crate::traits::{ConditionalRules, Empty, EnsureRules, IntoRuleError};
use crate::types::{
    ErrorAccumulator, RuleError, ServiceError, ServiceErrorCode, ServiceResult, ValidationResult,
    VALIDATION_FAILED,
};
use crate::validation::core::ServiceValidation;

type PendingCheck<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Option<RuleError>> + Send + 'a>;

/// [`ServiceValidation`] plus a queue of deferred asynchronous checks.
///
/// Synchronous rules are evaluated immediately. Asynchronous checks are only
/// stored; a terminal operation runs them, and only when every synchronous rule
/// passed. Queued checks then run one after another in registration order and
/// all of them run, so the caller sees every failing check at once.
///
/// # Examples
///
/// ```
/// use service_rail::prelude::*;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let result = ServiceValidate::build::<String>()
///     .ensure_not_whitespace("Barbell", "Name is required")
///     .ensure_is_unique_async_with(|| async { false }, "Equipment", "Barbell")
///     .match_errors_async(
///         || async { ServiceResult::success("created".to_string()) },
///         |errors| ServiceResult::failure_many(String::new(), errors.to_vec()),
///     )
///     .await;
///
/// assert_eq!(
///     result.first_error().map(ServiceError::code),
///     Some(ServiceErrorCode::AlreadyExists)
/// );
/// # });
/// ```
#[must_use]
pub struct ServiceValidationBuilder<'a, T> {
    validation: ServiceValidation<T>,
    pending: Vec<PendingCheck<'a>>,
}

/// Builder for checks that produce no value; terminates in a [`ValidationResult`].
pub type PlainValidationBuilder<'a> = ServiceValidationBuilder<'a, ()>;

impl<T> Default for ServiceValidationBuilder<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for ServiceValidationBuilder<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceValidationBuilder")
            .field("errors", &self.validation.errors())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<'a, T> ServiceValidationBuilder<'a, T> {
    pub fn new() -> Self {
        Self::from_validation(ServiceValidation::new())
    }

    /// Continues from an existing validation, keeping its recorded errors.
    pub fn from_validation(validation: ServiceValidation<T>) -> Self {
        Self { validation, pending: Vec::new() }
    }

    /// The synchronous part of the chain.
    #[inline]
    pub fn validation(&self) -> &ServiceValidation<T> {
        &self.validation
    }

    /// Number of queued asynchronous checks.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn queue<F, Fut>(mut self, check: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Option<RuleError>> + Send + 'a,
    {
        self.pending
            .push(Box::new(move || -> BoxFuture<'a, Option<RuleError>> { check().boxed() }));
        self
    }

    /// Queues `predicate`; `error` is recorded if it resolves to `false`.
    pub fn ensure_async<F, Fut, E>(self, predicate: F, error: E) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
        E: IntoRuleError + Send + 'a,
    {
        self.queue(move || async move {
            if predicate().await {
                None
            } else {
                Some(error.into_rule_error())
            }
        })
    }

    /// Queues a check that reports its own failure.
    pub fn ensure_result_async<F, Fut, E>(self, check: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
        E: IntoRuleError + Send + 'a,
    {
        self.queue(move || async move {
            check().await.err().map(IntoRuleError::into_rule_error)
        })
    }

    /// Queues a uniqueness check; `is_unique` must resolve to `true` to pass.
    pub fn ensure_is_unique_async<F, Fut, E>(self, is_unique: F, error: E) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
        E: IntoRuleError + Send + 'a,
    {
        self.ensure_async(is_unique, error)
    }

    /// Uniqueness check reporting `AlreadyExists` for `entity_name` and `value`.
    pub fn ensure_is_unique_async_with<F, Fut>(
        self,
        is_unique: F,
        entity_name: &str,
        value: &str,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
    {
        self.ensure_async(is_unique, ServiceError::already_exists(entity_name, value))
    }

    /// Same as [`ensure_is_unique_async_with`](Self::ensure_is_unique_async_with) for a name.
    pub fn ensure_name_is_unique_async<F, Fut>(
        self,
        is_unique: F,
        entity_name: &str,
        name: &str,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
    {
        self.ensure_is_unique_async_with(is_unique, entity_name, name)
    }

    /// Queues a check that fails when `exists` resolves to `true`.
    pub fn ensure_not_exists_async<F, Fut, E>(self, exists: F, error: E) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
        E: IntoRuleError + Send + 'a,
    {
        self.ensure_async(move || async move { !exists().await }, error)
    }

    /// Queues a check that fails when `exists` resolves to `false`.
    pub fn ensure_exists_async<F, Fut, E>(self, exists: F, error: E) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
        E: IntoRuleError + Send + 'a,
    {
        self.ensure_async(exists, error)
    }

    /// Existence check reporting `NotFound` for `entity_name`.
    pub fn ensure_exists_async_with<F, Fut>(self, exists: F, entity_name: &str) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
    {
        self.ensure_async(exists, ServiceError::not_found(entity_name))
    }

    /// Queues a check whose failure is reported as `ValidationFailed` with `message`.
    pub fn ensure_has_valid_async<F, Fut>(self, is_valid: F, message: &str) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
    {
        self.ensure_async(is_valid, ServiceError::validation_failed(message))
    }

    /// Queues a service call that must succeed.
    pub fn ensure_entity_exists_async<F, Fut, D, E>(self, lookup: F, error: E) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = ServiceResult<D>> + Send + 'a,
        E: IntoRuleError + Send + 'a,
    {
        self.ensure_async(move || async move { lookup().await.is_success() }, error)
    }

    /// Queues a permission-style check.
    pub fn ensure_operation_allowed_async<F, Fut, E>(self, is_allowed: F, error: E) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = bool> + Send + 'a,
        E: IntoRuleError + Send + 'a,
    {
        self.ensure_async(is_allowed, error)
    }

    /// Runs the two evaluation phases and returns every failure.
    ///
    /// Phase one: recorded synchronous errors short-circuit, and no queued check
    /// runs. Phase two: every queued check runs, in order.
    async fn evaluate(self) -> ErrorAccumulator {
        if self.validation.has_errors() {
            if !self.pending.is_empty() {
                tracing::trace!(
                    skipped = self.pending.len(),
                    "synchronous rules failed, skipping asynchronous checks"
                );
            }
            return self.validation.accumulated().clone();
        }

        let mut failures = ErrorAccumulator::new();
        for check in self.pending {
            if let Some(error) = check().await {
                failures.push(error);
            }
        }
        failures
    }

    /// Runs every check; `when_invalid` receives the failure messages.
    pub async fn match_async<V, Fut, I>(self, when_valid: V, when_invalid: I) -> ServiceResult<T>
    where
        V: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
        I: FnOnce(&[String]) -> ServiceResult<T>,
    {
        let failures = self.evaluate().await;
        if failures.is_empty() {
            return when_valid().await;
        }
        when_invalid(&failures.messages())
    }

    /// Runs every check; `when_invalid` receives structured errors.
    pub async fn match_errors_async<V, Fut, I>(
        self,
        when_valid: V,
        when_invalid: I,
    ) -> ServiceResult<T>
    where
        V: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
        I: FnOnce(&[ServiceError]) -> ServiceResult<T>,
    {
        let failures = self.evaluate().await;
        if failures.is_empty() {
            return when_valid().await;
        }
        when_invalid(&failures.into_service_errors())
    }

    /// Runs every check and folds the outcome into a [`ValidationResult`].
    ///
    /// The first structured error's code is kept; several messages are joined by `"; "`.
    pub async fn to_validation_result_async(self) -> ValidationResult {
        self.evaluate().await.to_validation_result()
    }
}

impl<'a, T: Empty> ServiceValidationBuilder<'a, T> {
    /// Runs every check; a failure carries only the first error.
    pub async fn match_or_fail_async<V, Fut>(self, when_valid: V) -> ServiceResult<T>
    where
        V: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        self.match_errors_async(when_valid, |errors| {
            let first = errors
                .first()
                .cloned()
                .unwrap_or_else(|| ServiceError::validation_failed(VALIDATION_FAILED));
            ServiceResult::failure(T::empty(), first)
        })
        .await
    }

    /// Runs every check; a failure carries all errors.
    pub async fn when_valid_async<V, Fut>(self, when_valid: V) -> ServiceResult<T>
    where
        V: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        self.match_errors_async(when_valid, |errors| {
            ServiceResult::failure_many(T::empty(), errors.iter().cloned())
        })
        .await
    }
}

impl<T> EnsureRules for ServiceValidationBuilder<'_, T> {
    fn ensure<E: IntoRuleError>(mut self, predicate: impl FnOnce() -> bool, error: E) -> Self {
        self.validation = self.validation.ensure(predicate, error);
        self
    }

    /// A plain message is reported as `InvalidFormat`.
    fn ensure_not_empty<V: Empty, E: IntoRuleError>(self, value: &V, error: E) -> Self {
        let error = invalid_format(error.into_rule_error());
        self.ensure(|| !value.is_empty(), error)
    }

    /// A plain message is reported as `InvalidFormat`.
    fn ensure_valid_id<V: Empty, E: IntoRuleError>(self, value: Option<&V>, error: E) -> Self {
        let error = invalid_format(error.into_rule_error());
        self.ensure(|| value.is_some_and(|id| !id.is_empty()), error)
    }
}

impl<T> ConditionalRules for ServiceValidationBuilder<'_, T> {
    #[inline]
    fn has_errors(&self) -> bool {
        self.validation.has_errors()
    }
}

fn invalid_format(error: RuleError) -> RuleError {
    match error {
        RuleError::Message(message) => {
            RuleError::Service(ServiceError::new(ServiceErrorCode::InvalidFormat, message))
        }
        structured => structured,
    }
}
