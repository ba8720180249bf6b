use core::fmt::Display;
use core::future::Future;

use futures_core::future::BoxFuture;

use crate::async_ext::{CatchUnwind, StepFutureExt};
use crate::traits::{Empty, EnsureRules};
use crate::types::{ServiceError, ServiceResult, VALIDATION_FAILED};
use crate::validation::builder::ServiceValidationBuilder;

/// State of one link of a [`ChainedServiceValidationBuilder`].
///
/// Once a link is `Invalid`, every later link carries the same error and no
/// further step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainLink<D> {
    Valid(D),
    Invalid(ServiceError),
}

impl<D> ChainLink<D> {
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[inline]
    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(error) => Some(error),
        }
    }
}

/// Data-carrying pipeline layered on a [`ServiceValidationBuilder`].
///
/// Steps are composed lazily and run in order when [`match_async`](Self::match_async)
/// is awaited: after the builder's synchronous rules passed, before its queued
/// asynchronous checks. Each step consumes the
/// chain and returns a new one, possibly carrying a different data type.
///
/// # Examples
///
/// ```
/// use service_rail::prelude::*;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let result = ServiceValidate::build::<String>()
///     .chain_not_empty(String::from("Squat"), ServiceError::not_found("Exercise"))
///     .then_create(|name| Ok::<_, String>(format!("{name} (copy)")), "Create duplicate")
///     .then_transform_async(
///         |name| async move { Ok::<_, String>(name.to_uppercase()) },
///         "Normalize",
///     )
///     .match_async(ServiceResult::success, |error| {
///         ServiceResult::failure(String::new(), error)
///     })
///     .await;
///
/// assert_eq!(result.value(), "SQUAT (COPY)");
/// # });
/// ```
#[must_use]
pub struct ChainedServiceValidationBuilder<'a, D, T> {
    builder: ServiceValidationBuilder<'a, T>,
    pipeline: BoxFuture<'a, ChainLink<D>>,
}

impl<'a, D: Send + 'a, T> ChainedServiceValidationBuilder<'a, D, T> {
    /// Starts a chain from a ready link.
    pub fn new(builder: ServiceValidationBuilder<'a, T>, link: ChainLink<D>) -> Self {
        Self { builder, pipeline: async move { link }.boxed() }
    }

    fn then<N, F, Fut>(self, step: F) -> ChainedServiceValidationBuilder<'a, N, T>
    where
        F: FnOnce(D) -> Fut + Send + 'a,
        Fut: Future<Output = ChainLink<N>> + Send + 'a,
    {
        let previous = self.pipeline;
        let pipeline = async move {
            match previous.await {
                ChainLink::Valid(data) => step(data).await,
                ChainLink::Invalid(error) => {
                    tracing::trace!(%error, "skipping chain step on invalid chain");
                    ChainLink::Invalid(error)
                }
            }
        };
        ChainedServiceValidationBuilder { builder: self.builder, pipeline: pipeline.boxed() }
    }

    /// Replaces the data through a fallible factory.
    ///
    /// A factory error becomes `ValidationFailed("{description}: {error}")`.
    /// The factory is never invoked on an invalid chain.
    pub fn then_create<N, F, X>(
        self,
        create: F,
        description: &str,
    ) -> ChainedServiceValidationBuilder<'a, N, T>
    where
        N: Send + 'a,
        F: FnOnce(D) -> Result<N, X> + Send + 'a,
        X: Display,
    {
        let description = description.to_owned();
        self.then(move |data| {
            let link = match create(data) {
                Ok(created) => ChainLink::Valid(created),
                Err(error) => ChainLink::Invalid(ServiceError::validation_failed(format!(
                    "{description}: {error}"
                ))),
            };
            async move { link }
        })
    }

    /// Runs a side effect on the data.
    ///
    /// `action` inspects the data and returns an owned future. An error becomes
    /// `ValidationFailed("{description} failed: {error}")`, a panic `InternalError`.
    pub fn then_perform_async<F, Fut, X>(self, action: F, description: &str) -> Self
    where
        F: FnOnce(&D) -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), X>> + Send + 'a,
        X: Display,
    {
        let description = description.to_owned();
        self.then(move |data| async move {
            match CatchUnwind::call(|| action(&data)).await {
                Ok(Ok(())) => ChainLink::Valid(data),
                Ok(Err(error)) => ChainLink::Invalid(ServiceError::validation_failed(format!(
                    "{description} failed: {error}"
                ))),
                Err(panic) => ChainLink::Invalid(ServiceError::internal_error(format!(
                    "{description} failed: {panic}"
                ))),
            }
        })
    }

    /// Replaces the data through a fallible async transform, with the same
    /// error conversion as [`then_perform_async`](Self::then_perform_async).
    pub fn then_transform_async<N, F, Fut, X>(
        self,
        transform: F,
        description: &str,
    ) -> ChainedServiceValidationBuilder<'a, N, T>
    where
        N: Send + 'a,
        F: FnOnce(D) -> Fut + Send + 'a,
        Fut: Future<Output = Result<N, X>> + Send + 'a,
        X: Display,
    {
        let description = description.to_owned();
        self.then(move |data| async move {
            match CatchUnwind::call(move || transform(data)).await {
                Ok(Ok(transformed)) => ChainLink::Valid(transformed),
                Ok(Err(error)) => ChainLink::Invalid(ServiceError::validation_failed(format!(
                    "{description} failed: {error}"
                ))),
                Err(panic) => ChainLink::Invalid(ServiceError::internal_error(format!(
                    "{description} failed: {panic}"
                ))),
            }
        })
    }

    /// [`then_create`](Self::then_create) described as `"Create duplicate"`.
    pub fn then_create_duplicate<N, F, X>(
        self,
        create: F,
    ) -> ChainedServiceValidationBuilder<'a, N, T>
    where
        N: Send + 'a,
        F: FnOnce(D) -> Result<N, X> + Send + 'a,
        X: Display,
    {
        self.then_create(create, "Create duplicate")
    }

    /// [`then_perform_async`](Self::then_perform_async) described as `"Add to repository"`.
    pub fn then_add_async<F, Fut, X>(self, add: F) -> Self
    where
        F: FnOnce(&D) -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), X>> + Send + 'a,
        X: Display,
    {
        self.then_perform_async(add, "Add to repository")
    }

    /// [`then_transform_async`](Self::then_transform_async) described as `"Reload entity"`.
    pub fn then_reload_async<F, Fut, X>(self, reload: F) -> Self
    where
        F: FnOnce(D) -> Fut + Send + 'a,
        Fut: Future<Output = Result<D, X>> + Send + 'a,
        X: Display,
    {
        self.then_transform_async(reload, "Reload entity")
    }

    /// Runs the pipeline, then the builder's queued checks.
    ///
    /// A builder whose synchronous rules already failed never runs the
    /// pipeline; `when_invalid` receives its first error. An invalid chain goes
    /// straight to `when_invalid`. Otherwise the builder is matched and, if it
    /// fails, `when_invalid` receives its first error only.
    pub async fn match_async<V, I>(self, when_valid: V, when_invalid: I) -> ServiceResult<T>
    where
        V: FnOnce(D) -> ServiceResult<T>,
        I: FnOnce(ServiceError) -> ServiceResult<T>,
    {
        self.match_async_with(move |data| async move { when_valid(data) }, when_invalid).await
    }

    /// [`match_async`](Self::match_async) with an asynchronous `when_valid`.
    pub async fn match_async_with<V, Fut, I>(
        self,
        when_valid: V,
        when_invalid: I,
    ) -> ServiceResult<T>
    where
        V: FnOnce(D) -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
        I: FnOnce(ServiceError) -> ServiceResult<T>,
    {
        if let Some(first) = self.builder.validation().structured_errors().into_iter().next() {
            tracing::trace!(error = %first, "synchronous rules failed, skipping chain pipeline");
            return when_invalid(first);
        }
        let data = match self.pipeline.await {
            ChainLink::Valid(data) => data,
            ChainLink::Invalid(error) => return when_invalid(error),
        };
        self.builder
            .match_errors_async(
                move || when_valid(data),
                move |errors| {
                    let first = errors
                        .first()
                        .cloned()
                        .unwrap_or_else(|| ServiceError::validation_failed(VALIDATION_FAILED));
                    when_invalid(first)
                },
            )
            .await
    }
}

impl<'a, T> ServiceValidationBuilder<'a, T> {
    /// Starts a data-carrying chain from `entity`.
    ///
    /// An empty entity yields an invalid chain carrying `error`; otherwise the
    /// check is recorded on the builder and the chain carries the entity.
    pub fn chain_not_empty<D>(
        self,
        entity: D,
        error: ServiceError,
    ) -> ChainedServiceValidationBuilder<'a, D, T>
    where
        D: Empty + Send + 'a,
    {
        if entity.is_empty() {
            return ChainedServiceValidationBuilder::new(self, ChainLink::Invalid(error));
        }
        let builder = self.ensure(|| true, error);
        ChainedServiceValidationBuilder::new(builder, ChainLink::Valid(entity))
    }

    /// Starts a chain carrying `data` without any check.
    pub fn chain<D: Send + 'a>(self, data: D) -> ChainedServiceValidationBuilder<'a, D, T> {
        ChainedServiceValidationBuilder::new(self, ChainLink::Valid(data))
    }
}
