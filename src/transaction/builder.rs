use core::any::Any;
use core::fmt::Display;
use core::future::Future;
use core::marker::PhantomData;

use crate::async_ext::CatchUnwind;
use crate::context::DynamicChainContext;
use crate::persistence::{
    EntityRepository, PersistenceError, Repository, UnitOfWorkProvider, WritableUnitOfWork,
};
use crate::traits::{Empty, EnsureRules, IntoRuleError};
use crate::types::{ErrorVec, ServiceError, ServiceResult, OPERATION_FAILED, VALIDATION_FAILED};

use super::entity_chain::TransactionalEntityChain;

/// Context key under which every transactional chain keeps its provider.
pub const UNIT_OF_WORK_PROVIDER_KEY: &str = "UnitOfWorkProvider";

/// Validation chain bound to one writable unit of work.
///
/// The unit of work is opened lazily by the first step that needs it and is
/// owned by the builder. Every terminal operation settles it exactly once
/// (commit or rollback) and then disposes the builder: the unit of work first,
/// then the [`DynamicChainContext`].
///
/// Unlike [`ServiceValidation`](crate::validation::ServiceValidation), this
/// builder short-circuits: once a rule failed, later rules are not evaluated.
///
/// Injected steps report failures through `Result`. A panic inside one is
/// caught and treated like an error, so no terminal operation ever leaves the
/// transaction open.
#[must_use]
pub struct TransactionalServiceValidationBuilder<P: UnitOfWorkProvider, T> {
    provider: P,
    errors: ErrorVec<ServiceError>,
    context: DynamicChainContext,
    unit_of_work: Option<P::Writable>,
    disposed: bool,
    _result: PhantomData<fn() -> T>,
}

impl<P: UnitOfWorkProvider, T> TransactionalServiceValidationBuilder<P, T> {
    pub fn new(provider: P) -> Self {
        let mut context = DynamicChainContext::new();
        if let Err(error) = context.store(UNIT_OF_WORK_PROVIDER_KEY, provider.clone()) {
            tracing::warn!(%error, "failed to register unit of work provider");
        }
        Self {
            provider,
            errors: ErrorVec::new(),
            context,
            unit_of_work: None,
            disposed: false,
            _result: PhantomData,
        }
    }

    /// Storage shared by the steps of this chain.
    #[inline]
    pub fn context(&self) -> &DynamicChainContext {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut DynamicChainContext {
        &mut self.context
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded so far, in order.
    #[inline]
    pub fn errors(&self) -> &[ServiceError] {
        &self.errors
    }

    /// Whether the writable unit of work has been opened.
    #[inline]
    pub fn has_unit_of_work(&self) -> bool {
        self.unit_of_work.is_some()
    }

    pub(crate) fn record(&mut self, error: ServiceError) {
        self.errors.push(error);
    }

    /// The writable unit of work, opened on first use.
    pub(crate) fn unit_of_work(&mut self) -> &mut P::Writable {
        open(&self.provider, &mut self.unit_of_work)
    }

    pub(crate) fn repository<R: Repository<P::Writable>>(&mut self) -> R {
        R::bind(self.unit_of_work())
    }

    /// Rolls back the unit of work if one was opened. Failures are logged only.
    pub(crate) async fn rollback_if_open(&mut self) {
        if let Some(unit_of_work) = self.unit_of_work.as_mut() {
            tracing::debug!("rolling back unit of work");
            if let Err(error) = unit_of_work.rollback().await {
                tracing::warn!(%error, "rollback failed");
            }
        }
    }

    /// Commits the unit of work if one was opened.
    pub(crate) async fn commit_if_open(&mut self) -> Result<(), PersistenceError> {
        let Some(unit_of_work) = self.unit_of_work.as_mut() else {
            return Ok(());
        };
        tracing::debug!("committing unit of work");
        unit_of_work.commit().await.inspect_err(|error| {
            tracing::warn!(%error, "commit failed");
        })
    }

    /// Awaits `predicate` unless the chain is already invalid.
    pub async fn ensure_async<F, Fut, E>(mut self, predicate: F, error: E) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
        E: IntoRuleError,
    {
        if !self.is_valid() {
            tracing::trace!("skipping async rule on invalid transactional chain");
            return self;
        }
        if !predicate().await {
            self.record(error.into_rule_error().into_service_error());
        }
        self
    }

    /// Loads an entity through repository `R` and starts an entity chain.
    ///
    /// The unit of work is opened even when the chain is already invalid, so the
    /// entity chain always settles it. An invalid chain carries `E::empty()` and
    /// never calls `load`. A load error or panic is recorded as `InternalError`.
    pub async fn then_load_async<E, R, F, Fut, X>(
        mut self,
        load: F,
    ) -> TransactionalEntityChain<P, E, T>
    where
        E: Empty,
        R: Repository<P::Writable>,
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<E, X>>,
        X: Display,
    {
        self.unit_of_work();
        if !self.is_valid() {
            return TransactionalEntityChain::new(self, E::empty());
        }
        let repository = self.repository::<R>();
        match settle(CatchUnwind::call(move || load(repository)).await) {
            Ok(entity) => TransactionalEntityChain::new(self, entity),
            Err(message) => {
                self.record(ServiceError::internal_error(format!(
                    "Load operation failed: {message}"
                )));
                TransactionalEntityChain::new(self, E::empty())
            }
        }
    }

    /// [`then_load_async`](Self::then_load_async) through [`EntityRepository::get_by_id`].
    pub async fn then_load_by_id_async<R>(
        self,
        id: &R::Id,
    ) -> TransactionalEntityChain<P, R::Entity, T>
    where
        R: Repository<P::Writable> + EntityRepository,
    {
        self.then_load_async(|repository: R| async move { repository.get_by_id(id).await })
            .await
    }

    /// Stores the outcome of `load` in the context under `key`.
    ///
    /// `load` inspects the context and returns an owned future.
    pub async fn then_load_into<V, F, Fut, X>(mut self, key: &str, load: F) -> Self
    where
        V: Any + Send + Sync,
        F: FnOnce(&DynamicChainContext) -> Fut,
        Fut: Future<Output = Result<V, X>>,
        X: Display,
    {
        if !self.is_valid() {
            return self;
        }
        let stored = settle(CatchUnwind::call(|| load(&self.context)).await)
            .and_then(|value| self.context.store(key, value).map_err(|error| error.to_string()));
        if let Err(message) = stored {
            self.record(ServiceError::internal_error(format!("Load operation failed: {message}")));
        }
        self
    }

    /// Runs a side effect with mutable access to the context.
    pub async fn then_perform_async<F, Fut, X>(mut self, action: F) -> Self
    where
        F: FnOnce(&mut DynamicChainContext) -> Fut,
        Fut: Future<Output = Result<(), X>>,
        X: Display,
    {
        if !self.is_valid() {
            return self;
        }
        if let Err(message) = settle(CatchUnwind::call(|| action(&mut self.context)).await) {
            self.record(ServiceError::internal_error(format!(
                "Perform operation failed: {message}"
            )));
        }
        self
    }

    /// [`then_perform_async`](Self::then_perform_async) gated by a context predicate.
    pub async fn then_perform_if_async<C, F, Fut, X>(mut self, condition: C, action: F) -> Self
    where
        C: FnOnce(&DynamicChainContext) -> bool,
        F: FnOnce(&mut DynamicChainContext) -> Fut,
        Fut: Future<Output = Result<(), X>>,
        X: Display,
    {
        if !self.is_valid() {
            return self;
        }
        let pending = CatchUnwind::call(|| {
            let pending = condition(&self.context).then(|| action(&mut self.context));
            async move {
                match pending {
                    Some(pending) => pending.await,
                    None => Ok(()),
                }
            }
        });
        if let Err(message) = settle(pending.await) {
            self.record(ServiceError::internal_error(format!(
                "Conditional perform operation failed: {message}"
            )));
        }
        self
    }

    /// Records `error` unless the context predicate holds.
    pub async fn then_ensure_async<F, Fut, E>(mut self, predicate: F, error: E) -> Self
    where
        F: FnOnce(&DynamicChainContext) -> Fut,
        Fut: Future<Output = bool>,
        E: IntoRuleError,
    {
        if !self.is_valid() {
            return self;
        }
        match CatchUnwind::call(|| predicate(&self.context)).await {
            Ok(true) => {}
            Ok(false) => self.record(error.into_rule_error().into_service_error()),
            Err(message) => self.record(ServiceError::internal_error(format!(
                "Ensure operation failed: {message}"
            ))),
        }
        self
    }

    /// Fully general terminal operation.
    ///
    /// An invalid chain rolls back and answers `when_invalid`. Otherwise the
    /// unit of work, if opened, is committed only when `when_valid` produced a
    /// success and rolled back when it produced a failure. A panic rolls back and
    /// records `InternalError("Transaction failed: ...")`.
    pub async fn match_async<V, Fut, I>(
        mut self,
        when_valid: V,
        when_invalid: I,
    ) -> ServiceResult<T>
    where
        V: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
        I: FnOnce(&[ServiceError]) -> ServiceResult<T>,
    {
        if !self.is_valid() {
            self.rollback_if_open().await;
            return when_invalid(&self.errors);
        }
        let result = match CatchUnwind::call(when_valid).await {
            Ok(result) => result,
            Err(message) => {
                self.rollback_if_open().await;
                self.record(ServiceError::internal_error(format!("Transaction failed: {message}")));
                return when_invalid(&self.errors);
            }
        };
        if result.is_failure() {
            self.rollback_if_open().await;
            return result;
        }
        match self.commit_if_open().await {
            Ok(()) => result,
            Err(error) => {
                self.record(ServiceError::internal_error(format!("Transaction failed: {error}")));
                when_invalid(&self.errors)
            }
        }
    }

    /// Disposes the unit of work, then the context. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(unit_of_work) = self.unit_of_work.take() {
            tracing::debug!("disposing unit of work");
            drop(unit_of_work);
        }
        self.context.dispose();
    }
}

impl<P: UnitOfWorkProvider, T: Empty> TransactionalServiceValidationBuilder<P, T> {
    /// Terminal failure carrying the first recorded error, or `fallback`.
    pub(crate) fn failure(&self, fallback: ServiceError) -> ServiceResult<T> {
        let error = self.errors.first().cloned().unwrap_or(fallback);
        ServiceResult::failure(T::empty(), error)
    }

    async fn execute<Fut, X>(mut self, pending: CatchUnwind<Fut>, label: &str) -> ServiceResult<T>
    where
        Fut: Future<Output = Result<T, X>>,
        X: Display,
    {
        match settle(pending.await) {
            Ok(value) => match self.commit_if_open().await {
                Ok(()) => ServiceResult::success(value),
                Err(error) => {
                    self.record(ServiceError::internal_error(format!("{label}: {error}")));
                    self.failure(ServiceError::internal_error(label))
                }
            },
            Err(message) => {
                self.rollback_if_open().await;
                self.record(ServiceError::internal_error(format!("{label}: {message}")));
                self.failure(ServiceError::internal_error(label))
            }
        }
    }

    /// Runs `execute` against repository `R` and commits.
    ///
    /// An invalid chain rolls back and fails with its first error. An error or
    /// panic from `execute` rolls back and fails with `InternalError`.
    pub async fn then_execute_async<R, F, Fut, X>(mut self, execute: F) -> ServiceResult<T>
    where
        R: Repository<P::Writable>,
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<T, X>>,
        X: Display,
    {
        if !self.is_valid() {
            self.rollback_if_open().await;
            return self.failure(ServiceError::validation_failed(VALIDATION_FAILED));
        }
        let repository = self.repository::<R>();
        let pending = CatchUnwind::call(move || execute(repository));
        self.execute(pending, OPERATION_FAILED).await
    }

    /// Like [`then_execute_async`](Self::then_execute_async), with direct access
    /// to the unit of work.
    pub async fn then_execute_with_unit_of_work_async<F, Fut, X>(
        mut self,
        execute: F,
    ) -> ServiceResult<T>
    where
        F: FnOnce(&mut P::Writable) -> Fut,
        Fut: Future<Output = Result<T, X>>,
        X: Display,
    {
        if !self.is_valid() {
            self.rollback_if_open().await;
            return self.failure(ServiceError::validation_failed(VALIDATION_FAILED));
        }
        let pending = CatchUnwind::call(|| execute(self.unit_of_work()));
        self.execute(pending, OPERATION_FAILED).await
    }

    /// Terminal step with access to both the unit of work and the context.
    pub async fn then_execute_with_context_async<F, Fut, X>(
        mut self,
        execute: F,
    ) -> ServiceResult<T>
    where
        F: FnOnce(&mut P::Writable, &mut DynamicChainContext) -> Fut,
        Fut: Future<Output = Result<T, X>>,
        X: Display,
    {
        if !self.is_valid() {
            self.rollback_if_open().await;
            return self.failure(ServiceError::validation_failed(VALIDATION_FAILED));
        }
        let unit_of_work = open(&self.provider, &mut self.unit_of_work);
        let pending = CatchUnwind::call(|| execute(unit_of_work, &mut self.context));
        self.execute(pending, OPERATION_FAILED).await
    }

    /// Terminal step over the context only.
    ///
    /// Commits only when an earlier step opened the unit of work.
    pub async fn then_execute_in_context_async<F, Fut, X>(mut self, execute: F) -> ServiceResult<T>
    where
        F: FnOnce(&DynamicChainContext) -> Fut,
        Fut: Future<Output = Result<T, X>>,
        X: Display,
    {
        if !self.is_valid() {
            self.rollback_if_open().await;
            return self.failure(ServiceError::validation_failed(VALIDATION_FAILED));
        }
        let pending = CatchUnwind::call(|| execute(&self.context));
        self.execute(pending, "Execute operation failed").await
    }
}

impl<P: UnitOfWorkProvider, T> EnsureRules for TransactionalServiceValidationBuilder<P, T> {
    fn ensure<E: IntoRuleError>(mut self, predicate: impl FnOnce() -> bool, error: E) -> Self {
        if !self.is_valid() {
            tracing::trace!("skipping rule on invalid transactional chain");
            return self;
        }
        if !predicate() {
            self.record(error.into_rule_error().into_service_error());
        }
        self
    }
}

impl<P: UnitOfWorkProvider, T> Drop for TransactionalServiceValidationBuilder<P, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<P: UnitOfWorkProvider, T> core::fmt::Debug for TransactionalServiceValidationBuilder<P, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransactionalServiceValidationBuilder")
            .field("errors", &self.errors)
            .field("context", &self.context)
            .field("unit_of_work_open", &self.unit_of_work.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn open<'u, P: UnitOfWorkProvider>(
    provider: &P,
    slot: &'u mut Option<P::Writable>,
) -> &'u mut P::Writable {
    slot.get_or_insert_with(|| {
        tracing::debug!("opening writable unit of work");
        provider.create_writable()
    })
}

/// Flattens a guarded step outcome into a single error message.
pub(crate) fn settle<V, X: Display>(outcome: Result<Result<V, X>, String>) -> Result<V, String> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(error.to_string()),
        Err(panic) => Err(panic),
    }
}
