use core::fmt::Display;
use core::future::Future;

use crate::async_ext::CatchUnwind;
use crate::persistence::{EntityRepository, Repository, UnitOfWorkProvider};
use crate::traits::{Empty, IntoRuleError};
use crate::types::{ServiceError, ServiceResult, TRANSACTION_FAILED};

use super::builder::{settle, TransactionalServiceValidationBuilder};

/// An entity travelling through an open transaction.
///
/// Started by [`TransactionalServiceValidationBuilder::then_load_async`]. The
/// chain shares its parent's errors and unit of work: a failure recorded here is
/// visible to the parent after [`end_chain`](Self::end_chain), and once the chain
/// is invalid no later step calls its closure.
///
/// [`then_commit_async`](Self::then_commit_async) settles the unit of work:
/// committed when every step passed, rolled back otherwise.
#[must_use]
pub struct TransactionalEntityChain<P: UnitOfWorkProvider, E, T> {
    parent: TransactionalServiceValidationBuilder<P, T>,
    entity: E,
}

impl<P: UnitOfWorkProvider, E, T> TransactionalEntityChain<P, E, T> {
    pub(crate) fn new(parent: TransactionalServiceValidationBuilder<P, T>, entity: E) -> Self {
        Self { parent, entity }
    }

    #[inline]
    pub fn entity(&self) -> &E {
        &self.entity
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.parent.is_valid()
    }

    #[inline]
    pub fn errors(&self) -> &[ServiceError] {
        self.parent.errors()
    }

    fn fail(&mut self, error: ServiceError) {
        self.parent.record(error);
    }

    /// Records `error` unless `predicate` holds for the entity.
    pub fn then_ensure<F, X>(mut self, predicate: F, error: X) -> Self
    where
        F: FnOnce(&E) -> bool,
        X: IntoRuleError,
    {
        if self.is_valid() && !predicate(&self.entity) {
            self.fail(error.into_rule_error().into_service_error());
        }
        self
    }

    /// Async form of [`then_ensure`](Self::then_ensure). A panic is recorded as
    /// `InternalError`.
    pub async fn then_ensure_async<F, Fut, X>(mut self, predicate: F, error: X) -> Self
    where
        F: FnOnce(&E) -> Fut,
        Fut: Future<Output = bool>,
        X: IntoRuleError,
    {
        if !self.is_valid() {
            return self;
        }
        match CatchUnwind::call(|| predicate(&self.entity)).await {
            Ok(true) => {}
            Ok(false) => self.fail(error.into_rule_error().into_service_error()),
            Err(message) => self.fail(ServiceError::internal_error(format!(
                "Ensure operation failed: {message}"
            ))),
        }
        self
    }

    /// Maps the entity through a fallible factory.
    ///
    /// An error becomes `ValidationFailed("{description}: {error}")`. An invalid
    /// chain carries `N::empty()` and never calls `transform`.
    pub fn then_transform<N, F, X>(
        mut self,
        transform: F,
        description: &str,
    ) -> TransactionalEntityChain<P, N, T>
    where
        N: Empty,
        F: FnOnce(E) -> Result<N, X>,
        X: Display,
    {
        if !self.is_valid() {
            return TransactionalEntityChain::new(self.parent, N::empty());
        }
        match transform(self.entity) {
            Ok(transformed) => TransactionalEntityChain::new(self.parent, transformed),
            Err(error) => {
                self.parent
                    .record(ServiceError::validation_failed(format!("{description}: {error}")));
                TransactionalEntityChain::new(self.parent, N::empty())
            }
        }
    }

    /// Runs a repository side effect on the entity.
    ///
    /// An error becomes `ValidationFailed("{description} failed: {error}")`; a
    /// panic becomes `InternalError` with the same text.
    pub async fn then_perform_async<R, F, Fut, X>(mut self, operation: F, description: &str) -> Self
    where
        R: Repository<P::Writable>,
        F: FnOnce(R, &E) -> Fut,
        Fut: Future<Output = Result<(), X>>,
        X: Display,
    {
        if !self.is_valid() {
            return self;
        }
        let repository = self.parent.repository::<R>();
        match CatchUnwind::call(|| operation(repository, &self.entity)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                self.fail(ServiceError::validation_failed(format!("{description} failed: {error}")))
            }
            Err(panic) => {
                self.fail(ServiceError::internal_error(format!("{description} failed: {panic}")))
            }
        }
        self
    }

    /// Saves the entity through repository `R`.
    pub async fn then_save_async<R, F, Fut, X>(self, save: F) -> Self
    where
        R: Repository<P::Writable>,
        F: FnOnce(R, &E) -> Fut,
        Fut: Future<Output = Result<(), X>>,
        X: Display,
    {
        self.then_perform_async(save, "Save").await
    }

    /// Transforms the entity with repository access, then hands the result to
    /// `update`.
    ///
    /// The chain keeps carrying the original entity; reload it to observe the
    /// update. A transform error becomes `ValidationFailed("{description}: {error}")`
    /// and skips `update`.
    pub async fn then_transform_and_update_async<R, N, F, TFut, X, U, UFut, Y>(
        mut self,
        transform: F,
        update: U,
        description: &str,
    ) -> Self
    where
        R: Repository<P::Writable>,
        F: FnOnce(R, &E) -> TFut,
        TFut: Future<Output = Result<N, X>>,
        X: Display,
        U: FnOnce(R, N) -> UFut,
        UFut: Future<Output = Result<(), Y>>,
        Y: Display,
    {
        if !self.is_valid() {
            return self;
        }
        let repository = self.parent.repository::<R>();
        let pending = CatchUnwind::call(|| transform(repository, &self.entity));
        let transformed = match settle(pending.await) {
            Ok(transformed) => transformed,
            Err(message) => {
                self.fail(ServiceError::validation_failed(format!("{description}: {message}")));
                return self;
            }
        };
        let repository = self.parent.repository::<R>();
        let pending = CatchUnwind::call(move || update(repository, transformed));
        if let Err(message) = settle(pending.await) {
            self.fail(ServiceError::validation_failed(format!("{description} failed: {message}")));
        }
        self
    }

    /// Re-fetches the entity, possibly in a different shape.
    ///
    /// An invalid chain carries `N::empty()` and never calls `reload`.
    pub async fn then_reload_async<R, N, F, Fut, X>(
        mut self,
        reload: F,
    ) -> TransactionalEntityChain<P, N, T>
    where
        R: Repository<P::Writable>,
        N: Empty,
        F: FnOnce(R, &E) -> Fut,
        Fut: Future<Output = Result<N, X>>,
        X: Display,
    {
        if !self.is_valid() {
            return TransactionalEntityChain::new(self.parent, N::empty());
        }
        let repository = self.parent.repository::<R>();
        match settle(CatchUnwind::call(|| reload(repository, &self.entity)).await) {
            Ok(reloaded) => TransactionalEntityChain::new(self.parent, reloaded),
            Err(message) => {
                self.fail(ServiceError::validation_failed(format!(
                    "Reload entity failed: {message}"
                )));
                TransactionalEntityChain::new(self.parent, N::empty())
            }
        }
    }

    /// Leaves the entity chain and continues on the parent builder.
    ///
    /// The unit of work stays open; the parent's terminal operation settles it.
    pub fn end_chain(self) -> TransactionalServiceValidationBuilder<P, T> {
        self.parent
    }
}

impl<P: UnitOfWorkProvider, E: Empty, T> TransactionalEntityChain<P, E, T> {
    /// Records `error` when the entity is the empty sentinel.
    pub fn then_ensure_not_empty(self, error: ServiceError) -> Self {
        self.then_ensure(|entity| !entity.is_empty(), error)
    }
}

impl<P, E, T> TransactionalEntityChain<P, E, T>
where
    P: UnitOfWorkProvider,
    E: Send + Sync,
{
    /// Persists the entity through [`EntityRepository::update`].
    pub async fn then_update_async<R>(mut self) -> Self
    where
        R: Repository<P::Writable> + EntityRepository<Entity = E>,
    {
        if !self.is_valid() {
            return self;
        }
        let repository = self.parent.repository::<R>();
        if let Err(error) = repository.update(&self.entity).await {
            self.fail(ServiceError::validation_failed(format!("Update failed: {error}")));
        }
        self
    }

    /// Adds the entity through [`EntityRepository::add`].
    pub async fn then_add_async<R>(mut self) -> Self
    where
        R: Repository<P::Writable> + EntityRepository<Entity = E>,
    {
        if !self.is_valid() {
            return self;
        }
        let repository = self.parent.repository::<R>();
        if let Err(error) = repository.add(&self.entity).await {
            self.fail(ServiceError::validation_failed(format!(
                "Add to repository failed: {error}"
            )));
        }
        self
    }
}

impl<P: UnitOfWorkProvider, E, T: Empty> TransactionalEntityChain<P, E, T> {
    /// Settles the transaction and maps the entity to the result.
    ///
    /// An invalid chain rolls back and fails with its first error. A valid chain
    /// commits; a failing commit is reported as `InternalError` without a
    /// rollback attempt. The parent builder is disposed either way.
    pub async fn then_commit_async<M>(mut self, map: M) -> ServiceResult<T>
    where
        M: FnOnce(E) -> T,
    {
        if !self.is_valid() {
            self.parent.rollback_if_open().await;
            return self.parent.failure(ServiceError::validation_failed(TRANSACTION_FAILED));
        }
        match self.parent.commit_if_open().await {
            Ok(()) => ServiceResult::success(map(self.entity)),
            Err(error) => {
                self.fail(ServiceError::internal_error(format!("{TRANSACTION_FAILED}: {error}")));
                self.parent.failure(ServiceError::internal_error(TRANSACTION_FAILED))
            }
        }
    }
}

impl<P, E, T> core::fmt::Debug for TransactionalEntityChain<P, E, T>
where
    P: UnitOfWorkProvider,
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransactionalEntityChain")
            .field("entity", &self.entity)
            .field("parent", &self.parent)
            .finish()
    }
}
