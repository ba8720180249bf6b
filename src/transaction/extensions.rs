use core::future::Future;

use crate::context::DynamicChainContext;
use crate::persistence::{ReadOnlyUnitOfWork, Repository, UnitOfWorkProvider};
use crate::types::ServiceError;

use super::builder::{TransactionalServiceValidationBuilder, UNIT_OF_WORK_PROVIDER_KEY};

impl<P: UnitOfWorkProvider, T> TransactionalServiceValidationBuilder<P, T> {
    /// Binds repository `R` to a fresh read-only unit of work and stores it in
    /// the context.
    ///
    /// Stored under `custom_key`, or under the repository's read-only key. The
    /// read-only unit of work is released right away; the repository handle
    /// outlives it.
    pub fn then_create_read_only_repository<R>(mut self, custom_key: Option<&str>) -> Self
    where
        R: Repository<P::ReadOnly>,
    {
        let provider = match self.context().get::<P>(UNIT_OF_WORK_PROVIDER_KEY) {
            Ok(provider) => provider.clone(),
            Err(error) => {
                self.record(ServiceError::internal_error(format!(
                    "Repository creation failed: {error}"
                )));
                return self;
            }
        };
        let repository = provider.create_read_only().repository::<R>();
        self.register(repository, custom_key, true)
    }

    /// Binds repository `R` to the writable unit of work, opening it if needed,
    /// and stores it in the context.
    pub fn then_create_writable_repository<R>(mut self, custom_key: Option<&str>) -> Self
    where
        R: Repository<P::Writable>,
    {
        let repository = self.repository::<R>();
        self.register(repository, custom_key, false)
    }

    fn register<R: Send + Sync + 'static>(
        mut self,
        repository: R,
        custom_key: Option<&str>,
        read_only: bool,
    ) -> Self {
        let context = self.context_mut();
        let stored = match custom_key {
            Some(key) => context.store(key, repository),
            None => context.store_repository(repository, read_only),
        };
        if let Err(error) = stored {
            self.record(ServiceError::internal_error(format!(
                "Repository creation failed: {error}"
            )));
        }
        self
    }

    /// Applies `action` to the builder when `condition` holds for the context.
    pub fn then_execute_if<C, A>(self, condition: C, action: A) -> Self
    where
        C: FnOnce(&DynamicChainContext) -> bool,
        A: FnOnce(Self) -> Self,
    {
        if condition(self.context()) {
            action(self)
        } else {
            self
        }
    }

    /// Async form of [`then_execute_if`](Self::then_execute_if).
    pub async fn then_execute_if_async<C, A, Fut>(self, condition: C, action: A) -> Self
    where
        C: FnOnce(&DynamicChainContext) -> bool,
        A: FnOnce(Self) -> Fut,
        Fut: Future<Output = Self>,
    {
        if condition(self.context()) {
            action(self).await
        } else {
            self
        }
    }
}
