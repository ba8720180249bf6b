use core::future::Future;

use crate::traits::{Empty, EnsureRules, IntoRuleError};
use crate::types::ServiceResult;
use crate::validation::core::ServiceValidation;

/// A [`ServiceValidation`] carrying data loaded along the way.
///
/// Data is only present while the validation has no errors and the load that
/// produced it succeeded. Every step below is skipped when either is missing.
#[must_use]
#[derive(Debug, Clone)]
pub struct ValidationWithData<T, D> {
    validation: ServiceValidation<T>,
    data: Option<D>,
}

impl<T, D> ValidationWithData<T, D> {
    #[inline]
    pub fn new(validation: ServiceValidation<T>, data: Option<D>) -> Self {
        Self { validation, data }
    }

    #[inline]
    pub fn validation(&self) -> &ServiceValidation<T> {
        &self.validation
    }

    #[inline]
    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    #[inline]
    pub fn into_parts(self) -> (ServiceValidation<T>, Option<D>) {
        (self.validation, self.data)
    }

    fn is_active(&self) -> bool {
        !self.validation.has_errors() && self.data.is_some()
    }

    /// Checks a predicate against the carried data.
    pub fn ensure_with<P, E>(mut self, predicate: P, error: E) -> Self
    where
        P: FnOnce(&D) -> bool,
        E: IntoRuleError,
    {
        if !self.is_active() {
            return self;
        }
        let holds = self.data.as_ref().is_some_and(predicate);
        self.validation = self.validation.ensure(|| holds, error);
        self
    }

    /// Async form of [`ensure_with`](Self::ensure_with).
    ///
    /// `predicate` inspects the data synchronously and returns an owned future.
    pub async fn ensure_with_async<P, Fut, E>(mut self, predicate: P, error: E) -> Self
    where
        P: FnOnce(&D) -> Fut,
        Fut: Future<Output = bool>,
        E: IntoRuleError,
    {
        if !self.is_active() {
            return self;
        }
        let holds = match &self.data {
            Some(data) => predicate(data).await,
            None => true,
        };
        self.validation = self.validation.ensure(|| holds, error);
        self
    }

    /// Maps the carried data.
    pub fn transform<N, F>(self, transformer: F) -> ValidationWithData<T, N>
    where
        F: FnOnce(D) -> N,
    {
        if self.validation.has_errors() {
            return ValidationWithData::new(self.validation, None);
        }
        ValidationWithData::new(self.validation, self.data.map(transformer))
    }
}

impl<T: Empty, D> ValidationWithData<T, D> {
    /// Hands the data to `action`, or fails with every recorded error.
    pub async fn then_with_entity<F, Fut>(self, action: F) -> ServiceResult<T>
    where
        F: FnOnce(D) -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        match self.data {
            Some(data) if !self.validation.has_errors() => action(data).await,
            _ => self.validation.into_failure(T::empty()),
        }
    }
}

impl<T: Empty, D: Empty> ValidationWithData<T, D> {
    /// Dispatches on whether the carried data is present and non-empty.
    pub async fn match_data_async<W, WFut, P, PFut>(
        self,
        when_empty: W,
        when_present: P,
    ) -> ServiceResult<T>
    where
        W: FnOnce() -> WFut,
        WFut: Future<Output = ServiceResult<T>>,
        P: FnOnce(D) -> PFut,
        PFut: Future<Output = ServiceResult<T>>,
    {
        if self.validation.has_errors() {
            return self.validation.into_failure(T::empty());
        }
        match self.data {
            Some(data) if !data.is_empty() => when_present(data).await,
            _ => when_empty().await,
        }
    }
}
