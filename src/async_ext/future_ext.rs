use core::future::Future;

use futures_core::future::BoxFuture;

use crate::async_ext::catch_unwind::CatchUnwind;

/// Adapters for futures passed into chain steps.
pub trait StepFutureExt: Future + Sized {
    /// Converts a panic while polling into `Err(message)`.
    #[inline]
    fn catch_panic(self) -> CatchUnwind<Self> {
        CatchUnwind::new(self)
    }

    /// Pins and boxes the future.
    #[inline]
    fn boxed<'a>(self) -> BoxFuture<'a, Self::Output>
    where
        Self: Send + 'a,
    {
        Box::pin(self)
    }
}

impl<F: Future> StepFutureExt for F {}
