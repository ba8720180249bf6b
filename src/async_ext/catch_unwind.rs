//! Last-resort panic boundary for injected steps.
//!
//! Chain steps report failures through `Result`. A step that panics instead is
//! caught here so the owning chain can still roll back and answer with an
//! `InternalError`.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures_core::future::FusedFuture;

use pin_project_lite::pin_project;

pin_project! {
    /// A Future wrapper that converts a panic raised while polling the inner
    /// future into `Err(message)`.
    ///
    /// [`CatchUnwind::call`] additionally guards the synchronous call that
    /// produces the future, which is where injected closures usually inspect
    /// borrowed state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_rail::async_ext::CatchUnwind;
    ///
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// let outcome = rt.block_on(CatchUnwind::new(async {
    ///     if rt_is_on_fire() {
    ///         panic!("disk on fire");
    ///     }
    ///     1
    /// }));
    /// assert_eq!(outcome, Err("disk on fire".to_string()));
    ///
    /// let outcome = rt.block_on(CatchUnwind::call(|| -> core::future::Ready<i32> {
    ///     panic!("bad input")
    /// }));
    /// assert_eq!(outcome, Err("bad input".to_string()));
    /// # fn rt_is_on_fire() -> bool { true }
    /// ```
    #[must_use = "futures do nothing unless polled"]
    pub struct CatchUnwind<Fut> {
        #[pin]
        future: Option<Fut>,
        failure: Option<String>,
        done: bool,
    }
}

impl<Fut> CatchUnwind<Fut> {
    #[inline]
    pub fn new(future: Fut) -> Self {
        Self { future: Some(future), failure: None, done: false }
    }

    /// Invokes `step` now and guards both the call and the future it returns.
    pub fn call<F>(step: F) -> Self
    where
        F: FnOnce() -> Fut,
    {
        match catch_unwind(AssertUnwindSafe(step)) {
            Ok(future) => Self::new(future),
            Err(payload) => Self {
                future: None,
                failure: Some(report(payload.as_ref())),
                done: false,
            },
        }
    }
}

impl<Fut: Future> Future for CatchUnwind<Fut> {
    type Output = Result<Fut::Output, String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if let Some(message) = this.failure.take() {
            *this.done = true;
            return Poll::Ready(Err(message));
        }
        let mut slot = this.future;
        let Some(future) = slot.as_mut().as_pin_mut() else {
            return Poll::Ready(Err("step polled after completion".to_owned()));
        };

        let output = match catch_unwind(AssertUnwindSafe(|| future.poll(cx))) {
            Ok(Poll::Pending) => return Poll::Pending,
            Ok(Poll::Ready(output)) => Ok(output),
            Err(payload) => Err(report(payload.as_ref())),
        };
        slot.set(None);
        *this.done = true;
        Poll::Ready(output)
    }
}

impl<Fut: Future> FusedFuture for CatchUnwind<Fut> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

fn report(payload: &(dyn Any + Send)) -> String {
    let message = panic_message(payload);
    tracing::warn!(panic = %message, "chain step panicked");
    message
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_owned()
    }
}
