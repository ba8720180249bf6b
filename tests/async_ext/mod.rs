use std::future::{Future, Ready};
use std::pin::{pin, Pin};
use std::task::{Context, Poll};

use futures_core::future::FusedFuture;
use service_rail::async_ext::{panic_message, CatchUnwind, StepFutureExt};

struct PendingOnce {
    polled: bool,
}

impl Future for PendingOnce {
    type Output = u8;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<u8> {
        if self.polled {
            return Poll::Ready(7);
        }
        self.polled = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[tokio::test]
async fn completed_future_passes_through() {
    assert_eq!(async { 5 }.catch_panic().await, Ok(5));
    assert_eq!(CatchUnwind::new(PendingOnce { polled: false }).await, Ok(7));
}

#[tokio::test]
async fn panic_while_polling_becomes_an_error() {
    let outcome = async {
        if "1".parse::<u8>().is_ok() {
            panic!("poll exploded");
        }
        1
    }
    .catch_panic()
    .await;

    assert_eq!(outcome, Err("poll exploded".to_string()));
}

#[tokio::test]
async fn panic_while_creating_the_future_becomes_an_error() {
    let id = 9;
    let outcome = CatchUnwind::call(|| -> Ready<u8> { panic!("bad id {id}") }).await;

    assert_eq!(outcome, Err("bad id 9".to_string()));
}

#[tokio::test]
async fn call_defers_to_the_returned_future() {
    let mut guarded = pin!(CatchUnwind::call(|| async { "ok" }));
    assert!(!guarded.is_terminated());

    assert_eq!(guarded.as_mut().await, Ok("ok"));
    assert!(guarded.is_terminated());
}

#[tokio::test]
async fn boxed_futures_are_send() {
    fn assert_send<T: Send>(_: &T) {}

    let boxed = async { 2 + 2 }.boxed();
    assert_send(&boxed);
    assert_eq!(boxed.await, 4);
}

#[test]
fn panic_messages_are_extracted() {
    let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
    let borrowed: Box<dyn std::any::Any + Send> = Box::new("borrowed");
    let opaque: Box<dyn std::any::Any + Send> = Box::new(42_u32);

    assert_eq!(panic_message(owned.as_ref()), "owned");
    assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
    assert_eq!(panic_message(opaque.as_ref()), "panic with a non-string payload");
}
