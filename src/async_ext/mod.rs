//! Future adapters used by the asynchronous chain steps.
//!
//! # Examples
//!
//! ```
//! use service_rail::async_ext::StepFutureExt;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! let value = rt.block_on(async { 21 * 2 }.catch_panic());
//! assert_eq!(value, Ok(42));
//! ```

mod catch_unwind;
mod future_ext;

pub use catch_unwind::{panic_message, CatchUnwind};
pub use future_ext::StepFutureExt;
pub use futures_core::future::BoxFuture;
