//! Validation chains bound to a writable unit of work.
//!
//! A [`TransactionalServiceValidationBuilder`] moves through
//! `valid (no unit of work) -> valid (unit of work open) -> committed | rolled back`,
//! and can become invalid from either valid state. Once invalid it stays
//! invalid. Every terminal operation reaches exactly one of commit and rollback
//! for an opened unit of work, then disposes the unit of work and the context.
//!
//! # Examples
//!
//! ```
//! use service_rail::prelude::*;
//!
//! #[derive(Clone)]
//! struct Provider;
//! struct Reader;
//! struct Writer;
//! struct Names;
//!
//! impl ReadOnlyUnitOfWork for Reader {}
//!
//! #[async_trait::async_trait]
//! impl WritableUnitOfWork for Writer {
//!     async fn commit(&mut self) -> PersistenceResult<()> { Ok(()) }
//!     async fn rollback(&mut self) -> PersistenceResult<()> { Ok(()) }
//! }
//!
//! impl Repository<Writer> for Names {
//!     fn bind(_: &Writer) -> Self { Names }
//! }
//!
//! impl UnitOfWorkProvider for Provider {
//!     type ReadOnly = Reader;
//!     type Writable = Writer;
//!     fn create_read_only(&self) -> Reader { Reader }
//!     fn create_writable(&self) -> Writer { Writer }
//! }
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let result = ServiceValidate::transaction::<_, String>(Provider)
//!     .ensure_not_whitespace("Barbell", "Name is required")
//!     .then_load_async(|_: Names| async { Ok::<_, PersistenceError>(String::from("barbell")) })
//!     .await
//!     .then_ensure_not_empty(ServiceError::not_found("Equipment"))
//!     .then_commit_async(|name| name.to_uppercase())
//!     .await;
//!
//! assert_eq!(result.value(), "BARBELL");
//! # });
//! ```
mod builder;
mod entity_chain;
mod extensions;

pub use self::builder::{TransactionalServiceValidationBuilder, UNIT_OF_WORK_PROVIDER_KEY};
pub use self::entity_chain::TransactionalEntityChain;
