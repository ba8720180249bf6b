//! Collaborator ports the transactional chain binds to.
//!
//! The chain never talks to a database itself. It asks a [`UnitOfWorkProvider`]
//! for units of work, binds [`Repository`] handles to them and decides when a
//! [`WritableUnitOfWork`] is committed or rolled back. Disposal of a unit of work
//! is its `Drop`.

use async_trait::async_trait;

use crate::traits::Empty;

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Failure reported by a repository or a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("commit failed: {0}")]
    Commit(String),
    #[error("rollback failed: {0}")]
    Rollback(String),
    #[error("{0}")]
    Storage(String),
}

/// A repository handle bound to a unit of work `U`.
///
/// A repository usable both for reads and writes implements this once per unit
/// of work type.
pub trait Repository<U: ?Sized>: Send + Sync + Sized + 'static {
    fn bind(unit_of_work: &U) -> Self;
}

/// Repository over a single entity type.
///
/// A lookup that finds nothing answers the entity's empty sentinel rather than
/// an error.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    type Id: Send + Sync;
    type Entity: Empty + Send + Sync;

    async fn get_by_id(&self, id: &Self::Id) -> PersistenceResult<Self::Entity>;

    async fn add(&self, entity: &Self::Entity) -> PersistenceResult<()>;

    async fn update(&self, entity: &Self::Entity) -> PersistenceResult<()>;
}

/// Unit of work for queries only. Never committed.
pub trait ReadOnlyUnitOfWork: Send + Sync + 'static {
    fn repository<R: Repository<Self>>(&self) -> R
    where
        Self: Sized,
    {
        R::bind(self)
    }
}

/// Unit of work wrapping one transaction.
///
/// The transactional chain calls exactly one of [`commit`](Self::commit) and
/// [`rollback`](Self::rollback), once, and then drops the unit of work.
#[async_trait]
pub trait WritableUnitOfWork: Send + Sync + 'static {
    fn repository<R: Repository<Self>>(&self) -> R
    where
        Self: Sized,
    {
        R::bind(self)
    }

    async fn commit(&mut self) -> PersistenceResult<()>;

    async fn rollback(&mut self) -> PersistenceResult<()>;
}

/// Factory for units of work. Cloned into every chain it starts.
pub trait UnitOfWorkProvider: Clone + Send + Sync + 'static {
    type ReadOnly: ReadOnlyUnitOfWork;
    type Writable: WritableUnitOfWork;

    fn create_read_only(&self) -> Self::ReadOnly;

    fn create_writable(&self) -> Self::Writable;
}
