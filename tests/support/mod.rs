//! In-memory persistence fakes that count how units of work are settled.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use service_rail::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: u32,
    pub name: String,
}

impl Exercise {
    pub fn new(id: u32, name: &str) -> Self {
        Self { id, name: name.to_string() }
    }
}

impl Empty for Exercise {
    fn empty() -> Self {
        Self { id: 0, name: String::new() }
    }

    fn is_empty(&self) -> bool {
        self.id == 0
    }
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub writable_opened: AtomicUsize,
    pub read_only_opened: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub writable_disposed: AtomicUsize,
    pub read_only_disposed: AtomicUsize,
}

impl Ledger {
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn writable_opened(&self) -> usize {
        self.writable_opened.load(Ordering::SeqCst)
    }

    pub fn writable_disposed(&self) -> usize {
        self.writable_disposed.load(Ordering::SeqCst)
    }

    pub fn read_only_opened(&self) -> usize {
        self.read_only_opened.load(Ordering::SeqCst)
    }

    pub fn read_only_disposed(&self) -> usize {
        self.read_only_disposed.load(Ordering::SeqCst)
    }
}

type Store = Arc<Mutex<HashMap<u32, Exercise>>>;

#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    pub ledger: Arc<Ledger>,
    pub store: Store,
    pub fail_commit: bool,
}

impl FakeProvider {
    pub fn with_exercises(exercises: &[Exercise]) -> Self {
        let provider = Self::default();
        {
            let mut store = provider.store.lock().unwrap();
            for exercise in exercises {
                store.insert(exercise.id, exercise.clone());
            }
        }
        provider
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn stored(&self, id: u32) -> Option<Exercise> {
        self.store.lock().unwrap().get(&id).cloned()
    }
}

impl UnitOfWorkProvider for FakeProvider {
    type ReadOnly = FakeReadOnly;
    type Writable = FakeWritable;

    fn create_read_only(&self) -> FakeReadOnly {
        self.ledger.read_only_opened.fetch_add(1, Ordering::SeqCst);
        FakeReadOnly { ledger: Arc::clone(&self.ledger), store: Arc::clone(&self.store) }
    }

    fn create_writable(&self) -> FakeWritable {
        self.ledger.writable_opened.fetch_add(1, Ordering::SeqCst);
        FakeWritable {
            ledger: Arc::clone(&self.ledger),
            store: Arc::clone(&self.store),
            fail_commit: self.fail_commit,
        }
    }
}

#[derive(Debug)]
pub struct FakeReadOnly {
    ledger: Arc<Ledger>,
    store: Store,
}

impl ReadOnlyUnitOfWork for FakeReadOnly {}

impl Drop for FakeReadOnly {
    fn drop(&mut self) {
        self.ledger.read_only_disposed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct FakeWritable {
    ledger: Arc<Ledger>,
    store: Store,
    fail_commit: bool,
}

#[async_trait]
impl WritableUnitOfWork for FakeWritable {
    async fn commit(&mut self) -> PersistenceResult<()> {
        if self.fail_commit {
            return Err(PersistenceError::Commit("deadlock detected".to_string()));
        }
        self.ledger.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> PersistenceResult<()> {
        self.ledger.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakeWritable {
    fn drop(&mut self) {
        self.ledger.writable_disposed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct ExerciseRepository {
    store: Store,
    pub read_only: bool,
}

impl ExerciseRepository {
    pub fn find(&self, id: u32) -> Exercise {
        self.store.lock().unwrap().get(&id).cloned().unwrap_or_else(Exercise::empty)
    }

    pub fn save(&self, exercise: &Exercise) {
        self.store.lock().unwrap().insert(exercise.id, exercise.clone());
    }
}

impl Repository<FakeWritable> for ExerciseRepository {
    fn bind(unit_of_work: &FakeWritable) -> Self {
        Self { store: Arc::clone(&unit_of_work.store), read_only: false }
    }
}

impl Repository<FakeReadOnly> for ExerciseRepository {
    fn bind(unit_of_work: &FakeReadOnly) -> Self {
        Self { store: Arc::clone(&unit_of_work.store), read_only: true }
    }
}

#[async_trait]
impl EntityRepository for ExerciseRepository {
    type Id = u32;
    type Entity = Exercise;

    async fn get_by_id(&self, id: &u32) -> PersistenceResult<Exercise> {
        Ok(self.find(*id))
    }

    async fn add(&self, entity: &Exercise) -> PersistenceResult<()> {
        let mut store = self.store.lock().unwrap();
        if store.contains_key(&entity.id) {
            return Err(PersistenceError::Storage(format!("duplicate key {}", entity.id)));
        }
        store.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &Exercise) -> PersistenceResult<()> {
        self.save(entity);
        Ok(())
    }
}

/// A disposable resource that counts its disposals.
#[derive(Debug)]
pub struct Tracked {
    pub disposals: Arc<AtomicUsize>,
    pub fail: bool,
}

impl Tracked {
    pub fn new(disposals: &Arc<AtomicUsize>) -> Self {
        Self { disposals: Arc::clone(disposals), fail: false }
    }

    pub fn failing(disposals: &Arc<AtomicUsize>) -> Self {
        Self { disposals: Arc::clone(disposals), fail: true }
    }
}

impl Disposable for Tracked {
    fn dispose(&mut self) -> Result<(), DisposeError> {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DisposeError::new("handle already closed"));
        }
        Ok(())
    }
}

/// Remembers how many writable units of work were disposed when it was disposed itself.
#[derive(Debug)]
pub struct DisposalRecorder {
    ledger: Arc<Ledger>,
    pub seen: Arc<Mutex<Option<usize>>>,
}

impl DisposalRecorder {
    pub fn new(ledger: &Arc<Ledger>) -> Self {
        Self { ledger: Arc::clone(ledger), seen: Arc::new(Mutex::new(None)) }
    }
}

impl Disposable for DisposalRecorder {
    fn dispose(&mut self) -> Result<(), DisposeError> {
        *self.seen.lock().unwrap() = Some(self.ledger.writable_disposed());
        Ok(())
    }
}
