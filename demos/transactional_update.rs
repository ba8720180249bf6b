//! Transactional Update Pattern
//!
//! Renames a stored exercise inside one writable unit of work: load the
//! entity, check it, transform it, persist it and commit. A failing step rolls
//! the unit of work back and the caller receives the coded errors instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use service_rail::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Exercise {
    id: u32,
    name: String,
}

impl Empty for Exercise {
    fn empty() -> Self {
        Self { id: 0, name: String::new() }
    }

    fn is_empty(&self) -> bool {
        self.id == 0
    }
}

type Table = Arc<Mutex<HashMap<u32, Exercise>>>;

/// Hands out units of work over one shared in-memory table.
#[derive(Debug, Clone, Default)]
struct InMemoryProvider {
    table: Table,
}

impl InMemoryProvider {
    fn seeded(exercises: &[(u32, &str)]) -> Self {
        let table: HashMap<_, _> = exercises
            .iter()
            .map(|&(id, name)| (id, Exercise { id, name: name.to_string() }))
            .collect();
        Self { table: Arc::new(Mutex::new(table)) }
    }

    fn name_of(&self, id: u32) -> Option<String> {
        let table = self.table.lock().ok()?;
        table.get(&id).map(|exercise| exercise.name.clone())
    }
}

impl UnitOfWorkProvider for InMemoryProvider {
    type ReadOnly = Snapshot;
    type Writable = Transaction;

    fn create_read_only(&self) -> Snapshot {
        Snapshot { table: Arc::clone(&self.table) }
    }

    fn create_writable(&self) -> Transaction {
        Transaction { table: Arc::clone(&self.table), staged: Table::default() }
    }
}

#[derive(Debug)]
struct Snapshot {
    table: Table,
}

impl ReadOnlyUnitOfWork for Snapshot {}

/// Buffers writes until commit.
#[derive(Debug)]
struct Transaction {
    table: Table,
    staged: Table,
}

#[async_trait]
impl WritableUnitOfWork for Transaction {
    async fn commit(&mut self) -> PersistenceResult<()> {
        let mut staged = lock(&self.staged)?;
        let mut table = lock(&self.table)?;
        for (id, exercise) in staged.drain() {
            println!("  commit: #{id} -> {}", exercise.name);
            table.insert(id, exercise);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> PersistenceResult<()> {
        let mut staged = lock(&self.staged)?;
        println!("  rollback: discarding {} staged write(s)", staged.len());
        staged.clear();
        Ok(())
    }
}

fn lock(table: &Table) -> PersistenceResult<MutexGuard<'_, HashMap<u32, Exercise>>> {
    table.lock().map_err(|_| PersistenceError::Storage("table lock poisoned".to_string()))
}

/// Reads committed rows; writes go to the unit of work's staging area.
#[derive(Debug, Clone)]
struct ExerciseRepository {
    table: Table,
    staged: Option<Table>,
}

impl ExerciseRepository {
    fn staging(&self) -> PersistenceResult<&Table> {
        self.staged
            .as_ref()
            .ok_or_else(|| PersistenceError::Storage("repository is read-only".to_string()))
    }
}

impl Repository<Transaction> for ExerciseRepository {
    fn bind(unit_of_work: &Transaction) -> Self {
        Self {
            table: Arc::clone(&unit_of_work.table),
            staged: Some(Arc::clone(&unit_of_work.staged)),
        }
    }
}

impl Repository<Snapshot> for ExerciseRepository {
    fn bind(unit_of_work: &Snapshot) -> Self {
        Self { table: Arc::clone(&unit_of_work.table), staged: None }
    }
}

#[async_trait]
impl EntityRepository for ExerciseRepository {
    type Id = u32;
    type Entity = Exercise;

    async fn get_by_id(&self, id: &u32) -> PersistenceResult<Exercise> {
        let table = lock(&self.table)?;
        Ok(table.get(id).cloned().unwrap_or_else(Exercise::empty))
    }

    async fn add(&self, entity: &Exercise) -> PersistenceResult<()> {
        let exists = lock(&self.table)?.contains_key(&entity.id);
        if exists {
            return Err(PersistenceError::Storage(format!("duplicate key {}", entity.id)));
        }
        self.update(entity).await
    }

    async fn update(&self, entity: &Exercise) -> PersistenceResult<()> {
        lock(self.staging()?)?.insert(entity.id, entity.clone());
        Ok(())
    }
}

fn rename(exercise: Exercise, name: &str) -> Result<Exercise, String> {
    if name.len() > 20 {
        return Err(format!("'{name}' is longer than 20 characters"));
    }
    Ok(Exercise { name: name.to_string(), ..exercise })
}

async fn rename_exercise(provider: InMemoryProvider, id: u32, name: &str) -> ServiceResult<String> {
    ServiceValidate::transaction::<_, String>(provider)
        .ensure_not_whitespace(name, "New name is required")
        .then_load_by_id_async::<ExerciseRepository>(&id)
        .await
        .then_ensure_not_empty(ServiceError::not_found("Exercise"))
        .then_ensure(|exercise| exercise.name != name, "Name is unchanged")
        .then_transform(|exercise| rename(exercise, name), "Rename")
        .then_update_async::<ExerciseRepository>()
        .await
        .then_commit_async(|exercise| exercise.name)
        .await
}

fn report(label: &str, result: &ServiceResult<String>) {
    if result.is_success() {
        println!("{label}: ok -> {}", result.value());
        return;
    }
    for error in result.structured_errors() {
        println!("{label}: {} -> {}", error.code(), error.message());
    }
}

#[tokio::main]
async fn main() {
    let provider = InMemoryProvider::seeded(&[(1, "Squat"), (2, "Deadlift")]);

    println!("rename #1 to Front Squat");
    let renamed = rename_exercise(provider.clone(), 1, "Front Squat").await;
    report("rename #1", &renamed);

    println!("rename #42 to Lunge");
    let missing = rename_exercise(provider.clone(), 42, "Lunge").await;
    report("rename #42", &missing);

    println!("rename #2 to a name that is too long");
    let too_long = rename_exercise(provider.clone(), 2, "Romanian Single Leg Deadlift").await;
    report("rename #2", &too_long);

    println!("rename #2 to blank");
    let blank = rename_exercise(provider.clone(), 2, "   ").await;
    report("rename #2", &blank);

    println!("stored: #1 = {:?}, #2 = {:?}", provider.name_of(1), provider.name_of(2));
}
