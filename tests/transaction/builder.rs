use std::future::{ready, Ready};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use service_rail::prelude::*;
use service_rail::transaction::UNIT_OF_WORK_PROVIDER_KEY;

use crate::support::{
    DisposalRecorder, Exercise, ExerciseRepository, FakeProvider, FakeWritable, Tracked,
};

fn squat() -> FakeProvider {
    FakeProvider::with_exercises(&[Exercise::new(1, "Squat")])
}

#[tokio::test]
async fn valid_chain_commits_once() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, Exercise>(provider.clone())
        .ensure_not_whitespace("Squat", "Name is required")
        .then_load_by_id_async::<ExerciseRepository>(&1)
        .await
        .then_ensure_not_empty(ServiceError::not_found("Exercise"))
        .then_commit_async(|exercise| exercise)
        .await;

    assert_eq!(result.value(), &Exercise::new(1, "Squat"));
    assert_eq!(provider.ledger.commits(), 1);
    assert_eq!(provider.ledger.rollbacks(), 0);
    assert_eq!(provider.ledger.writable_opened(), 1);
    assert_eq!(provider.ledger.writable_disposed(), 1);
}

#[tokio::test]
async fn failing_step_after_load_rolls_back_once() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, Exercise>(provider.clone())
        .then_load_by_id_async::<ExerciseRepository>(&1)
        .await
        .then_ensure(|exercise| exercise.name == "Bench Press", "Not a bench exercise")
        .then_commit_async(|exercise| exercise)
        .await;

    assert_eq!(
        result.structured_errors(),
        [ServiceError::validation_failed("Not a bench exercise")]
    );
    assert!(Empty::is_empty(result.value()));
    assert_eq!(provider.ledger.commits(), 0);
    assert_eq!(provider.ledger.rollbacks(), 1);
    assert_eq!(provider.ledger.writable_disposed(), 1);
}

#[tokio::test]
async fn failure_before_any_unit_of_work_settles_nothing() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .ensure_not_whitespace(" ", "Name is required")
        .ensure_not_whitespace("", "never recorded")
        .then_execute_async(|_: ExerciseRepository| async { Ok::<_, String>("never".to_string()) })
        .await;

    assert_eq!(result.structured_errors(), [ServiceError::validation_failed("Name is required")]);
    assert_eq!(provider.ledger.writable_opened(), 0);
    assert_eq!(provider.ledger.commits(), 0);
    assert_eq!(provider.ledger.rollbacks(), 0);
}

#[tokio::test]
async fn rules_short_circuit() {
    let evaluated = AtomicUsize::new(0);

    let builder = ServiceValidate::transaction::<_, String>(squat())
        .ensure(|| false, "first")
        .ensure(
            || {
                evaluated.fetch_add(1, Ordering::SeqCst);
                false
            },
            "second",
        )
        .ensure_async(
            || {
                evaluated.fetch_add(1, Ordering::SeqCst);
                async { false }
            },
            "third",
        )
        .await;

    assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    assert_eq!(builder.errors(), [ServiceError::validation_failed("first")]);
    assert!(!builder.is_valid());
}

#[tokio::test]
async fn execute_error_rolls_back() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_execute_async(|_: ExerciseRepository| async { Err::<String, _>("disk full") })
        .await;

    assert_eq!(
        result.structured_errors(),
        [ServiceError::internal_error("Operation failed: disk full")]
    );
    assert_eq!(provider.ledger.commits(), 0);
    assert_eq!(provider.ledger.rollbacks(), 1);
}

#[tokio::test]
async fn execute_panic_rolls_back() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_execute_async(|_: ExerciseRepository| -> Ready<Result<String, String>> {
            panic!("connection reset")
        })
        .await;

    assert_eq!(
        result.structured_errors(),
        [ServiceError::internal_error("Operation failed: connection reset")]
    );
    assert_eq!(provider.ledger.commits(), 0);
    assert_eq!(provider.ledger.rollbacks(), 1);
    assert_eq!(provider.ledger.writable_disposed(), 1);
}

#[tokio::test]
async fn execute_success_commits_the_work() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .ensure_min_length("Lunge", 3, "Name too short")
        .then_execute_async(|repository: ExerciseRepository| async move {
            repository.save(&Exercise::new(2, "Lunge"));
            Ok::<_, String>("Lunge".to_string())
        })
        .await;

    assert_eq!(result.value(), "Lunge");
    assert_eq!(provider.stored(2), Some(Exercise::new(2, "Lunge")));
    assert_eq!(provider.ledger.commits(), 1);
    assert_eq!(provider.ledger.rollbacks(), 0);
}

#[tokio::test]
async fn commit_failure_is_reported_without_rollback() {
    let provider = squat().failing_commit();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_execute_async(|_: ExerciseRepository| async { Ok::<_, String>("saved".to_string()) })
        .await;

    assert_eq!(
        result.structured_errors(),
        [ServiceError::internal_error("Operation failed: commit failed: deadlock detected")]
    );
    assert_eq!(result.value(), "");
    assert_eq!(provider.ledger.rollbacks(), 0);
    assert_eq!(provider.ledger.writable_disposed(), 1);
}

#[tokio::test]
async fn execute_with_unit_of_work_and_context() {
    let provider = squat();

    let renamed = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_execute_with_unit_of_work_async(|unit_of_work: &mut FakeWritable| {
            let repository: ExerciseRepository = unit_of_work.repository();
            repository.save(&Exercise::new(1, "Back Squat"));
            ready(Ok::<_, String>("Back Squat".to_string()))
        })
        .await;
    assert_eq!(renamed.value(), "Back Squat");
    assert_eq!(provider.stored(1).map(|exercise| exercise.name), Some("Back Squat".to_string()));

    let counted = ServiceValidate::transaction::<_, usize>(provider.clone())
        .then_execute_with_context_async(|unit_of_work, context| {
            let repository: ExerciseRepository = unit_of_work.repository();
            let exists = !repository.find(1).is_empty();
            ready(Ok::<_, String>(usize::from(exists) + context.len()))
        })
        .await;
    assert_eq!(*counted.value(), 2);
    assert_eq!(provider.ledger.commits(), 2);
}

#[tokio::test]
async fn execute_in_context_commits_only_an_opened_unit_of_work() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_perform_async(|context| {
            ready(context.store("Name", "Plank".to_string()).map_err(|e| e.to_string()))
        })
        .await
        .then_execute_in_context_async(|context| ready(context.get::<String>("Name").cloned()))
        .await;

    assert_eq!(result.value(), "Plank");
    assert_eq!(provider.ledger.writable_opened(), 0);
    assert_eq!(provider.ledger.commits(), 0);

    let failed = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None)
        .then_execute_in_context_async(|context| ready(context.get::<String>("Missing").cloned()))
        .await;

    let error = &failed.structured_errors()[0];
    assert_eq!(error.code(), ServiceErrorCode::InternalError);
    assert!(error.message().starts_with("Execute operation failed: no item with key 'Missing'"));
    assert_eq!(provider.ledger.rollbacks(), 1);
}

#[tokio::test]
async fn context_steps_share_values() {
    let provider = squat();

    let builder = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_load_into("Exercise", |_| ready(Ok::<_, String>(Exercise::new(7, "Row"))))
        .await
        .then_perform_if_async(
            |context| context.contains("Exercise"),
            |context| {
                let renamed = context
                    .get::<Exercise>("Exercise")
                    .map(|exercise| exercise.name.to_uppercase());
                let stored = renamed.and_then(|name| context.store("Label", name));
                ready(stored.map_err(|e| e.to_string()))
            },
        )
        .await
        .then_perform_if_async(
            |context| context.contains("Missing"),
            |_| ready(Err::<(), _>("never")),
        )
        .await
        .then_ensure_async(|context| ready(context.contains("Label")), "Label is missing")
        .await;

    assert!(builder.is_valid());
    assert_eq!(builder.context().get::<String>("Label").unwrap(), "ROW");
}

#[tokio::test]
async fn context_step_failures_are_labelled() {
    let load = ServiceValidate::transaction::<_, String>(squat())
        .then_load_into("Exercise", |_| ready(Err::<Exercise, _>("timeout")))
        .await;
    assert_eq!(load.errors(), [ServiceError::internal_error("Load operation failed: timeout")]);

    let perform = ServiceValidate::transaction::<_, String>(squat())
        .then_perform_async(|_| ready(Err::<(), _>("locked")))
        .await;
    assert_eq!(
        perform.errors(),
        [ServiceError::internal_error("Perform operation failed: locked")]
    );

    let conditional = ServiceValidate::transaction::<_, String>(squat())
        .then_perform_if_async(|_| true, |_| ready(Err::<(), _>("locked")))
        .await;
    assert_eq!(
        conditional.errors(),
        [ServiceError::internal_error("Conditional perform operation failed: locked")]
    );

    let ensure = ServiceValidate::transaction::<_, String>(squat())
        .then_ensure_async(|_| -> Ready<bool> { panic!("predicate exploded") }, "unused")
        .await;
    assert_eq!(
        ensure.errors(),
        [ServiceError::internal_error("Ensure operation failed: predicate exploded")]
    );

    let rejected = ServiceValidate::transaction::<_, String>(squat())
        .then_ensure_async(|_| ready(false), ServiceError::not_found("Exercise"))
        .await;
    assert_eq!(rejected.errors(), [ServiceError::not_found("Exercise")]);
}

#[tokio::test]
async fn match_async_commits_success() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None)
        .match_async(
            || async { ServiceResult::success("done".to_string()) },
            |errors| ServiceResult::failure_many(String::new(), errors.to_vec()),
        )
        .await;

    assert!(result.is_success());
    assert_eq!(provider.ledger.commits(), 1);
    assert_eq!(provider.ledger.rollbacks(), 0);
}

#[tokio::test]
async fn match_async_rolls_back_a_failed_outcome() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None)
        .match_async(
            || async {
                ServiceResult::failure(
                    String::new(),
                    ServiceError::new(ServiceErrorCode::ConcurrencyConflict, "stale version"),
                )
            },
            |errors| ServiceResult::failure_many(String::new(), errors.to_vec()),
        )
        .await;

    assert_eq!(
        result.first_error().map(ServiceError::code),
        Some(ServiceErrorCode::ConcurrencyConflict)
    );
    assert_eq!(provider.ledger.commits(), 0);
    assert_eq!(provider.ledger.rollbacks(), 1);
}

#[tokio::test]
async fn match_async_rolls_back_when_the_outcome_panics() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None)
        .match_async(
            || async {
                if "1".parse::<u8>().is_ok() {
                    panic!("pool exhausted");
                }
                ServiceResult::success("never".to_string())
            },
            |errors| ServiceResult::failure_many(String::new(), errors.to_vec()),
        )
        .await;

    assert_eq!(
        result.structured_errors(),
        [ServiceError::internal_error("Transaction failed: pool exhausted")]
    );
    assert_eq!(provider.ledger.commits(), 0);
    assert_eq!(provider.ledger.rollbacks(), 1);
    assert_eq!(provider.ledger.writable_disposed(), 1);

    let provider = squat();
    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None)
        .match_async(
            || -> Ready<ServiceResult<String>> { panic!("no handler") },
            |errors| ServiceResult::failure_many(String::new(), errors.to_vec()),
        )
        .await;

    assert_eq!(
        result.structured_errors(),
        [ServiceError::internal_error("Transaction failed: no handler")]
    );
    assert_eq!(provider.ledger.rollbacks(), 1);
}

#[tokio::test]
async fn match_async_on_invalid_chain_hands_over_every_error() {
    let provider = squat();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None)
        .ensure(|| false, ServiceError::already_exists("Exercise", "Squat"))
        .match_async(
            || async { ServiceResult::success("never".to_string()) },
            |errors| ServiceResult::failure_many(String::new(), errors.to_vec()),
        )
        .await;

    assert_eq!(result.structured_errors(), [ServiceError::already_exists("Exercise", "Squat")]);
    assert_eq!(provider.ledger.rollbacks(), 1);
}

#[tokio::test]
async fn match_async_commit_failure_goes_to_when_invalid() {
    let provider = squat().failing_commit();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None)
        .match_async(
            || async { ServiceResult::success("done".to_string()) },
            |errors| ServiceResult::failure_many(String::new(), errors.to_vec()),
        )
        .await;

    assert_eq!(
        result.structured_errors(),
        [ServiceError::internal_error("Transaction failed: commit failed: deadlock detected")]
    );
}

#[tokio::test]
async fn unit_of_work_is_disposed_before_the_context() {
    let provider = squat();
    let disposals = Arc::new(AtomicUsize::new(0));
    let recorder = DisposalRecorder::new(&provider.ledger);
    let seen = Arc::clone(&recorder.seen);
    let tracked = Tracked::new(&disposals);

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_perform_async(move |context| {
            let stored = context
                .store_disposable("Recorder", recorder)
                .and_then(|()| context.store_disposable("Tracked", tracked));
            ready(stored.map_err(|e| e.to_string()))
        })
        .await
        .then_execute_async(|_: ExerciseRepository| async { Ok::<_, String>("done".to_string()) })
        .await;

    assert!(result.is_success());
    assert_eq!(*seen.lock().unwrap(), Some(1));
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropping_an_unfinished_chain_disposes_without_settling() {
    let provider = squat();

    let mut builder = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None);
    assert!(builder.has_unit_of_work());

    builder.dispose();
    builder.dispose();
    assert!(!builder.has_unit_of_work());
    assert!(builder.context().is_disposed());
    drop(builder);

    assert_eq!(provider.ledger.writable_disposed(), 1);
    assert_eq!(provider.ledger.commits(), 0);
    assert_eq!(provider.ledger.rollbacks(), 0);
}

#[test]
fn provider_is_registered_in_the_context() {
    let builder = ServiceValidate::transaction::<_, String>(squat());

    assert!(builder.context().get::<FakeProvider>(UNIT_OF_WORK_PROVIDER_KEY).is_ok());
    assert!(!builder.has_unit_of_work());
}
