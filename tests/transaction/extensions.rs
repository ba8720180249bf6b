use std::future::ready;

use service_rail::prelude::*;
use service_rail::transaction::UNIT_OF_WORK_PROVIDER_KEY;

use crate::support::{Exercise, ExerciseRepository, FakeProvider};

fn provider() -> FakeProvider {
    FakeProvider::with_exercises(&[Exercise::new(1, "Squat")])
}

#[test]
fn read_only_repository_is_stored_under_its_key() {
    let provider = provider();

    let builder = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_read_only_repository::<ExerciseRepository>(None);

    let repository = builder
        .context()
        .get::<ExerciseRepository>("ReadOnlyExerciseRepository")
        .unwrap();
    assert!(repository.read_only);
    assert_eq!(repository.find(1).name, "Squat");
    assert!(!builder.has_unit_of_work());
    assert_eq!(provider.ledger.read_only_opened(), 1);
    assert_eq!(provider.ledger.read_only_disposed(), 1);
}

#[test]
fn repositories_can_use_a_custom_key() {
    let builder = ServiceValidate::transaction::<_, String>(provider())
        .then_create_read_only_repository::<ExerciseRepository>(Some("Catalog"))
        .then_create_writable_repository::<ExerciseRepository>(Some("Editor"));

    assert!(builder.context().get::<ExerciseRepository>("Catalog").unwrap().read_only);
    assert!(!builder.context().get::<ExerciseRepository>("Editor").unwrap().read_only);
    assert!(!builder.context().contains("ReadOnlyExerciseRepository"));
}

#[test]
fn writable_repository_opens_the_unit_of_work() {
    let provider = provider();

    let builder = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_create_writable_repository::<ExerciseRepository>(None);

    assert!(builder.has_unit_of_work());
    assert!(builder.context().get_repository::<ExerciseRepository>(false).is_ok());
    assert_eq!(provider.ledger.writable_opened(), 1);
}

#[test]
fn missing_provider_is_recorded() {
    let mut builder = ServiceValidate::transaction::<_, String>(provider());
    assert!(builder.context_mut().remove(UNIT_OF_WORK_PROVIDER_KEY));

    let builder = builder.then_create_read_only_repository::<ExerciseRepository>(None);

    let error = &builder.errors()[0];
    assert_eq!(error.code(), ServiceErrorCode::InternalError);
    assert!(error
        .message()
        .starts_with("Repository creation failed: no item with key 'UnitOfWorkProvider'"));
}

#[test]
fn blank_custom_key_is_recorded() {
    let builder = ServiceValidate::transaction::<_, String>(provider())
        .then_create_writable_repository::<ExerciseRepository>(Some(" "));

    assert_eq!(
        builder.errors(),
        [ServiceError::internal_error(
            "Repository creation failed: storage key cannot be empty or whitespace"
        )]
    );
}

#[test]
fn execute_if_applies_the_action_only_when_the_condition_holds() {
    let builder = ServiceValidate::transaction::<_, String>(provider())
        .then_create_read_only_repository::<ExerciseRepository>(None)
        .then_execute_if(
            |context| context.contains("ReadOnlyExerciseRepository"),
            |builder| builder.ensure(|| false, "Catalog is read only"),
        )
        .then_execute_if(
            |context| context.contains("WritableExerciseRepository"),
            |builder| builder.ensure(|| false, "never"),
        );

    assert_eq!(builder.errors(), [ServiceError::validation_failed("Catalog is read only")]);
}

#[tokio::test]
async fn execute_if_async_awaits_the_action() {
    let provider = provider();

    let result = ServiceValidate::transaction::<_, String>(provider.clone())
        .then_execute_if_async(
            |context| !context.contains("Label"),
            |builder| async move {
                builder
                    .then_perform_async(|context| {
                        let stored = context.store("Label", "Squat".to_string());
                        ready(stored.map_err(|e| e.to_string()))
                    })
                    .await
            },
        )
        .await
        .then_execute_if_async(
            |_| false,
            |builder| async move { builder.ensure(|| false, "never") },
        )
        .await
        .then_execute_in_context_async(|context| ready(context.get::<String>("Label").cloned()))
        .await;

    assert_eq!(result.value(), "Squat");
    assert_eq!(provider.ledger.writable_opened(), 0);
}
