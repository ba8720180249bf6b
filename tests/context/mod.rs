use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use service_rail::context::{ContextError, DynamicChainContext};
use service_rail::impl_data_key;

use crate::support::Tracked;

#[derive(Debug, PartialEq)]
struct Equipment {
    name: &'static str,
}

impl_data_key!(Equipment);

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

#[test]
fn get_with_wrong_type_is_a_mismatch() {
    let mut context = DynamicChainContext::new();
    context.store("Count", 3_u32).unwrap();

    let error = context.get::<String>("Count").unwrap_err();
    assert_eq!(
        error,
        ContextError::TypeMismatch { key: "Count".to_string(), expected: "String", actual: "u32" }
    );
    assert!(context.try_get::<String>("Count").is_none());
    assert_eq!(context.try_get::<u32>("Count"), Some(&3));
}

#[test]
fn blank_and_missing_keys_are_rejected() {
    let mut context = DynamicChainContext::new();

    assert_eq!(context.store("  ", 1_u8), Err(ContextError::EmptyKey));
    assert_eq!(context.get::<u8>(""), Err(ContextError::EmptyKey));
    assert_eq!(
        context.get::<u8>("Missing"),
        Err(ContextError::MissingKey { key: "Missing".to_string() })
    );
    assert!(context.try_get::<u8>(" ").is_none());
    assert!(!context.contains(""));
    assert!(context.is_empty());
}

#[test]
fn missing_key_message_names_the_key() {
    let context = DynamicChainContext::new();
    let message = context.get::<u8>("Equipment").unwrap_err().to_string();
    assert!(message.contains("'Equipment'"), "unexpected message: {message}");
}

#[test]
fn store_replaces_existing_values() {
    let mut context = DynamicChainContext::new();
    context.store("Name", String::from("Barbell")).unwrap();
    context.store("Name", String::from("Kettlebell")).unwrap();

    assert_eq!(context.len(), 1);
    assert_eq!(context.get::<String>("Name").unwrap(), "Kettlebell");
}

#[test]
fn get_mut_updates_in_place() {
    let mut context = DynamicChainContext::new();
    context.store("Sets", vec![5_u32]).unwrap();

    context.get_mut::<Vec<u32>>("Sets").unwrap().push(3);

    assert_eq!(context.get::<Vec<u32>>("Sets").unwrap(), &[5, 3]);
    assert!(matches!(
        context.get_mut::<String>("Sets"),
        Err(ContextError::TypeMismatch { .. })
    ));
}

#[test]
fn clear_disposes_every_disposable_once_even_when_one_fails() {
    let first = counter();
    let failing = counter();
    let last = counter();

    let mut context = DynamicChainContext::new();
    context.store_disposable("First", Tracked::new(&first)).unwrap();
    context.store_disposable("Failing", Tracked::failing(&failing)).unwrap();
    context.store_disposable("Last", Tracked::new(&last)).unwrap();
    context.store("Plain", 1_u8).unwrap();

    context.clear();

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(failing.load(Ordering::SeqCst), 1);
    assert_eq!(last.load(Ordering::SeqCst), 1);
    assert!(context.is_empty());

    drop(context);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(failing.load(Ordering::SeqCst), 1);
    assert_eq!(last.load(Ordering::SeqCst), 1);
}

#[test]
fn replaced_disposables_are_still_disposed() {
    let replaced = counter();
    let current = counter();

    let mut context = DynamicChainContext::new();
    context.store_disposable("Handle", Tracked::new(&replaced)).unwrap();
    context.store_disposable("Handle", Tracked::new(&current)).unwrap();
    assert_eq!(replaced.load(Ordering::SeqCst), 0);

    context.dispose();

    assert_eq!(replaced.load(Ordering::SeqCst), 1);
    assert_eq!(current.load(Ordering::SeqCst), 1);
}

#[test]
fn remove_disposes_but_take_hands_over() {
    let removed = counter();
    let taken = counter();

    let mut context = DynamicChainContext::new();
    context.store_disposable("Removed", Tracked::new(&removed)).unwrap();
    context.store_disposable("Taken", Tracked::new(&taken)).unwrap();

    assert!(context.remove("Removed"));
    assert!(!context.remove("Removed"));
    assert_eq!(removed.load(Ordering::SeqCst), 1);

    let handle = context.take::<Tracked>("Taken").unwrap();
    assert!(!context.contains("Taken"));

    drop(context);
    assert_eq!(taken.load(Ordering::SeqCst), 0);
    assert_eq!(handle.disposals.load(Ordering::SeqCst), 0);
}

#[test]
fn take_with_wrong_type_leaves_the_entry() {
    let mut context = DynamicChainContext::new();
    context.store("Name", String::from("Barbell")).unwrap();

    assert!(matches!(context.take::<u32>("Name"), Err(ContextError::TypeMismatch { .. })));
    assert_eq!(context.take::<String>("Name").unwrap(), "Barbell");
    assert!(context.is_empty());
}

#[test]
fn dispose_is_idempotent() {
    let disposals = counter();
    let mut context = DynamicChainContext::new();
    context.store_disposable("Handle", Tracked::new(&disposals)).unwrap();

    context.dispose();
    context.dispose();
    assert!(context.is_disposed());
    drop(context);

    assert_eq!(disposals.load(Ordering::SeqCst), 1);
}

#[test]
fn disposed_context_rejects_new_values() {
    let disposals = counter();
    let mut context = DynamicChainContext::new();
    context.dispose();

    assert_eq!(
        context.store_disposable("Late", Tracked::new(&disposals)),
        Err(ContextError::Disposed)
    );
    assert_eq!(context.store("Name", String::from("Barbell")), Err(ContextError::Disposed));
    assert!(context.is_empty());
    drop(context);

    assert_eq!(disposals.load(Ordering::SeqCst), 1);
}

#[test]
fn repositories_are_keyed_by_mode() {
    struct EquipmentRepository;

    let mut context = DynamicChainContext::new();
    context.store_repository(EquipmentRepository, true).unwrap();

    assert!(context.contains("ReadOnlyEquipmentRepository"));
    assert!(context.get_repository::<EquipmentRepository>(true).is_ok());
    assert!(context.try_get_repository::<EquipmentRepository>(false).is_none());
}

#[test]
fn data_is_keyed_by_type() {
    let mut context = DynamicChainContext::new();
    context.store_data(vec![Equipment { name: "Barbell" }]).unwrap();
    context.store_data(Equipment { name: "Kettlebell" }).unwrap();

    assert_eq!(context.get_data::<Vec<Equipment>>().unwrap().len(), 1);
    assert_eq!(context.get::<Equipment>("Equipment").unwrap().name, "Kettlebell");
    assert!(context.try_get_data::<Option<Equipment>>().is_none());

    let mut keys: Vec<_> = context.keys().collect();
    keys.sort_unstable();
    assert_eq!(keys, ["Equipment", "Equipments"]);
}
