//! Registry integration tests.
//!
//! These run the registry against a real database file and check the
//! collection-level properties with generated records.

use patient_registry::{
    MemoryStore, PatientFields, PatientId, Registry, RegistryOptions, SearchScope, SlotStore,
    SqliteStore,
};
use proptest::prelude::*;

fn open(path: &std::path::Path) -> Registry<SqliteStore> {
    let store = SqliteStore::open(path).unwrap();
    Registry::load(store, RegistryOptions::default())
}

#[test]
fn test_register_search_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open(&dir.path().join("registry.db"));

    let first = registry
        .create(PatientFields::new("Ana", "Diaz", "1234"))
        .unwrap();
    assert_eq!(registry.list(), &[first.clone()]);

    let second = registry
        .create(PatientFields::new("Juan", "Perez", "5678"))
        .unwrap();

    let found = registry.filter("1234", SearchScope::NationalId);
    assert_eq!(found, vec![first.clone()]);

    assert!(registry.delete(first.id).is_some());
    assert_eq!(registry.list(), &[second]);
}

#[test]
fn test_restart_restores_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    let before = {
        let mut registry = open(&path);
        registry
            .create(
                PatientFields::new("Ana", "Diaz", "1234")
                    .with_age("34")
                    .with_insurance_provider("OSDE")
                    .with_notes("penicillin allergy\nfollow up in March"),
            )
            .unwrap();
        let juan = registry
            .create(PatientFields::new("Juan", "Perez", "5678"))
            .unwrap();
        registry
            .update(juan.id, PatientFields::new("Juan", "Perez Gomez", "5678"))
            .unwrap();
        registry.list().to_vec()
    };

    let registry = open(&path);
    assert_eq!(registry.list(), before.as_slice());
    assert!(registry.sync_state().is_synced());
}

#[test]
fn test_restart_after_deleting_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    {
        let mut registry = open(&path);
        let record = registry
            .create(PatientFields::new("Ana", "Diaz", "1234"))
            .unwrap();
        registry.delete(record.id);
    }

    let registry = open(&path);
    assert!(registry.is_empty());
    // An emptied registry is saved as an empty list, not removed
    assert_eq!(
        registry.store().read("patients-data").unwrap().as_deref(),
        Some("[]")
    );
}

#[test]
fn test_loads_legacy_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store
            .write(
                "patients-data",
                r#"[{
                    "id": 1700000000000,
                    "nombre": "María",
                    "apellido": "González",
                    "dni": "30111222",
                    "edad": 52,
                    "obraSocial": "PAMI",
                    "detalles": "Hipertensión",
                    "fechaRegistro": "3/14/2024"
                }]"#,
            )
            .unwrap();
    }

    let mut registry = open(&path);
    let record = registry.get(PatientId::new(1_700_000_000_000)).unwrap();
    assert_eq!(record.fields.first_name, "María");
    assert_eq!(record.fields.last_name, "González");
    assert_eq!(record.age(), Some("52"));
    assert_eq!(record.insurance_provider(), Some("PAMI"));
    assert_eq!(record.registered_on, "3/14/2024");

    assert_eq!(
        registry.filter("gonzález", SearchScope::LastName).len(),
        1
    );

    // The next write uses the current field names
    registry
        .create(PatientFields::new("Ana", "Diaz", "1234"))
        .unwrap();
    let raw = registry.store().read("patients-data").unwrap().unwrap();
    assert!(raw.contains("\"firstName\":\"María\""));
    assert!(!raw.contains("nombre"));
}

#[test]
fn test_corrupt_slot_starts_empty_and_is_replaced_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.write("patients-data", "not json at all").unwrap();
    }

    let mut registry = open(&path);
    assert!(registry.is_empty());
    // Loading leaves the bad value alone
    assert_eq!(
        registry.store().read("patients-data").unwrap().as_deref(),
        Some("not json at all")
    );

    registry
        .create(PatientFields::new("Ana", "Diaz", "1234"))
        .unwrap();
    drop(registry);

    assert_eq!(open(&path).len(), 1);
}

#[test]
fn test_malformed_entry_does_not_cost_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store
            .write(
                "patients-data",
                r#"[
                    {"id":1,"firstName":"Ana","lastName":"Diaz","nationalId":"1234","registeredOn":"3/1/2024"},
                    {"id":2,"firstName":"Juan","lastName":"Perez","registeredOn":"3/2/2024"}
                ]"#,
            )
            .unwrap();
    }

    {
        let mut registry = open(&path);
        assert_eq!(registry.len(), 1);
        registry
            .create(PatientFields::new("Eva", "Ruiz", "9"))
            .unwrap();
    }

    let registry = open(&path);
    let names: Vec<&str> = registry
        .list()
        .iter()
        .map(|r| r.fields.first_name.as_str())
        .collect();
    assert_eq!(names, vec!["Ana", "Eva"]);
}

#[test]
fn test_quota_exceeded_keeps_last_saved_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    let first = {
        let store = SqliteStore::open(&path).unwrap().with_quota(Some(400));
        let mut registry = Registry::load(store, RegistryOptions::default());
        let first = registry
            .create(PatientFields::new("Ana", "Diaz", "1234"))
            .unwrap();
        assert!(registry.sync_state().is_synced());

        registry
            .create(PatientFields::new("Juan", "Perez", "5678").with_notes("x".repeat(500)))
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.sync_state().is_synced());
        first
    };

    let registry = open(&path);
    assert_eq!(registry.list(), &[first]);
}

#[test]
fn test_separate_slot_keys_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");
    let options = |key: &str| RegistryOptions {
        slot_key: key.to_string(),
        ..RegistryOptions::default()
    };

    {
        let store = SqliteStore::open(&path).unwrap();
        let mut registry = Registry::load(store, options("clinic-a"));
        registry
            .create(PatientFields::new("Ana", "Diaz", "1234"))
            .unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let registry = Registry::load(store, options("clinic-b"));
    assert!(registry.is_empty());
    assert_eq!(registry.store().keys().unwrap(), vec!["clinic-a".to_string()]);
}

fn fields_strategy() -> impl Strategy<Value = PatientFields> {
    (
        "[A-Za-z]{1,10}",
        "[A-Za-z]{1,10}",
        "[0-9]{1,8}",
        "[0-9]{0,3}",
        "[A-Za-z ]{0,10}",
        "[A-Za-z\n ]{0,20}",
    )
        .prop_map(|(first, last, dni, age, insurance, notes)| {
            PatientFields::new(first, last, dni)
                .with_age(age)
                .with_insurance_provider(insurance)
                .with_notes(notes)
        })
}

fn registry_with(records: &[PatientFields]) -> Registry<MemoryStore> {
    let mut registry = Registry::load(MemoryStore::new(), RegistryOptions::default());
    for fields in records {
        registry.create(fields.clone()).unwrap();
    }
    registry
}

proptest! {
    #[test]
    fn prop_created_ids_are_unique(records in prop::collection::vec(fields_strategy(), 1..20)) {
        let registry = registry_with(&records);
        let mut ids: Vec<PatientId> = registry.list().iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), records.len());
    }

    #[test]
    fn prop_empty_query_returns_list(records in prop::collection::vec(fields_strategy(), 0..20)) {
        let registry = registry_with(&records);
        prop_assert_eq!(registry.filter("", SearchScope::All), registry.list());
    }

    #[test]
    fn prop_filter_ignores_case(
        records in prop::collection::vec(fields_strategy(), 1..10),
        pick in any::<prop::sample::Index>(),
    ) {
        let registry = registry_with(&records);
        let target = pick.get(registry.list()).clone();

        let upper = registry.filter(&target.fields.last_name.to_uppercase(), SearchScope::LastName);
        let lower = registry.filter(&target.fields.last_name.to_lowercase(), SearchScope::LastName);

        prop_assert!(upper.contains(&target));
        prop_assert_eq!(upper, lower);
    }

    #[test]
    fn prop_update_keeps_id_and_date(
        original in fields_strategy(),
        replacement in fields_strategy(),
    ) {
        let mut registry = registry_with(&[original]);
        let before = registry.list()[0].clone();

        let after = registry.update(before.id, replacement.clone()).unwrap().unwrap();

        prop_assert_eq!(after.id, before.id);
        prop_assert_eq!(&after.registered_on, &before.registered_on);
        prop_assert_eq!(&after.fields, &replacement);
        prop_assert_eq!(registry.get(before.id), Some(&after));
    }

    #[test]
    fn prop_delete_removes_exactly_one(
        records in prop::collection::vec(fields_strategy(), 1..15),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut registry = registry_with(&records);
        let mut expected = registry.list().to_vec();
        let removed = expected.remove(pick.index(expected.len()));

        prop_assert_eq!(registry.delete(removed.id), Some(removed));
        prop_assert_eq!(registry.list(), expected.as_slice());
    }

    #[test]
    fn prop_reload_reproduces_collection(records in prop::collection::vec(fields_strategy(), 0..15)) {
        let registry = registry_with(&records);
        let before = registry.list().to_vec();

        let reloaded = Registry::load(registry.into_store(), RegistryOptions::default());
        prop_assert_eq!(reloaded.list(), before.as_slice());
    }
}
