use super::*;
use crate::grid::LightColor;

fn lights() -> Vec<PresetLight> {
    vec![PresetLight { id: 3, color: LightColor::Red }, PresetLight { id: 15, color: LightColor::Green }]
}

/// Store whose writes always fail.
struct ReadOnlyStore(MemoryStore);

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.get(key)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("quota exceeded")))
    }
}

// =============================================================================
// load_local
// =============================================================================

#[test]
fn load_local_missing_key_is_empty() {
    assert!(load_local(&MemoryStore::new()).is_empty());
}

#[test]
fn load_local_malformed_is_empty() {
    let store = MemoryStore::new().with_value(PRESETS_STORAGE_KEY, "{not json");
    assert!(load_local(&store).is_empty());
}

#[test]
fn load_local_wrong_shape_is_empty() {
    let store = MemoryStore::new().with_value(PRESETS_STORAGE_KEY, "[1,2,3]");
    assert!(load_local(&store).is_empty());
}

#[test]
fn load_local_reads_stored_collection() {
    let json = r#"{"custom_1":{"id":"custom_1","name":"Tug","description":"towing","category":"custom","lights":[{"id":0,"color":"white"}]}}"#;
    let store = MemoryStore::new().with_value(PRESETS_STORAGE_KEY, json);
    let collection = load_local(&store);
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.get("custom_1").unwrap().name, "Tug");
}

#[test]
fn load_local_keys_entries_by_preset_id() {
    let json = r#"{"k1":{"id":"other","name":"Pilot","lights":[{"id":4,"color":"white"}]}}"#;
    let store = MemoryStore::new().with_value(PRESETS_STORAGE_KEY, json);
    let collection = load_local(&store);
    assert_eq!(collection.len(), 1);
    assert!(collection.get("k1").is_none());
    assert_eq!(collection.get("other").unwrap().name, "Pilot");
}

#[test]
fn mismatched_key_preset_can_be_deleted_by_its_id() {
    let json = r#"{"k1":{"id":"other","name":"Pilot","lights":[{"id":4,"color":"white"}]}}"#;
    let mut local = LocalPresets::load(MemoryStore::new().with_value(PRESETS_STORAGE_KEY, json));
    assert_eq!(local.delete("other").unwrap().unwrap().name, "Pilot");
    assert!(load_local(local.store()).is_empty());
}

// =============================================================================
// LocalPresets::create
// =============================================================================

#[test]
fn create_rejects_empty_name_without_writing() {
    let mut local = LocalPresets::load(MemoryStore::new());
    let err = local
        .create("", "d", vec![PresetLight { id: 0, color: LightColor::Red }])
        .unwrap_err();
    assert!(matches!(err, LocalPresetError::Validation(ValidationError::EmptyName)));
    assert!(local.presets().is_empty());
    assert!(local.store().get(PRESETS_STORAGE_KEY).unwrap().is_none());
}

#[test]
fn create_rejects_empty_pattern() {
    let mut local = LocalPresets::load(MemoryStore::new());
    let err = local.create("Name", "d", vec![]).unwrap_err();
    assert!(matches!(err, LocalPresetError::Validation(ValidationError::EmptyPattern)));
}

#[test]
fn create_persists_and_returns_preset() {
    let mut local = LocalPresets::load(MemoryStore::new());
    let preset = local.create("Trawler", "fishing", lights()).unwrap();
    assert!(preset.id.starts_with("custom_"));
    assert!(local.contains(&preset.id));

    let reloaded = load_local(local.store());
    assert_eq!(reloaded.get(&preset.id), Some(&preset));
}

#[test]
fn create_assigns_unique_ids() {
    let mut local = LocalPresets::load(MemoryStore::new());
    let a = local.create("A", "", lights()).unwrap();
    let b = local.create("B", "", lights()).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(local.presets().len(), 2);
}

#[test]
fn create_storage_failure_leaves_collection_unchanged() {
    let mut local = LocalPresets::load(ReadOnlyStore(MemoryStore::new()));
    let err = local.create("A", "", lights()).unwrap_err();
    assert!(matches!(err, LocalPresetError::Storage(_)));
    assert!(local.presets().is_empty());
}

// =============================================================================
// LocalPresets::delete
// =============================================================================

#[test]
fn delete_removes_only_target() {
    let mut local = LocalPresets::load(MemoryStore::new());
    let a = local.create("A", "", lights()).unwrap();
    let b = local.create("B", "", lights()).unwrap();

    let removed = local.delete(&a.id).unwrap();
    assert_eq!(removed.map(|p| p.id), Some(a.id.clone()));
    assert!(!local.contains(&a.id));
    assert!(local.contains(&b.id));

    let reloaded = load_local(local.store());
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.contains(&b.id));
}

#[test]
fn delete_unknown_id_is_noop() {
    let mut local = LocalPresets::load(MemoryStore::new());
    assert!(local.delete("custom_missing").unwrap().is_none());
    assert!(local.store().get(PRESETS_STORAGE_KEY).unwrap().is_none());
}

// =============================================================================
// FileStore
// =============================================================================

#[test]
fn file_store_missing_key_reads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    assert!(store.get("nothing").unwrap().is_none());
}

#[test]
fn file_store_round_trips_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path().join("nested"));
    store.set("k", "v1").unwrap();
    store.set("k", "v2").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
}

#[test]
fn save_then_reload_in_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let created = {
        let mut local = LocalPresets::load(FileStore::new(dir.path()));
        local.create("Pilot vessel", "white over red", lights()).unwrap()
    };

    let fresh = LocalPresets::load(FileStore::new(dir.path()));
    let reloaded = fresh.get(&created.id).unwrap();
    assert_eq!(reloaded.name, "Pilot vessel");
    assert_eq!(reloaded.description, "white over red");
    assert_eq!(reloaded.lights, lights());
}

#[test]
fn create_never_reuses_a_stored_id() {
    // Far-future id: a fresh clock reading lands below it.
    let json = r#"{"custom_99999999999999":{"id":"custom_99999999999999","name":"Future","lights":[{"id":1,"color":"red"}]}}"#;
    let mut local = LocalPresets::load(MemoryStore::new().with_value(PRESETS_STORAGE_KEY, json));

    let created = local.create("Next", "", lights()).unwrap();
    assert_eq!(created.id, "custom_100000000000000");
    assert_eq!(local.presets().len(), 2);
    assert_eq!(local.get("custom_99999999999999").unwrap().name, "Future");
}
