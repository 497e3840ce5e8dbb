#![forbid(unsafe_code)]

//! Integration tests: settings persisted to a JSON file across sessions.

use std::path::Path;
use std::rc::Rc;

use tether_core::{JsonFileStore, Value, ValueStore};
use tether_harness::{CheckBox, LineEdit, ListEditor};
use tether_settings::{RegistryConfig, SettingsRegistry};

fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn committed_values_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    {
        let store = Rc::new(JsonFileStore::open(&path).unwrap());
        let mut registry = SettingsRegistry::new(Rc::clone(&store));
        let check = CheckBox::new(false);
        let edit = LineEdit::new("default");
        let items = ListEditor::default();
        registry.register_property("key 1", check.property()).unwrap();
        registry.register_property("key 2", edit.property()).unwrap();
        registry.register_property("key list", items.property()).unwrap();

        check.set_checked(true);
        edit.set_text("first edit");
        items.set_items(["first item", "second item"]);
        registry.apply_settings().unwrap();
    }

    assert_eq!(
        read_json(&path),
        serde_json::json!({
            "key 1": true,
            "key 2": "first edit",
            "key list": ["first item", "second item"],
        })
    );

    let store = Rc::new(JsonFileStore::open(&path).unwrap());
    let mut registry = SettingsRegistry::new(store);
    let check = CheckBox::new(false);
    let edit = LineEdit::new("default");
    let items = ListEditor::default();
    registry.register_property("key 1", check.property()).unwrap();
    registry.register_property("key 2", edit.property()).unwrap();
    registry.register_property("key list", items.property()).unwrap();

    assert!(check.is_checked());
    assert_eq!(edit.text(), "first edit");
    assert_eq!(items.items(), vec!["first item", "second item"]);
    assert!(registry.changed_settings().is_empty());
}

#[test]
fn interim_edits_reach_the_file_before_apply() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = Rc::new(JsonFileStore::open(&path).unwrap());
    let mut registry = SettingsRegistry::new(Rc::clone(&store));
    let edit = LineEdit::new("default");
    registry.register_property("key 2", edit.property()).unwrap();

    edit.set_text("uncommitted");
    assert_eq!(read_json(&path)["key 2"], "uncommitted");
    assert_eq!(registry.previous_value("key 2").unwrap(), Value::from("default"));

    registry.reset_settings().unwrap();
    assert_eq!(read_json(&path)["key 2"], "default");
}

#[test]
fn manual_sync_store_writes_once_on_apply() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    let store = Rc::new(JsonFileStore::open(&path).unwrap().with_auto_sync(false));
    let mut registry = SettingsRegistry::new(Rc::clone(&store));
    let check = CheckBox::new(false);
    registry.register_property("key 1", check.property()).unwrap();

    check.set_checked(true);
    assert!(!path.exists(), "nothing written before sync");
    assert!(store.is_dirty());

    registry.apply_settings().unwrap();
    assert!(!store.is_dirty());
    assert_eq!(read_json(&path)["key 1"], true);
}

#[test]
fn write_through_off_keeps_file_at_committed_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = Rc::new(JsonFileStore::open(&path).unwrap());
    let mut registry = SettingsRegistry::with_config(
        Rc::clone(&store),
        RegistryConfig::default().with_write_through(false),
    );
    let edit = LineEdit::new("default");
    registry.register_property("key 2", edit.property()).unwrap();

    edit.set_text("draft");
    assert_eq!(read_json(&path)["key 2"], "default");

    registry.apply_settings().unwrap();
    assert_eq!(read_json(&path)["key 2"], "draft");
}

#[test]
fn switching_to_a_profile_file_loads_its_values() {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work.json");
    let home = dir.path().join("home.json");
    std::fs::write(&home, r#"{ "key 2": "from home" }"#).unwrap();

    let mut registry = SettingsRegistry::new(Rc::new(JsonFileStore::open(&work).unwrap()));
    let check = CheckBox::new(true);
    let edit = LineEdit::new("default");
    registry.register_property("key 1", check.property()).unwrap();
    registry.register_property("key 2", edit.property()).unwrap();

    let home_store = Rc::new(JsonFileStore::open(&home).unwrap());
    registry.set_store(Rc::clone(&home_store)).unwrap();

    assert_eq!(edit.text(), "from home");
    assert_eq!(registry.default_value("key 2").unwrap(), Value::from("default"));
    assert_eq!(registry.previous_value("key 2").unwrap(), Value::from("from home"));
    assert_eq!(home_store.get("key 1").unwrap(), Some(Value::Bool(true)));
    assert!(registry.changed_settings().is_empty());
    assert_eq!(read_json(&home)["key 1"], true);
}

#[test]
fn config_file_drives_registry_behaviour() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("registry.toml");
    std::fs::write(&config_path, "seed_store = false\n").unwrap();
    let config = RegistryConfig::load(&config_path).unwrap();

    let store = Rc::new(JsonFileStore::open(dir.path().join("settings.json")).unwrap());
    let mut registry = SettingsRegistry::with_config(Rc::clone(&store), config);
    let check = CheckBox::new(false);
    registry.register_property("key 1", check.property()).unwrap();

    assert_eq!(store.keys().unwrap(), Vec::<String>::new());
    registry.apply_settings().unwrap();
    assert_eq!(store.get("key 1").unwrap(), Some(Value::Bool(false)));
}
