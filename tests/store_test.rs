//! 案件ストアの統合テスト
//!
//! 両方の保存形式で同じ振る舞いになることを確認

use photo_report_common::{ItemRecord, ProjectRecord};
use photo_report_rust::store::{open_store, StoreBackend};
use tempfile::tempdir;

const BACKENDS: [StoreBackend; 2] = [StoreBackend::JsonFile, StoreBackend::Settings];

fn sample_project(id: &str, location: &str) -> ProjectRecord {
    let mut project = ProjectRecord::new(id, location);
    project.items.push(ItemRecord::new("開挖", "09:00", "/photos/1.jpg", true));
    project.items.push(ItemRecord::new("回填 \"A\"", "2024/01/01 10:30", "/photos/2.png", false));
    project
}

#[test]
fn test_save_then_load_round_trip() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(backend, &dir.path().join("data").join("store.json"));

        let project = sample_project("A1", "台北市");
        store.save(&project.key(), &project).unwrap();

        let loaded = store.get("A1-台北市").unwrap();
        assert_eq!(loaded, Some(project), "{}", backend);
    }
}

#[test]
fn test_remove_never_saved_key() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = open_store(backend, &path);

        let project = sample_project("A1", "x");
        store.save(&project.key(), &project).unwrap();
        let before = std::fs::read(&path).unwrap();

        assert!(!store.remove("B2-y").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}

#[test]
fn test_saving_one_project_keeps_others() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(backend, &dir.path().join("store.json"));

        let first = sample_project("A1", "x");
        let mut second = sample_project("B2", "y");
        store.save(&first.key(), &first).unwrap();
        store.save(&second.key(), &second).unwrap();

        second.items.clear();
        store.save(&second.key(), &second).unwrap();

        assert_eq!(store.get("A1-x").unwrap(), Some(first));
        assert_eq!(store.list_keys().unwrap(), vec!["A1-x", "B2-y"]);
    }
}

#[test]
fn test_missing_file_is_empty() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open_store(backend, &dir.path().join("none.json"));
        assert!(store.load().unwrap().is_empty());
        assert!(store.list_keys().unwrap().is_empty());
    }
}
