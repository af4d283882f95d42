//! 編集セッション
//!
//! 1案件ずつ編集する状態機械:
//! Idle → Editing（案件選択・新規・項目追加）→ Generating（生成）→ Editing。
//! 未保存の変更は明示的な保存か、`on-close` 方針での終了時にのみ書き込まれる。

use crate::error::{ReportError, Result};
use crate::generate::{generate_report, GenerateOptions, GenerateReport};
use crate::stamp::Stamper;
use crate::store::ProjectStore;
use indexmap::IndexMap;
use photo_report_common::{ItemRecord, ProjectRecord, ReportVariant, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// 終了時の保存方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavePolicy {
    /// 明示的に保存したときだけ書き込む
    #[default]
    Explicit,
    /// 終了時に現在の案件を保存する（idと場所/日付が入力済みの場合）
    OnClose,
}

impl std::str::FromStr for SavePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "explicit" => Ok(SavePolicy::Explicit),
            "on-close" | "onclose" => Ok(SavePolicy::OnClose),
            _ => Err(format!("Unknown save policy: {}. Use explicit or on-close", s)),
        }
    }
}

impl std::fmt::Display for SavePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SavePolicy::Explicit => write!(f, "explicit"),
            SavePolicy::OnClose => write!(f, "on-close"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Editing,
    Generating,
}

pub struct Session {
    variant: ReportVariant,
    store: Box<dyn ProjectStore>,
    policy: SavePolicy,
    projects: IndexMap<String, ProjectRecord>,
    current: Option<ProjectRecord>,
    dirty: bool,
    state: SessionState,
    load_error: Option<String>,
}

impl Session {
    /// ストアを読み込んでセッションを開始する
    ///
    /// ストアが壊れている場合は空の一覧で続行し、エラーを `load_error` に残す。
    pub fn open(variant: ReportVariant, store: Box<dyn ProjectStore>, policy: SavePolicy) -> Self {
        let (projects, load_error) = match store.load() {
            Ok(projects) => (projects, None),
            Err(err) => {
                warn!("could not load {}: {}", store.path().display(), err);
                (IndexMap::new(), Some(err.to_string()))
            }
        };
        debug!("session opened with {} project(s)", projects.len());

        Self {
            variant,
            store,
            policy,
            projects,
            current: None,
            dirty: false,
            state: SessionState::Idle,
            load_error,
        }
    }

    pub fn variant(&self) -> &ReportVariant {
        &self.variant
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    /// 起動時の読み込みエラー
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn project_keys(&self) -> Vec<String> {
        self.projects.keys().cloned().collect()
    }

    pub fn current(&self) -> Option<&ProjectRecord> {
        self.current.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn current_mut(&mut self) -> &mut ProjectRecord {
        self.state = SessionState::Editing;
        self.dirty = true;
        self.current.get_or_insert_with(ProjectRecord::default)
    }

    /// 現在の案件を差し替え、未保存の変更を破棄したかを返す
    fn switch_to(&mut self, record: ProjectRecord) -> bool {
        let discarded = self.dirty;
        if discarded {
            debug!("discarding unsaved changes");
        }
        self.current = Some(record);
        self.dirty = false;
        self.state = SessionState::Editing;
        discarded
    }

    /// 空の案件を開始する
    pub fn new_project(&mut self) -> bool {
        self.switch_to(ProjectRecord::default())
    }

    /// 保存済み案件を開く
    pub fn select_project(&mut self, key: &str) -> Result<bool> {
        let record = self
            .projects
            .get(key)
            .cloned()
            .ok_or_else(|| ReportError::ProjectNotFound(key.to_string()))?;
        Ok(self.switch_to(record))
    }

    pub fn set_info(&mut self, id: &str, location_or_date: &str) {
        let project = self.current_mut();
        project.id = id.trim().to_string();
        project.location_or_date = location_or_date.trim().to_string();
    }

    /// 項目を末尾に追加し、その位置（0始まり）を返す
    pub fn add_item(&mut self, item: ItemRecord) -> usize {
        let project = self.current_mut();
        project.items.push(item);
        project.items.len() - 1
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.current.as_ref().map_or(0, |p| p.items.len());
        if index >= len {
            return Err(ReportError::ItemIndex { index: index + 1, len });
        }
        Ok(())
    }

    pub fn update_item(&mut self, index: usize, item: ItemRecord) -> Result<()> {
        self.check_index(index)?;
        self.current_mut().items[index] = item;
        Ok(())
    }

    /// 複数項目を削除（いずれかが範囲外なら何も削除しない）
    pub fn remove_items(&mut self, indices: &[usize]) -> Result<usize> {
        for &index in indices {
            self.check_index(index)?;
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let project = self.current_mut();
        for &index in sorted.iter().rev() {
            project.items.remove(index);
        }
        Ok(sorted.len())
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let items = &mut self.current_mut().items;
            let item = items.remove(from);
            items.insert(to, item);
        }
        Ok(())
    }

    /// 現在の案件をストアに保存し、キーを返す
    pub fn save(&mut self) -> Result<String> {
        let record = match &self.current {
            Some(record) if record.has_identity() => record.clone(),
            Some(record) if !record.id.trim().is_empty() => {
                return Err(ValidationError::MissingProjectField {
                    label: self.variant.location_field_label.clone(),
                }
                .into())
            }
            _ => {
                return Err(ValidationError::MissingProjectField {
                    label: self.variant.id_field_label.clone(),
                }
                .into())
            }
        };

        let key = record.key();
        self.store.save(&key, &record)?;
        self.projects.insert(key.clone(), record);
        self.dirty = false;
        info!("saved project {}", key);
        Ok(key)
    }

    /// 保存済み案件を削除（編集中の内容は残る）
    pub fn remove_project(&mut self, key: &str) -> Result<bool> {
        let removed = self.store.remove(key)?;
        self.projects.shift_remove(key);
        if removed && self.current.as_ref().is_some_and(|p| p.key() == key) {
            self.dirty = true;
        }
        Ok(removed)
    }

    /// 現在の案件から報告書を生成する
    pub fn generate(&mut self, stamper: &Stamper, options: &GenerateOptions) -> Result<GenerateReport> {
        let project = self.current.clone().unwrap_or_default();
        self.state = SessionState::Generating;
        let result = generate_report(&project, &self.variant, stamper, options);
        self.state = SessionState::Editing;
        result
    }

    /// セッションを終了する。保存した場合は `true`
    pub fn close(mut self) -> Result<bool> {
        let should_save = self.policy == SavePolicy::OnClose
            && self.dirty
            && self.current.as_ref().is_some_and(|p| p.has_identity());
        if should_save {
            self.save()?;
        }
        self.state = SessionState::Idle;
        Ok(should_save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonFileStore, StoreBackend, open_store};
    use std::path::Path;
    use tempfile::tempdir;

    fn session(path: &Path, policy: SavePolicy) -> Session {
        Session::open(
            ReportVariant::case_report(),
            Box::new(JsonFileStore::new(path)),
            policy,
        )
    }

    fn item(desc: &str) -> ItemRecord {
        ItemRecord::new(desc, "09:00", "a.png", false)
    }

    #[test]
    fn test_state_transitions() {
        let dir = tempdir().unwrap();
        let mut s = session(&dir.path().join("store.json"), SavePolicy::Explicit);
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.load_error().is_none());

        s.add_item(item("x"));
        assert_eq!(s.state(), SessionState::Editing);
        assert!(s.is_dirty());
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut s = session(&path, SavePolicy::Explicit);
        s.set_info("A1", "2024-01-01");
        s.add_item(item("x"));
        assert_eq!(s.save().unwrap(), "A1-2024-01-01");
        assert!(!s.is_dirty());

        let mut reopened = session(&path, SavePolicy::Explicit);
        assert_eq!(reopened.project_keys(), vec!["A1-2024-01-01"]);
        assert!(!reopened.select_project("A1-2024-01-01").unwrap());
        assert_eq!(reopened.current().unwrap().items, vec![item("x")]);
    }

    #[test]
    fn test_save_requires_identity() {
        let dir = tempdir().unwrap();
        let mut s = session(&dir.path().join("store.json"), SavePolicy::Explicit);
        s.set_info("A1", "");

        let err = s.save().unwrap_err();
        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::MissingProjectField { ref label }) if label == "案件地址"
        ));
        assert!(!dir.path().join("store.json").exists());
    }

    #[test]
    fn test_switch_reports_discarded_changes() {
        let dir = tempdir().unwrap();
        let mut s = session(&dir.path().join("store.json"), SavePolicy::Explicit);
        s.set_info("A1", "x");
        s.save().unwrap();

        s.add_item(item("unsaved"));
        assert!(s.select_project("A1-x").unwrap());
        assert!(s.current().unwrap().items.is_empty());
        assert!(!s.new_project());

        assert!(matches!(
            s.select_project("nope"),
            Err(ReportError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_item_editing() {
        let dir = tempdir().unwrap();
        let mut s = session(&dir.path().join("store.json"), SavePolicy::Explicit);
        for desc in ["a", "b", "c", "d"] {
            s.add_item(item(desc));
        }

        s.move_item(0, 3).unwrap();
        s.update_item(0, item("B")).unwrap();
        assert_eq!(s.remove_items(&[2, 0, 2]).unwrap(), 2);

        let descs: Vec<_> = s.current().unwrap().items.iter().map(|i| i.description.clone()).collect();
        assert_eq!(descs, vec!["c", "a"]);

        assert!(matches!(
            s.remove_items(&[0, 5]),
            Err(ReportError::ItemIndex { index: 6, len: 2 })
        ));
        assert_eq!(s.current().unwrap().items.len(), 2);
        assert!(s.move_item(0, 2).is_err());
    }

    #[test]
    fn test_close_policies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut s = session(&path, SavePolicy::Explicit);
        s.set_info("A1", "x");
        assert!(!s.close().unwrap());
        assert!(!path.exists());

        let mut s = session(&path, SavePolicy::OnClose);
        s.set_info("A1", "x");
        assert!(s.close().unwrap());
        assert_eq!(session(&path, SavePolicy::Explicit).project_keys(), vec!["A1-x"]);

        // 未入力なら on-close でも保存しない
        let mut s = session(&path, SavePolicy::OnClose);
        s.add_item(item("y"));
        assert!(!s.close().unwrap());
    }

    #[test]
    fn test_remove_project() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut s = session(&path, SavePolicy::Explicit);
        s.set_info("A1", "x");
        s.save().unwrap();

        assert!(s.remove_project("A1-x").unwrap());
        assert!(s.project_keys().is_empty());
        assert!(s.is_dirty());
        assert!(!s.remove_project("A1-x").unwrap());
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let s = Session::open(
            ReportVariant::station_report(),
            open_store(StoreBackend::Settings, &path),
            SavePolicy::Explicit,
        );
        assert!(s.project_keys().is_empty());
        assert!(s.load_error().unwrap().contains("破損"));
    }

    #[test]
    fn test_save_policy_parse() {
        assert_eq!("on-close".parse::<SavePolicy>().unwrap(), SavePolicy::OnClose);
        assert_eq!("Explicit".parse::<SavePolicy>().unwrap(), SavePolicy::Explicit);
        assert!("never".parse::<SavePolicy>().is_err());
        assert_eq!(SavePolicy::OnClose.to_string(), "on-close");
    }
}
