//! In-memory workspace backend.
//!
//! Serves two roles: the mock the reconciler's properties are tested
//! against, and an offline demo backend. With a state file attached, the
//! record set survives across processes, so consecutive CLI runs observe
//! each other's creations.

use crate::api::{WorkspaceApi, WorkspaceConfig};
use crate::types::{ParamMap, ResourceKind, ResourceRecord, ResourceScope};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;
use ztw_core::{Result, ZtwError};

/// Principal reported by [`InMemoryWorkspace::current_user`].
pub const DEFAULT_USER: &str = "demo.user@example.com";

/// State file used when the configuration names none. Keeping a default on
/// disk means every backend instance in a run (and across runs) observes the
/// same record set.
pub fn default_state_file() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ZtwError::Config("cannot determine home directory".to_string()))?;
    Ok(home.join(".ztw").join("workspace.json"))
}

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateEntry {
    scope: String,
    record: ResourceRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkspaceState {
    version: u32,
    entries: Vec<StateEntry>,
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            entries: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct InMemoryWorkspace {
    user: String,
    state: Mutex<WorkspaceState>,
    state_file: Option<PathBuf>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    uploads: Mutex<Vec<String>>,
    fail_next_create: AtomicBool,
    fail_next_list: AtomicBool,
}

impl Default for InMemoryWorkspace {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            state: Mutex::new(WorkspaceState::default()),
            state_file: None,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            fail_next_create: AtomicBool::new(false),
            fail_next_list: AtomicBool::new(false),
        }
    }
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a JSON state file. Existing state is loaded on open;
    /// every mutation is written back.
    pub fn with_state_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = Self::load_state(&path)?;
        Ok(Self {
            state: Mutex::new(state),
            state_file: Some(path),
            ..Self::default()
        })
    }

    pub fn from_config(config: &WorkspaceConfig) -> Result<Self> {
        let path = match &config.state_file {
            Some(path) => path.clone(),
            None => default_state_file()?,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::with_state_file(path)
    }

    fn load_state(path: &Path) -> Result<WorkspaceState> {
        if !path.exists() {
            return Ok(WorkspaceState::default());
        }
        let raw = fs::read_to_string(path)?;
        let state: WorkspaceState = serde_json::from_str(&raw).map_err(|e| {
            ZtwError::Serialization(format!("invalid state file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), entries = state.entries.len(), "loaded workspace state");
        Ok(state)
    }

    fn persist(&self, state: &WorkspaceState) -> Result<()> {
        if let Some(path) = &self.state_file {
            let raw = serde_json::to_string_pretty(state)?;
            fs::write(path, raw)?;
        }
        Ok(())
    }

    /// Pre-populate a record, bypassing the create path and its counters.
    pub fn seed(&self, kind: ResourceKind, scope: &ResourceScope, key: &str, metadata: ParamMap) {
        let mut state = self.state.lock().expect("state lock");
        state.entries.push(StateEntry {
            scope: scope.key(),
            record: ResourceRecord::new(kind, key, metadata),
        });
    }

    /// Make the next `create` call fail with a remote create error.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Make the next `list` call fail with a remote listing error.
    pub fn fail_next_list(&self) {
        self.fail_next_list.store(true, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Remote paths uploaded so far, in order.
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().expect("uploads lock").clone()
    }
}

impl WorkspaceApi for InMemoryWorkspace {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn current_user(&self) -> Result<String> {
        Ok(self.user.clone())
    }

    fn list(&self, kind: ResourceKind, scope: &ResourceScope) -> Result<Vec<ResourceRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_list.swap(false, Ordering::SeqCst) {
            return Err(ZtwError::RemoteList(format!(
                "injected failure listing {kind}"
            )));
        }
        let state = self.state.lock().expect("state lock");
        let scope_key = scope.key();
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.record.kind == kind && entry.scope == scope_key)
            .map(|entry| entry.record.clone())
            .collect())
    }

    fn create(
        &self,
        kind: ResourceKind,
        scope: &ResourceScope,
        params: &ParamMap,
    ) -> Result<ResourceRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(ZtwError::RemoteCreate(format!(
                "injected failure creating {kind}"
            )));
        }
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ZtwError::RemoteCreate(format!("create params for {kind} carry no name"))
            })?;

        let record = ResourceRecord::new(kind, name, params.clone());
        let mut state = self.state.lock().expect("state lock");
        state.entries.push(StateEntry {
            scope: scope.key(),
            record: record.clone(),
        });
        self.persist(&state)?;
        Ok(record)
    }

    fn upload(&self, remote_path: &str, bytes: &[u8], overwrite: bool) -> Result<()> {
        let mut uploads = self.uploads.lock().expect("uploads lock");
        if !overwrite && uploads.iter().any(|p| p == remote_path) {
            return Err(ZtwError::Upload(format!(
                "{remote_path} already exists and overwrite is off"
            )));
        }
        debug!(path = remote_path, size = bytes.len(), "recorded upload");
        uploads.push(remote_path.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn schema_scope() -> ResourceScope {
        ResourceScope::Schema {
            catalog: "workspace".into(),
            schema: "default".into(),
        }
    }

    fn named_params(name: &str) -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("name".to_string(), json!(name));
        params
    }

    #[test]
    fn test_create_requires_name_param() {
        let api = InMemoryWorkspace::new();
        let err = api
            .create(ResourceKind::Volume, &schema_scope(), &ParamMap::new())
            .unwrap_err();
        assert!(err.to_string().contains("no name"));
    }

    #[test]
    fn test_state_survives_across_instances() {
        let dir = TempDir::new().expect("tempdir");
        let state_file = dir.path().join("workspace.json");

        let first = InMemoryWorkspace::with_state_file(&state_file).expect("open");
        first
            .create(ResourceKind::Volume, &schema_scope(), &named_params("datafiles"))
            .expect("create");

        let second = InMemoryWorkspace::with_state_file(&state_file).expect("reopen");
        let records = second
            .list(ResourceKind::Volume, &schema_scope())
            .expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "datafiles");
    }

    #[test]
    fn test_corrupt_state_file_is_a_serialization_error() {
        let dir = TempDir::new().expect("tempdir");
        let state_file = dir.path().join("workspace.json");
        fs::write(&state_file, "{{ not json").expect("write");

        let err = InMemoryWorkspace::with_state_file(&state_file).unwrap_err();
        assert!(matches!(err, ZtwError::Serialization(_)));
    }

    #[test]
    fn test_default_state_file_lives_under_home() {
        let path = default_state_file().expect("home directory");
        assert!(path.ends_with(".ztw/workspace.json"));
    }

    #[test]
    fn test_from_config_creates_missing_state_dirs() {
        let dir = TempDir::new().expect("tempdir");
        let config = WorkspaceConfig {
            backend: "memory".into(),
            state_file: Some(dir.path().join("nested").join("workspace.json")),
            ..Default::default()
        };

        // Parent directories are created on demand.
        let first = InMemoryWorkspace::from_config(&config).expect("open");
        first
            .create(ResourceKind::Volume, &schema_scope(), &named_params("datafiles"))
            .expect("create");

        let second = InMemoryWorkspace::from_config(&config).expect("reopen");
        let records = second
            .list(ResourceKind::Volume, &schema_scope())
            .expect("list");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_upload_overwrite_semantics() {
        let api = InMemoryWorkspace::new();
        api.upload("/Volumes/w/d/v/data.csv", b"a,b\n", true)
            .expect("first upload");
        api.upload("/Volumes/w/d/v/data.csv", b"a,b\n", true)
            .expect("overwrite allowed");
        let err = api
            .upload("/Volumes/w/d/v/data.csv", b"a,b\n", false)
            .unwrap_err();
        assert!(matches!(err, ZtwError::Upload(_)));
        assert_eq!(api.uploads().len(), 2);
    }
}
