//! Shared fixtures for server integration tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use patchlink_engine::{HostState, PatchEngine};
use patchlink_utils::{PatchlinkError, Result};

/// In-memory host engine backed by a temp autosave directory.
///
/// `known_modules` gates `set_param_value`; `description` mirrors what the
/// last `load_autosave` read back from disk.
pub struct MockHost {
    _tempdir: TempDir,
    autosave: PathBuf,
    pub description: Option<String>,
    pub loads: usize,
    pub known_modules: Vec<i64>,
    pub params: HashMap<(i64, i32), f32>,
    pub host_params: Vec<f32>,
    pub state: HashMap<String, String>,
    pub reject_state: bool,
}

impl MockHost {
    pub fn new() -> Self {
        let tempdir = TempDir::new().unwrap();
        let autosave = tempdir.path().join("autosave");
        Self {
            _tempdir: tempdir,
            autosave,
            description: None,
            loads: 0,
            known_modules: vec![1, 2, 3],
            params: HashMap::new(),
            host_params: vec![0.0; 4],
            state: HashMap::new(),
            reject_state: false,
        }
    }
}

impl PatchEngine for MockHost {
    fn prepare_save(&mut self) {}

    fn save_autosave(&mut self) -> Result<()> {
        Ok(())
    }

    fn clean_autosave(&mut self) -> Result<()> {
        Ok(())
    }

    fn load_autosave(&mut self) -> Result<()> {
        let path = self.autosave.join(patchlink_protocol::DESCRIPTION_FILE);
        self.description = Some(std::fs::read_to_string(&path).map_err(|source| {
            PatchlinkError::FileRead { path, source }
        })?);
        self.loads += 1;
        Ok(())
    }

    fn autosave_path(&self) -> &Path {
        &self.autosave
    }

    fn set_param_value(&mut self, module_id: i64, param_id: i32, value: f32) -> Result<()> {
        if !self.known_modules.contains(&module_id) {
            return Err(PatchlinkError::ModuleNotFound(module_id));
        }
        self.params.insert((module_id, param_id), value);
        Ok(())
    }

    fn host_param_count(&self) -> u32 {
        self.host_params.len() as u32
    }

    fn set_host_param(&mut self, param_id: u32, value: f32) {
        self.host_params[param_id as usize] = value;
    }
}

impl HostState for MockHost {
    fn set_state(&mut self, key: &str, value: &str) -> bool {
        if self.reject_state {
            return false;
        }
        self.state.insert(key.to_string(), value.to_string());
        true
    }
}
