//! Shared fixtures for session integration tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use patchlink_engine::{EditHistory, PatchEngine, ScreenshotSource};
use patchlink_protocol::DESCRIPTION_FILE;
use patchlink_utils::Result;

/// Minimal in-memory patch engine over a temp autosave directory
pub struct MockEngine {
    _tempdir: TempDir,
    autosave: PathBuf,
    pub description: String,
    pub prepare_calls: usize,
    pub params: HashMap<(i64, i32), f32>,
}

impl MockEngine {
    pub fn with_description(description: &str) -> Self {
        let tempdir = TempDir::new().unwrap();
        let autosave = tempdir.path().join("autosave");
        Self {
            _tempdir: tempdir,
            autosave,
            description: description.to_string(),
            prepare_calls: 0,
            params: HashMap::new(),
        }
    }
}

impl PatchEngine for MockEngine {
    fn prepare_save(&mut self) {
        self.prepare_calls += 1;
    }

    fn save_autosave(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.autosave)?;
        std::fs::write(self.autosave.join(DESCRIPTION_FILE), &self.description)?;
        Ok(())
    }

    fn clean_autosave(&mut self) -> Result<()> {
        Ok(())
    }

    fn load_autosave(&mut self) -> Result<()> {
        self.description = std::fs::read_to_string(self.autosave.join(DESCRIPTION_FILE))?;
        Ok(())
    }

    fn autosave_path(&self) -> &Path {
        &self.autosave
    }

    fn set_param_value(&mut self, module_id: i64, param_id: i32, value: f32) -> Result<()> {
        self.params.insert((module_id, param_id), value);
        Ok(())
    }

    fn host_param_count(&self) -> u32 {
        0
    }

    fn set_host_param(&mut self, _param_id: u32, _value: f32) {}
}

/// Scripted edit history
pub struct MockHistory {
    pub index: i64,
    pub action: Option<String>,
}

impl EditHistory for MockHistory {
    fn action_index(&self) -> i64 {
        self.index
    }

    fn last_action_name(&self) -> Option<String> {
        self.action.clone()
    }
}

/// Screenshot source handing out a fixed PNG-ish payload
pub struct MockShots {
    pub captures: usize,
}

impl ScreenshotSource for MockShots {
    fn capture_screenshot(&mut self) -> Option<Vec<u8>> {
        self.captures += 1;
        Some(b"\x89PNG-test".to_vec())
    }
}
