//! Run-scoped state threaded through every stage of a sync.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use codesync_core::{config, ComponentId, ProjectId, SyncConfig};

use crate::error::SyncError;
use crate::paths;
use crate::writer::StagedWrites;

/// What the final import pass needs to know about one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUpdateSummary {
    pub skeleton_module_modified: bool,
}

pub type UpdateSummary = BTreeMap<ComponentId, ComponentUpdateSummary>;

/// A deferred merge of a hand-edited skeleton with its regenerated version.
///
/// Produced while projects are synced, consumed once after the config is
/// final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMerge {
    pub project_id: ProjectId,
    pub component_id: ComponentId,
    pub component_name: String,
    /// Skeleton location relative to `srcDir`.
    pub skeleton_module_path: String,
    pub edited_skeleton: String,
    pub new_skeleton: String,
    pub node_ids: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct SyncContext {
    pub config_path: PathBuf,
    /// `<config dir>/<srcDir>`; every config path is relative to it.
    pub src_root: PathBuf,
    pub config: SyncConfig,
    pub writes: StagedWrites,
    pub summary: UpdateSummary,
    pub pending_merges: Vec<PendingMerge>,
}

impl SyncContext {
    pub fn new(config_path: &Path, config: SyncConfig) -> Self {
        Self {
            config_path: config_path.to_path_buf(),
            src_root: config::src_root(config_path, &config),
            config,
            writes: StagedWrites::new(),
            summary: UpdateSummary::new(),
            pending_merges: Vec::new(),
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        config::base_dir(&self.config_path)
    }

    /// Absolute location of a config-relative path.
    pub fn abs_path(&self, relative: &str) -> PathBuf {
        paths::resolve(&self.src_root, relative)
    }

    /// `<defaultPlasmicDir>/<project-dir>/<file_name>`
    pub fn managed_path(&self, project_name: &str, file_name: &str) -> String {
        paths::join(&[
            &self.config.default_managed_dir,
            &paths::project_dir_name(project_name),
            file_name,
        ])
    }

    pub fn record(&mut self, component: &ComponentId, skeleton_module_modified: bool) {
        self.summary.insert(
            component.clone(),
            ComponentUpdateSummary {
                skeleton_module_modified,
            },
        );
    }

    /// Stage the current config into the write batch.
    pub fn persist_config(&mut self) -> Result<(), SyncError> {
        let json = config::to_json_string(&self.config)?;
        let path = self.config_path.clone();
        self.writes.stage(path, &json);
        Ok(())
    }
}
