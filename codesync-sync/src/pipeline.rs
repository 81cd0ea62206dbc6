//! Sync pipeline entrypoint used by the CLI.
//!
//! Stages, in order:
//!
//! 1. resolve versions (may prompt; no writes)
//! 2. sync the default stylesheet
//! 3. sync every resolved project, leaves first
//! 4. materialize unset schemes, stage the finalized config
//! 5. execute deferred merges against the finalized config
//! 6. fix imports of every touched component
//! 7. flush the batch (or preview it in dry-run mode)
//! 8. run post-sync commands

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use codesync_core::{config, ProjectId, Scheme};

use crate::context::SyncContext;
use crate::convert::ScriptConverter;
use crate::error::SyncError;
use crate::imports::{self, ImportResolver};
use crate::merge::Merger;
use crate::remote::Remote;
use crate::resolver::{self, Confirmer};
use crate::writer::WriteResult;
use crate::{orchestrator, post_sync, scheduler, siblings};

/// A `--projects` argument: `id` or `id@range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub project_id: ProjectId,
    pub version_range: Option<String>,
}

impl FromStr for ProjectSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, range) = match s.split_once('@') {
            Some((id, range)) => (id.trim(), Some(range.trim())),
            None => (s.trim(), None),
        };
        if id.is_empty() {
            return Err(format!("invalid project '{s}'; expected <id> or <id>@<range>"));
        }
        if range.is_some_and(str::is_empty) {
            return Err(format!("invalid project '{s}'; version range after '@' is empty"));
        }
        Ok(Self {
            project_id: ProjectId::from(id),
            version_range: range.map(str::to_owned),
        })
    }
}

impl fmt::Display for ProjectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_range {
            Some(range) => write!(f, "{}@{}", self.project_id, range),
            None => self.project_id.fmt(f),
        }
    }
}

/// Flags consumed by the engine.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Empty means every project already in the config.
    pub projects: Vec<ProjectSpec>,
    /// Component ids or names to restrict generation to.
    pub components: Vec<String>,
    pub only_existing: bool,
    pub force_overwrite: bool,
    pub new_component_scheme: Option<Scheme>,
    pub append_jsx_on_missing_base: bool,
    pub recursive: bool,
    pub include_dependencies: bool,
    pub non_interactive: bool,
    pub dry_run: bool,
}

/// External collaborators a run delegates to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub remote: &'a dyn Remote,
    pub merger: &'a dyn Merger,
    pub imports: &'a dyn ImportResolver,
    pub converter: &'a dyn ScriptConverter,
    pub confirmer: &'a dyn Confirmer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedProject {
    pub project_id: ProjectId,
    pub project_name: String,
    pub version: String,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct SyncReport {
    pub projects: Vec<SyncedProject>,
    pub writes: Vec<WriteResult>,
    pub merged: usize,
    pub dry_run: bool,
}

/// Run a full sync against the config at `config_path`.
///
/// Either every staged file is flushed or none is.
pub fn run(
    config_path: &Path,
    opts: &SyncOptions,
    collab: &Collaborators<'_>,
) -> Result<SyncReport, SyncError> {
    let config = config::load_at(config_path)?;
    let mut ctx = SyncContext::new(config_path, config);

    let resolved = resolver::resolve_projects(&mut ctx.config, opts, collab.remote, collab.confirmer)?;

    siblings::sync_style_config(&mut ctx, collab.remote)?;
    let projects = orchestrator::sync_projects(&mut ctx, &resolved, opts, collab)?;

    let materialized = ctx.config.materialize_schemes();
    if materialized > 0 {
        tracing::debug!("defaulted scheme of {materialized} component(s)");
    }
    ctx.persist_config()?;

    let merged = scheduler::run_pending_merges(&mut ctx, opts, collab.merger, collab.imports)?;
    imports::fix_all_imports(&mut ctx, collab.imports)?;

    let base_dir = ctx.base_dir();
    let SyncContext { writes, config, .. } = ctx;
    let writes = if opts.dry_run {
        writes.preview(&base_dir)?
    } else {
        writes.flush()?
    };

    if !opts.dry_run {
        post_sync::run_commands(&base_dir, &config.post_sync_commands);
    }

    Ok(SyncReport {
        projects,
        writes,
        merged,
        dry_run: opts.dry_run,
    })
}
