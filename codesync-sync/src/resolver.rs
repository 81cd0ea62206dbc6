//! Version resolution and the breaking-upgrade check.
//!
//! Runs before anything is staged: every failure here leaves the working
//! tree untouched. The only side effect is rewriting stored ranges in the
//! in-memory config once the user accepts a breaking upgrade.

use std::collections::BTreeSet;

use codesync_core::{version, SyncConfig};

use crate::bundle::{ProjectSyncTarget, ResolveRequest, ResolvedProject};
use crate::error::{format_breaking, BreakingChange, SyncError};
use crate::pipeline::SyncOptions;
use crate::remote::Remote;

/// Asks the user a yes/no question.
pub trait Confirmer {
    fn confirm(&self, message: &str) -> Result<bool, SyncError>;
}

/// One target per requested project; every stored project when none was
/// requested.
pub fn build_targets(
    config: &SyncConfig,
    opts: &SyncOptions,
) -> Result<Vec<ProjectSyncTarget>, SyncError> {
    let targets: Vec<ProjectSyncTarget> = if opts.projects.is_empty() {
        config
            .projects
            .iter()
            .map(|p| ProjectSyncTarget {
                project_id: p.project_id.clone(),
                version_range: p.version.clone(),
                component_id_or_names: opts.components.clone(),
            })
            .collect()
    } else {
        opts.projects
            .iter()
            .map(|spec| {
                let stored = config.project(&spec.project_id).map(|p| p.version.clone());
                ProjectSyncTarget {
                    project_id: spec.project_id.clone(),
                    version_range: spec
                        .version_range
                        .clone()
                        .or(stored)
                        .unwrap_or_else(|| version::LATEST.to_owned()),
                    component_id_or_names: opts.components.clone(),
                }
            })
            .collect()
    };

    if targets.is_empty() {
        return Err(SyncError::UserInput(
            "no projects to sync; pass --projects or add a project to codesync.json".into(),
        ));
    }
    Ok(targets)
}

/// Resolved projects that are stored locally with a range the resolved
/// version does not satisfy.
pub fn breaking_changes(config: &SyncConfig, resolved: &[ResolvedProject]) -> Vec<BreakingChange> {
    resolved
        .iter()
        .filter_map(|p| {
            let stored = config.project(&p.project_id)?;
            if version::satisfies(&p.version, &stored.version) {
                return None;
            }
            Some(BreakingChange {
                project_id: p.project_id.0.clone(),
                project_name: p.project_name.clone(),
                stored_range: stored.version.clone(),
                resolved_version: p.version.clone(),
            })
        })
        .collect()
}

/// Resolve every target to a single version.
///
/// Returns projects in resolution order.
pub fn resolve_projects(
    config: &mut SyncConfig,
    opts: &SyncOptions,
    remote: &dyn Remote,
    confirmer: &dyn Confirmer,
) -> Result<Vec<ResolvedProject>, SyncError> {
    let targets = build_targets(config, opts)?;
    let request = ResolveRequest {
        projects: targets,
        recursive: opts.recursive,
        include_dependencies: opts.include_dependencies,
    };
    let response = remote.resolve(&request)?;

    if !response.conflicts.is_empty() {
        return Err(SyncError::Conflict {
            conflicts: response
                .conflicts
                .iter()
                .map(|c| format!("  {}: {}", c.project_id, c.message))
                .collect(),
        });
    }

    let mut seen = BTreeSet::new();
    for project in &response.projects {
        if !seen.insert(&project.project_id) {
            return Err(SyncError::Conflict {
                conflicts: vec![format!(
                    "  {}: resolved to more than one version",
                    project.project_id
                )],
            });
        }
    }

    if response.projects.is_empty() {
        let requested: Vec<String> = request
            .projects
            .iter()
            .map(|t| t.project_id.0.clone())
            .collect();
        return Err(SyncError::UserInput(format!(
            "nothing to sync for {}; check the project ids and component names",
            requested.join(", ")
        )));
    }

    let changes = breaking_changes(config, &response.projects);
    if !changes.is_empty() {
        if opts.non_interactive {
            return Err(SyncError::VersionRange { changes });
        }
        let message = format!(
            "The following projects will be upgraded outside their stored version range:\n{}\nContinue?",
            format_breaking(&changes)
        );
        if !confirmer.confirm(&message)? {
            return Err(SyncError::Cancelled);
        }
        accept_breaking(config, &changes);
    }

    Ok(response.projects)
}

/// Re-anchor each accepted project's stored range at its resolved version.
fn accept_breaking(config: &mut SyncConfig, changes: &[BreakingChange]) {
    for change in changes {
        let Some(range) = version::caret_range(&change.resolved_version) else {
            tracing::warn!(
                "cannot derive a range from version {} of {}; keeping {}",
                change.resolved_version,
                change.project_id,
                change.stored_range
            );
            continue;
        };
        if let Some(project) = config
            .projects
            .iter_mut()
            .find(|p| p.project_id.0 == change.project_id)
        {
            tracing::info!(
                "{}: version range {} -> {}",
                project.project_name,
                project.version,
                range
            );
            project.version = range;
        }
    }
}
