//! Per-project sync loop.
//!
//! Projects are visited in reverse resolution order so dependencies are
//! written before their dependents. Import paths are only fixed in the
//! final global pass, so the order shows up in logs and staging order but
//! not in the resulting files.

use std::collections::BTreeMap;

use codesync_core::{version, Lang, ProjectConfig};

use crate::bundle::{FetchRequest, ProjectBundle, ResolvedProject};
use crate::context::SyncContext;
use crate::convert::ScriptConverter;
use crate::error::SyncError;
use crate::pipeline::{Collaborators, SyncOptions, SyncedProject};
use crate::{reconciler, siblings};

/// Range recorded for a project: `latest` for projects the user asked for,
/// a caret range at the resolved version for dependencies.
pub fn selected_range(project: &ResolvedProject) -> String {
    if !project.indirect {
        return version::LATEST.to_owned();
    }
    version::caret_range(&project.version).unwrap_or_else(|| version::LATEST.to_owned())
}

pub(crate) fn sync_projects(
    ctx: &mut SyncContext,
    resolved: &[ResolvedProject],
    opts: &SyncOptions,
    collab: &Collaborators<'_>,
) -> Result<Vec<SyncedProject>, SyncError> {
    let mut synced = Vec::with_capacity(resolved.len());
    for project in resolved.iter().rev() {
        sync_project(ctx, project, opts, collab)?;
        synced.push(SyncedProject {
            project_id: project.project_id.clone(),
            project_name: project.project_name.clone(),
            version: project.version.clone(),
        });
    }
    Ok(synced)
}

fn sync_project(
    ctx: &mut SyncContext,
    resolved: &ResolvedProject,
    opts: &SyncOptions,
    collab: &Collaborators<'_>,
) -> Result<(), SyncError> {
    let range = selected_range(resolved);
    let default_scheme = ctx.config.code.scheme;
    let existing_schemes = ctx
        .config
        .project(&resolved.project_id)
        .map(|p| {
            p.components
                .iter()
                .map(|c| (c.id.clone(), c.effective_scheme(default_scheme)))
                .collect()
        })
        .unwrap_or_else(BTreeMap::new);

    tracing::info!(
        "syncing {} ({}) at version {}",
        resolved.project_name,
        resolved.project_id,
        resolved.version
    );
    let request = FetchRequest {
        project_id: resolved.project_id.clone(),
        version: resolved.version.clone(),
        version_range: range.clone(),
        component_ids: resolved.component_ids.clone(),
        existing_schemes,
        new_component_scheme: opts.new_component_scheme.unwrap_or(default_scheme),
    };
    let response = collab.remote.fetch_components(&request)?;
    let mut bundle = ProjectBundle::from_entries(&resolved.project_id, response)?;

    if ctx.config.code.lang == Lang::Js {
        convert_bundle(&mut bundle, collab.converter)?;
    }

    if opts.only_existing {
        let before = bundle.components.len();
        bundle
            .components
            .retain(|c| ctx.config.knows_component(&c.id));
        tracing::debug!(
            "--only-existing skipped {} new component(s)",
            before - bundle.components.len()
        );
    }

    ensure_project_config(ctx, resolved, &bundle, &range);

    siblings::sync_global_variants(ctx, &resolved.project_id, &bundle)?;
    for component in &bundle.components {
        let state = reconciler::reconcile_component(ctx, &resolved.project_id, component, opts)?;
        tracing::debug!("{}: {:?}", component.component_name, state);
    }
    siblings::upsert_style_tokens(ctx, &bundle.project)?;

    let mut icon_ids = resolved.icon_ids.clone();
    for id in &bundle.icon_ids {
        if !icon_ids.contains(id) {
            icon_ids.push(id.clone());
        }
    }
    if icon_ids.is_empty() {
        tracing::debug!("{}: no icons to sync", resolved.project_name);
    } else {
        siblings::sync_icons(ctx, resolved, &range, &icon_ids, collab)?;
    }
    Ok(())
}

/// Create the project entry on first sync; keep the stored name current.
fn ensure_project_config(
    ctx: &mut SyncContext,
    resolved: &ResolvedProject,
    bundle: &ProjectBundle,
    range: &str,
) {
    match ctx.config.project_mut(&resolved.project_id) {
        Some(project) => {
            if project.project_name != bundle.project.project_name {
                tracing::info!(
                    "project {} renamed: {} -> {}",
                    project.project_id,
                    project.project_name,
                    bundle.project.project_name
                );
                project.project_name = bundle.project.project_name.clone();
            }
        }
        None => {
            let mut project = ProjectConfig::new(
                resolved.project_id.clone(),
                bundle.project.project_name.clone(),
            );
            project.version = range.to_owned();
            ctx.config.projects.push(project);
        }
    }
}

/// Convert every script module of the bundle before anything acts on it.
fn convert_bundle(
    bundle: &mut ProjectBundle,
    converter: &dyn ScriptConverter,
) -> Result<(), SyncError> {
    for component in &mut bundle.components {
        let render = converter.to_untyped(&component.render_module_file_name, &component.render_module)?;
        component.render_module_file_name = render.file_name;
        component.render_module = render.content;

        let skeleton =
            converter.to_untyped(&component.skeleton_module_file_name, &component.skeleton_module)?;
        component.skeleton_module_file_name = skeleton.file_name;
        component.skeleton_module = skeleton.content;
    }
    for variant in &mut bundle.global_variants {
        let context = converter.to_untyped(&variant.context_file_name, &variant.context_module)?;
        variant.context_file_name = context.file_name;
        variant.context_module = context.content;
    }
    Ok(())
}
