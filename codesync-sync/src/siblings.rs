//! Artifacts synced next to components: the default stylesheet, project
//! style tokens, global variant contexts and icons.
//!
//! Every artifact keeps the path already stored for it; new ones go under
//! the managed directory.

use codesync_core::{GlobalVariantGroupConfig, IconConfig, Lang, ProjectId};

use crate::bundle::{icons_from_entries, IconsRequest, ProjectBundle, ProjectMetaBundle, ResolvedProject};
use crate::context::SyncContext;
use crate::error::SyncError;
use crate::paths;
use crate::pipeline::Collaborators;
use crate::remote::Remote;

pub(crate) fn sync_style_config(ctx: &mut SyncContext, remote: &dyn Remote) -> Result<(), SyncError> {
    let style = remote.fetch_style_config()?;
    if style.default_style_css_file_name.is_empty() {
        tracing::debug!("no default stylesheet configured upstream");
        return Ok(());
    }
    if ctx.config.style.default_style_css_file_path.is_empty() {
        ctx.config.style.default_style_css_file_path = paths::join(&[
            &ctx.config.default_managed_dir,
            &style.default_style_css_file_name,
        ]);
    }
    let path = ctx.abs_path(&ctx.config.style.default_style_css_file_path);
    ctx.writes.stage(path, &style.default_style_css_rules);
    Ok(())
}

pub(crate) fn sync_global_variants(
    ctx: &mut SyncContext,
    project_id: &ProjectId,
    bundle: &ProjectBundle,
) -> Result<(), SyncError> {
    let project_name = project_name(ctx, project_id);
    for variant in &bundle.global_variants {
        let stored = ctx
            .config
            .global_variants
            .variant_groups
            .iter()
            .position(|g| g.id == variant.id);
        let context_path = match stored {
            Some(i) => {
                let group = &mut ctx.config.global_variants.variant_groups[i];
                group.name = variant.name.clone();
                group.context_file_path.clone()
            }
            None => {
                let context_file_path = ctx.managed_path(&project_name, &variant.context_file_name);
                ctx.config
                    .global_variants
                    .variant_groups
                    .push(GlobalVariantGroupConfig {
                        id: variant.id.clone(),
                        name: variant.name.clone(),
                        project_id: project_id.clone(),
                        context_file_path: context_file_path.clone(),
                    });
                context_file_path
            }
        };
        let path = ctx.abs_path(&context_path);
        ctx.writes.stage(path, &variant.context_module);
    }
    Ok(())
}

/// Write the project-wide stylesheet and record where it lives.
pub(crate) fn upsert_style_tokens(
    ctx: &mut SyncContext,
    meta: &ProjectMetaBundle,
) -> Result<(), SyncError> {
    let fresh = ctx.managed_path(&meta.project_name, &meta.css_file_name);
    let Some(project) = ctx.config.project_mut(&meta.project_id) else {
        return Ok(());
    };
    if project.css_file_path.is_empty() {
        project.css_file_path = fresh;
    }
    let relative = project.css_file_path.clone();
    let path = ctx.abs_path(&relative);
    ctx.writes.stage(path, &meta.css_rules);
    Ok(())
}

pub(crate) fn sync_icons(
    ctx: &mut SyncContext,
    resolved: &ResolvedProject,
    version_range: &str,
    icon_ids: &[String],
    collab: &Collaborators<'_>,
) -> Result<(), SyncError> {
    let request = IconsRequest {
        project_id: resolved.project_id.clone(),
        version_range: version_range.to_owned(),
        icon_ids: icon_ids.to_vec(),
    };
    let mut icons = icons_from_entries(collab.remote.fetch_icons(&request)?)?;
    if ctx.config.code.lang == Lang::Js {
        for icon in &mut icons {
            let converted = collab.converter.to_untyped(&icon.module_file_name, &icon.module)?;
            icon.module_file_name = converted.file_name;
            icon.module = converted.content;
        }
    }

    let project_name = project_name(ctx, &resolved.project_id);
    for icon in icons {
        let fresh = ctx.managed_path(&project_name, &paths::join(&["icons", &icon.module_file_name]));
        let Some(project) = ctx.config.project_mut(&resolved.project_id) else {
            break;
        };
        let module_file_path = match project.icons.iter_mut().find(|i| i.id == icon.id) {
            Some(stored) => {
                stored.name = icon.name.clone();
                stored.module_file_path.clone()
            }
            None => {
                project.icons.push(IconConfig {
                    id: icon.id.clone(),
                    name: icon.name.clone(),
                    module_file_path: fresh.clone(),
                });
                fresh
            }
        };
        let path = ctx.abs_path(&module_file_path);
        ctx.writes.stage(path, &icon.module);
    }
    tracing::debug!("{}: synced {} icon(s)", project_name, icon_ids.len());
    Ok(())
}

fn project_name(ctx: &SyncContext, project_id: &ProjectId) -> String {
    ctx.config
        .project(project_id)
        .map(|p| p.project_name.clone())
        .unwrap_or_else(|| project_id.0.clone())
}
