//! Import statement resolution.
//!
//! Generated modules tag every import of a sibling artifact:
//!
//! ```text
//! import PlasmicButton from "./codesync/site/PlasmicButton"; // codesync-import:c1/render
//! ```
//!
//! [`MarkerImportResolver`] rewrites the specifier of each tagged line to
//! the path the finalized config assigns to the target. Untagged lines are
//! never touched.

use codesync_core::{ComponentId, ProjectId, SyncConfig};

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::paths;

/// Tag introducing `<id>/<kind>` on an import line.
pub const IMPORT_TAG: &str = "codesync-import:";

pub trait ImportResolver {
    /// Rewrite the imports of `content`, which lives at `file_path`
    /// (relative to `srcDir`).
    fn resolve(&self, file_path: &str, content: &str, config: &SyncConfig) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerImportResolver;

impl ImportResolver for MarkerImportResolver {
    fn resolve(&self, file_path: &str, content: &str, config: &SyncConfig) -> String {
        let mut out = String::with_capacity(content.len());
        for line in content.split_inclusive('\n') {
            match rewrite_line(file_path, line, config) {
                Some(rewritten) => out.push_str(&rewritten),
                None => out.push_str(line),
            }
        }
        out
    }
}

fn rewrite_line(file_path: &str, line: &str, config: &SyncConfig) -> Option<String> {
    let tag_at = line.find(IMPORT_TAG)?;
    let tag = line[tag_at + IMPORT_TAG.len()..]
        .split_whitespace()
        .next()
        .unwrap_or("");
    let (id, kind) = tag.rsplit_once('/')?;

    let Some((target, is_script)) = target_path(config, id, kind) else {
        tracing::warn!("{file_path}: cannot resolve import of {kind} {id}; leaving it unchanged");
        return None;
    };

    let mut specifier = paths::relative_import(file_path, &target);
    if is_script {
        specifier = paths::strip_script_extension(&specifier).to_owned();
    }

    // The specifier is the last quoted string before the tag's comment.
    let code = &line[..tag_at];
    let close = code.rfind(['"', '\''])?;
    let quote = code[close..].chars().next()?;
    let open = code[..close].rfind(quote)?;
    Some(format!(
        "{}{}{}",
        &line[..=open],
        specifier,
        &line[close..]
    ))
}

/// Config path of the artifact named by an import tag, and whether it is a
/// script module.
fn target_path(config: &SyncConfig, id: &str, kind: &str) -> Option<(String, bool)> {
    let path = match kind {
        "component" => config
            .find_component(&ComponentId::from(id))
            .map(|c| (c.import_spec.module_path.clone(), true)),
        "render" => config
            .find_component(&ComponentId::from(id))
            .map(|c| (c.render_module_file_path.clone(), true)),
        "css" => config
            .find_component(&ComponentId::from(id))
            .map(|c| (c.css_file_path.clone(), false)),
        "projectcss" => config
            .project(&ProjectId::from(id))
            .map(|p| (p.css_file_path.clone(), false)),
        "globalVariant" => config
            .global_variant(id)
            .map(|g| (g.context_file_path.clone(), true)),
        "icon" => config
            .find_icon(id)
            .map(|i| (i.module_file_path.clone(), true)),
        "defaultcss" => Some((config.style.default_style_css_file_path.clone(), false)),
        _ => None,
    }?;
    if path.0.is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Final pass over every component touched by this run.
///
/// Render modules are always fixed; skeletons only when the summary says
/// this run rewrote them.
pub(crate) fn fix_all_imports(
    ctx: &mut SyncContext,
    resolver: &dyn ImportResolver,
) -> Result<usize, SyncError> {
    let mut targets = Vec::new();
    for component in ctx.config.projects.iter().flat_map(|p| p.components.iter()) {
        let Some(summary) = ctx.summary.get(&component.id) else {
            continue;
        };
        targets.push(component.render_module_file_path.clone());
        if summary.skeleton_module_modified {
            targets.push(component.import_spec.module_path.clone());
        }
    }

    let mut fixed = 0;
    for relative in targets {
        let path = ctx.abs_path(&relative);
        let Some(content) = ctx.writes.read(&path)? else {
            continue;
        };
        let resolved = resolver.resolve(&relative, &content, &ctx.config);
        if resolved != content {
            ctx.writes.stage(path, &resolved);
            fixed += 1;
        }
    }
    tracing::debug!("fixed imports in {fixed} file(s)");
    Ok(fixed)
}
