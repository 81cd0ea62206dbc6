//! Per-component write policy.
//!
//! | stored config | scheme   | on-disk skeleton | skeleton action              |
//! |---------------|----------|------------------|------------------------------|
//! | none          | any      | any              | write                        |
//! | present       | direct   | missing          | fail with `MissingFile`      |
//! | present       | direct   | present          | queue a [`PendingMerge`]     |
//! | present       | blackbox | missing          | regenerate                   |
//! | present       | blackbox | no marker        | keep                         |
//! | present       | blackbox | marker           | overwrite only when forced   |
//!
//! Render modules and stylesheets are rewritten in every case.

use codesync_core::{ComponentConfig, ImportSpec, ProjectId, Scheme};

use crate::bundle::ComponentBundle;
use crate::context::{PendingMerge, SyncContext};
use crate::error::SyncError;
use crate::merge::has_managed_marker;
use crate::pipeline::SyncOptions;

/// What happened to a component's skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Created,
    MergeQueued,
    Kept,
    Regenerated,
    /// Marker found on a blackbox skeleton and no `--force-overwrite`.
    Protected,
    /// Marker found on a blackbox skeleton, replaced anyway.
    Overwritten,
}

pub(crate) fn reconcile_component(
    ctx: &mut SyncContext,
    project_id: &ProjectId,
    bundle: &ComponentBundle,
    opts: &SyncOptions,
) -> Result<ComponentState, SyncError> {
    let default_scheme = ctx.config.code.scheme;
    let stored = ctx
        .config
        .project(project_id)
        .and_then(|p| p.component(&bundle.id))
        .cloned();

    let Some(stored) = stored else {
        create_component(ctx, project_id, bundle, opts)?;
        return Ok(ComponentState::Created);
    };

    if stored.name != bundle.component_name {
        tracing::info!(
            "component {} renamed: {} -> {}",
            stored.id,
            stored.name,
            bundle.component_name
        );
        if let Some(c) = ctx
            .config
            .project_mut(project_id)
            .and_then(|p| p.component_mut(&bundle.id))
        {
            c.name = bundle.component_name.clone();
        }
    }

    let render_path = ctx.abs_path(&stored.render_module_file_path);
    let css_path = ctx.abs_path(&stored.css_file_path);
    ctx.writes.stage(render_path, &bundle.render_module);
    ctx.writes.stage(css_path, &bundle.css_rules);

    let skeleton_rel = stored.import_spec.module_path.clone();
    let skeleton_path = ctx.abs_path(&skeleton_rel);
    let on_disk = ctx.writes.read(&skeleton_path)?;

    let state = match (stored.effective_scheme(default_scheme), on_disk) {
        (Scheme::Direct, None) => {
            tracing::error!(
                "{}: edited skeleton {} is missing; restore it, or remove the component from codesync.json to regenerate it",
                bundle.component_name,
                skeleton_path.display()
            );
            return Err(SyncError::MissingFile {
                component: bundle.component_name.clone(),
                path: skeleton_path,
            });
        }
        (Scheme::Direct, Some(edited)) => {
            ctx.pending_merges.push(PendingMerge {
                project_id: project_id.clone(),
                component_id: bundle.id.clone(),
                component_name: bundle.component_name.clone(),
                skeleton_module_path: skeleton_rel,
                edited_skeleton: edited,
                new_skeleton: bundle.skeleton_module.clone(),
                node_ids: bundle.name_in_id_to_uuid.clone(),
            });
            ctx.record(&bundle.id, true);
            ComponentState::MergeQueued
        }
        (Scheme::Blackbox, None) => {
            tracing::warn!(
                "{}: skeleton {} is missing; regenerating it",
                bundle.component_name,
                skeleton_path.display()
            );
            ctx.writes.stage(skeleton_path, &bundle.skeleton_module);
            ctx.record(&bundle.id, true);
            ComponentState::Regenerated
        }
        (Scheme::Blackbox, Some(current)) if has_managed_marker(&current) => {
            if opts.force_overwrite {
                tracing::warn!(
                    "{}: {} contains managed-edit markers but is declared blackbox; overwriting because of --force-overwrite",
                    bundle.component_name,
                    skeleton_path.display()
                );
                ctx.writes.stage(skeleton_path, &bundle.skeleton_module);
                ctx.record(&bundle.id, true);
                ComponentState::Overwritten
            } else {
                tracing::warn!(
                    "{}: {} contains managed-edit markers but is declared blackbox; leaving it untouched (set its scheme to \"direct\" or pass --force-overwrite)",
                    bundle.component_name,
                    skeleton_path.display()
                );
                ctx.record(&bundle.id, false);
                ComponentState::Protected
            }
        }
        (Scheme::Blackbox, Some(_)) => {
            ctx.record(&bundle.id, false);
            ComponentState::Kept
        }
    };
    Ok(state)
}

fn create_component(
    ctx: &mut SyncContext,
    project_id: &ProjectId,
    bundle: &ComponentBundle,
    opts: &SyncOptions,
) -> Result<(), SyncError> {
    let project_name = ctx
        .config
        .project(project_id)
        .map(|p| p.project_name.clone())
        .unwrap_or_else(|| project_id.0.clone());

    let skeleton_rel = unclaimed_skeleton_path(ctx, &bundle.skeleton_module_file_name);
    if skeleton_rel != bundle.skeleton_module_file_name {
        tracing::warn!(
            "{}: {} belongs to another component; using {} instead",
            bundle.component_name,
            bundle.skeleton_module_file_name,
            skeleton_rel
        );
    }
    let render_rel = ctx.managed_path(&project_name, &bundle.render_module_file_name);
    let css_rel = ctx.managed_path(&project_name, &bundle.css_file_name);

    let skeleton_path = ctx.abs_path(&skeleton_rel);
    if ctx.writes.read(&skeleton_path)?.is_some() {
        tracing::warn!(
            "{}: {} already exists but the component is new; overwriting it",
            bundle.component_name,
            skeleton_path.display()
        );
    }
    let render_path = ctx.abs_path(&render_rel);
    let css_path = ctx.abs_path(&css_rel);
    ctx.writes.stage(skeleton_path, &bundle.skeleton_module);
    ctx.writes.stage(render_path, &bundle.render_module);
    ctx.writes.stage(css_path, &bundle.css_rules);

    let component = ComponentConfig {
        id: bundle.id.clone(),
        name: bundle.component_name.clone(),
        project_id: project_id.clone(),
        scheme: opts.new_component_scheme,
        import_spec: ImportSpec {
            module_path: skeleton_rel,
        },
        render_module_file_path: render_rel,
        css_file_path: css_rel,
    };
    tracing::info!("new component {} ({})", component.name, component.id);
    if let Some(project) = ctx.config.project_mut(project_id) {
        project.components.push(component);
    }
    ctx.record(&bundle.id, true);
    Ok(())
}

/// `Button.tsx`, else the first free `Button_<n>.tsx`.
///
/// A path is taken once any stored component imports from it or another
/// component staged it earlier in this run.
fn unclaimed_skeleton_path(ctx: &SyncContext, wanted: &str) -> String {
    let taken = |candidate: &str| {
        ctx.writes.is_staged(&ctx.abs_path(candidate))
            || ctx
                .config
                .projects
                .iter()
                .flat_map(|p| &p.components)
                .any(|c| c.import_spec.module_path == candidate)
    };
    if !taken(wanted) {
        return wanted.to_string();
    }
    let (stem, extension) = split_extension(wanted);
    let mut n = 1;
    loop {
        let candidate = format!("{stem}_{n}{extension}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => path.split_at(name_start + dot),
        _ => (path, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesync_core::{ComponentId, ProjectConfig, SyncConfig};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    const MARKED: &str = "// codesync-managed-start: root\n<div/>\n// codesync-managed-end: root\n";

    fn bundle() -> ComponentBundle {
        ComponentBundle {
            id: ComponentId::from("c1"),
            component_name: "Button".into(),
            skeleton_module_file_name: "Button.tsx".into(),
            skeleton_module: "export default Button;\n".into(),
            render_module_file_name: "PlasmicButton.tsx".into(),
            render_module: "render v2\n".into(),
            css_file_name: "PlasmicButton.css".into(),
            css_rules: ".b{}\n".into(),
            name_in_id_to_uuid: BTreeMap::new(),
        }
    }

    fn ctx(dir: &TempDir, scheme: Option<Scheme>) -> SyncContext {
        let mut config = SyncConfig {
            src_dir: ".".into(),
            ..SyncConfig::default()
        };
        let mut project = ProjectConfig::new(ProjectId::from("p1"), "Site");
        if let Some(scheme) = scheme {
            project.components.push(ComponentConfig {
                id: ComponentId::from("c1"),
                name: "Button".into(),
                project_id: ProjectId::from("p1"),
                scheme: Some(scheme),
                import_spec: ImportSpec {
                    module_path: "Button.tsx".into(),
                },
                render_module_file_path: "codesync/site/PlasmicButton.tsx".into(),
                css_file_path: "codesync/site/PlasmicButton.css".into(),
            });
        }
        config.projects.push(project);
        SyncContext::new(&dir.path().join("codesync.json"), config)
    }

    fn run(ctx: &mut SyncContext, force: bool) -> Result<ComponentState, SyncError> {
        let opts = SyncOptions {
            force_overwrite: force,
            ..Default::default()
        };
        reconcile_component(ctx, &ProjectId::from("p1"), &bundle(), &opts)
    }

    #[test]
    fn new_component_is_registered_and_written() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx(&dir, None);
        assert_eq!(run(&mut ctx, false).unwrap(), ComponentState::Created);

        let c = ctx.config.find_component(&ComponentId::from("c1")).unwrap();
        assert_eq!(c.render_module_file_path, "codesync/site/PlasmicButton.tsx");
        assert_eq!(c.scheme, None);
        assert_eq!(ctx.writes.len(), 3);
        assert!(ctx.summary[&ComponentId::from("c1")].skeleton_module_modified);
    }

    #[test]
    fn direct_component_queues_merge_without_touching_skeleton() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Button.tsx"), "edited\n").unwrap();
        let mut ctx = ctx(&dir, Some(Scheme::Direct));
        assert_eq!(run(&mut ctx, false).unwrap(), ComponentState::MergeQueued);

        assert!(!ctx.writes.is_staged(&dir.path().join("Button.tsx")));
        assert_eq!(ctx.pending_merges.len(), 1);
        assert_eq!(ctx.pending_merges[0].edited_skeleton, "edited\n");
    }

    #[test]
    fn direct_component_without_skeleton_is_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx(&dir, Some(Scheme::Direct));
        let err = run(&mut ctx, false).unwrap_err();
        assert!(matches!(err, SyncError::MissingFile { .. }));
    }

    #[test]
    fn blackbox_skeleton_is_kept_but_render_rewritten() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Button.tsx"), "mine\n").unwrap();
        let mut ctx = ctx(&dir, Some(Scheme::Blackbox));
        assert_eq!(run(&mut ctx, false).unwrap(), ComponentState::Kept);

        assert!(!ctx.writes.is_staged(&dir.path().join("Button.tsx")));
        assert!(ctx
            .writes
            .is_staged(&dir.path().join("codesync/site/PlasmicButton.tsx")));
    }

    #[test]
    fn marker_on_blackbox_needs_force() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Button.tsx"), MARKED).unwrap();

        let mut protected = ctx(&dir, Some(Scheme::Blackbox));
        assert_eq!(run(&mut protected, false).unwrap(), ComponentState::Protected);
        assert!(!protected.writes.is_staged(&dir.path().join("Button.tsx")));

        let mut forced = ctx(&dir, Some(Scheme::Blackbox));
        assert_eq!(run(&mut forced, true).unwrap(), ComponentState::Overwritten);
        assert!(forced.writes.is_staged(&dir.path().join("Button.tsx")));
    }

    #[test]
    fn new_component_never_reuses_a_claimed_skeleton() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx(&dir, Some(Scheme::Blackbox));
        let opts = SyncOptions::default();

        let mut second = bundle();
        second.id = ComponentId::from("c2");
        let mut third = bundle();
        third.id = ComponentId::from("c3");
        for b in [&second, &third] {
            reconcile_component(&mut ctx, &ProjectId::from("p1"), b, &opts).unwrap();
        }

        let path_of = |id: &str| {
            ctx.config
                .find_component(&ComponentId::from(id))
                .unwrap()
                .import_spec
                .module_path
                .clone()
        };
        assert_eq!(path_of("c1"), "Button.tsx");
        assert_eq!(path_of("c2"), "Button_1.tsx");
        assert_eq!(path_of("c3"), "Button_2.tsx");
        assert!(!ctx.writes.is_staged(&dir.path().join("Button.tsx")));
    }

    #[test]
    fn extension_split_ignores_dots_in_directories() {
        assert_eq!(split_extension("Button.tsx"), ("Button", ".tsx"));
        assert_eq!(split_extension("ui.v2/Button"), ("ui.v2/Button", ""));
        assert_eq!(split_extension("src/.hidden"), ("src/.hidden", ""));
    }

    #[test]
    fn rename_keeps_identity() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Button.tsx"), "mine\n").unwrap();
        let mut ctx = ctx(&dir, Some(Scheme::Blackbox));
        let mut renamed = bundle();
        renamed.component_name = "PrimaryButton".into();
        reconcile_component(&mut ctx, &ProjectId::from("p1"), &renamed, &SyncOptions::default())
            .unwrap();

        let c = ctx.config.find_component(&ComponentId::from("c1")).unwrap();
        assert_eq!(c.name, "PrimaryButton");
        assert_eq!(c.import_spec.module_path, "Button.tsx");
    }
}
