//! Deferred skeleton merges.
//!
//! Runs after every project is synced and the config is final, so import
//! specifiers on both sides of a merge point at their final locations.

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::imports::ImportResolver;
use crate::merge::{MergeRequest, Merger};
use crate::pipeline::SyncOptions;

/// Execute every pending merge. Returns how many merged cleanly.
pub(crate) fn run_pending_merges(
    ctx: &mut SyncContext,
    opts: &SyncOptions,
    merger: &dyn Merger,
    imports: &dyn ImportResolver,
) -> Result<usize, SyncError> {
    let pending = std::mem::take(&mut ctx.pending_merges);
    let mut merged = 0;

    for task in pending {
        let path = ctx.abs_path(&task.skeleton_module_path);
        let edited = imports.resolve(&task.skeleton_module_path, &task.edited_skeleton, &ctx.config);
        let generated = imports.resolve(&task.skeleton_module_path, &task.new_skeleton, &ctx.config);

        let request = MergeRequest {
            component_id: &task.component_id,
            edited: &edited,
            generated: &generated,
            node_ids: &task.node_ids,
            append_on_missing_base: opts.append_jsx_on_missing_base,
        };
        match merger.merge(&request) {
            Ok(result) => {
                tracing::debug!("merged {}", task.skeleton_module_path);
                ctx.writes.stage(path, &result);
                merged += 1;
            }
            Err(err) if opts.force_overwrite => {
                tracing::warn!(
                    "{}: merge failed ({err}); overwriting {} with the generated version",
                    task.component_name,
                    task.skeleton_module_path
                );
                ctx.writes.stage(path, &generated);
            }
            Err(source) => {
                tracing::error!("{}: merge failed", task.component_name);
                return Err(SyncError::MergeFailure { path, source });
            }
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PendingMerge;
    use crate::imports::MarkerImportResolver;
    use crate::merge::{MergeError, RegionMerger};
    use codesync_core::{ComponentId, ProjectId, SyncConfig};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct Refuse;

    impl Merger for Refuse {
        fn merge(&self, _: &MergeRequest<'_>) -> Result<String, MergeError> {
            Err(MergeError::Other("incompatible".into()))
        }
    }

    fn ctx_with_task(dir: &TempDir) -> SyncContext {
        let config = SyncConfig {
            src_dir: ".".into(),
            ..SyncConfig::default()
        };
        let mut ctx = SyncContext::new(&dir.path().join("codesync.json"), config);
        ctx.pending_merges.push(PendingMerge {
            project_id: ProjectId::from("p1"),
            component_id: ComponentId::from("c1"),
            component_name: "Button".into(),
            skeleton_module_path: "Button.tsx".into(),
            edited_skeleton: "mine\n// codesync-managed-start: root\nold\n// codesync-managed-end: root\n".into(),
            new_skeleton: "// codesync-managed-start: root\nnew\n// codesync-managed-end: root\n".into(),
            node_ids: BTreeMap::new(),
        });
        ctx
    }

    #[test]
    fn successful_merge_is_staged() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx_with_task(&dir);
        let n = run_pending_merges(&mut ctx, &SyncOptions::default(), &RegionMerger, &MarkerImportResolver)
            .unwrap();
        assert_eq!(n, 1);
        let staged = ctx.writes.read(&dir.path().join("Button.tsx")).unwrap().unwrap();
        assert!(staged.starts_with("mine\n"));
        assert!(staged.contains("new\n"));
        assert!(ctx.pending_merges.is_empty());
    }

    #[test]
    fn failure_without_force_stages_nothing() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx_with_task(&dir);
        let err = run_pending_merges(&mut ctx, &SyncOptions::default(), &Refuse, &MarkerImportResolver)
            .unwrap_err();
        assert!(matches!(err, SyncError::MergeFailure { .. }));
        assert!(ctx.writes.is_empty());
    }

    #[test]
    fn failure_with_force_stages_generated() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx_with_task(&dir);
        let opts = SyncOptions {
            force_overwrite: true,
            ..Default::default()
        };
        let n = run_pending_merges(&mut ctx, &opts, &Refuse, &MarkerImportResolver).unwrap();
        assert_eq!(n, 0);
        let staged = ctx.writes.read(&dir.path().join("Button.tsx")).unwrap().unwrap();
        assert!(!staged.contains("mine"));
    }
}
