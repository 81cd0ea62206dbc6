//! Error types for codesync-sync.

use std::path::PathBuf;

use thiserror::Error;

use codesync_core::error::ConfigError;

use crate::bundle::BundleError;
use crate::convert::ConvertError;
use crate::merge::MergeError;
use crate::remote::RemoteError;

/// A project whose resolved version falls outside its stored range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakingChange {
    pub project_id: String,
    pub project_name: String,
    pub stored_range: String,
    pub resolved_version: String,
}

/// All errors that can abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Nothing to sync, or ids that the server does not know.
    #[error("{0}")]
    UserInput(String),

    /// The server reported inconsistent root requests.
    #[error("conflicting project versions requested:\n{}", .conflicts.join("\n"))]
    Conflict { conflicts: Vec<String> },

    /// Resolved versions outside the stored range in non-interactive mode.
    #[error(
        "{} project(s) would be upgraded outside their stored version range:\n{}\nre-run interactively to accept the upgrade",
        .changes.len(),
        format_breaking(.changes)
    )]
    VersionRange { changes: Vec<BreakingChange> },

    /// The user declined a confirmation prompt.
    #[error("sync cancelled; no files were changed")]
    Cancelled,

    /// A hand-edited file the reconciler needs is not on disk.
    #[error("component {component} expects an edited file at {path}, but it does not exist")]
    MissingFile { component: String, path: PathBuf },

    /// The structural merge could not reconcile edited and generated code.
    #[error("could not merge {path}: {source}; re-run with --force-overwrite to replace it with the generated version")]
    MergeFailure {
        path: PathBuf,
        #[source]
        source: MergeError,
    },

    /// A call to the code-generation service failed.
    #[error("upstream service error: {0}")]
    Upstream(#[from] RemoteError),

    /// The service answered with a bundle that failed validation.
    #[error("invalid bundle from upstream: {0}")]
    Bundle(#[from] BundleError),

    /// Script format conversion failed.
    #[error("format conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// An error from the config layer.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The confirmation prompt itself failed.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Errors that describe a user-facing condition rather than a failure
    /// of the tool or its environment.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            SyncError::UserInput(_)
                | SyncError::Conflict { .. }
                | SyncError::VersionRange { .. }
                | SyncError::Cancelled
                | SyncError::MissingFile { .. }
                | SyncError::MergeFailure { .. }
        )
    }
}

pub(crate) fn format_breaking(changes: &[BreakingChange]) -> String {
    changes
        .iter()
        .map(|c| {
            format!(
                "  {} ({}): stored {} -> resolved {}",
                c.project_name, c.project_id, c.stored_range, c.resolved_version
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_range_message_lists_every_project() {
        let err = SyncError::VersionRange {
            changes: vec![
                BreakingChange {
                    project_id: "p1".into(),
                    project_name: "Site".into(),
                    stored_range: "^1.0.0".into(),
                    resolved_version: "2.0.0".into(),
                },
                BreakingChange {
                    project_id: "p2".into(),
                    project_name: "Lib".into(),
                    stored_range: "^0.1.0".into(),
                    resolved_version: "0.2.0".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 project(s)"));
        assert!(msg.contains("Site (p1): stored ^1.0.0 -> resolved 2.0.0"));
        assert!(msg.contains("Lib (p2)"));
        assert!(err.is_handled());
    }

    #[test]
    fn upstream_errors_are_not_handled() {
        let err = SyncError::Upstream(RemoteError::Transport("connection reset".into()));
        assert!(!err.is_handled());
        assert!(err.to_string().contains("connection reset"));
    }
}
