//! # codesync-sync
//!
//! Reconciles locally stored project artifacts with freshly generated ones.
//!
//! Call [`run`] with the path of a `codesync.json` and a set of
//! [`Collaborators`]; the engine resolves versions, reconciles every
//! component, runs deferred merges and flushes all writes as one batch.

pub mod bundle;
pub mod context;
pub mod convert;
pub mod error;
pub mod imports;
pub mod merge;
pub mod orchestrator;
pub mod paths;
pub mod pipeline;
pub mod post_sync;
pub mod reconciler;
pub mod remote;
pub mod resolver;
mod scheduler;
mod siblings;
pub mod writer;

pub use convert::{ExtensionConverter, ScriptConverter};
pub use error::{BreakingChange, SyncError};
pub use imports::{ImportResolver, MarkerImportResolver};
pub use merge::{MergeError, Merger, RegionMerger};
pub use pipeline::{run, Collaborators, ProjectSpec, SyncOptions, SyncReport, SyncedProject};
pub use remote::{Remote, RemoteError};
pub use resolver::Confirmer;
pub use writer::WriteResult;
