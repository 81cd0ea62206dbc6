//! codesync core library — config schema, config persistence, version ranges.
//!
//! - [`types`] — newtypes and the `codesync.json` schema
//! - [`config`] — discover / load / save / init
//! - [`version`] — range helpers (`latest`, caret ranges, satisfaction)
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;
pub mod version;

pub use error::ConfigError;
pub use types::{
    CodeConfig, ComponentConfig, ComponentId, GlobalVariantGroupConfig, GlobalVariantsConfig,
    IconConfig, ImportSpec, Lang, ProjectConfig, ProjectId, Scheme, StyleConfig, SyncConfig,
};
