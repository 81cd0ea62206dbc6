//! Boundary to the code-generation service.
//!
//! The engine only sees the [`Remote`] trait; the CLI provides the HTTP
//! implementation and tests provide in-memory fakes. Calls are blocking and
//! carry no retry policy of their own.

use thiserror::Error;

use crate::bundle::{
    BundleEntry, FetchRequest, FetchResponse, IconsRequest, ResolveRequest, ResolveResponse,
    StyleBundle,
};

/// Failures of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never produced a response (DNS, TLS, reset, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    /// The response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Credentials are missing or rejected.
    #[error("not authenticated: {0}")]
    Unauthorized(String),
}

/// Calls the sync engine makes against the code-generation service.
pub trait Remote {
    /// Pin every requested project (and optionally its dependencies) to one
    /// version.
    fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse, RemoteError>;

    /// Generate code for one project at the resolved version.
    fn fetch_components(&self, request: &FetchRequest) -> Result<FetchResponse, RemoteError>;

    /// Fetch icon modules. An empty id list means "every icon" on the
    /// server side, so callers must not send one.
    fn fetch_icons(&self, request: &IconsRequest) -> Result<Vec<BundleEntry>, RemoteError>;

    /// Fetch the site-wide default stylesheet.
    fn fetch_style_config(&self) -> Result<StyleBundle, RemoteError>;
}
