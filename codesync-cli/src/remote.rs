//! Blocking HTTP client for the code-generation service.

use serde::de::DeserializeOwned;
use serde::Serialize;

use codesync_sync::bundle::{
    BundleEntry, FetchRequest, FetchResponse, IconsRequest, ResolveRequest, ResolveResponse,
    StyleBundle,
};
use codesync_sync::{Remote, RemoteError};

use crate::auth::AuthConfig;

#[derive(Clone)]
pub struct HttpRemote {
    base_url: String,
    user: String,
    token: String,
}

impl HttpRemote {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            base_url: format!("{}/api/v1", auth.host.trim_end_matches('/')),
            user: auth.user.clone(),
            token: auth.token.clone(),
        }
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {url}");
        let response = ureq::post(&url)
            .set("x-codesync-user", &self.user)
            .set("x-codesync-token", &self.token)
            .send_json(body)
            .map_err(map_error)?;
        response
            .into_json()
            .map_err(|e| RemoteError::Decode(format!("{url}: {e}")))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {url}");
        let response = ureq::get(&url)
            .set("x-codesync-user", &self.user)
            .set("x-codesync-token", &self.token)
            .call()
            .map_err(map_error)?;
        response
            .into_json()
            .map_err(|e| RemoteError::Decode(format!("{url}: {e}")))
    }
}

fn map_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(code @ (401 | 403), response) => RemoteError::Unauthorized(format!(
            "{code}: {}",
            response.into_string().unwrap_or_default()
        )),
        ureq::Error::Status(code, response) => RemoteError::Status {
            code,
            message: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
    }
}

impl Remote for HttpRemote {
    fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse, RemoteError> {
        self.post("/resolve-sync", request)
    }

    fn fetch_components(&self, request: &FetchRequest) -> Result<FetchResponse, RemoteError> {
        self.post(
            &format!("/projects/{}/code/components", request.project_id),
            request,
        )
    }

    fn fetch_icons(&self, request: &IconsRequest) -> Result<Vec<BundleEntry>, RemoteError> {
        self.post(&format!("/projects/{}/code/icons", request.project_id), request)
    }

    fn fetch_style_config(&self) -> Result<StyleBundle, RemoteError> {
        self.get("/code/style-config")
    }
}
