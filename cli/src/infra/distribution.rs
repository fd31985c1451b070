//! Artifact distribution client: implements `ArtifactDownloader`.

use nest_common::Route;

use crate::application::ports::{ArtifactDownloader, HttpRequest, HttpResponse, HttpTransport};
use crate::domain::artifact::{ArtifactFetch, Download, SIGNATURE_SUFFIX};
use crate::domain::error::{ApiError, ProtocolError};

const NOT_MODIFIED: u16 = 304;

/// Downloads one named artifact and its detached signature.
pub struct DistributionClient<T> {
    transport: T,
    remote_name: String,
}

impl<T: HttpTransport> DistributionClient<T> {
    pub fn new(transport: T, remote_name: impl Into<String>) -> Self {
        Self {
            transport,
            remote_name: remote_name.into(),
        }
    }

    fn artifact_endpoint(&self, route: &Route) -> String {
        format!("/static{}/{}", route.url, self.remote_name)
    }

    fn signature_endpoint(&self, route: &Route) -> String {
        format!("{}{SIGNATURE_SUFFIX}", self.artifact_endpoint(route))
    }
}

impl<T: HttpTransport> ArtifactDownloader for DistributionClient<T> {
    fn fetch_artifact(&self, route: &Route, token: Option<&str>) -> Result<ArtifactFetch, ApiError> {
        let endpoint = self.artifact_endpoint(route);
        let mut request = HttpRequest::get(&endpoint);
        if let Some(token) = token {
            request = request.header("If-None-Match", token);
        }
        let response = self.transport.send(&request)?;
        if response.status == NOT_MODIFIED {
            return Ok(ArtifactFetch::NotModified);
        }
        Ok(ArtifactFetch::Fetched(into_download(response, &endpoint)?))
    }

    fn fetch_signature(&self, route: &Route) -> Result<Download, ApiError> {
        let endpoint = self.signature_endpoint(route);
        let response = self.transport.send(&HttpRequest::get(&endpoint))?;
        Ok(into_download(response, &endpoint)?)
    }
}

fn into_download(response: HttpResponse, endpoint: &str) -> Result<Download, ProtocolError> {
    response.require_success(endpoint)?;
    let token = response
        .header("etag")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    Ok(Download {
        body: response.body,
        token,
    })
}
