//! Ingress upload client: implements `UploadIngress` with a multipart body.

use std::path::Path;

use anyhow::{Context, Result};
use nest_common::UploadResponse;

use crate::application::ports::{HttpRequest, HttpTransport, Method, UploadIngress};
use crate::domain::error::ApiError;

const UPLOAD_ENDPOINT: &str = "/upload";

pub struct IngressClient<T> {
    transport: T,
}

impl<T: HttpTransport> IngressClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: HttpTransport> UploadIngress for IngressClient<T> {
    fn upload(
        &self,
        archive: &Path,
        content_type: &str,
        facts: &serde_json::Value,
    ) -> Result<UploadResponse> {
        let payload =
            std::fs::read(archive).with_context(|| format!("reading {}", archive.display()))?;
        let file_name = archive
            .file_name()
            .map_or_else(|| "archive".to_string(), |n| n.to_string_lossy().into_owned());
        let metadata = serde_json::to_vec(facts).context("encoding metadata")?;

        let mut form = MultipartForm::new(uuid::Uuid::new_v4().simple().to_string());
        form.part("file", Some(&file_name), content_type, &payload);
        form.part("metadata", None, "application/json", &metadata);

        let request = HttpRequest::new(Method::Post, UPLOAD_ENDPOINT)
            .header("Content-Type", &form.content_type())
            .body(form.finish());
        let response = self.transport.send(&request).map_err(ApiError::from)?;
        response
            .require_success(UPLOAD_ENDPOINT)
            .map_err(ApiError::from)?;
        Ok(response.json(UPLOAD_ENDPOINT).map_err(ApiError::from)?)
    }
}

// ── Multipart encoding ────────────────────────────────────────────────────────

/// Minimal `multipart/form-data` encoder.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    #[must_use]
    pub fn new(boundary: String) -> Self {
        Self {
            boundary,
            body: Vec::new(),
        }
    }

    pub fn part(&mut self, name: &str, file_name: Option<&str>, content_type: &str, data: &[u8]) {
        let name = escape_quoted(name);
        let disposition = match file_name {
            Some(file) => format!(
                "form-data; name=\"{name}\"; filename=\"{}\"",
                escape_quoted(file)
            ),
            None => format!("form-data; name=\"{name}\""),
        };
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: {disposition}\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// Percent-encode the bytes that would end a quoted header parameter,
/// as browsers do for form-data names (WHATWG HTML, multipart encoding).
fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            other => out.push(other),
        }
    }
    out
}
