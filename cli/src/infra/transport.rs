//! Mutual-TLS HTTP transport over `ureq` + `rustls`.
//!
//! One `MtlsTransport` is bound to one (host, port, path-prefix). It returns
//! every HTTP response as data; only failures below HTTP are errors.

use std::cell::OnceCell;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tracing::debug;

use crate::application::ports::{HttpRequest, HttpResponse, HttpTransport};
use crate::domain::config::NestConfig;
use crate::domain::error::TransportError;

/// Module update router.
pub const ROUTER_PREFIX: &str = "/api/module-update-router/v1";
/// Artifact distribution.
pub const DISTRIBUTION_PREFIX: &str = "/api/v1";
pub const INVENTORY_PREFIX: &str = "/api/inventory/v1";
pub const INGRESS_PREFIX: &str = "/api/ingress/v1";

/// Larger response bodies are rejected.
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// HTTPS client authenticated with the host identity.
pub struct MtlsTransport {
    agent: ureq::Agent,
    base_url: String,
    echo_responses: bool,
}

impl MtlsTransport {
    /// Build a transport for `prefix` on the configured API host.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the identity, trust bundle or proxy
    /// setting cannot be loaded.
    pub fn new(config: &NestConfig, prefix: &str) -> Result<Self, TransportError> {
        let tls = load_tls_config(
            &config.network.ca_certificates,
            &config.network.identity_certificate(),
            &config.network.identity_key(),
        )?;
        let mut builder = ureq::AgentBuilder::new()
            .tls_config(Arc::new(tls))
            .timeout(config.network.timeout());
        if let Some(proxy) = &config.network.proxy {
            let proxy = ureq::Proxy::new(proxy).map_err(|e| TransportError::Proxy {
                proxy: proxy.clone(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }
        Ok(Self {
            agent: builder.build(),
            base_url: base_url(&config.api.host, config.api.port, prefix),
            echo_responses: false,
        })
    }

    /// Echo every response to stderr (diagnostics only).
    #[must_use]
    pub fn with_response_echo(mut self, enabled: bool) -> Self {
        self.echo_responses = enabled;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn echo(&self, url: &str, response: &HttpResponse) {
        if !self.echo_responses {
            return;
        }
        eprintln!("{url} -> {}", response.status);
        for (name, value) in &response.headers {
            eprintln!("  {name}: {value}");
        }
        eprintln!("{}", String::from_utf8_lossy(&response.body));
    }
}

impl HttpTransport for MtlsTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.endpoint);
        let mut call = self.agent.request(request.method.as_str(), &url);
        for (key, value) in &request.params {
            call = call.query(key, value);
        }
        for (key, value) in &request.headers {
            call = call.set(key, value);
        }

        let started = Instant::now();
        let result = match &request.body {
            Some(body) => call.send_bytes(body),
            None => call.call(),
        };
        let response = match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(TransportError::Request {
                    url,
                    kind: transport.kind().to_string(),
                    reason: transport.to_string(),
                });
            }
        };

        let response = read_response(&url, response)?;
        debug!(
            method = request.method.as_str(),
            url = %url,
            status = response.status,
            bytes = response.body.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "http request"
        );
        self.echo(&url, &response);
        Ok(response)
    }
}

/// `MtlsTransport` built on the first request.
///
/// Commands that end before touching the network never load TLS material;
/// loading failures surface from `send` like any other transport error.
pub struct LazyTransport<'a> {
    config: &'a NestConfig,
    prefix: &'static str,
    echo_responses: bool,
    inner: OnceCell<MtlsTransport>,
}

impl<'a> LazyTransport<'a> {
    #[must_use]
    pub fn new(config: &'a NestConfig, prefix: &'static str) -> Self {
        Self {
            config,
            prefix,
            echo_responses: false,
            inner: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_response_echo(mut self, enabled: bool) -> Self {
        self.echo_responses = enabled;
        self
    }

    fn get(&self) -> Result<&MtlsTransport, TransportError> {
        if let Some(transport) = self.inner.get() {
            return Ok(transport);
        }
        let transport =
            MtlsTransport::new(self.config, self.prefix)?.with_response_echo(self.echo_responses);
        Ok(self.inner.get_or_init(|| transport))
    }
}

impl HttpTransport for LazyTransport<'_> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.get()?.send(request)
    }
}

fn read_response(url: &str, response: ureq::Response) -> Result<HttpResponse, TransportError> {
    let status = response.status();
    let headers = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_string();
            Some((name, value))
        })
        .collect();
    let body = read_body(url, response.into_reader(), MAX_BODY_BYTES)?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

/// Read at most `limit` bytes. One byte more is an error, never a truncation.
fn read_body(url: &str, reader: impl Read, limit: u64) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| TransportError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    if u64::try_from(body.len()).unwrap_or(u64::MAX) > limit {
        return Err(TransportError::Body {
            url: url.to_string(),
            reason: format!("response exceeds {limit} bytes"),
        });
    }
    Ok(body)
}

#[must_use]
pub fn base_url(host: &str, port: u16, prefix: &str) -> String {
    format!("https://{host}:{port}{prefix}")
}

// ── TLS material ──────────────────────────────────────────────────────────────

/// Build a client config trusting only `ca_path` and presenting the host
/// identity. Hostname and peer verification stay on.
///
/// # Errors
///
/// Returns `TransportError::TlsMaterial` naming the file that failed to load.
pub fn load_tls_config(
    ca_path: &Path,
    cert_path: &Path,
    key_path: &Path,
) -> Result<rustls::ClientConfig, TransportError> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in load_certs(ca_path)? {
        roots
            .add(cert)
            .map_err(|e| material(ca_path, &e.to_string()))?;
    }

    let client_certs = load_certs(cert_path)?;
    let client_key = load_key(key_path)?;

    rustls::ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::TlsConfig(e.to_string()))?
        .with_root_certificates(roots)
        .with_client_auth_cert(client_certs, client_key)
        .map_err(|e| TransportError::TlsConfig(e.to_string()))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| material(path, &e.to_string()))?;
    if certs.is_empty() {
        return Err(material(path, "no certificates found"));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, TransportError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| material(path, &e.to_string()))?
        .ok_or_else(|| material(path, "no private key found"))
}

fn open(path: &Path) -> Result<BufReader<File>, TransportError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| material(path, &e.to_string()))
}

fn material(path: &Path, reason: &str) -> TransportError {
    TransportError::TlsMaterial {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
