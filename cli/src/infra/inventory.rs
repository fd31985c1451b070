//! Inventory service client: implements `HostInventory`.

use anyhow::{Context, Result};
use nest_common::{Host, HostPatch, Hosts};
use tracing::warn;

use crate::application::ports::{HostInventory, HttpRequest, HttpResponse, HttpTransport, Method};
use crate::domain::error::{ApiError, RegistrationError};

const HOSTS_ENDPOINT: &str = "/hosts";
const CHECKIN_ENDPOINT: &str = "/hosts/checkin";
const CREATED: u16 = 201;

pub struct InventoryClient<T> {
    transport: T,
}

impl<T: HttpTransport> InventoryClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.send(request).map_err(ApiError::from)?;
        Ok(response)
    }
}

fn json_request(method: Method, endpoint: &str, body: &impl serde::Serialize) -> Result<HttpRequest> {
    let body = serde_json::to_vec(body).context("encoding request body")?;
    Ok(HttpRequest::new(method, endpoint)
        .header("Content-Type", "application/json")
        .body(body))
}

impl<T: HttpTransport> HostInventory for InventoryClient<T> {
    fn get_host(&self, machine_id: &str) -> Result<Option<Host>> {
        let request = HttpRequest::get(HOSTS_ENDPOINT).param("insights_id", machine_id);
        let response = self.send(&request)?;
        response
            .require_success(HOSTS_ENDPOINT)
            .map_err(ApiError::from)?;
        let hosts: Hosts = response.json(HOSTS_ENDPOINT).map_err(ApiError::from)?;
        if hosts.results.len() > 1 {
            warn!(
                machine_id,
                count = hosts.results.len(),
                "several hosts share this machine id, using the first"
            );
        }
        Ok(hosts.results.into_iter().next())
    }

    fn update_host(&self, id: &str, patch: &HostPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let endpoint = format!("{HOSTS_ENDPOINT}/{id}");
        let response = self.send(&json_request(Method::Patch, &endpoint, patch)?)?;
        response.require_success(&endpoint).map_err(ApiError::from)?;
        Ok(())
    }

    fn delete_host(&self, id: &str) -> Result<()> {
        let endpoint = format!("{HOSTS_ENDPOINT}/{id}");
        let response = self.send(&HttpRequest::new(Method::Delete, &endpoint))?;
        response.require_success(&endpoint).map_err(ApiError::from)?;
        Ok(())
    }

    fn checkin(&self, facts: &serde_json::Value) -> Result<Host> {
        let response = self.send(&json_request(Method::Post, CHECKIN_ENDPOINT, facts)?)?;
        if response.status != CREATED {
            return Err(RegistrationError::CheckinRejected {
                status: response.status,
            }
            .into());
        }
        Ok(response.json(CHECKIN_ENDPOINT).map_err(ApiError::from)?)
    }
}
