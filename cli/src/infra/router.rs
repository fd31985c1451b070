//! Module update router client: implements `ChannelRouter`.

use nest_common::Route;
use tracing::debug;

use crate::application::ports::{ChannelRouter, HttpRequest, HttpTransport};
use crate::domain::error::ApiError;

const CHANNEL_ENDPOINT: &str = "/channel";

/// Asks the router which channel serves a module.
pub struct RouterClient<T> {
    transport: T,
    canary: bool,
}

impl<T: HttpTransport> RouterClient<T> {
    /// With `canary` set, every lookup returns the canary route offline.
    pub fn new(transport: T, canary: bool) -> Self {
        Self { transport, canary }
    }
}

impl<T: HttpTransport> ChannelRouter for RouterClient<T> {
    fn resolve_route(&self, module: &str) -> Result<Route, ApiError> {
        if self.canary {
            debug!(module, "canary mode, skipping router");
            return Ok(Route::canary());
        }
        let request = HttpRequest::get(CHANNEL_ENDPOINT).param("module", module);
        let response = self.transport.send(&request)?;
        response.require_success(CHANNEL_ENDPOINT)?;
        Ok(response.json::<Route>(CHANNEL_ENDPOINT)?)
    }
}
