//! One pipeline per endpoint: validate, resolve config, authenticate, orchestrate, respond.
//!
//! Each step returns `Result`, so the first failure ends the invocation with
//! its own response and nothing after it runs.

mod announce_tag;
mod project_stream;
mod subscribers_shield;

pub use announce_tag::*;
pub use project_stream::*;
pub use subscribers_shield::*;

use crate::api::OutboundResponse;
use crate::configuration::{Settings, ZulipCredentials};
use crate::error::BridgeError;
use crate::github_client::GitHubClient;
use crate::zulip_client::ZulipClient;
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

/// What every invocation shares. Nothing in here is mutated by a handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub github: GitHubClient,
    pub zulip_http_client: Client,
}

impl AppState {
    fn zulip(&self, credentials: &ZulipCredentials) -> Result<ZulipClient, BridgeError> {
        ZulipClient::new(self.zulip_http_client.clone(), credentials)
    }
}

/// Turns a finished pipeline into the invocation's only response.
fn respond(outcome: Result<OutboundResponse, BridgeError>) -> OutboundResponse {
    match outcome {
        Ok(response) => {
            info!(status = %response.status, "invocation succeeded");
            response
        }
        Err(error) => {
            let status = error.status();
            warn!(%status, %error, "invocation failed");
            error.into()
        }
    }
}
