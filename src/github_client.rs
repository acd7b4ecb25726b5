use crate::domain::redacted;
use crate::error::BridgeError;
use crate::schema::{GitHubErrorBody, Repository};
use reqwest::{Client, header::ACCEPT};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Clone)]
pub struct GitHubClient {
    http_client: Client,
    api_url: Url,
}

impl GitHubClient {
    pub fn new(http_client: Client, api_url: Url) -> Self {
        Self {
            http_client,
            api_url,
        }
    }

    /// Fetches `owner/name`, authenticating with the caller's token.
    ///
    /// A non-2xx answer keeps GitHub's status and message.
    #[instrument(skip(self, token))]
    pub async fn fetch_repository(
        &self,
        owner: &str,
        name: &str,
        token: &SecretString,
    ) -> Result<Repository, BridgeError> {
        let url = self.repository_url(owner, name)?;
        let shown_url = redacted(&url);
        debug!(url = %shown_url, "fetching repository");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| BridgeError::transport(&shown_url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::transport(&shown_url, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GitHubErrorBody>(&body)
                .map(|error| error.message)
                .unwrap_or(body);
            return Err(BridgeError::GitHub {
                status,
                message: format!("GET {shown_url}: {} {message}", status.as_u16()),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn repository_url(&self, owner: &str, name: &str) -> Result<Url, BridgeError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BridgeError::InvalidConfig(format!("{} cannot be a base URL", self.api_url))
            })?
            .pop_if_empty()
            .extend(["repos", owner, name]);
        Ok(url)
    }
}
