use crate::configuration::ZulipCredentials;
use crate::domain::{StreamName, redacted};
use crate::error::BridgeError;
use crate::schema::{StreamIdResponse, StreamSubscribersResponse, Subscription};
use reqwest::{Client, Method};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};
use url::Url;

/// Policy flags sent with every subscription request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionPolicy {
    pub web_public: bool,
}

/// A chat-service client authenticated as one bot.
///
/// The bot's credentials live in the user-info of the base URL, so every
/// request carries them as basic auth.
pub struct ZulipClient {
    http_client: Client,
    base_url: Url,
}

impl ZulipClient {
    pub fn new(http_client: Client, credentials: &ZulipCredentials) -> Result<Self, BridgeError> {
        let mut base_url = credentials.base_url.clone();
        base_url
            .set_username(credentials.email.as_str())
            .and_then(|_| base_url.set_password(Some(credentials.api_key.expose_secret())))
            .map_err(|_| {
                BridgeError::InvalidConfig(format!(
                    "cannot authenticate against {}",
                    redacted(&credentials.base_url)
                ))
            })?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Looks up the numeric id of `stream`.
    #[instrument(skip(self))]
    pub async fn get_stream_id(&self, stream: &StreamName) -> Result<u64, BridgeError> {
        let url = self.endpoint("api/v1/get_stream_id", &[("stream", stream.as_str())]);
        let body = self.call(Method::GET, url).await?;
        let response: StreamIdResponse = serde_json::from_str(&body)?;
        Ok(response.stream_id)
    }

    /// Subscribes the bot and `principals` to `stream`, creating it if needed.
    ///
    /// Zulip treats an existing stream as an update, so repeating this is safe.
    /// Returns the raw response body.
    #[instrument(skip(self, description))]
    pub async fn create_or_update_subscription(
        &self,
        stream: &StreamName,
        description: &str,
        principals: &[u64],
        policy: SubscriptionPolicy,
    ) -> Result<String, BridgeError> {
        let url = self.subscription_url(stream, description, principals, policy)?;
        self.call(Method::POST, url).await
    }

    /// Like [`Self::create_or_update_subscription`], but any HTTP answer counts as success.
    #[instrument(skip(self, description))]
    pub async fn create_or_update_subscription_unchecked(
        &self,
        stream: &StreamName,
        description: &str,
        principals: &[u64],
        policy: SubscriptionPolicy,
    ) -> Result<String, BridgeError> {
        let url = self.subscription_url(stream, description, principals, policy)?;
        let (status, body) = self.send(Method::POST, &url).await?;
        if !status.is_success() {
            warn!(%status, "ignoring failed subscription update");
        }
        Ok(body)
    }

    #[instrument(skip(self, description))]
    pub async fn update_stream_description(
        &self,
        stream_id: u64,
        description: &str,
    ) -> Result<(), BridgeError> {
        let description = serde_json::to_string(description)?;
        let url = self.endpoint(
            &format!("api/v1/streams/{stream_id}"),
            &[("description", description.as_str())],
        );
        self.call(Method::PATCH, url).await?;
        Ok(())
    }

    #[instrument(skip(self, content))]
    pub async fn post_message(
        &self,
        stream_id: u64,
        topic: &str,
        content: &str,
    ) -> Result<(), BridgeError> {
        let to = serde_json::to_string(&[stream_id])?;
        let url = self.endpoint(
            "api/v1/messages",
            &[
                ("type", "stream"),
                ("to", to.as_str()),
                ("topic", topic),
                ("content", content),
            ],
        );
        self.call(Method::POST, url).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_subscribers(&self, stream_id: u64) -> Result<Vec<u64>, BridgeError> {
        let url = self.endpoint(&format!("api/v1/streams/{stream_id}/members"), &[]);
        let body = self.call(Method::GET, url).await?;
        let response: StreamSubscribersResponse = serde_json::from_str(&body)?;
        Ok(response.subscribers)
    }

    fn subscription_url(
        &self,
        stream: &StreamName,
        description: &str,
        principals: &[u64],
        policy: SubscriptionPolicy,
    ) -> Result<Url, BridgeError> {
        let subscriptions = serde_json::to_string(&[Subscription {
            name: stream.as_str(),
            description,
        }])?;
        let principals = serde_json::to_string(principals)?;
        let message_retention_days = serde_json::to_string("realm_default")?;

        let mut query = vec![
            ("subscriptions", subscriptions.as_str()),
            ("principals", principals.as_str()),
            ("authorization_errors_fatal", "true"),
            ("announce", "true"),
            ("history_public_to_subscribers", "true"),
            // Any member may post.
            ("stream_post_policy", "1"),
            ("message_retention_days", message_retention_days.as_str()),
        ];
        if policy.web_public {
            query.push(("is_web_public", "true"));
        }
        Ok(self.endpoint("api/v1/users/me/subscriptions", &query))
    }

    /// Replaces the base URL's path and query.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(None);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Sends the request and insists on a 2xx answer.
    async fn call(&self, method: Method, url: Url) -> Result<String, BridgeError> {
        let (status, body) = self.send(method, &url).await?;
        if !status.is_success() {
            return Err(BridgeError::Zulip {
                status,
                url: redacted(&url),
                body,
            });
        }
        Ok(body)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
    ) -> Result<(reqwest::StatusCode, String), BridgeError> {
        let shown_url = redacted(url);
        debug!(%method, url = %shown_url, "calling Zulip");

        let response = self
            .http_client
            .request(method, url.clone())
            .send()
            .await
            .map_err(|e| BridgeError::transport(&shown_url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::transport(&shown_url, e))?;
        Ok((status, body))
    }
}
