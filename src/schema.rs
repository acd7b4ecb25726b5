//! Request and response shapes exchanged with GitHub, Zulip and shields.io.

use serde::{Deserialize, Serialize};

/// The fields of GitHub's repository object the handlers use.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Repository {
    /// A missing description is an empty one.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// GitHub's error body, e.g. `{"message": "Not Found", "documentation_url": "..."}`.
#[derive(Debug, Deserialize)]
pub struct GitHubErrorBody {
    pub message: String,
}

/// `GET api/v1/get_stream_id`
#[derive(Debug, Deserialize)]
pub struct StreamIdResponse {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub result: String,
    pub stream_id: u64,
}

/// `GET api/v1/streams/<id>/members`
#[derive(Debug, Deserialize)]
pub struct StreamSubscribersResponse {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub result: String,
    pub subscribers: Vec<u64>,
}

/// One entry of the `subscriptions` parameter of `POST api/v1/users/me/subscriptions`.
#[derive(Debug, Serialize)]
pub struct Subscription<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

/// A shields.io endpoint badge. See <https://shields.io/endpoint>.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Shield {
    pub schema_version: u8,
    pub label: String,
    pub message: String,
    pub color: String,
    pub named_logo: String,
}

impl Shield {
    pub fn stream_subscribers(count: usize) -> Self {
        Self {
            schema_version: 1,
            label: "chat".to_string(),
            message: format!("{count} in stream"),
            // Renders a nicer shade than "green".
            color: "g".to_string(),
            named_logo: "zulip".to_string(),
        }
    }
}
