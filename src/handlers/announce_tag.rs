use super::{AppState, respond};
use crate::api::{AUTHORIZATION, InboundRequest, OutboundResponse, ParamSource, RequestRequirements};
use crate::configuration::{Bot, GitHubSettings};
use crate::domain::StreamName;
use crate::error::BridgeError;
use axum::http::Method;
use tracing::instrument;

const REQUIREMENTS: RequestRequirements = RequestRequirements {
    method: Method::POST,
    bearer_header: Some(AUTHORIZATION),
    source: ParamSource::Query,
    params: &["project", "tag"],
};

const TOPIC: &str = "tag announcements";

/// Posts a link to a freshly pushed tag into the project's stream.
#[instrument(name = "announce_tag", skip_all)]
pub async fn announce_tag(state: &AppState, request: &InboundRequest) -> OutboundResponse {
    respond(run(state, request).await)
}

async fn run(state: &AppState, request: &InboundRequest) -> Result<OutboundResponse, BridgeError> {
    let request = REQUIREMENTS.validate(request)?;
    let credentials = state.settings.zulip.resolve(Bot::TagAnnouncement)?;
    let zulip = state.zulip(&credentials)?;

    let github = &state.settings.github;
    let repository = state
        .github
        .fetch_repository(&github.owner, request.param("project"), request.bearer_token()?)
        .await?;

    let stream_id = zulip
        .get_stream_id(&StreamName::for_project(&repository.name))
        .await?;
    let content = announcement(github, &repository.name, request.param("tag"));
    zulip.post_message(stream_id, TOPIC, &content).await?;

    Ok(OutboundResponse::ok("Announced tag."))
}

fn announcement(github: &GitHubSettings, repository: &str, tag: &str) -> String {
    format!(
        "Tag pushed: [{tag}]({}/{}/{repository}/releases/tag/{tag})",
        github.web_url.trim_end_matches('/'),
        github.owner,
    )
}
