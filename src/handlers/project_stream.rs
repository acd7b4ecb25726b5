use super::{AppState, respond};
use crate::api::{AUTHORIZATION, InboundRequest, OutboundResponse, ParamSource, RequestRequirements};
use crate::configuration::Bot;
use crate::domain::StreamName;
use crate::error::BridgeError;
use crate::zulip_client::SubscriptionPolicy;
use axum::http::Method;
use tracing::instrument;

const CREATE_OR_UPDATE: RequestRequirements = RequestRequirements {
    method: Method::POST,
    bearer_header: Some(AUTHORIZATION),
    source: ParamSource::Body,
    params: &["repository name"],
};

const TOUCH: RequestRequirements = RequestRequirements {
    method: Method::POST,
    bearer_header: Some(AUTHORIZATION),
    source: ParamSource::Form,
    params: &["repository"],
};

/// Ensures `project/<repository>` exists and carries the repository's description.
#[instrument(name = "create_or_update_project_stream", skip_all)]
pub async fn create_or_update_project_stream(
    state: &AppState,
    request: &InboundRequest,
) -> OutboundResponse {
    respond(create_or_update(state, request).await)
}

async fn create_or_update(
    state: &AppState,
    request: &InboundRequest,
) -> Result<OutboundResponse, BridgeError> {
    let request = CREATE_OR_UPDATE.validate(request)?;
    let credentials = state.settings.zulip.resolve(Bot::ProjectStream)?;
    let zulip = state.zulip(&credentials)?;

    let repository = state
        .github
        .fetch_repository(
            &state.settings.github.owner,
            request.param("repository name"),
            request.bearer_token()?,
        )
        .await?;

    let project_streams = &state.settings.project_streams;
    let stream = StreamName::for_project(&repository.name);
    zulip
        .create_or_update_subscription(
            &stream,
            repository.description(),
            &project_streams.maintainer_ids,
            SubscriptionPolicy {
                web_public: project_streams.web_public,
            },
        )
        .await?;
    // Subscribing never rewrites an existing stream's description.
    let stream_id = zulip.get_stream_id(&stream).await?;
    zulip
        .update_stream_description(stream_id, repository.description())
        .await?;

    Ok(OutboundResponse::ok(
        "Created stream or updated stream description.",
    ))
}

/// Subscribes to `project/<repository>`, creating it if it does not exist yet.
#[instrument(name = "touch_project_stream", skip_all)]
pub async fn touch_project_stream(state: &AppState, request: &InboundRequest) -> OutboundResponse {
    respond(touch(state, request).await)
}

async fn touch(state: &AppState, request: &InboundRequest) -> Result<OutboundResponse, BridgeError> {
    let request = TOUCH.validate(request)?;
    let credentials = state.settings.zulip.resolve(Bot::General)?;
    let zulip = state.zulip(&credentials)?;

    let repository = state
        .github
        .fetch_repository(
            &state.settings.github.owner,
            request.param("repository"),
            request.bearer_token()?,
        )
        .await?;

    let project_streams = &state.settings.project_streams;
    let stream = StreamName::for_project(&repository.name);
    let policy = SubscriptionPolicy {
        web_public: project_streams.web_public,
    };
    let body = if project_streams.lenient_touch {
        zulip
            .create_or_update_subscription_unchecked(
                &stream,
                repository.description(),
                &project_streams.maintainer_ids,
                policy,
            )
            .await?
    } else {
        zulip
            .create_or_update_subscription(
                &stream,
                repository.description(),
                &project_streams.maintainer_ids,
                policy,
            )
            .await?
    };

    Ok(OutboundResponse::ok(format!("Response from Zulip:\n\n{body}")))
}
