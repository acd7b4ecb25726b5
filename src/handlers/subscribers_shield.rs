use super::{AppState, respond};
use crate::api::{InboundRequest, OutboundResponse, ParamSource, RequestRequirements};
use crate::configuration::Bot;
use crate::domain::StreamName;
use crate::error::BridgeError;
use crate::schema::Shield;
use axum::http::{Method, StatusCode};
use tracing::instrument;

const REQUIREMENTS: RequestRequirements = RequestRequirements {
    method: Method::GET,
    bearer_header: None,
    source: ParamSource::Query,
    params: &["stream"],
};

/// Answers a shields.io endpoint badge showing how many users are in a stream.
#[instrument(name = "stream_subscribers_shield", skip_all)]
pub async fn stream_subscribers_shield(
    state: &AppState,
    request: &InboundRequest,
) -> OutboundResponse {
    respond(run(state, request).await)
}

async fn run(state: &AppState, request: &InboundRequest) -> Result<OutboundResponse, BridgeError> {
    let request = REQUIREMENTS.validate(request)?;
    let credentials = state.settings.zulip.resolve(Bot::General)?;

    let zulip = state.zulip(&credentials)?;
    let stream_id = zulip
        .get_stream_id(&StreamName::new(request.param("stream")))
        .await?;
    let subscribers = zulip.list_subscribers(stream_id).await?;

    Ok(OutboundResponse::json(
        StatusCode::OK,
        &Shield::stream_subscribers(subscribers.len()),
    )?)
}
