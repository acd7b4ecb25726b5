use crate::api::InboundRequest;
use crate::configuration::Settings;
use crate::github_client::GitHubClient;
use crate::handlers::{
    AppState, announce_tag, create_or_update_project_stream, stream_subscribers_shield,
    touch_project_stream,
};
use axum::{
    Router,
    extract::State,
    http::HeaderValue,
    response::IntoResponse,
    routing::{any, get},
};
use reqwest::{
    Client, Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct Application {
    pub port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, std::io::Error> {
        let github_http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(configuration.github.timeout())
            .build()
            .map_err(std::io::Error::other)?;
        let zulip_http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(configuration.zulip.timeout())
            .build()
            .map_err(std::io::Error::other)?;
        let github_api_url = Url::parse(&configuration.github.api_url).map_err(|e| {
            std::io::Error::other(format!(
                "Invalid GitHub API URL '{}': {e}",
                configuration.github.api_url
            ))
        })?;

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();

        let state = AppState {
            settings: Arc::new(configuration),
            github: GitHubClient::new(github_http_client, github_api_url),
            zulip_http_client,
        };
        let router = Self::app(state)?;

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn app(state: AppState) -> Result<Router, std::io::Error> {
        let allowed_origins: Vec<HeaderValue> = state
            .settings
            .cors
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| {
                    std::io::Error::other(format!("Invalid CORS origin '{origin}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors = CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
            .allow_credentials(true);

        Ok(Router::new()
            .route("/health", get(health_check))
            .route("/announce_tag", any(announce_tag_handler))
            .route(
                "/create_or_update_project_stream",
                any(create_or_update_project_stream_handler),
            )
            .route(
                "/stream_subscribers_shield",
                any(stream_subscribers_shield_handler),
            )
            .route("/touch_project_stream", any(touch_project_stream_handler))
            .with_state(state)
            .layer(cors))
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        info!(port = self.port, "Listening");
        axum::serve(self.listener, self.router).await
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn announce_tag_handler(
    State(state): State<AppState>,
    request: InboundRequest,
) -> impl IntoResponse {
    announce_tag(&state, &request).await
}

async fn create_or_update_project_stream_handler(
    State(state): State<AppState>,
    request: InboundRequest,
) -> impl IntoResponse {
    create_or_update_project_stream(&state, &request).await
}

async fn stream_subscribers_shield_handler(
    State(state): State<AppState>,
    request: InboundRequest,
) -> impl IntoResponse {
    stream_subscribers_shield(&state, &request).await
}

async fn touch_project_stream_handler(
    State(state): State<AppState>,
    request: InboundRequest,
) -> impl IntoResponse {
    touch_project_stream(&state, &request).await
}
