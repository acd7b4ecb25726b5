mod validation;

pub use validation::*;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// An invocation as the handlers see it, detached from the HTTP server.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Header names as received; axum lowercases them.
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    pub body: String,
    /// Why the body could not be read, if it could not. Only variants that read
    /// the body report it.
    pub body_error: Option<BodyRejection>,
}

/// A body that could not be read as text or as a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRejection {
    pub status: StatusCode,
    pub message: String,
}

impl InboundRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HashMap::new(),
            query: HashMap::new(),
            form: HashMap::new(),
            body: String::new(),
            body_error: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_form_field(mut self, name: &str, value: &str) -> Self {
        self.form.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// The single answer an invocation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub body: String,
    pub content_type: &'static str,
}

impl OutboundResponse {
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: TEXT_PLAIN,
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::text(StatusCode::OK, body)
    }

    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status,
            body: serde_json::to_string(value)?,
            content_type: APPLICATION_JSON,
        })
    }
}

impl IntoResponse for OutboundResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(CONTENT_TYPE, HeaderValue::from_static(self.content_type))],
            self.body,
        )
            .into_response()
    }
}

impl<S> FromRequest<S> for InboundRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let headers = req
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect::<HashMap<_, _>>();
        let query = req
            .uri()
            .query()
            .map(parse_urlencoded)
            .unwrap_or_default();
        let content_type = headers
            .get(CONTENT_TYPE.as_str())
            .cloned()
            .unwrap_or_default();

        let mut inbound = InboundRequest {
            method,
            headers,
            query,
            ..InboundRequest::new(Method::GET)
        };

        // Body failures are kept for validation, which checks the method first.
        if content_type.starts_with("multipart/form-data") {
            match read_multipart(req, state).await {
                Ok(form) => inbound.form = form,
                Err(rejection) => inbound.body_error = Some(rejection),
            }
            return Ok(inbound);
        }

        match String::from_request(req, state).await {
            Ok(body) => inbound.body = body,
            Err(e) => {
                inbound.body_error = Some(BodyRejection {
                    status: e.status(),
                    message: e.body_text(),
                });
                return Ok(inbound);
            }
        }
        if content_type.starts_with("application/x-www-form-urlencoded") {
            inbound.form = parse_urlencoded(&inbound.body);
        }
        Ok(inbound)
    }
}

async fn read_multipart<S>(
    req: Request,
    state: &S,
) -> Result<HashMap<String, String>, BodyRejection>
where
    S: Send + Sync,
{
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| BodyRejection {
            status: e.status(),
            message: e.body_text(),
        })?;

    let mut form = HashMap::new();
    loop {
        let field = multipart.next_field().await.map_err(|e| BodyRejection {
            status: e.status(),
            message: e.body_text(),
        })?;
        let Some(field) = field else {
            return Ok(form);
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(|e| BodyRejection {
            status: e.status(),
            message: e.body_text(),
        })?;
        form.insert(name, value);
    }
}

fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect()
}
