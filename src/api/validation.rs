use super::InboundRequest;
use crate::error::BridgeError;
use axum::http::Method;
use secrecy::SecretString;
use std::collections::HashMap;

/// The header carrying the caller's GitHub token.
pub const AUTHORIZATION: &str = "authorization";

/// Where a variant reads its required parameters from. A variant reads from exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Query,
    Form,
    /// The whole request body is the single parameter.
    Body,
}

/// What a variant requires of an inbound request before it touches the network.
#[derive(Debug, Clone)]
pub struct RequestRequirements {
    pub method: Method,
    pub bearer_header: Option<&'static str>,
    pub source: ParamSource,
    pub params: &'static [&'static str],
}

/// The values extracted from a request that passed validation.
#[derive(Debug)]
pub struct ValidatedRequest {
    bearer_token: Option<SecretString>,
    params: HashMap<&'static str, String>,
}

impl ValidatedRequest {
    pub fn bearer_token(&self) -> Result<&SecretString, BridgeError> {
        self.bearer_token
            .as_ref()
            .ok_or_else(|| header_missing(AUTHORIZATION))
    }

    /// Returns a required parameter. Only names listed in the requirements are present.
    pub fn param(&self, name: &str) -> &str {
        let value = self.params.get(name).map(String::as_str);
        debug_assert!(value.is_some(), "`{name}` is not a required parameter");
        value.unwrap_or_default()
    }
}

impl RequestRequirements {
    /// Checks method, header, body and parameters, in that order.
    ///
    /// Empty values count as missing. The first failure wins. A body that could
    /// not be read only matters to variants that read the body.
    pub fn validate(&self, request: &InboundRequest) -> Result<ValidatedRequest, BridgeError> {
        if request.method != self.method {
            return Err(BridgeError::MethodNotAllowed(self.method.clone()));
        }

        let bearer_token = match self.bearer_header {
            Some(name) => {
                let value = request
                    .headers
                    .get(name)
                    .map(String::as_str)
                    .map(strip_scheme)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| header_missing(name))?;
                Some(SecretString::from(value.to_string()))
            }
            None => None,
        };

        if matches!(self.source, ParamSource::Body | ParamSource::Form)
            && let Some(rejection) = &request.body_error
        {
            return Err(BridgeError::UnreadableBody {
                status: rejection.status,
                message: rejection.message.clone(),
            });
        }

        let mut params = HashMap::new();
        for &name in self.params {
            let value = match self.source {
                ParamSource::Query => request.query.get(name).map(String::as_str),
                ParamSource::Form => request.form.get(name).map(|value| value.trim()),
                ParamSource::Body => Some(request.body.trim()),
            };
            match value {
                Some(value) if !value.is_empty() => {
                    params.insert(name, value.to_string());
                }
                _ => return Err(BridgeError::BadRequest(self.missing_message(name))),
            }
        }

        Ok(ValidatedRequest {
            bearer_token,
            params,
        })
    }

    fn missing_message(&self, name: &str) -> String {
        match self.source {
            ParamSource::Query => format!("Query string parameter `{name}` missing or empty."),
            ParamSource::Form => format!("Form field `{name}` missing or empty."),
            ParamSource::Body => format!("Empty request body/{name}."),
        }
    }
}

fn header_missing(name: &str) -> BridgeError {
    BridgeError::BadRequest(format!("`{}` header missing.", capitalize(name)))
}

/// Accepts both a raw token and the `Bearer <token>` / `token <token>` forms.
fn strip_scheme(value: &str) -> &str {
    let value = value.trim();
    for scheme in ["bearer ", "token "] {
        if let Some(prefix) = value.get(..scheme.len())
            && prefix.eq_ignore_ascii_case(scheme)
            && value.len() > scheme.len()
        {
            return value[scheme.len()..].trim_start();
        }
    }
    value
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
