//! Ordered request/response transforms applied around every API call.
//!
//! [`ApiClient`](crate::ApiClient) runs each middleware's
//! [`on_request`](Middleware::on_request) in chain order before dispatch,
//! then feeds the response through every
//! [`on_response`](Middleware::on_response) in the same order. Transport
//! failures are reported to [`on_error`](Middleware::on_error) instead.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};

use crate::auth::{SessionHandler, TokenStore};
use crate::error::ClientError;

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// One link of the request pipeline.
pub trait Middleware: Send + Sync {
    fn on_request(&self, _request: &mut Request) -> Result<(), ClientError> {
        Ok(())
    }

    fn on_response(&self, response: Response) -> Result<Response, ClientError> {
        Ok(response)
    }

    fn on_error(&self, _error: &reqwest::Error) {}
}

/// Injects the bearer token and handles session invalidation.
///
/// A `401` response clears the stored token and calls
/// [`SessionHandler::session_expired`] once; the response is then passed
/// on unchanged so the caller still sees the failure.
pub struct AuthMiddleware {
    tokens: Arc<dyn TokenStore>,
    session: Arc<dyn SessionHandler>,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<dyn TokenStore>, session: Arc<dyn SessionHandler>) -> Self {
        Self { tokens, session }
    }
}

impl Middleware for AuthMiddleware {
    fn on_request(&self, request: &mut Request) -> Result<(), ClientError> {
        match self.tokens.token() {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {token}"))?;
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            None => {
                request.headers_mut().remove(AUTHORIZATION);
            }
        }
        Ok(())
    }

    fn on_response(&self, response: Response) -> Result<Response, ClientError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "Session rejected by backend, clearing token");
            if let Err(e) = self.tokens.clear() {
                tracing::error!(error = %e, "Failed to clear stored token");
            }
            self.session.session_expired();
        }
        Ok(response)
    }
}

/// Tags each request with an `x-request-id` and traces the exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn on_request(&self, request: &mut Request) -> Result<(), ClientError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            request_id = %request_id,
            "API request",
        );
        let value = HeaderValue::from_str(&request_id)?;
        request
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        Ok(())
    }

    fn on_response(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            tracing::debug!(url = %response.url(), status = status.as_u16(), "API response");
        } else {
            tracing::warn!(url = %response.url(), status = status.as_u16(), "API error response");
        }
        Ok(response)
    }

    fn on_error(&self, error: &reqwest::Error) {
        tracing::error!(
            url = ?error.url().map(|u| u.as_str()),
            error = %error,
            "API request failed",
        );
    }
}
