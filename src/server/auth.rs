//! Bearer-token handling for the endpoints.
//!
//! Tokens are only checked for presence. Conversations are keyed by the
//! token's `sub` claim when it decodes as a JWT, so a refreshed token still
//! sees the same history; opaque tokens key by themselves.

use axum::Json;
use axum::extract::Request;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{DecodingKey, Validation, decode};
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::HandlerError;

/// Owner key for conversations created through a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

/// Used by `/api/chat` when no token is sent.
pub const ANONYMOUS_OWNER: &str = "anonymous";

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// The unverified `sub` claim of a JWT, if it has one.
fn subject(token: &str) -> Option<String> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    match decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Some(data.claims.sub),
        Err(e) => {
            debug!("Token is not a JWT with a subject: {}", e);
            None
        }
    }
}

pub fn owner_for(token: &str) -> Owner {
    Owner(subject(token).unwrap_or_else(|| token.to_string()))
}

/// Route layer that rejects requests without a bearer token and hands the
/// owner key to the handler as an extension.
pub async fn require_bearer(mut req: Request, next: Next) -> Result<Response, HandlerError> {
    let owner = bearer_token(req.headers())
        .map(owner_for)
        .ok_or(HandlerError::Unauthorized("Unauthorized"))?;
    debug!("Request from owner {}", owner.0);
    req.extensions_mut().insert(owner);
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub authenticated: bool,
    pub message: &'static str,
}

/// `GET /api/auth/verify`
pub async fn verify(headers: HeaderMap) -> Result<Json<VerifyResponse>, HandlerError> {
    bearer_token(&headers).ok_or(HandlerError::Unauthorized("No token provided"))?;
    Ok(Json(VerifyResponse {
        authenticated: true,
        message: "Token verification successful",
    }))
}
