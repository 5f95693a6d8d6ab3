use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::tokens::TokenKeys;
use crate::error::ApiError;

/// Extracts and validates the session token, rejecting with 401 otherwise.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        match keys.verify_session(token) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(_) => {
                warn!("invalid or expired session token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Like `AuthUser`, but never rejects; the status endpoint reports both
/// outcomes itself.
pub struct MaybeAuthUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await.ok();
        Ok(MaybeAuthUser(user.map(|u| u.0)))
    }
}

/// Resolves the caller's address: first entry of `X-Forwarded-For` when
/// present, otherwise the direct peer address.
pub struct ClientIp(pub Option<String>);

pub(crate) fn forwarded_for_client(value: &str) -> Option<String> {
    value
        .split(',')
        .next()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(forwarded_for_client);
        if let Some(ip) = forwarded {
            return Ok(ClientIp(Some(ip)));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        Ok(ClientIp(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_the_first_entry() {
        assert_eq!(
            forwarded_for_client("203.0.113.7, 10.0.0.1, 10.0.0.2"),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn forwarded_for_trims_whitespace() {
        assert_eq!(
            forwarded_for_client("  203.0.113.7 "),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn empty_forwarded_for_is_none() {
        assert_eq!(forwarded_for_client(""), None);
        assert_eq!(forwarded_for_client(" , 10.0.0.1"), None);
    }
}
