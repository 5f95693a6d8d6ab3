use axum::{
    extract::{FromRef, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::auth::{
    dto::{
        AvailabilityParams, AvailabilityResponse, LoginRequest, LoginResponse, RegisterParams,
        RegisterRequest, UserProjection,
    },
    extractors::{AuthUser, ClientIp, MaybeAuthUser},
    service,
    tokens::TokenKeys,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/status", get(auth_status))
        .route("/auth/register", get(register_confirmation).post(register))
        .route("/auth/login", post(login))
        .route("/auth/availability", get(availability))
        .route("/auth/profile", get(profile))
}

pub async fn auth_status(MaybeAuthUser(user_id): MaybeAuthUser) -> Result<Json<Value>, ApiError> {
    match user_id {
        Some(_) => Ok(Json(json!({ "detail": "User is logged in" }))),
        None => Err(ApiError::Unauthorized),
    }
}

/// GET /auth/register serves two steps of the flow: `send_confirmation`
/// issues and emails a token, `confirmation_token` checks one.
#[instrument(skip(state))]
pub async fn register_confirmation(
    State(state): State<AppState>,
    Query(params): Query<RegisterParams>,
) -> Result<Json<Value>, ApiError> {
    let keys = TokenKeys::from_ref(&state);

    if let Some(email) = params.send_confirmation.as_deref().filter(|v| !v.is_empty()) {
        service::issue_confirmation(&keys, state.mailer.as_ref(), &state.config.frontend, email)
            .await?;
        Ok(Json(json!({ "detail": "Email has been sent" })))
    } else if let Some(token) = params
        .confirmation_token
        .as_deref()
        .filter(|v| !v.is_empty())
    {
        let email = service::verify_confirmation(&keys, token)?;
        Ok(Json(json!({
            "detail": "The confirmation link is valid",
            "data": { "email": email }
        })))
    } else {
        Err(ApiError::MissingInformation)
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Query(params): Query<RegisterParams>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = params
        .confirmation_token
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingToken)?;

    let keys = TokenKeys::from_ref(&state);
    service::complete_registration(state.users.as_ref(), &keys, token, payload).await?;
    Ok(Json(json!({ "detail": "Account created successfully" })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = service::authenticate(state.users.as_ref(), &payload, ip).await?;

    let keys = TokenKeys::from_ref(&state);
    let token = keys.sign_session(user.id)?;
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let available = service::check_availability(
        state.users.as_ref(),
        params.username.as_deref(),
        params.email.as_deref(),
    )
    .await?;
    Ok(Json(AvailabilityResponse { available }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProjection>, ApiError> {
    let user = service::get_profile(state.users.as_ref(), user_id).await?;
    Ok(Json(user.into()))
}
