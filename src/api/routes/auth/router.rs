//! Router for the auth API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use super::public;
use crate::api::gate::{AUTH_COOKIE, AUTH_COOKIE_VALUE};
use crate::api::public::{ApiError, SuccessResponse};
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

/// Check the shared password and hand out a session cookie valid for
/// seven days
async fn verify(
    State(state): State<SharedState>,
    jar: CookieJar,
    payload: Result<Json<public::VerifyRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<SuccessResponse>), ApiError> {
    let Json(payload) = payload.map_err(ApiError::from)?;

    if payload.password != state.config.app_password {
        return Err(ApiError::Unauthorized("invalid password".to_string()));
    }

    let cookie = Cookie::build((AUTH_COOKIE, AUTH_COOKIE_VALUE))
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(7));

    Ok((jar.add(cookie), Json(SuccessResponse::ok())))
}

/// Create the auth router
pub fn router() -> Router<SharedState> {
    Router::new().route("/verify", post(verify))
}
