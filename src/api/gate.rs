//! Shared-password access gate applied in front of every route.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use super::public::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";
pub const AUTH_COOKIE_VALUE: &str = "authenticated";

const PUBLIC_PATHS: &[&str] = &["/login", "/api/auth/verify"];

fn is_public(path: &str) -> bool {
    if PUBLIC_PATHS.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    // Static assets
    !path.starts_with("/api/")
        && path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

pub async fn require_auth(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let authenticated = jar
        .get(AUTH_COOKIE)
        .is_some_and(|cookie| cookie.value() == AUTH_COOKIE_VALUE);

    if authenticated || is_public(path) {
        return next.run(request).await;
    }

    if path.starts_with("/api/") {
        tracing::debug!("Rejecting unauthenticated request to {}", path);
        return ApiError::Unauthorized("unauthorized".to_string()).into_response();
    }
    Redirect::to("/login").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public("/login"));
        assert!(is_public("/api/auth/verify"));
        assert!(is_public("/assets/app.js"));
        assert!(is_public("/favicon.ico"));
        assert!(!is_public("/"));
        assert!(!is_public("/api/chat"));
        assert!(!is_public("/api/conversations/abc"));
        assert!(!is_public("/api/conversations/x.y"));
    }
}
