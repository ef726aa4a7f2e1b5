//! Route guard middleware for the protected chat surface.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};

/// Gate a request on the current identity.
///
/// Unauthenticated requests are redirected to `/login` with the requested
/// path and query carried in `from` for a later redirect-back. While the startup
/// restore is still pending, an indeterminate loading page is served
/// instead of a premature redirect.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.auth.is_restoring() {
        return (StatusCode::SERVICE_UNAVAILABLE, Html(LOADING_PAGE)).into_response();
    }

    if state.auth.current_user().is_none() {
        let uri = request.uri();
        let from = uri
            .path_and_query()
            .map_or(uri.path(), |pq| pq.as_str())
            .to_string();
        tracing::debug!(
            name: "auth.guard.redirect",
            from = %from,
            "Unauthenticated request redirected to login"
        );
        return Redirect::to(&format!("/login?from={from}")).into_response();
    }

    next.run(request).await
}

const LOADING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta http-equiv="refresh" content="1">
    <title>Loading - Gadget Chat</title>
</head>
<body>
    <p>Restoring your session&hellip;</p>
</body>
</html>"#;
