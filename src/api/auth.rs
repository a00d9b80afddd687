use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::error::Error;
use crate::AppState;

/// Bearer-token gate in front of every lifecycle route.
///
/// Runs before any handler work, so a rejected request has no side
/// effects. Health stays outside this layer.
pub async fn require_operator(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if !token_matches(presented, &state.config.auth.token) {
        return Err(Error::Auth);
    }

    Ok(next.run(req).await)
}

/// Constant-time comparison; an unconfigured (empty) operator token
/// fails closed.
fn token_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
