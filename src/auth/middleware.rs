//! Access-control gate — axum middleware wrapping protected route groups.
//!
//! Reads are public; `POST`/`PUT`/`DELETE` require a valid, non-revoked
//! token presented raw in the `token` header (no `Bearer` prefix). The
//! resolved principal is attached to request extensions for downstream
//! handlers; none consult the role today, but the attachment point exists.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::AuthService;
use crate::store::UserRecord;

/// The identity a request runs as after passing the gate.
#[derive(Debug, Clone)]
pub enum RequestPrincipal {
    /// Public read, or a route group outside the gate's coverage
    Anonymous,
    /// Authenticated mutating request
    User(UserRecord),
}

/// Gate middleware. Applied per route group; groups not wrapped bypass auth
/// entirely — which entities to wrap is policy, decided in configuration.
pub async fn access_control(
    State(auth): State<Arc<AuthService>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // Reads are public by design; preflight never carries credentials
    let method = request.method();
    if !matches!(*method, Method::POST | Method::PUT | Method::DELETE) {
        request.extensions_mut().insert(RequestPrincipal::Anonymous);
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get("token")
        .and_then(|v| v.to_str().ok());

    match auth.authenticate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(RequestPrincipal::User(user));
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Request denied");
            e.into_response()
        }
    }
}
