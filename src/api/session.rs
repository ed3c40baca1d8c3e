//! Login and logout handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde_json::{Value, json};
use tracing::info;

use super::AppState;
use crate::{Error, Result};

/// `POST /login` — exchange credentials for a signed token.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let (email, password) = credentials(&body)?;

    let token = state.auth.login(&email, &password).await?;
    info!(email = %email, "Login successful");

    Ok(Json(json!({"message": "Login successful", "token": token})))
}

/// `POST /logout` — revoke the presented token.
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let token = headers.get("token").and_then(|v| v.to_str().ok());
    let message = state.auth.logout(token).await?;
    Ok(Json(json!({"message": message})))
}

/// Pull a non-empty email and password out of the login payload.
fn credentials(body: &[u8]) -> Result<(String, String)> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|_| Error::invalid("Missing email or password"))?;

    let field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match (field("email"), field("password")) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(Error::invalid("Missing email or password")),
    }
}
