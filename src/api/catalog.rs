//! Aggregate read-only views over the catalog.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::AppState;
use crate::Result;

/// `GET /allUniversities` — every university row, as a bare array.
pub async fn all_universities_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>> {
    let rows = state.store.all_universities().await?;
    Ok(Json(rows))
}

/// `GET /allCourses` — the flattened course view joined with its
/// university and entry requirements.
pub async fn all_courses_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>> {
    let rows = state.store.all_courses().await?;
    Ok(Json(rows))
}

/// `GET /allUniNames` — `{id, name}` pairs where the display name joins the
/// university and campus names with a hyphen.
pub async fn university_names_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>> {
    let rows = state.store.all_universities().await?;
    let names = rows
        .iter()
        .map(|row| {
            let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
            let campus = row
                .get("campus_name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            json!({"id": row.get("id"), "name": format!("{name}-{campus}")})
        })
        .collect();
    Ok(Json(names))
}
