//! HTTP surface — router, shared state and the error-to-response mapping.

pub mod catalog;
pub mod crud;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderName, Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing::error;

use crate::auth::{AuthService, access_control};
use crate::config::AuthConfig;
use crate::store::{Entity, Store};
use crate::{Error, Result};

use crud::CrudHandlers;

/// Shared application state
pub struct AppState {
    /// Persistence port
    pub store: Arc<dyn Store>,
    /// Token service, blacklist and principal lookup
    pub auth: Arc<AuthService>,
    /// One immutable CRUD handler bundle per entity, built at startup
    pub crud: HashMap<Entity, CrudHandlers>,
}

impl AppState {
    /// Build the state, constructing the handler bundle for every entity.
    pub fn new(store: Arc<dyn Store>, auth: Arc<AuthService>) -> Self {
        let crud = Entity::ALL
            .into_iter()
            .map(|entity| (entity, CrudHandlers::for_entity(entity)))
            .collect();
        Self { store, auth, crud }
    }
}

/// Create the router.
///
/// Each entity route group is mounted under `/<entity>` with method-based
/// dispatch; groups named in `auth.protected` are wrapped by the
/// access-control gate, the rest bypass it even for writes.
pub fn create_router(state: Arc<AppState>, auth_config: &AuthConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/login", post(session::login_handler))
        .route("/logout", post(session::logout_handler))
        .route("/allUniversities", get(catalog::all_universities_handler))
        .route("/allCourses", get(catalog::all_courses_handler))
        .route("/allUniNames", get(catalog::university_names_handler))
        .fallback(not_found_handler)
        .with_state(Arc::clone(&state));

    for entity in Entity::ALL {
        let path = format!("/{}", entity.path());
        let mut group = Router::new()
            .route(&path, any(entity_handler))
            .with_state((Arc::clone(&state), entity));

        if auth_config.is_protected(entity.path()) {
            group = group.layer(middleware::from_fn_with_state(
                Arc::clone(&state.auth),
                access_control,
            ));
        }

        app = app.merge(group);
    }

    app.layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Permissive CORS, matching the headers browsers send to this API.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("token"),
        ])
}

/// Method-dispatch entry point for one entity route group.
async fn entity_handler(
    State((state, entity)): State<(Arc<AppState>, Entity)>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let handlers = &state.crud[&entity];
    handlers
        .dispatch(state.store.as_ref(), &method, &query, &body)
        .await
}

/// `GET /` — welcome message.
async fn root_handler() -> Json<Value> {
    Json(json!({"message": "Welcome to the University API"}))
}

/// Any unmatched path.
async fn not_found_handler() -> Error {
    Error::NotFound
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Invalid { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                // Shell errors never surface their detail to clients
                error!(error = %self, "Internal error while handling request");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "Internal server error"})),
                )
                    .into_response();
            }
        };

        let body = match &self {
            Error::Invalid { fields, .. } if !fields.is_empty() => {
                json!({"message": self.to_string(), "errors": fields})
            }
            _ => json!({"message": self.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}
