//! Generic CRUD dispatcher.
//!
//! [`CrudHandlers`] bundles the four method handlers for one entity. The
//! bundle is built once at startup from the entity tag — which fixes the
//! validation function and the optional prepare hook — and is stateless
//! thereafter. Validators are opaque to the dispatcher: pure functions over
//! the payload, no I/O.

use std::collections::HashMap;

use axum::{Json, http::Method};
use serde_json::{Value, json};

use crate::auth::password;
use crate::store::{Entity, Fields, Store};
use crate::validate;
use crate::{Error, Result};

type Validator = fn(&Fields) -> Vec<validate::FieldError>;
type Prepare = fn(&mut Fields) -> Result<()>;

/// Immutable bundle of create/read/update/delete for one entity.
pub struct CrudHandlers {
    entity: Entity,
    validate: Validator,
    /// Runs after validation, before the store call (users: password hashing)
    prepare: Option<Prepare>,
}

impl CrudHandlers {
    /// Build the handler bundle for an entity. The mapping is closed — no
    /// runtime name composition, no missing-handler failures.
    #[must_use]
    pub fn for_entity(entity: Entity) -> Self {
        let validate: Validator = match entity {
            Entity::University => validate::university,
            Entity::Course => validate::course,
            Entity::Ielts => validate::ielts,
            Entity::Pte => validate::pte,
            Entity::Requirement => validate::requirements,
            Entity::User => validate::user,
        };
        let prepare: Option<Prepare> = match entity {
            Entity::User => Some(hash_user_password),
            _ => None,
        };
        Self {
            entity,
            validate,
            prepare,
        }
    }

    /// Route a request to the handler matching its method; 405 otherwise.
    pub async fn dispatch(
        &self,
        store: &dyn Store,
        method: &Method,
        query: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<Json<Value>> {
        match *method {
            Method::POST => self.create(store, parse_payload(body)?).await,
            Method::GET => self.read(store, query).await,
            Method::PUT => self.update(store, parse_payload(body)?).await,
            Method::DELETE => self.remove(store, query).await,
            _ => Err(Error::MethodNotAllowed),
        }
    }

    async fn create(&self, store: &dyn Store, mut payload: Fields) -> Result<Json<Value>> {
        let errors = (self.validate)(&payload);
        if !errors.is_empty() {
            return Err(Error::invalid_fields("Invalid input", errors));
        }

        if let Some(prepare) = self.prepare {
            prepare(&mut payload)?;
        }

        let id = store.create(self.entity, payload).await?;
        Ok(Json(json!({
            "message": format!("{} created successfully", self.entity),
            "result": {"id": id}
        })))
    }

    async fn read(&self, store: &dyn Store, query: &HashMap<String, String>) -> Result<Json<Value>> {
        let id = query_id(query)?;
        // A missing row is a success with a null result, not a 404
        let row = store.fetch(self.entity, id).await?;
        Ok(Json(json!({
            "message": format!("{} retrieved successfully", self.entity),
            "result": row
        })))
    }

    async fn update(&self, store: &dyn Store, payload: Fields) -> Result<Json<Value>> {
        let id = payload
            .get("id")
            .and_then(id_value)
            .ok_or_else(|| Error::invalid("Invalid ID"))?;

        let fields = validate::updatable_fields(&payload);
        if fields.is_empty() {
            return Err(Error::invalid("No valid fields to update"));
        }

        store.update(self.entity, id, fields).await?;
        Ok(Json(json!({
            "message": format!("{} updated successfully", self.entity),
            "result": null
        })))
    }

    async fn remove(&self, store: &dyn Store, query: &HashMap<String, String>) -> Result<Json<Value>> {
        let id = query_id(query)?;
        store.delete(self.entity, id).await?;
        Ok(Json(json!({
            "message": format!("{} deleted successfully", self.entity),
            "result": null
        })))
    }
}

/// Replace the validated plaintext password with its Argon2 hash.
fn hash_user_password(fields: &mut Fields) -> Result<()> {
    let Some(plain) = fields.get("password").and_then(Value::as_str) else {
        // Unreachable after validation, but never store a missing password
        return Err(Error::invalid("Invalid input"));
    };
    let hashed = password::hash_password(plain)?;
    fields.insert("password".to_string(), Value::String(hashed));
    Ok(())
}

/// Parse a request body into a field map. An empty body is an empty map;
/// anything that is not a JSON object is invalid input.
fn parse_payload(body: &[u8]) -> Result<Fields> {
    if body.is_empty() {
        return Ok(Fields::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(Error::invalid("Invalid input")),
    }
}

/// Non-empty id from the query string, parsed to the numeric row id.
fn query_id(query: &HashMap<String, String>) -> Result<i64> {
    query
        .get("id")
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| Error::invalid("Invalid ID"))
}

/// Row id from a payload value — number or numeric string.
fn id_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    }
}
