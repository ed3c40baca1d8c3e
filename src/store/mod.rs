//! Persistence port for the directory API.
//!
//! The [`Store`] trait abstracts over storage backends; the relational engine
//! behind it (schema, migrations, referential integrity) is not this crate's
//! concern. The only bundled implementation is [`memory::MemoryStore`],
//! which backs the test suite and standalone operation.

pub mod memory;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;

/// Raw field map of an entity record, as submitted by a client.
pub type Fields = serde_json::Map<String, Value>;

/// Closed set of entities served by the CRUD dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// A university campus
    University,
    /// A course offered by a university
    Course,
    /// An IELTS score requirement (band scale 1.0–9.0)
    Ielts,
    /// A PTE score requirement (10–90 scale)
    Pte,
    /// Admission criteria linking a course to language-test thresholds
    Requirement,
    /// An account in the credential store
    User,
}

impl Entity {
    /// Every entity, in route registration order.
    pub const ALL: [Entity; 6] = [
        Entity::University,
        Entity::Course,
        Entity::Ielts,
        Entity::Pte,
        Entity::Requirement,
        Entity::User,
    ];

    /// URL path segment for this entity's route group.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Entity::University => "university",
            Entity::Course => "course",
            Entity::Ielts => "ielts",
            Entity::Pte => "pte",
            Entity::Requirement => "requirements",
            Entity::User => "users",
        }
    }

    /// Label used in response messages ("University created successfully").
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Entity::University => "University",
            Entity::Course => "Course",
            Entity::Ielts => "Ielts",
            Entity::Pte => "Pte",
            Entity::Requirement => "Requirements",
            Entity::User => "User",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Account role in the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Branch manager
    Manager,
    /// System administrator
    Admin,
    /// Admissions counselor
    Counselor,
    /// Applicant account
    Student,
}

impl Role {
    /// All roles, for validation messages.
    pub const ALL: [Role; 4] = [Role::Manager, Role::Admin, Role::Counselor, Role::Student];

    /// Lowercase name as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Counselor => "counselor",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or(())
    }
}

/// A user row as read during authentication. Never mutated by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Server-assigned numeric id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email (unique lookup key)
    pub email: String,
    /// Argon2 PHC hash of the password
    pub password_hash: String,
    /// Account role
    pub role: Role,
}

/// Persistence failures, surfaced verbatim as 500 responses.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend failure (connection, query, serialization)
    #[error("{0}")]
    Backend(String),
}

/// Trait abstracting the storage backend.
///
/// Implementations must be `Send + Sync` because the store is shared across
/// request tasks. Each operation is a single call; the core never batches or
/// retries.
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    /// Insert a record, returning the server-assigned id.
    async fn create(&self, entity: Entity, fields: Fields) -> Result<i64, StoreError>;

    /// Fetch a record by id. `Ok(None)` when no row matches — absence is not
    /// an error at this layer.
    async fn fetch(&self, entity: Entity, id: i64) -> Result<Option<Value>, StoreError>;

    /// Overwrite the given fields of a record. Updating a missing row is a
    /// no-op success, matching SQL UPDATE semantics.
    async fn update(&self, entity: Entity, id: i64, fields: Fields) -> Result<(), StoreError>;

    /// Delete a record by id. Deleting a missing row is a no-op success.
    async fn delete(&self, entity: Entity, id: i64) -> Result<(), StoreError>;

    /// Look up a user by email for authentication and login.
    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// All university rows.
    async fn all_universities(&self) -> Result<Vec<Value>, StoreError>;

    /// All courses joined with their university, requirement and test scores.
    async fn all_courses(&self) -> Result<Vec<Value>, StoreError>;
}
