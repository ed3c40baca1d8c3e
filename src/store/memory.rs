//! In-memory store — `DashMap` tables keyed by the entity tag.
//!
//! Reference implementation of the [`Store`] port. Ids are assigned from a
//! single process-wide counter, so they are unique across entities as well as
//! within one.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde_json::{Value, json};

use super::{Entity, Fields, Role, Store, StoreError, UserRecord};

/// In-memory store backed by one `DashMap` table per entity.
pub struct MemoryStore {
    tables: HashMap<Entity, DashMap<i64, Fields>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    /// Create an empty store with all tables present.
    #[must_use]
    pub fn new() -> Self {
        let tables = Entity::ALL
            .into_iter()
            .map(|entity| (entity, DashMap::new()))
            .collect();
        Self {
            tables,
            next_id: AtomicI64::new(1),
        }
    }

    fn table(&self, entity: Entity) -> &DashMap<i64, Fields> {
        // All six tables are created in `new`; the map is never mutated after.
        &self.tables[&entity]
    }

    fn row_with_id(id: i64, fields: &Fields) -> Value {
        let mut row = fields.clone();
        row.insert("id".to_string(), json!(id));
        Value::Object(row)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn field_i64(fields: &Fields, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn field_str(fields: &Fields, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(String::from)
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create(&self, entity: Entity, fields: Fields) -> Result<i64, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.table(entity).insert(id, fields);
        Ok(id)
    }

    async fn fetch(&self, entity: Entity, id: i64) -> Result<Option<Value>, StoreError> {
        Ok(self
            .table(entity)
            .get(&id)
            .map(|entry| Self::row_with_id(id, entry.value())))
    }

    async fn update(&self, entity: Entity, id: i64, fields: Fields) -> Result<(), StoreError> {
        if let Some(mut entry) = self.table(entity).get_mut(&id) {
            for (key, value) in fields {
                entry.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, entity: Entity, id: i64) -> Result<(), StoreError> {
        self.table(entity).remove(&id);
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        for entry in self.table(Entity::User) {
            let fields = entry.value();
            if field_str(fields, "email").as_deref() != Some(email) {
                continue;
            }

            let role = field_str(fields, "role")
                .and_then(|r| Role::from_str(&r).ok())
                .ok_or_else(|| {
                    StoreError::Backend(format!("user {email} has an unknown role"))
                })?;

            return Ok(Some(UserRecord {
                id: *entry.key(),
                name: field_str(fields, "name").unwrap_or_default(),
                email: email.to_string(),
                password_hash: field_str(fields, "password").unwrap_or_default(),
                role,
            }));
        }
        Ok(None)
    }

    async fn all_universities(&self) -> Result<Vec<Value>, StoreError> {
        let mut rows: Vec<(i64, Value)> = self
            .table(Entity::University)
            .iter()
            .map(|entry| (*entry.key(), Self::row_with_id(*entry.key(), entry.value())))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn all_courses(&self) -> Result<Vec<Value>, StoreError> {
        let universities = self.table(Entity::University);
        let requirements = self.table(Entity::Requirement);
        let ielts = self.table(Entity::Ielts);
        let pte = self.table(Entity::Pte);

        let mut courses: Vec<(i64, Fields)> = self
            .table(Entity::Course)
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        courses.sort_by_key(|(id, _)| *id);

        let mut rows = Vec::with_capacity(courses.len());
        for (course_id, course) in courses {
            let university = field_i64(&course, "university_id")
                .and_then(|uid| universities.get(&uid).map(|e| e.value().clone()));

            let requirement = field_i64(&course, "requirement_id")
                .and_then(|rid| requirements.get(&rid).map(|e| e.value().clone()));

            let ielts_overall = requirement
                .as_ref()
                .and_then(|r| field_i64(r, "ielts_id"))
                .and_then(|iid| ielts.get(&iid).and_then(|e| e.value().get("overall").cloned()));

            let pte_overall = requirement
                .as_ref()
                .and_then(|r| field_i64(r, "pte_id"))
                .and_then(|pid| pte.get(&pid).and_then(|e| e.value().get("overall").cloned()));

            let get = |source: &Option<Fields>, key: &str| {
                source
                    .as_ref()
                    .and_then(|f| f.get(key).cloned())
                    .unwrap_or(Value::Null)
            };

            rows.push(json!({
                "course_id": course_id,
                "course_name": course.get("name").cloned().unwrap_or(Value::Null),
                "fees": course.get("fees").cloned().unwrap_or(Value::Null),
                "duration": course.get("duration").cloned().unwrap_or(Value::Null),
                "intake": course.get("intake").cloned().unwrap_or(Value::Null),
                "link": course.get("link").cloned().unwrap_or(Value::Null),
                "university_name": get(&university, "name"),
                "university_country": get(&university, "country"),
                "university_campus_name": get(&university, "campus_name"),
                "university_city": get(&university, "city"),
                "course_requirement": get(&requirement, "requirement"),
                "ielts_overall": ielts_overall.unwrap_or(Value::Null),
                "pte_overall": pte_overall.unwrap_or(Value::Null),
            }));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        // GIVEN: an empty store
        let store = MemoryStore::new();

        // WHEN: two records are created
        let a = store
            .create(Entity::University, fields(json!({"name": "Aalto"})))
            .await
            .unwrap();
        let b = store
            .create(Entity::University, fields(json!({"name": "Oulu"})))
            .await
            .unwrap();

        // THEN: ids are distinct and increasing
        assert!(b > a);
    }

    #[tokio::test]
    async fn fetch_returns_row_with_id() {
        let store = MemoryStore::new();
        let id = store
            .create(Entity::Ielts, fields(json!({"overall": 7.0})))
            .await
            .unwrap();

        let row = store.fetch(Entity::Ielts, id).await.unwrap().unwrap();

        assert_eq!(row["id"], json!(id));
        assert_eq!(row["overall"], json!(7.0));
    }

    #[tokio::test]
    async fn fetch_missing_row_is_none_not_error() {
        let store = MemoryStore::new();

        let row = store.fetch(Entity::Ielts, 7).await.unwrap();

        assert!(row.is_none());
    }

    #[tokio::test]
    async fn update_merges_fields_and_ignores_missing_rows() {
        let store = MemoryStore::new();
        let id = store
            .create(Entity::Course, fields(json!({"name": "CS", "fees": 9000})))
            .await
            .unwrap();

        store
            .update(Entity::Course, id, fields(json!({"fees": 9500})))
            .await
            .unwrap();
        // Missing row: no-op success, like SQL UPDATE with zero rows affected
        store
            .update(Entity::Course, id + 100, fields(json!({"fees": 1})))
            .await
            .unwrap();

        let row = store.fetch(Entity::Course, id).await.unwrap().unwrap();
        assert_eq!(row["name"], json!("CS"));
        assert_eq!(row["fees"], json!(9500));
    }

    #[tokio::test]
    async fn user_by_email_builds_a_record() {
        let store = MemoryStore::new();
        store
            .create(
                Entity::User,
                fields(json!({
                    "name": "Alice",
                    "email": "alice@example.com",
                    "password": "$argon2id$stub",
                    "role": "admin"
                })),
            )
            .await
            .unwrap();

        let user = store
            .user_by_email("alice@example.com")
            .await
            .unwrap()
            .expect("user exists");

        assert_eq!(user.name, "Alice");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.password_hash, "$argon2id$stub");
        assert!(store.user_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_courses_joins_university_requirement_and_scores() {
        // GIVEN: a course wired to a university and a requirement with both scores
        let store = MemoryStore::new();
        let uni = store
            .create(
                Entity::University,
                fields(json!({
                    "name": "Aalto", "country": "Finland",
                    "campus_name": "Otaniemi", "city": "Espoo"
                })),
            )
            .await
            .unwrap();
        let ielts = store
            .create(Entity::Ielts, fields(json!({"overall": 6.5})))
            .await
            .unwrap();
        let req = store
            .create(
                Entity::Requirement,
                fields(json!({"requirement": "Bachelor's degree", "ielts_id": ielts})),
            )
            .await
            .unwrap();
        store
            .create(
                Entity::Course,
                fields(json!({
                    "name": "MSc CS", "university_id": uni, "requirement_id": req,
                    "fees": 15000, "duration": 24, "intake": "autumn",
                    "link": "https://aalto.fi/cs"
                })),
            )
            .await
            .unwrap();

        // WHEN: the aggregate is read
        let rows = store.all_courses().await.unwrap();

        // THEN: one flat row with joined columns; missing joins are null
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["course_name"], json!("MSc CS"));
        assert_eq!(row["university_name"], json!("Aalto"));
        assert_eq!(row["course_requirement"], json!("Bachelor's degree"));
        assert_eq!(row["ielts_overall"], json!(6.5));
        assert_eq!(row["pte_overall"], Value::Null);
    }
}
