// In-memory document store — HashMap-backed implementation of the
// `PayloadClient` contract. Serves as the test fixture and as a zero-setup
// store for examples. Thread-safe via `tokio::sync::RwLock`.
//
// The store assigns IDs in the configured representation (serial integers
// or UUID strings) and runs registered per-collection create hooks before
// each insert, mirroring the host CMS's hook pipeline. `override_access`
// is accepted for contract parity; the in-memory store enforces no access
// rules of its own.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapter::Operator;
use crate::collections::CreateHook;
use crate::error::{PayloadAuthError, Result};
use crate::options::IdType;
use crate::store::{DocWhere, FieldFilter, FindArgs, FindResult, PayloadClient};

#[derive(Debug, Default)]
struct Inner {
    docs: HashMap<String, Vec<serde_json::Value>>,
    counters: HashMap<String, i64>,
}

/// In-memory `PayloadClient`.
#[derive(Clone)]
pub struct MemoryStore {
    id_type: IdType,
    inner: Arc<RwLock<Inner>>,
    create_hooks: HashMap<String, Vec<CreateHook>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("id_type", &self.id_type)
            .field("hooked_collections", &self.create_hooks.len())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(IdType::Number)
    }
}

impl MemoryStore {
    /// Create an empty store assigning IDs in the given representation.
    pub fn new(id_type: IdType) -> Self {
        Self {
            id_type,
            inner: Arc::new(RwLock::new(Inner::default())),
            create_hooks: HashMap::new(),
        }
    }

    /// Register a create hook for a collection. Hooks run in registration
    /// order before the document is inserted; call this before sharing the
    /// store.
    pub fn register_create_hook(&mut self, collection: &str, hook: CreateHook) {
        self.create_hooks
            .entry(collection.to_string())
            .or_default()
            .push(hook);
    }

    /// Seed a collection with pre-existing documents (bypasses hooks).
    pub async fn seed(&self, collection: &str, docs: Vec<serde_json::Value>) {
        let mut inner = self.inner.write().await;
        inner
            .docs
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    /// Snapshot of a collection's documents (for assertions).
    pub async fn collection(&self, collection: &str) -> Vec<serde_json::Value> {
        self.inner
            .read()
            .await
            .docs
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(&self, inner: &mut Inner, collection: &str) -> serde_json::Value {
        match self.id_type {
            IdType::Number => {
                let counter = inner.counters.entry(collection.to_string()).or_insert(0);
                *counter += 1;
                serde_json::Value::from(*counter)
            }
            IdType::Text => serde_json::Value::String(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Check a document against a store filter: every AND predicate must hold
/// and, when the OR group is non-empty, at least one OR predicate must.
fn matches_where(doc: &serde_json::Value, where_doc: &DocWhere) -> bool {
    let and_ok = where_doc.and.iter().all(|f| matches_filter(doc, f));
    let or_ok = where_doc.or.is_empty() || where_doc.or.iter().any(|f| matches_filter(doc, f));
    and_ok && or_ok
}

fn matches_filter(doc: &serde_json::Value, filter: &FieldFilter) -> bool {
    let field_val = doc
        .get(&filter.field)
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    match filter.operator {
        Operator::Eq => field_val == filter.value,
        Operator::Ne => field_val != filter.value,
        Operator::Lt => compare_json(&field_val, &filter.value) == Some(Ordering::Less),
        Operator::Lte => matches!(
            compare_json(&field_val, &filter.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Gt => compare_json(&field_val, &filter.value) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            compare_json(&field_val, &filter.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::In => match &filter.value {
            serde_json::Value::Array(arr) => arr.contains(&field_val),
            _ => false,
        },
        Operator::Contains => str_pair(&field_val, &filter.value)
            .map_or(false, |(f, t)| f.contains(t)),
        Operator::StartsWith => str_pair(&field_val, &filter.value)
            .map_or(false, |(f, t)| f.starts_with(t)),
        Operator::EndsWith => str_pair(&field_val, &filter.value)
            .map_or(false, |(f, t)| f.ends_with(t)),
    }
}

fn str_pair<'a>(
    a: &'a serde_json::Value,
    b: &'a serde_json::Value,
) -> Option<(&'a str, &'a str)> {
    Some((a.as_str()?, b.as_str()?))
}

fn compare_json(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    match (a, b) {
        (serde_json::Value::Number(an), serde_json::Value::Number(bn)) => {
            an.as_f64()?.partial_cmp(&bn.as_f64()?)
        }
        (serde_json::Value::String(a_s), serde_json::Value::String(b_s)) => Some(a_s.cmp(b_s)),
        _ => None,
    }
}

fn sort_docs(docs: &mut [serde_json::Value], sort: &str) {
    let (field, descending) = match sort.strip_prefix('-') {
        Some(f) => (f, true),
        None => (sort, false),
    };
    docs.sort_by(|a, b| {
        let ord = match (a.get(field), b.get(field)) {
            (Some(av), Some(bv)) => compare_json(av, bv).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

fn merge_into(target: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
}

#[async_trait]
impl PayloadClient for MemoryStore {
    async fn create(
        &self,
        collection: &str,
        data: serde_json::Value,
        _override_access: bool,
    ) -> Result<serde_json::Value> {
        let mut record = data;
        if let Some(hooks) = self.create_hooks.get(collection) {
            let client: &dyn PayloadClient = self;
            for hook in hooks {
                record = hook(client, collection, record).await?;
            }
        }

        if !record.is_object() {
            return Err(PayloadAuthError::Database(
                "create data must be a JSON object".into(),
            ));
        }

        let mut inner = self.inner.write().await;
        if record.get("id").map_or(true, serde_json::Value::is_null) {
            let id = self.next_id(&mut inner, collection);
            if let Some(obj) = record.as_object_mut() {
                obj.insert("id".to_string(), id);
            }
        }
        inner
            .docs
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &serde_json::Value,
        _depth: i64,
        _override_access: bool,
    ) -> Result<serde_json::Value> {
        let inner = self.inner.read().await;
        inner
            .docs
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.get("id") == Some(id)))
            .cloned()
            .ok_or(PayloadAuthError::NotFound)
    }

    async fn find(
        &self,
        collection: &str,
        args: FindArgs,
        _override_access: bool,
    ) -> Result<FindResult> {
        let inner = self.inner.read().await;
        let empty = Vec::new();
        let docs = inner.docs.get(collection).unwrap_or(&empty);

        let mut matched: Vec<serde_json::Value> = docs
            .iter()
            .filter(|d| matches_where(d, &args.where_doc))
            .cloned()
            .collect();
        let total = matched.len() as i64;

        if let Some(ref sort) = args.sort {
            sort_docs(&mut matched, sort);
        }

        if let Some(limit) = args.limit {
            let page = args.page.unwrap_or(1).max(1);
            let start = ((page - 1) * limit) as usize;
            matched = if start < matched.len() {
                matched.split_off(start)
            } else {
                Vec::new()
            };
            matched.truncate(limit as usize);
        }

        Ok(FindResult {
            docs: matched,
            total_docs: total,
        })
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &serde_json::Value,
        data: serde_json::Value,
        _override_access: bool,
    ) -> Result<serde_json::Value> {
        let mut inner = self.inner.write().await;
        let doc = inner
            .docs
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.get("id") == Some(id)))
            .ok_or(PayloadAuthError::NotFound)?;
        merge_into(doc, &data);
        Ok(doc.clone())
    }

    async fn update_where(
        &self,
        collection: &str,
        where_doc: &DocWhere,
        data: serde_json::Value,
        _override_access: bool,
    ) -> Result<Vec<serde_json::Value>> {
        let mut inner = self.inner.write().await;
        let mut updated = Vec::new();
        if let Some(docs) = inner.docs.get_mut(collection) {
            for doc in docs.iter_mut() {
                if matches_where(doc, where_doc) {
                    merge_into(doc, &data);
                    updated.push(doc.clone());
                }
            }
        }
        Ok(updated)
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: &serde_json::Value,
        _override_access: bool,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let docs = inner
            .docs
            .get_mut(collection)
            .ok_or(PayloadAuthError::NotFound)?;
        let pos = docs
            .iter()
            .position(|d| d.get("id") == Some(id))
            .ok_or(PayloadAuthError::NotFound)?;
        docs.remove(pos);
        Ok(())
    }

    async fn delete_where(
        &self,
        collection: &str,
        where_doc: &DocWhere,
        _override_access: bool,
    ) -> Result<i64> {
        let mut inner = self.inner.write().await;
        if let Some(docs) = inner.docs.get_mut(collection) {
            let before = docs.len();
            docs.retain(|d| !matches_where(d, where_doc));
            Ok((before - docs.len()) as i64)
        } else {
            Ok(0)
        }
    }

    async fn count(
        &self,
        collection: &str,
        where_doc: &DocWhere,
        _override_access: bool,
    ) -> Result<i64> {
        let inner = self.inner.read().await;
        let count = inner
            .docs
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches_where(d, where_doc)).count())
            .unwrap_or(0);
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq_filter(field: &str, value: serde_json::Value) -> DocWhere {
        DocWhere {
            and: vec![FieldFilter {
                field: field.to_string(),
                operator: Operator::Eq,
                value,
            }],
            or: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_serial_ids() {
        let store = MemoryStore::new(IdType::Number);
        let first = store.create("users", json!({"name": "Alice"}), true).await.unwrap();
        let second = store.create("users", json!({"name": "Bob"}), true).await.unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
    }

    #[tokio::test]
    async fn test_create_assigns_uuid_ids() {
        let store = MemoryStore::new(IdType::Text);
        let doc = store.create("users", json!({"name": "Alice"}), true).await.unwrap();
        assert!(doc["id"].as_str().unwrap().len() > 30);
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let store = MemoryStore::new(IdType::Number);
        let err = store
            .find_by_id("users", &json!(99), 0, true)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_filter_and_or() {
        let store = MemoryStore::new(IdType::Number);
        store
            .seed(
                "users",
                vec![
                    json!({"id": 1, "role": "admin", "active": true}),
                    json!({"id": 2, "role": "user", "active": true}),
                    json!({"id": 3, "role": "user", "active": false}),
                ],
            )
            .await;

        let where_doc = DocWhere {
            and: vec![FieldFilter {
                field: "active".into(),
                operator: Operator::Eq,
                value: json!(true),
            }],
            or: vec![
                FieldFilter {
                    field: "role".into(),
                    operator: Operator::Eq,
                    value: json!("admin"),
                },
                FieldFilter {
                    field: "role".into(),
                    operator: Operator::Eq,
                    value: json!("user"),
                },
            ],
        };
        let result = store
            .find("users", FindArgs { where_doc, ..Default::default() }, true)
            .await
            .unwrap();
        assert_eq!(result.docs.len(), 2);
        assert_eq!(result.total_docs, 2);
    }

    #[tokio::test]
    async fn test_find_pagination_and_sort() {
        let store = MemoryStore::new(IdType::Number);
        for name in ["Charlie", "Alice", "Bob", "Dave", "Eve"] {
            store.create("users", json!({"name": name}), true).await.unwrap();
        }

        let args = FindArgs {
            sort: Some("name".into()),
            limit: Some(2),
            page: Some(2),
            ..Default::default()
        };
        let result = store.find("users", args, true).await.unwrap();
        assert_eq!(result.total_docs, 5);
        assert_eq!(result.docs.len(), 2);
        assert_eq!(result.docs[0]["name"], "Charlie");
        assert_eq!(result.docs[1]["name"], "Dave");
    }

    #[tokio::test]
    async fn test_find_sort_descending() {
        let store = MemoryStore::new(IdType::Number);
        store
            .seed(
                "sessions",
                vec![json!({"id": 1, "token": "a"}), json!({"id": 2, "token": "b"})],
            )
            .await;
        let args = FindArgs {
            sort: Some("-token".into()),
            ..Default::default()
        };
        let result = store.find("sessions", args, true).await.unwrap();
        assert_eq!(result.docs[0]["token"], "b");
    }

    #[tokio::test]
    async fn test_update_where_returns_docs() {
        let store = MemoryStore::new(IdType::Number);
        store
            .seed(
                "users",
                vec![
                    json!({"id": 1, "role": "user"}),
                    json!({"id": 2, "role": "user"}),
                ],
            )
            .await;
        let updated = store
            .update_where(
                "users",
                &eq_filter("role", json!("user")),
                json!({"role": "banned"}),
                true,
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|d| d["role"] == "banned"));
    }

    #[tokio::test]
    async fn test_delete_where_counts() {
        let store = MemoryStore::new(IdType::Number);
        store
            .seed(
                "sessions",
                vec![
                    json!({"id": 1, "user": 1}),
                    json!({"id": 2, "user": 1}),
                    json!({"id": 3, "user": 2}),
                ],
            )
            .await;
        let deleted = store
            .delete_where("sessions", &eq_filter("user", json!(1)), true)
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.count("sessions", &DocWhere::default(), true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_operator_contains() {
        let store = MemoryStore::new(IdType::Number);
        store
            .seed(
                "users",
                vec![
                    json!({"id": 1, "email": "alice@test.com"}),
                    json!({"id": 2, "email": "bob@other.com"}),
                ],
            )
            .await;
        let where_doc = DocWhere {
            and: vec![FieldFilter {
                field: "email".into(),
                operator: Operator::Contains,
                value: json!("test.com"),
            }],
            or: Vec::new(),
        };
        let result = store
            .find("users", FindArgs { where_doc, ..Default::default() }, true)
            .await
            .unwrap();
        assert_eq!(result.docs.len(), 1);
        assert_eq!(result.docs[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_create_hook_runs_before_insert() {
        use std::sync::Arc;

        let mut store = MemoryStore::new(IdType::Number);
        store.register_create_hook(
            "users",
            Arc::new(
                |_client: &dyn crate::store::PayloadClient, _collection: &str, mut data: serde_json::Value| {
                    Box::pin(async move {
                        data["hooked"] = json!(true);
                        Ok(data)
                    })
                },
            ),
        );
        let doc = store.create("users", json!({"name": "Alice"}), true).await.unwrap();
        assert_eq!(doc["hooked"], true);
    }
}
