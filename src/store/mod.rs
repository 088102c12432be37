// Document-store client contract — the minimal CRUD surface the adapter
// needs from the host store. Every method takes the collection slug, plain
// JSON records, and an explicit `override_access` flag the host store must
// honor (the auth engine is its own authorization authority).

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapter::Operator;
use crate::error::Result;

pub use memory::MemoryStore;

/// A single field predicate in the store's query language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub operator: Operator,
    pub value: serde_json::Value,
}

/// The store-level filter: one AND group and one OR group. A document
/// matches when it satisfies every AND predicate and, if the OR group is
/// non-empty, at least one OR predicate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocWhere {
    pub and: Vec<FieldFilter>,
    pub or: Vec<FieldFilter>,
}

impl DocWhere {
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty()
    }
}

/// Arguments for a filtered list query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindArgs {
    #[serde(rename = "where")]
    pub where_doc: DocWhere,
    pub limit: Option<i64>,
    /// 1-based page number (the store paginates by page, not offset).
    pub page: Option<i64>,
    /// Sort field; a leading `-` means descending.
    pub sort: Option<String>,
    /// Relationship expansion depth.
    pub depth: i64,
}

/// Result envelope for a list query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult {
    pub docs: Vec<serde_json::Value>,
    pub total_docs: i64,
}

/// The host document store's CRUD API.
///
/// Errors use [`crate::PayloadAuthError`]; a by-ID miss is surfaced as
/// `NotFound`, which callers normalize per operation.
#[async_trait]
pub trait PayloadClient: Send + Sync + fmt::Debug {
    /// Insert a document; returns it with store-assigned fields applied.
    async fn create(
        &self,
        collection: &str,
        data: serde_json::Value,
        override_access: bool,
    ) -> Result<serde_json::Value>;

    /// Fetch one document by primary key. Missing ⇒ `Err(NotFound)`.
    async fn find_by_id(
        &self,
        collection: &str,
        id: &serde_json::Value,
        depth: i64,
        override_access: bool,
    ) -> Result<serde_json::Value>;

    /// Filtered, paginated list query.
    async fn find(
        &self,
        collection: &str,
        args: FindArgs,
        override_access: bool,
    ) -> Result<FindResult>;

    /// Update one document by primary key. Missing ⇒ `Err(NotFound)`.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &serde_json::Value,
        data: serde_json::Value,
        override_access: bool,
    ) -> Result<serde_json::Value>;

    /// Update all documents matching the filter; returns the updated docs.
    async fn update_where(
        &self,
        collection: &str,
        where_doc: &DocWhere,
        data: serde_json::Value,
        override_access: bool,
    ) -> Result<Vec<serde_json::Value>>;

    /// Delete one document by primary key. Missing ⇒ `Err(NotFound)`.
    async fn delete_by_id(
        &self,
        collection: &str,
        id: &serde_json::Value,
        override_access: bool,
    ) -> Result<()>;

    /// Delete all documents matching the filter; returns the deleted count.
    async fn delete_where(
        &self,
        collection: &str,
        where_doc: &DocWhere,
        override_access: bool,
    ) -> Result<i64>;

    /// Count documents matching the filter.
    async fn count(
        &self,
        collection: &str,
        where_doc: &DocWhere,
        override_access: bool,
    ) -> Result<i64>;
}
