// The engine-facing operation contract — the seven CRUD-style operations
// (plus count) the auth engine issues against its database adapter, and the
// query vocabulary they speak.
//
// All records are `serde_json::Value` objects to stay schema-agnostic. The
// adapter is the trust boundary's inside: host-store authorization is
// bypassed underneath it, so it must never be handed to callers outside
// the auth engine.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ─── Where Clause ────────────────────────────────────────────────

/// Comparison operators for WHERE clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal (default).
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Value is in the given list.
    In,
    /// String contains substring.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
}

/// Logical connector between WHERE clauses. Predicates partition into one
/// AND group and one OR group; arbitrary nesting is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    And,
    Or,
}

/// A single WHERE condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereClause {
    /// The field name to filter on.
    pub field: String,
    /// The comparison value.
    pub value: serde_json::Value,
    /// The comparison operator (default: Eq).
    #[serde(default)]
    pub operator: Operator,
    /// How this clause combines with the others. `None` means AND.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
}

impl WhereClause {
    /// Simple equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator: Operator::Eq,
            connector: None,
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Mark this clause as OR-combined.
    pub fn or(mut self) -> Self {
        self.connector = Some(Connector::Or);
        self
    }

    /// Whether a query is a single equality predicate on the primary key —
    /// the point-lookup fast path.
    pub fn is_id_point_lookup(clauses: &[WhereClause]) -> bool {
        matches!(
            clauses,
            [WhereClause {
                field,
                operator: Operator::Eq,
                ..
            }] if field == "id"
        )
    }
}

// ─── Sort / Pagination ───────────────────────────────────────────

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification (field + direction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Query parameters for `find_many`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyQuery {
    pub where_clauses: Vec<WhereClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Row offset. Translated to page-based pagination underneath; offsets
    /// that are not a multiple of the limit land on the containing page,
    /// so callers must not rely on mid-page offsets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    /// Request one level of relationship expansion from the store.
    #[serde(default)]
    pub join: bool,
}

// ─── Adapter Trait ───────────────────────────────────────────────

/// The operation contract the auth engine consumes.
#[async_trait]
pub trait AuthAdapter: Send + Sync + fmt::Debug {
    /// Create a record. Returns the store's result merged over the input:
    /// store-assigned fields (the generated ID, values mutated by store
    /// hooks) take precedence over caller-supplied values.
    async fn create(&self, model: &str, data: serde_json::Value) -> Result<serde_json::Value>;

    /// Find a single record. A single equality predicate on `id` uses the
    /// store's point-lookup path; its not-found signal becomes `Ok(None)`.
    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        select: Option<&[String]>,
        join: bool,
    ) -> Result<Option<serde_json::Value>>;

    /// Find multiple records with filtering, pagination, and sorting.
    async fn find_many(&self, model: &str, query: FindManyQuery)
        -> Result<Vec<serde_json::Value>>;

    /// Update a single record; returns the merged record or `None`.
    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> Result<Option<serde_json::Value>>;

    /// Update all matching records; returns the affected count.
    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> Result<i64>;

    /// Delete a single record. Absence is not an error.
    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> Result<()>;

    /// Delete all matching records; returns the deleted count.
    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> Result<i64>;

    /// Count matching records, ignoring pagination.
    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> Result<i64>;
}
