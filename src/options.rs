// Adapter configuration — ID type mode, pluralization, debug logging, and
// the allow/block lists that override the outbound ID-coercion heuristic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How document IDs are represented in the host store.
///
/// Resolved once at adapter construction and immutable afterwards. Every ID
/// and foreign-key value crossing the adapter is coerced to this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    /// Numeric serial IDs (the store's default).
    #[default]
    Number,
    /// String IDs (UUIDs or engine-generated tokens).
    Text,
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Configuration for the Payload adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAdapterConfig {
    /// Force the ID representation. When absent, the mode is inferred from
    /// the auth engine's ID-generation strategy (database-generated serial
    /// IDs ⇒ `Number`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_type: Option<IdType>,

    /// Pluralize collection slugs (`user` → `users`).
    ///
    /// Default: true
    #[serde(default = "default_true")]
    pub use_plural: bool,

    /// Emit a debug log line per adapter operation.
    ///
    /// Default: false
    #[serde(default)]
    pub debug_logs: bool,

    /// Field names that must always go through outbound ID coercion, even
    /// when they do not match the `Id`/`_id` suffix heuristic.
    #[serde(default)]
    pub convert_id_fields: Vec<String>,

    /// Field names excluded from outbound ID coercion even though they
    /// match the suffix heuristic.
    #[serde(default)]
    pub skip_id_fields: Vec<String>,

    /// Page size used when `find_many` is called without a limit. Also the
    /// divisor for the offset→page translation.
    #[serde(default = "default_limit")]
    pub default_limit: i64,
}

fn default_true() -> bool {
    true
}

fn default_limit() -> i64 {
    10
}

impl Default for PayloadAdapterConfig {
    fn default() -> Self {
        Self {
            id_type: None,
            use_plural: true,
            debug_logs: false,
            convert_id_fields: Vec::new(),
            skip_id_fields: Vec::new(),
            default_limit: default_limit(),
        }
    }
}

impl PayloadAdapterConfig {
    pub fn id_type(mut self, id_type: IdType) -> Self {
        self.id_type = Some(id_type);
        self
    }

    pub fn use_plural(mut self, use_plural: bool) -> Self {
        self.use_plural = use_plural;
        self
    }

    pub fn debug_logs(mut self, enabled: bool) -> Self {
        self.debug_logs = enabled;
        self
    }

    pub fn convert_id_field(mut self, field: impl Into<String>) -> Self {
        self.convert_id_fields.push(field.into());
        self
    }

    pub fn skip_id_field(mut self, field: impl Into<String>) -> Self {
        self.skip_id_fields.push(field.into());
        self
    }
}
