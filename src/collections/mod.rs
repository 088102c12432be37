// Collection synthesis — design-time generation of document-store
// collection definitions from the introspected schema. Nothing here runs
// on the request path; the output is merged into the host application's
// static configuration before any request is served.

pub mod first_user;
pub mod generate;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::store::PayloadClient;

pub use first_user::{first_user_elevation_hook, FirstUserElevation};
pub use generate::generate_collections;

/// Future returned by a collection create hook.
pub type CreateHookFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + 'a>>;

/// Pre-commit hook on a collection's create pipeline. Receives the store
/// client, the collection slug, and the pending document; returns the
/// document to persist.
pub type CreateHook = Arc<
    dyn for<'a> Fn(&'a dyn PayloadClient, &'a str, serde_json::Value) -> CreateHookFuture<'a>
        + Send
        + Sync,
>;

/// Post-processing callback applied to each synthesized collection before
/// it is registered.
pub type CollectionTransform = Arc<dyn Fn(CollectionConfig) -> CollectionConfig + Send + Sync>;

/// Access decision for one collection operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Rejected outright. Writes to auth collections belong to the auth
    /// engine, not the admin UI.
    Denied,
    /// Allowed only for users carrying the named capability value in
    /// their role field.
    AdminOnly(String),
    /// No restriction.
    Open,
}

/// Per-operation access rules for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionAccess {
    pub create: AccessRule,
    pub read: AccessRule,
    pub update: AccessRule,
    pub delete: AccessRule,
}

impl CollectionAccess {
    /// The synthesizer's default: reads and deletes for admins, writes
    /// rejected.
    pub fn auth_default(admin_role: &str) -> Self {
        Self {
            create: AccessRule::Denied,
            read: AccessRule::AdminOnly(admin_role.to_string()),
            update: AccessRule::Denied,
            delete: AccessRule::AdminOnly(admin_role.to_string()),
        }
    }
}

/// Field types in the host store's collection vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionFieldType {
    Text,
    Number,
    Checkbox,
    Date,
    Json,
    /// Repeated text values.
    TextList,
    /// Relation to another collection, identified by its slug.
    Relationship(String),
}

/// One field of a collection definition.
#[derive(Debug, Clone)]
pub struct CollectionField {
    pub name: String,
    pub field_type: CollectionFieldType,
    pub required: bool,
    pub unique: bool,
    /// Include this field in the session token's claims.
    pub save_to_jwt: bool,
    pub default_value: Option<serde_json::Value>,
}

/// Admin UI hints for a collection.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    /// Sidebar group label.
    pub group: Option<String>,
    /// Field shown as the document title in list views.
    pub use_as_title: Option<String>,
}

/// A document-store collection definition.
#[derive(Clone)]
pub struct CollectionConfig {
    pub slug: String,
    pub fields: Vec<CollectionField>,
    pub admin: AdminConfig,
    pub access: CollectionAccess,
    /// Hooks run before a document is created.
    pub before_create: Vec<CreateHook>,
}

impl fmt::Debug for CollectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("slug", &self.slug)
            .field("fields", &self.fields)
            .field("admin", &self.admin)
            .field("access", &self.access)
            .field("before_create", &self.before_create.len())
            .finish()
    }
}

impl CollectionConfig {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            fields: Vec::new(),
            admin: AdminConfig::default(),
            access: CollectionAccess::auth_default("admin"),
            before_create: Vec::new(),
        }
    }

    pub fn field(&mut self, field: CollectionField) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// Options steering collection synthesis.
#[derive(Clone, Default)]
pub struct GenerateOptions {
    /// Model keys to leave out entirely.
    pub skip_models: Vec<String>,
    /// Model key → slug override, applied before pluralization.
    pub rename: HashMap<String, String>,
    /// Admin sidebar group label for the synthesized collections.
    pub admin_group: Option<String>,
    /// Role value treated as the administrative capability.
    pub admin_role: String,
    /// Replace the default access rules on every synthesized collection.
    pub access_override: Option<CollectionAccess>,
    /// Model key → field names to flag for token-claim inclusion.
    pub save_to_jwt: HashMap<String, Vec<String>>,
    /// Post-process each synthesized collection before registration.
    pub transform: Option<CollectionTransform>,
    /// Pluralize slugs.
    pub use_plural: bool,
}

impl fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("skip_models", &self.skip_models)
            .field("rename", &self.rename)
            .field("admin_group", &self.admin_group)
            .field("admin_role", &self.admin_role)
            .field("use_plural", &self.use_plural)
            .finish()
    }
}

impl GenerateOptions {
    /// Defaults matching the adapter's: plural slugs, "admin" capability.
    pub fn auth_default() -> Self {
        Self {
            admin_role: "admin".to_string(),
            use_plural: true,
            ..Self::default()
        }
    }
}
