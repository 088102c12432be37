// better-auth-payload — schema-driven adapter between the better-auth
// engine and a Payload-style document store.
//
// Wires together schema introspection, name/value translation, the CRUD
// operation layer, and design-time collection synthesis.

pub mod adapter;
pub mod collections;
pub mod error;
pub mod instance;
pub mod naming;
pub mod options;
pub mod payload;
pub mod request;
pub mod schema;
pub mod store;
pub mod transform;

pub use adapter::{
    AuthAdapter, Connector, FindManyQuery, Operator, SortBy, SortDirection, WhereClause,
};
pub use collections::{
    first_user_elevation_hook, generate_collections, AccessRule, CollectionAccess,
    CollectionConfig, CollectionField, CollectionFieldType, CreateHook, FirstUserElevation,
    GenerateOptions,
};
pub use error::{PayloadAuthError, Result};
pub use instance::InstanceHolder;
pub use options::{IdType, PayloadAdapterConfig};
pub use payload::{ClientResolver, PayloadAdapter, OVERRIDE_ACCESS};
pub use request::{normalize_request, NormalizedRequest};
pub use schema::introspect::{build_schema, AuthEngineOptions, GenerateIdStrategy};
pub use schema::{AuthModel, AuthSchema, FieldType, SchemaField};
pub use store::{DocWhere, FieldFilter, FindArgs, FindResult, MemoryStore, PayloadClient};
pub use transform::{coerce_to_id_type, Translator};
