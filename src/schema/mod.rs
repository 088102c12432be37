// Schema DSL — the normalized, in-memory description of the auth engine's
// models that every other component consumes. Built once at construction
// and immutable afterwards.

pub mod introspect;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Field types supported by the schema system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Json,
    StringArray,
}

/// Default value for a field: either a static JSON value or a thunk
/// evaluated per record (e.g. "now" timestamps).
#[derive(Clone)]
pub enum DefaultValue {
    Static(serde_json::Value),
    Computed(Arc<dyn Fn() -> serde_json::Value + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self) -> serde_json::Value {
        match self {
            Self::Static(v) => v.clone(),
            Self::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Computed(_) => f.debug_tuple("Computed").field(&"<thunk>").finish(),
        }
    }
}

/// Foreign key reference to another model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReference {
    /// Logical model key of the referenced model (e.g. "user").
    pub model: String,
    /// Field in the referenced model (usually "id").
    pub field: String,
}

/// A single field definition within a model.
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub field_type: FieldType,
    /// Custom storage name override.
    pub field_name: Option<String>,
    pub required: bool,
    pub unique: bool,
    pub default_value: Option<DefaultValue>,
    /// Present iff this field is a foreign key. The storage representation
    /// of such a field drops the `Id`/`_id` naming suffix.
    pub references: Option<FieldReference>,
}

impl SchemaField {
    pub fn required_string() -> Self {
        Self {
            field_type: FieldType::String,
            field_name: None,
            required: true,
            unique: false,
            default_value: None,
            references: None,
        }
    }

    pub fn optional_string() -> Self {
        Self {
            required: false,
            ..Self::required_string()
        }
    }

    pub fn boolean(default: bool) -> Self {
        Self {
            field_type: FieldType::Boolean,
            required: false,
            default_value: Some(DefaultValue::Static(serde_json::Value::Bool(default))),
            ..Self::required_string()
        }
    }

    pub fn number() -> Self {
        Self {
            field_type: FieldType::Number,
            required: false,
            ..Self::required_string()
        }
    }

    pub fn date() -> Self {
        Self {
            field_type: FieldType::Date,
            required: false,
            ..Self::required_string()
        }
    }

    pub fn json() -> Self {
        Self {
            field_type: FieldType::Json,
            required: false,
            ..Self::required_string()
        }
    }

    pub fn string_array() -> Self {
        Self {
            field_type: FieldType::StringArray,
            required: false,
            ..Self::required_string()
        }
    }

    /// Required date field defaulting to the current timestamp.
    pub fn created_at() -> Self {
        Self {
            field_type: FieldType::Date,
            required: true,
            default_value: Some(DefaultValue::Computed(Arc::new(|| {
                serde_json::Value::String(
                    chrono::Utc::now()
                        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                )
            }))),
            ..Self::required_string()
        }
    }

    pub fn updated_at() -> Self {
        Self::created_at()
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_reference(mut self, model: &str, field: &str) -> Self {
        self.references = Some(FieldReference {
            model: model.to_string(),
            field: field.to_string(),
        });
        self
    }

    pub fn with_field_name(mut self, name: &str) -> Self {
        self.field_name = Some(name.to_string());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(DefaultValue::Static(value));
        self
    }
}

/// A model definition: optional rename plus the field map.
#[derive(Debug, Clone, Default)]
pub struct AuthModel {
    /// Override for the storage-side name (singular). Absent ⇒ the model
    /// key is used.
    pub model_name: Option<String>,
    /// Map of field key → field definition.
    pub fields: HashMap<String, SchemaField>,
}

impl AuthModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, field: SchemaField) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.model_name = Some(name.to_string());
        self
    }
}

/// The complete auth schema: model key → model definition.
#[derive(Debug, Clone, Default)]
pub struct AuthSchema {
    pub models: HashMap<String, AuthModel>,
}

impl AuthSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, key: &str, model: AuthModel) -> Self {
        self.models.insert(key.to_string(), model);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AuthModel> {
        self.models.get(key)
    }

    /// Build the core schema (user, session, account, verification).
    pub fn core_schema() -> Self {
        let user = AuthModel::new()
            .field("id", SchemaField::required_string())
            .field("name", SchemaField::required_string())
            .field("email", SchemaField::required_string().with_unique())
            .field("emailVerified", SchemaField::boolean(false))
            .field("image", SchemaField::optional_string())
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        let session = AuthModel::new()
            .field("id", SchemaField::required_string())
            .field("token", SchemaField::required_string().with_unique())
            .field("expiresAt", SchemaField::date().with_required())
            .field("ipAddress", SchemaField::optional_string())
            .field("userAgent", SchemaField::optional_string())
            .field(
                "userId",
                SchemaField::required_string().with_reference("user", "id"),
            )
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        let account = AuthModel::new()
            .field("id", SchemaField::required_string())
            .field("accountId", SchemaField::required_string())
            .field("providerId", SchemaField::required_string())
            .field(
                "userId",
                SchemaField::required_string().with_reference("user", "id"),
            )
            .field("accessToken", SchemaField::optional_string())
            .field("refreshToken", SchemaField::optional_string())
            .field("idToken", SchemaField::optional_string())
            .field("accessTokenExpiresAt", SchemaField::date())
            .field("refreshTokenExpiresAt", SchemaField::date())
            .field("scope", SchemaField::optional_string())
            .field("password", SchemaField::optional_string())
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        let verification = AuthModel::new()
            .field("id", SchemaField::required_string())
            .field("identifier", SchemaField::required_string())
            .field("value", SchemaField::required_string())
            .field("expiresAt", SchemaField::date().with_required())
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        Self::new()
            .model("user", user)
            .model("session", session)
            .model("account", account)
            .model("verification", verification)
    }
}
