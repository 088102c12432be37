// Schema introspection — normalizes the auth engine's declarative
// configuration (core models, optional capability extensions, renames,
// additional fields) into an `AuthSchema`. Pure over the configuration:
// no engine logic runs here. Dangling references are not validated; they
// surface later as lookup failures in the translator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::naming;
use crate::schema::{AuthModel, AuthSchema, SchemaField};

/// How the auth engine generates primary IDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateIdStrategy {
    /// Let the database assign serial IDs (default).
    #[default]
    Serial,
    /// Engine-generated UUIDs.
    Uuid,
    /// Engine-generated random string tokens.
    Random,
}

impl GenerateIdStrategy {
    /// Whether the engine produces its own (string) IDs rather than
    /// relying on store-assigned serials.
    pub fn generates_string_ids(&self) -> bool {
        !matches!(self, Self::Serial)
    }
}

/// Per-model override block: rename, field renames, extra fields.
#[derive(Debug, Clone, Default)]
pub struct ModelOverride {
    /// Storage-side model name override (singular).
    pub model_name: Option<String>,
    /// Field key → storage name override.
    pub field_names: HashMap<String, String>,
    /// Fields added on top of the model's built-in set.
    pub additional_fields: HashMap<String, SchemaField>,
}

/// Optional capability extensions the engine may enable. Each adds its
/// own model to the schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityModels {
    pub two_factor: bool,
    pub passkey: bool,
    pub api_key: bool,
}

/// The declarative slice of the auth engine's configuration that the
/// adapter consumes. Shape is owned by the engine; only what the schema
/// builder needs is represented here.
#[derive(Debug, Clone, Default)]
pub struct AuthEngineOptions {
    pub generate_id: GenerateIdStrategy,
    pub user: ModelOverride,
    pub session: ModelOverride,
    pub account: ModelOverride,
    pub verification: ModelOverride,
    pub capabilities: CapabilityModels,
}

impl AuthEngineOptions {
    /// Every (model key, rename) pair carrying a rename override.
    pub fn model_renames(&self) -> Vec<(&'static str, String)> {
        [
            ("user", &self.user),
            ("session", &self.session),
            ("account", &self.account),
            ("verification", &self.verification),
        ]
        .into_iter()
        .filter_map(|(key, o)| o.model_name.clone().map(|name| (key, name)))
        .collect()
    }
}

/// Build the normalized schema from engine configuration.
pub fn build_schema(options: &AuthEngineOptions) -> AuthSchema {
    let mut schema = AuthSchema::core_schema();

    apply_override(&mut schema, "user", &options.user);
    apply_override(&mut schema, "session", &options.session);
    apply_override(&mut schema, "account", &options.account);
    apply_override(&mut schema, "verification", &options.verification);

    if options.capabilities.two_factor {
        schema = schema.model("twoFactor", two_factor_model());
    }
    if options.capabilities.passkey {
        schema = schema.model("passkey", passkey_model());
    }
    if options.capabilities.api_key {
        schema = schema.model("apikey", api_key_model());
    }

    schema
}

fn apply_override(schema: &mut AuthSchema, key: &str, over: &ModelOverride) {
    let Some(model) = schema.models.get_mut(key) else {
        return;
    };
    if over.model_name.is_some() {
        model.model_name = over.model_name.clone();
    }
    for (field, storage_name) in &over.field_names {
        if let Some(def) = model.fields.get_mut(field) {
            def.field_name = Some(storage_name.clone());
        }
    }
    for (field, def) in &over.additional_fields {
        model.fields.insert(field.clone(), def.clone());
    }
}

fn two_factor_model() -> AuthModel {
    AuthModel::new()
        .field("id", SchemaField::required_string())
        .field("secret", SchemaField::required_string())
        .field("backupCodes", SchemaField::required_string())
        .field(
            "userId",
            SchemaField::required_string().with_reference("user", "id"),
        )
}

fn passkey_model() -> AuthModel {
    AuthModel::new()
        .field("id", SchemaField::required_string())
        .field("name", SchemaField::optional_string())
        .field("publicKey", SchemaField::required_string())
        .field(
            "userId",
            SchemaField::required_string().with_reference("user", "id"),
        )
        .field("credentialID", SchemaField::required_string())
        .field("counter", SchemaField::number().with_required())
        .field("deviceType", SchemaField::required_string())
        .field("backedUp", SchemaField::boolean(false))
        .field("transports", SchemaField::optional_string())
        .field("createdAt", SchemaField::created_at())
}

fn api_key_model() -> AuthModel {
    AuthModel::new()
        .field("id", SchemaField::required_string())
        .field("name", SchemaField::optional_string())
        .field("start", SchemaField::optional_string())
        .field("prefix", SchemaField::optional_string())
        .field("key", SchemaField::required_string())
        .field(
            "userId",
            SchemaField::required_string().with_reference("user", "id"),
        )
        .field("refillInterval", SchemaField::number())
        .field("refillAmount", SchemaField::number())
        .field("lastRefillAt", SchemaField::date())
        .field("enabled", SchemaField::boolean(true))
        .field("rateLimitEnabled", SchemaField::boolean(true))
        .field("rateLimitTimeWindow", SchemaField::number())
        .field("rateLimitMax", SchemaField::number())
        .field("requestCount", SchemaField::number())
        .field("remaining", SchemaField::number())
        .field("lastRequest", SchemaField::date())
        .field("expiresAt", SchemaField::date())
        .field("permissions", SchemaField::json())
        .field("metadata", SchemaField::json())
        .field("createdAt", SchemaField::created_at())
        .field("updatedAt", SchemaField::updated_at())
}

// ─── Model lookup strategies ─────────────────────────────────────

/// Resolve a model from a name that may be the model key, a rename
/// override, or a (possibly pluralized) collection slug. Strategies are
/// tried in order; the first hit wins.
pub fn resolve_model<'a>(schema: &'a AuthSchema, name: &str) -> Option<(&'a str, &'a AuthModel)> {
    const STRATEGIES: [fn(&AuthSchema, &str) -> Option<String>; 3] =
        [exact_key, renamed_model, singularized_key];

    for strategy in STRATEGIES {
        if let Some(key) = strategy(schema, name) {
            if let Some((key, model)) = schema.models.get_key_value(&key) {
                return Some((key.as_str(), model));
            }
        }
    }
    None
}

fn exact_key(schema: &AuthSchema, name: &str) -> Option<String> {
    schema.models.contains_key(name).then(|| name.to_string())
}

fn renamed_model(schema: &AuthSchema, name: &str) -> Option<String> {
    schema
        .models
        .iter()
        .find(|(_, model)| model.model_name.as_deref() == Some(name))
        .map(|(key, _)| key.clone())
}

fn singularized_key(schema: &AuthSchema, name: &str) -> Option<String> {
    let singular = naming::singularize(name);
    (singular != name && schema.models.contains_key(&singular)).then_some(singular)
}
