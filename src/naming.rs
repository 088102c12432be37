// Naming conventions — collection slugs and storage-side field names.
//
// The auth engine names foreign keys with an `Id`/`_id` suffix (`userId`);
// the document store models the same relationship as a relation field
// without the suffix (`user`). Collection slugs are the (optionally
// renamed) model name, pluralized when the adapter-wide flag is on.

use crate::schema::AuthModel;

/// Pluralize a model name into a collection slug.
pub fn pluralize(name: &str) -> String {
    if name.ends_with('s') || name.ends_with("sh") || name.ends_with("ch") {
        format!("{name}es")
    } else if name.ends_with('y')
        && !name.ends_with("ay")
        && !name.ends_with("ey")
        && !name.ends_with("oy")
        && !name.ends_with("uy")
    {
        format!("{}ies", &name[..name.len() - 1])
    } else {
        format!("{name}s")
    }
}

/// Best-effort inverse of [`pluralize`], used by the model lookup chain.
pub fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix("ses") {
        format!("{stem}s")
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_string()
    } else {
        name.to_string()
    }
}

/// Strip the auth engine's foreign-key suffix from a field name.
/// Returns `None` when the name carries no recognized suffix (including
/// the bare names `id` and `_id`, which are primary keys, not references).
pub fn strip_id_suffix(field: &str) -> Option<&str> {
    if let Some(stem) = field.strip_suffix("_id") {
        (!stem.is_empty()).then_some(stem)
    } else if let Some(stem) = field.strip_suffix("Id") {
        (!stem.is_empty()).then_some(stem)
    } else {
        None
    }
}

/// Whether a key looks like an ID-carrying field to the outbound coercion
/// heuristic. Deliberately permissive: any recognized suffix counts, so
/// custom fields added by engine extensions are not missed. The adapter's
/// allow/block lists exist to correct the cases where this guess is wrong.
pub fn looks_like_id_field(field: &str) -> bool {
    strip_id_suffix(field).is_some()
}

/// Storage-side collection slug for a model.
pub fn collection_slug(key: &str, model: &AuthModel, use_plural: bool) -> String {
    let base = model.model_name.as_deref().unwrap_or(key);
    if use_plural {
        pluralize(base)
    } else {
        base.to_string()
    }
}

/// Storage-side name for a field: custom override first, then the
/// reference-suffix strip for foreign keys.
pub fn field_name(model: &AuthModel, field: &str) -> String {
    let Some(def) = model.fields.get(field) else {
        return field.to_string();
    };
    let named = def.field_name.as_deref().unwrap_or(field);
    if def.references.is_some() {
        if let Some(stripped) = strip_id_suffix(named) {
            return stripped.to_string();
        }
    }
    named.to_string()
}
