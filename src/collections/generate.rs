// Walks the introspected schema and emits collection definitions for the
// host store, merging with any collections the application already
// defines. Augmentation is append-only: a field the host has declared is
// never removed or redefined, because host collections carry hand-authored
// access control the synthesizer must not disturb.

use std::collections::HashMap;

use crate::collections::{
    CollectionConfig, CollectionField, CollectionFieldType, GenerateOptions,
};
use crate::naming;
use crate::schema::{AuthModel, AuthSchema, FieldType, SchemaField};

const TITLE_FIELD_PREFERENCE: [&str; 5] = ["name", "email", "title", "username", "token"];

fn slug_for(key: &str, model: &AuthModel, options: &GenerateOptions) -> String {
    let base = options
        .rename
        .get(key)
        .map(String::as_str)
        .or(model.model_name.as_deref())
        .unwrap_or(key);
    if options.use_plural {
        naming::pluralize(base)
    } else {
        base.to_string()
    }
}

fn field_type_for(
    schema: &AuthSchema,
    field: &SchemaField,
    options: &GenerateOptions,
) -> CollectionFieldType {
    if let Some(reference) = &field.references {
        let slug = schema
            .get(&reference.model)
            .map(|m| slug_for(&reference.model, m, options))
            .unwrap_or_else(|| reference.model.clone());
        return CollectionFieldType::Relationship(slug);
    }
    match field.field_type {
        FieldType::String => CollectionFieldType::Text,
        FieldType::Number => CollectionFieldType::Number,
        FieldType::Boolean => CollectionFieldType::Checkbox,
        FieldType::Date => CollectionFieldType::Date,
        FieldType::Json => CollectionFieldType::Json,
        FieldType::StringArray => CollectionFieldType::TextList,
    }
}

fn synthesize_fields(
    schema: &AuthSchema,
    model_key: &str,
    model: &AuthModel,
    options: &GenerateOptions,
) -> Vec<CollectionField> {
    let jwt_fields = options.save_to_jwt.get(model_key);
    let mut keys: Vec<&String> = model.fields.keys().collect();
    keys.sort();

    keys.into_iter()
        .filter(|key| key.as_str() != "id")
        .filter_map(|key| {
            let field = model.fields.get(key)?;
            Some(CollectionField {
                name: naming::field_name(model, key),
                field_type: field_type_for(schema, field, options),
                required: field.required,
                unique: field.unique,
                save_to_jwt: jwt_fields.map_or(false, |fs| fs.iter().any(|f| f == key)),
                default_value: field
                    .default_value
                    .as_ref()
                    .map(crate::schema::DefaultValue::resolve),
            })
        })
        .collect()
}

fn guess_title_field(fields: &[CollectionField]) -> Option<String> {
    for candidate in TITLE_FIELD_PREFERENCE {
        if fields.iter().any(|f| f.name == candidate) {
            return Some(candidate.to_string());
        }
    }
    fields
        .iter()
        .find(|f| f.field_type == CollectionFieldType::Text)
        .map(|f| f.name.clone())
}

fn synthesize(
    schema: &AuthSchema,
    model_key: &str,
    model: &AuthModel,
    options: &GenerateOptions,
) -> CollectionConfig {
    let fields = synthesize_fields(schema, model_key, model, options);
    let mut collection = CollectionConfig::new(slug_for(model_key, model, options));
    collection.admin.group = options.admin_group.clone();
    collection.admin.use_as_title = guess_title_field(&fields);
    collection.fields = fields;
    collection.access = options
        .access_override
        .clone()
        .unwrap_or_else(|| crate::collections::CollectionAccess::auth_default(&options.admin_role));
    collection
}

/// Append the schema fields an existing collection is missing. Fields the
/// host already declares are left exactly as declared.
fn augment(
    existing: &mut CollectionConfig,
    schema: &AuthSchema,
    model_key: &str,
    model: &AuthModel,
    options: &GenerateOptions,
) {
    for field in synthesize_fields(schema, model_key, model, options) {
        if !existing.has_field(&field.name) {
            existing.fields.push(field);
        }
    }
}

/// Produce the full collection set for a schema: host-defined collections
/// augmented in place, plus a synthesized collection for every model not
/// already covered and not skipped. The optional transform runs on each
/// newly synthesized collection before it is returned.
pub fn generate_collections(
    schema: &AuthSchema,
    existing: Vec<CollectionConfig>,
    options: &GenerateOptions,
) -> Vec<CollectionConfig> {
    let mut collections = existing;
    let by_slug: HashMap<String, usize> = collections
        .iter()
        .enumerate()
        .map(|(i, c)| (c.slug.clone(), i))
        .collect();

    let mut model_keys: Vec<&String> = schema.models.keys().collect();
    model_keys.sort();

    for key in model_keys {
        if options.skip_models.iter().any(|m| m == key) {
            continue;
        }
        let Some(model) = schema.get(key) else {
            continue;
        };
        let slug = slug_for(key, model, options);

        if let Some(&index) = by_slug.get(&slug) {
            augment(&mut collections[index], schema, key, model, options);
        } else {
            let mut collection = synthesize(schema, key, model, options);
            if let Some(transform) = &options.transform {
                collection = transform(collection);
            }
            collections.push(collection);
        }
    }

    collections
}
