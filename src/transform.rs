// Field, name, and value translation between the auth engine's relational
// conventions and the document store's.
//
// The engine speaks camelCase field names with `Id`-suffixed foreign keys
// and string identifiers; the store speaks relation fields without the
// suffix and identifiers in the adapter's resolved representation. The
// `Translator` carries the introspected schema plus the resolved ID type
// and rewrites records and filters in both directions. It holds no other
// state and every method is a pure function of its inputs.

use std::sync::Arc;

use chrono::SecondsFormat;

use crate::adapter::{Connector, Operator, WhereClause};
use crate::error::{PayloadAuthError, Result};
use crate::naming;
use crate::options::IdType;
use crate::schema::introspect::resolve_model;
use crate::schema::{AuthModel, AuthSchema, FieldType};
use crate::store::{DocWhere, FieldFilter};

/// Stateless name/value translator bound to one introspected schema and
/// one resolved ID representation.
#[derive(Debug, Clone)]
pub struct Translator {
    schema: Arc<AuthSchema>,
    id_type: IdType,
    use_plural: bool,
    convert_id_fields: Vec<String>,
    skip_id_fields: Vec<String>,
}

/// Coerce a single identifier value into the given representation.
///
/// Numeric mode parses pure-digit strings into integers and leaves every
/// other value untouched, so a non-numeric string (an external ID, say)
/// passes through unchanged. Text mode stringifies numbers. Applying the
/// coercion twice is a no-op.
pub fn coerce_to_id_type(value: &serde_json::Value, id_type: IdType) -> serde_json::Value {
    match id_type {
        IdType::Number => {
            if let Some(s) = value.as_str() {
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(n) = s.parse::<i64>() {
                        return serde_json::Value::from(n);
                    }
                }
            }
            value.clone()
        }
        IdType::Text => match value {
            serde_json::Value::Number(n) => serde_json::Value::String(n.to_string()),
            _ => value.clone(),
        },
    }
}

/// Normalize a date value to an RFC 3339 timestamp with millisecond
/// precision in UTC. Strings that do not parse pass through unchanged.
fn normalize_date(value: &serde_json::Value) -> serde_json::Value {
    if let Some(s) = value.as_str() {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return serde_json::Value::String(
                dt.with_timezone(&chrono::Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            );
        }
    } else if let Some(millis) = value.as_i64() {
        if let Some(dt) = chrono::DateTime::from_timestamp_millis(millis) {
            return serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
    }
    value.clone()
}

impl Translator {
    pub fn new(
        schema: Arc<AuthSchema>,
        id_type: IdType,
        use_plural: bool,
        convert_id_fields: Vec<String>,
        skip_id_fields: Vec<String>,
    ) -> Self {
        Self {
            schema,
            id_type,
            use_plural,
            convert_id_fields,
            skip_id_fields,
        }
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    fn model(&self, model: &str) -> Result<(&str, &AuthModel)> {
        resolve_model(&self.schema, model).ok_or_else(|| {
            PayloadAuthError::Config(format!("no schema model matching '{model}'"))
        })
    }

    /// Storage-side collection slug for a model key.
    pub fn collection_slug(&self, model: &str) -> Result<String> {
        let (key, def) = self.model(model)?;
        Ok(naming::collection_slug(key, def, self.use_plural))
    }

    /// Storage-side name for one field of a model.
    pub fn field_name(&self, model: &str, field: &str) -> Result<String> {
        let (_, def) = self.model(model)?;
        Ok(naming::field_name(def, field))
    }

    /// Whether the outbound coercion heuristic applies to a field name,
    /// after the allow and block lists have their say.
    fn should_coerce(&self, field: &str) -> bool {
        if self.skip_id_fields.iter().any(|f| f == field) {
            return false;
        }
        if self.convert_id_fields.iter().any(|f| f == field) {
            return true;
        }
        naming::looks_like_id_field(field)
    }

    fn is_reference(&self, def: &AuthModel, field: &str) -> bool {
        def.fields
            .get(field)
            .map_or(false, |f| f.references.is_some())
    }

    /// Rewrite an engine-side record into its storage shape: keys renamed,
    /// identifier values coerced, date values normalized.
    pub fn transform_inbound(&self, model: &str, data: serde_json::Value) -> Result<serde_json::Value> {
        let (_, def) = self.model(model)?;
        let serde_json::Value::Object(map) = data else {
            return Ok(data);
        };

        let mut out = serde_json::Map::with_capacity(map.len());
        for (key, value) in map {
            let storage_key = naming::field_name(def, &key);
            let value = if key == "id" || self.is_reference(def, &key) || self.should_coerce(&key)
            {
                coerce_to_id_type(&value, self.id_type)
            } else if matches!(
                def.fields.get(&key).map(|f| f.field_type),
                Some(FieldType::Date)
            ) {
                normalize_date(&value)
            } else {
                value
            };
            out.insert(storage_key, value);
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Rewrite a storage-side document back into the engine's shape.
    ///
    /// Reference fields keep their storage key and additionally regain the
    /// original suffixed key, so callers expecting either form find what
    /// they need. A relation expanded by the store into a nested document
    /// contributes its `id` to the suffixed key. Keys matching the ID
    /// heuristic are coerced into the resolved representation.
    pub fn transform_outbound(&self, model: &str, doc: serde_json::Value) -> Result<serde_json::Value> {
        let (_, def) = self.model(model)?;
        let serde_json::Value::Object(map) = doc else {
            return Ok(doc);
        };

        // storage name -> (engine field key, descriptor) for this model
        let mut by_storage: std::collections::HashMap<String, &str> =
            std::collections::HashMap::with_capacity(def.fields.len());
        for field_key in def.fields.keys() {
            by_storage.insert(naming::field_name(def, field_key), field_key.as_str());
        }

        let mut out = serde_json::Map::with_capacity(map.len());
        for (key, value) in map {
            let engine_key = by_storage.get(key.as_str()).copied();
            let field_def = engine_key.and_then(|k| def.fields.get(k));
            let is_reference = field_def.map_or(false, |f| f.references.is_some());

            if is_reference {
                let id_value = match &value {
                    serde_json::Value::Object(nested) => {
                        nested.get("id").cloned().unwrap_or(serde_json::Value::Null)
                    }
                    other => other.clone(),
                };
                let id_value = coerce_to_id_type(&id_value, self.id_type);
                if let Some(engine_key) = engine_key {
                    if engine_key != key {
                        out.insert(engine_key.to_string(), id_value.clone());
                    }
                }
                let short_value = if value.is_object() {
                    value
                } else {
                    id_value
                };
                out.insert(key, short_value);
                continue;
            }

            let value = if key != "id" && self.should_coerce(&key) {
                coerce_to_id_type(&value, self.id_type)
            } else if matches!(field_def.map(|f| f.field_type), Some(FieldType::Date)) {
                normalize_date(&value)
            } else {
                value
            };
            out.insert(key, value);
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Translate engine-side predicates into a store filter document.
    ///
    /// Predicates are partitioned by connector into one AND group and one
    /// OR group; nesting beyond that is not representable and not
    /// supported.
    pub fn translate_where(&self, model: &str, clauses: &[WhereClause]) -> Result<DocWhere> {
        let (_, def) = self.model(model)?;
        let mut doc = DocWhere::default();
        for clause in clauses {
            let storage_key = naming::field_name(def, &clause.field);
            let coerce = clause.field == "id"
                || self.is_reference(def, &clause.field)
                || self.should_coerce(&clause.field);
            let value = if coerce {
                match &clause.value {
                    serde_json::Value::Array(items) => serde_json::Value::Array(
                        items
                            .iter()
                            .map(|v| coerce_to_id_type(v, self.id_type))
                            .collect(),
                    ),
                    other => coerce_to_id_type(other, self.id_type),
                }
            } else {
                clause.value.clone()
            };
            let filter = FieldFilter {
                field: storage_key,
                operator: clause.operator,
                value,
            };
            match clause.connector {
                Some(Connector::Or) => doc.or.push(filter),
                Some(Connector::And) | None => doc.and.push(filter),
            }
        }
        Ok(doc)
    }

    /// Extract the coerced primary-key value from a point-lookup clause set.
    pub fn point_lookup_id(&self, clauses: &[WhereClause]) -> Option<serde_json::Value> {
        if !WhereClause::is_id_point_lookup(clauses) {
            return None;
        }
        clauses
            .first()
            .filter(|c| c.operator == Operator::Eq)
            .map(|c| coerce_to_id_type(&c.value, self.id_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translator(id_type: IdType) -> Translator {
        Translator::new(
            Arc::new(AuthSchema::core_schema()),
            id_type,
            true,
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_coerce_numeric_mode() {
        assert_eq!(coerce_to_id_type(&json!("42"), IdType::Number), json!(42));
        assert_eq!(coerce_to_id_type(&json!(42), IdType::Number), json!(42));
        assert_eq!(
            coerce_to_id_type(&json!("abc-123"), IdType::Number),
            json!("abc-123")
        );
        assert_eq!(coerce_to_id_type(&json!(""), IdType::Number), json!(""));
    }

    #[test]
    fn test_coerce_text_mode() {
        assert_eq!(coerce_to_id_type(&json!(42), IdType::Text), json!("42"));
        assert_eq!(coerce_to_id_type(&json!("abc"), IdType::Text), json!("abc"));
    }

    #[test]
    fn test_coerce_is_idempotent() {
        let once = coerce_to_id_type(&json!("42"), IdType::Number);
        let twice = coerce_to_id_type(&once, IdType::Number);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_inbound_strips_reference_suffix_and_coerces() {
        let t = translator(IdType::Number);
        let out = t
            .transform_inbound("session", json!({"userId": "42", "token": "abc"}))
            .unwrap();
        assert_eq!(out, json!({"user": 42, "token": "abc"}));
    }

    #[test]
    fn test_outbound_restores_suffixed_key() {
        let t = translator(IdType::Number);
        let out = t
            .transform_outbound("session", json!({"id": "7", "user": 42, "token": "abc"}))
            .unwrap();
        assert_eq!(out["user"], json!(42));
        assert_eq!(out["userId"], json!(42));
        assert_eq!(out["token"], json!("abc"));
        // plain "id" is outside the suffix heuristic
        assert_eq!(out["id"], json!("7"));
    }

    #[test]
    fn test_outbound_extracts_id_from_expanded_relation() {
        let t = translator(IdType::Number);
        let out = t
            .transform_outbound(
                "session",
                json!({"id": 1, "user": {"id": 42, "email": "a@b.c"}}),
            )
            .unwrap();
        assert_eq!(out["userId"], json!(42));
        assert_eq!(out["user"]["email"], json!("a@b.c"));
    }

    #[test]
    fn test_outbound_heuristic_respects_block_list() {
        let t = Translator::new(
            Arc::new(AuthSchema::core_schema()),
            IdType::Number,
            true,
            Vec::new(),
            vec!["externalId".to_string()],
        );
        let out = t
            .transform_outbound("user", json!({"externalId": "007"}))
            .unwrap();
        assert_eq!(out["externalId"], json!("007"));
    }

    #[test]
    fn test_outbound_allow_list_forces_coercion() {
        let t = Translator::new(
            Arc::new(AuthSchema::core_schema()),
            IdType::Number,
            true,
            vec!["legacyRef".to_string()],
            Vec::new(),
        );
        let out = t
            .transform_outbound("user", json!({"legacyRef": "9"}))
            .unwrap();
        assert_eq!(out["legacyRef"], json!(9));
    }

    #[test]
    fn test_translate_where_partitions_connectors() {
        let t = translator(IdType::Number);
        let clauses = vec![
            WhereClause::eq("token", "abc"),
            WhereClause::eq("userId", "42").or(),
        ];
        let doc = t.translate_where("session", &clauses).unwrap();
        assert_eq!(doc.and.len(), 1);
        assert_eq!(doc.and[0].field, "token");
        assert_eq!(doc.or.len(), 1);
        assert_eq!(doc.or[0].field, "user");
        assert_eq!(doc.or[0].value, json!(42));
    }

    #[test]
    fn test_translate_where_coerces_in_set() {
        let t = translator(IdType::Number);
        let clauses = vec![
            WhereClause::eq("id", json!(["1", "2"])).with_operator(Operator::In),
        ];
        let doc = t.translate_where("user", &clauses).unwrap();
        assert_eq!(doc.and[0].value, json!([1, 2]));
    }

    #[test]
    fn test_point_lookup_id() {
        let t = translator(IdType::Number);
        let clauses = vec![WhereClause::eq("id", "7")];
        assert_eq!(t.point_lookup_id(&clauses), Some(json!(7)));

        let clauses = vec![WhereClause::eq("token", "abc")];
        assert_eq!(t.point_lookup_id(&clauses), None);
    }

    #[test]
    fn test_collection_slug_respects_plural_flag() {
        let plural = translator(IdType::Number);
        assert_eq!(plural.collection_slug("user").unwrap(), "users");

        let singular = Translator::new(
            Arc::new(AuthSchema::core_schema()),
            IdType::Number,
            false,
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(singular.collection_slug("user").unwrap(), "user");
    }

    #[test]
    fn test_unknown_model_is_a_config_error() {
        let t = translator(IdType::Number);
        let err = t.collection_slug("banana").unwrap_err();
        assert!(matches!(err, PayloadAuthError::Config(_)));
    }
}
