// The adapter binding the auth engine's operation contract to a host
// document store.
//
// Construction resolves the ID representation and introspects the schema
// once; per-call state is limited to the translated query. The store
// client is resolved lazily on first use, with concurrent first callers
// sharing a single resolution attempt.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::adapter::{AuthAdapter, FindManyQuery, SortDirection, WhereClause};
use crate::error::Result;
use crate::options::{IdType, PayloadAdapterConfig};
use crate::schema::introspect::{build_schema, AuthEngineOptions};
use crate::store::{FindArgs, PayloadClient};
use crate::transform::Translator;

/// Authorization bypass passed on every store call. The auth engine is
/// its own authorization authority; re-applying the host application's
/// access rules inside this layer would block legitimate auth operations.
/// Callers outside the auth engine must never reach these operations.
pub const OVERRIDE_ACCESS: bool = true;

/// Callback producing the store client on first use.
pub type ClientResolver = Arc<
    dyn Fn() -> Pin<Box<dyn Future<Output = Result<Arc<dyn PayloadClient>>> + Send>>
        + Send
        + Sync,
>;

/// Schema-driven adapter between the auth engine and a document store.
pub struct PayloadAdapter {
    translator: Translator,
    debug_logs: bool,
    default_limit: i64,
    resolver: ClientResolver,
    client: OnceCell<Arc<dyn PayloadClient>>,
    warnings: Vec<String>,
}

impl std::fmt::Debug for PayloadAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadAdapter")
            .field("id_type", &self.translator.id_type())
            .field("debug_logs", &self.debug_logs)
            .field("client_resolved", &self.client.initialized())
            .field("warnings", &self.warnings)
            .finish()
    }
}

impl PayloadAdapter {
    /// Build an adapter from the auth engine's declarative options.
    ///
    /// The ID representation comes from explicit configuration when set,
    /// otherwise it is inferred from the engine's ID-generation strategy
    /// (engine-generated string IDs imply text mode, serial IDs numeric).
    /// Configuration inconsistencies are logged as warnings and collected
    /// on the adapter; they never fail construction.
    pub fn new(
        engine: &AuthEngineOptions,
        config: PayloadAdapterConfig,
        resolver: ClientResolver,
    ) -> Self {
        let schema = Arc::new(build_schema(engine));
        let id_type = config.id_type.unwrap_or(if engine.generate_id.generates_string_ids() {
            IdType::Text
        } else {
            IdType::Number
        });

        let warnings = construction_warnings(engine, &config, id_type);
        for warning in &warnings {
            tracing::warn!("[Payload Adapter] {warning}");
        }

        Self {
            translator: Translator::new(
                schema,
                id_type,
                config.use_plural,
                config.convert_id_fields,
                config.skip_id_fields,
            ),
            debug_logs: config.debug_logs,
            default_limit: config.default_limit,
            resolver,
            client: OnceCell::new(),
            warnings,
        }
    }

    /// Build an adapter around an already-constructed store client.
    pub fn with_client(
        engine: &AuthEngineOptions,
        config: PayloadAdapterConfig,
        client: Arc<dyn PayloadClient>,
    ) -> Self {
        let resolver: ClientResolver = Arc::new(move || {
            let client = Arc::clone(&client);
            Box::pin(async move { Ok(client) })
        });
        Self::new(engine, config, resolver)
    }

    /// Construction-time configuration warnings, in emission order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The ID representation every identifier is coerced to.
    pub fn id_type(&self) -> IdType {
        self.translator.id_type()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    async fn client(&self) -> Result<&Arc<dyn PayloadClient>> {
        self.client.get_or_try_init(|| (self.resolver)()).await
    }

    fn debug(&self, operation: &str, model: &str, collection: &str, detail: &serde_json::Value) {
        if self.debug_logs {
            tracing::debug!(
                "[Payload Adapter] {operation} on '{model}' (collection '{collection}'): {detail}"
            );
        }
    }

    /// Merge the store's translated result over the caller's input: store
    /// values win on overlapping keys, input keys absent from the result
    /// survive.
    fn merge_result(
        &self,
        input: serde_json::Value,
        result: serde_json::Value,
    ) -> serde_json::Value {
        let Some(result_map) = result.as_object() else {
            return result;
        };
        let serde_json::Value::Object(mut merged) = input else {
            return result;
        };
        for (k, v) in result_map {
            merged.insert(k.clone(), v.clone());
        }
        serde_json::Value::Object(merged)
    }
}

fn construction_warnings(
    engine: &AuthEngineOptions,
    config: &PayloadAdapterConfig,
    id_type: IdType,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if id_type == IdType::Number && engine.generate_id.generates_string_ids() {
        warnings.push(
            "ID type is 'number' but the auth engine generates its own string IDs; \
             generated IDs will not coerce and lookups may miss"
                .to_string(),
        );
    }

    if config.use_plural {
        for (key, rename) in engine.model_renames() {
            if rename.ends_with('s') {
                warnings.push(format!(
                    "model '{key}' is renamed to already-plural '{rename}' while \
                     pluralization is enabled; the collection slug will be '{}'",
                    crate::naming::pluralize(&rename),
                ));
            }
        }
    }

    warnings
}

fn apply_select(doc: serde_json::Value, select: Option<&[String]>) -> serde_json::Value {
    let Some(fields) = select else {
        return doc;
    };
    let serde_json::Value::Object(map) = doc else {
        return doc;
    };
    let picked = map
        .into_iter()
        .filter(|(k, _)| k == "id" || fields.iter().any(|f| f == k))
        .collect();
    serde_json::Value::Object(picked)
}

fn sort_expression(translator: &Translator, model: &str, sort: &crate::adapter::SortBy) -> Result<String> {
    let field = translator.field_name(model, &sort.field)?;
    Ok(match sort.direction {
        SortDirection::Asc => field,
        SortDirection::Desc => format!("-{field}"),
    })
}

#[async_trait]
impl AuthAdapter for PayloadAdapter {
    async fn create(&self, model: &str, data: serde_json::Value) -> Result<serde_json::Value> {
        let collection = self.translator.collection_slug(model)?;
        let inbound = self.translator.transform_inbound(model, data.clone())?;
        self.debug("CREATE", model, &collection, &inbound);

        let client = self.client().await?;
        let doc = client
            .create(&collection, inbound, OVERRIDE_ACCESS)
            .await
            .map_err(|e| e.in_operation("create", model, &collection))?;

        let outbound = self.translator.transform_outbound(model, doc)?;
        Ok(self.merge_result(data, outbound))
    }

    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        select: Option<&[String]>,
        join: bool,
    ) -> Result<Option<serde_json::Value>> {
        let collection = self.translator.collection_slug(model)?;
        let depth = if join { 1 } else { 0 };

        if let Some(id) = self.translator.point_lookup_id(where_clauses) {
            self.debug("FIND_ONE (by id)", model, &collection, &id);
            let client = self.client().await?;
            return match client.find_by_id(&collection, &id, depth, OVERRIDE_ACCESS).await {
                Ok(doc) => {
                    let outbound = self.translator.transform_outbound(model, doc)?;
                    Ok(Some(apply_select(outbound, select)))
                }
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e.in_operation("findOne", model, &collection)),
            };
        }

        let where_doc = self.translator.translate_where(model, where_clauses)?;
        self.debug(
            "FIND_ONE",
            model,
            &collection,
            &serde_json::to_value(&where_doc).unwrap_or_default(),
        );
        let args = FindArgs {
            where_doc,
            limit: Some(1),
            page: Some(1),
            sort: None,
            depth,
        };
        let client = self.client().await?;
        let result = client
            .find(&collection, args, OVERRIDE_ACCESS)
            .await
            .map_err(|e| e.in_operation("findOne", model, &collection))?;

        match result.docs.into_iter().next() {
            Some(doc) => {
                let outbound = self.translator.transform_outbound(model, doc)?;
                Ok(Some(apply_select(outbound, select)))
            }
            None => Ok(None),
        }
    }

    async fn find_many(
        &self,
        model: &str,
        query: FindManyQuery,
    ) -> Result<Vec<serde_json::Value>> {
        let collection = self.translator.collection_slug(model)?;
        let where_doc = self.translator.translate_where(model, &query.where_clauses)?;

        let limit = query.limit.unwrap_or(self.default_limit);
        // Page-oriented store: offsets that are not an exact multiple of
        // the limit round down to the containing page.
        let page = if limit > 0 {
            query.offset.unwrap_or(0) / limit + 1
        } else {
            1
        };
        let sort = match &query.sort_by {
            Some(s) => Some(sort_expression(&self.translator, model, s)?),
            None => None,
        };

        let args = FindArgs {
            where_doc,
            limit: Some(limit),
            page: Some(page),
            sort,
            depth: if query.join { 1 } else { 0 },
        };
        self.debug(
            "FIND_MANY",
            model,
            &collection,
            &serde_json::to_value(&args).unwrap_or_default(),
        );

        let client = self.client().await?;
        let result = client
            .find(&collection, args, OVERRIDE_ACCESS)
            .await
            .map_err(|e| e.in_operation("findMany", model, &collection))?;

        let select = query.select.as_deref();
        result
            .docs
            .into_iter()
            .map(|doc| {
                self.translator
                    .transform_outbound(model, doc)
                    .map(|d| apply_select(d, select))
            })
            .collect()
    }

    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> Result<Option<serde_json::Value>> {
        let collection = self.translator.collection_slug(model)?;
        let inbound = self.translator.transform_inbound(model, data.clone())?;
        self.debug("UPDATE", model, &collection, &inbound);
        let client = self.client().await?;

        let doc = if let Some(id) = self.translator.point_lookup_id(where_clauses) {
            match client
                .update_by_id(&collection, &id, inbound, OVERRIDE_ACCESS)
                .await
            {
                Ok(doc) => Some(doc),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.in_operation("update", model, &collection)),
            }
        } else {
            let where_doc = self.translator.translate_where(model, where_clauses)?;
            client
                .update_where(&collection, &where_doc, inbound, OVERRIDE_ACCESS)
                .await
                .map_err(|e| e.in_operation("update", model, &collection))?
                .into_iter()
                .next()
        };

        match doc {
            Some(doc) => {
                let outbound = self.translator.transform_outbound(model, doc)?;
                Ok(Some(self.merge_result(data, outbound)))
            }
            None => Ok(None),
        }
    }

    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> Result<i64> {
        let collection = self.translator.collection_slug(model)?;
        let inbound = self.translator.transform_inbound(model, data)?;
        let where_doc = self.translator.translate_where(model, where_clauses)?;
        self.debug("UPDATE_MANY", model, &collection, &inbound);

        let client = self.client().await?;
        let updated = client
            .update_where(&collection, &where_doc, inbound, OVERRIDE_ACCESS)
            .await
            .map_err(|e| e.in_operation("updateMany", model, &collection))?;
        Ok(updated.len() as i64)
    }

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> Result<()> {
        let collection = self.translator.collection_slug(model)?;
        let client = self.client().await?;

        if let Some(id) = self.translator.point_lookup_id(where_clauses) {
            self.debug("DELETE (by id)", model, &collection, &id);
            return match client.delete_by_id(&collection, &id, OVERRIDE_ACCESS).await {
                Ok(()) => Ok(()),
                Err(e) if e.is_not_found() => Ok(()),
                Err(e) => Err(e.in_operation("delete", model, &collection)),
            };
        }

        let where_doc = self.translator.translate_where(model, where_clauses)?;
        self.debug(
            "DELETE",
            model,
            &collection,
            &serde_json::to_value(&where_doc).unwrap_or_default(),
        );
        client
            .delete_where(&collection, &where_doc, OVERRIDE_ACCESS)
            .await
            .map_err(|e| e.in_operation("delete", model, &collection))?;
        Ok(())
    }

    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> Result<i64> {
        let collection = self.translator.collection_slug(model)?;
        let where_doc = self.translator.translate_where(model, where_clauses)?;
        self.debug(
            "DELETE_MANY",
            model,
            &collection,
            &serde_json::to_value(&where_doc).unwrap_or_default(),
        );

        let client = self.client().await?;
        client
            .delete_where(&collection, &where_doc, OVERRIDE_ACCESS)
            .await
            .map_err(|e| e.in_operation("deleteMany", model, &collection))
    }

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> Result<i64> {
        let collection = self.translator.collection_slug(model)?;
        let where_doc = self.translator.translate_where(model, where_clauses)?;

        let client = self.client().await?;
        client
            .count(&collection, &where_doc, OVERRIDE_ACCESS)
            .await
            .map_err(|e| e.in_operation("count", model, &collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn adapter_with_memory(id_type: IdType) -> PayloadAdapter {
        let store = Arc::new(MemoryStore::new(id_type));
        PayloadAdapter::with_client(
            &AuthEngineOptions::default(),
            PayloadAdapterConfig::default().id_type(id_type),
            store,
        )
    }

    #[tokio::test]
    async fn test_create_strips_reference_and_restores_it() {
        let adapter = adapter_with_memory(IdType::Number);
        let created = adapter
            .create("session", json!({"userId": "42", "token": "abc"}))
            .await
            .unwrap();
        assert_eq!(created["userId"], json!(42));
        assert_eq!(created["user"], json!(42));
        assert_eq!(created["token"], json!("abc"));
        assert!(created.get("id").is_some());
    }

    #[tokio::test]
    async fn test_find_one_missing_is_none() {
        let adapter = adapter_with_memory(IdType::Number);
        let found = adapter
            .find_one("user", &[WhereClause::eq("id", "99")], None, false)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_point_lookup_matches_filtered_query() {
        let adapter = adapter_with_memory(IdType::Number);
        let created = adapter
            .create("user", json!({"email": "a@b.c", "name": "Alice"}))
            .await
            .unwrap();
        let id = created["id"].clone();

        let by_point = adapter
            .find_one("user", &[WhereClause::eq("id", id.clone())], None, false)
            .await
            .unwrap()
            .unwrap();
        let by_filter = adapter
            .find_many(
                "user",
                FindManyQuery {
                    where_clauses: vec![WhereClause::eq("id", id)],
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_point, by_filter[0]);
    }

    #[tokio::test]
    async fn test_find_many_offset_rounds_to_page() {
        let adapter = adapter_with_memory(IdType::Number);
        for i in 0..5 {
            adapter
                .create("user", json!({"email": format!("u{i}@t.c"), "name": format!("u{i}")}))
                .await
                .unwrap();
        }
        let page_two = adapter
            .find_many(
                "user",
                FindManyQuery {
                    limit: Some(2),
                    offset: Some(2),
                    sort_by: Some(crate::adapter::SortBy {
                        field: "email".into(),
                        direction: SortDirection::Asc,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page_two.len(), 2);
        assert_eq!(page_two[0]["email"], json!("u2@t.c"));
    }

    #[tokio::test]
    async fn test_update_merges_store_result_over_patch() {
        let adapter = adapter_with_memory(IdType::Number);
        let created = adapter
            .create("user", json!({"email": "a@b.c", "name": "Alice"}))
            .await
            .unwrap();
        let updated = adapter
            .update(
                "user",
                &[WhereClause::eq("id", created["id"].clone())],
                json!({"name": "Alicia"}),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["name"], json!("Alicia"));
        assert_eq!(updated["email"], json!("a@b.c"));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let adapter = adapter_with_memory(IdType::Number);
        adapter
            .delete("user", &[WhereClause::eq("id", "99")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_many_returns_count() {
        let adapter = adapter_with_memory(IdType::Number);
        let user = adapter
            .create("user", json!({"email": "a@b.c", "name": "A"}))
            .await
            .unwrap();
        for token in ["t1", "t2"] {
            adapter
                .create(
                    "session",
                    json!({"userId": user["id"], "token": token}),
                )
                .await
                .unwrap();
        }
        let deleted = adapter
            .delete_many("session", &[WhereClause::eq("userId", user["id"].clone())])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(adapter.count("session", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lazy_resolver_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_inner = Arc::clone(&calls);
        let resolver: ClientResolver = Arc::new(move || {
            let calls = Arc::clone(&calls_inner);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(MemoryStore::new(IdType::Number)) as Arc<dyn PayloadClient>)
            })
        });
        let adapter = Arc::new(PayloadAdapter::new(
            &AuthEngineOptions::default(),
            PayloadAdapterConfig::default(),
            resolver,
        ));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let adapter = Arc::clone(&adapter);
            handles.push(tokio::spawn(async move {
                adapter.count("user", &[]).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_plural_rename_warns_once() {
        use crate::schema::introspect::ModelOverride;

        let engine = AuthEngineOptions {
            user: ModelOverride {
                model_name: Some("members".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let adapter = PayloadAdapter::with_client(
            &engine,
            PayloadAdapterConfig::default(),
            Arc::new(MemoryStore::new(IdType::Number)),
        );
        let relevant: Vec<_> = adapter
            .warnings()
            .iter()
            .filter(|w| w.contains("user"))
            .collect();
        assert_eq!(relevant.len(), 1);
    }

    #[tokio::test]
    async fn test_id_type_mismatch_warns() {
        use crate::schema::introspect::GenerateIdStrategy;

        let engine = AuthEngineOptions {
            generate_id: GenerateIdStrategy::Uuid,
            ..Default::default()
        };
        let adapter = PayloadAdapter::with_client(
            &engine,
            PayloadAdapterConfig::default().id_type(IdType::Number),
            Arc::new(MemoryStore::new(IdType::Number)),
        );
        assert_eq!(adapter.warnings().len(), 1);
    }
}
