// First-registered-user elevation: a create hook for the identity
// collection that promotes the very first document to the elevated role.
// The existence check bypasses host authorization; its failure degrades to
// the default role so a store hiccup never blocks registration.

use std::sync::Arc;

use crate::collections::CreateHook;
use crate::payload::OVERRIDE_ACCESS;
use crate::store::{DocWhere, PayloadClient};

/// Role assignment policy for the identity collection's create pipeline.
#[derive(Debug, Clone)]
pub struct FirstUserElevation {
    /// Field carrying the role value.
    pub role_field: String,
    /// Role forced onto the first-ever document.
    pub elevated_role: String,
    /// Role applied when the caller supplies none. `None` leaves the
    /// field absent.
    pub default_role: Option<String>,
}

impl Default for FirstUserElevation {
    fn default() -> Self {
        Self {
            role_field: "role".to_string(),
            elevated_role: "admin".to_string(),
            default_role: Some("user".to_string()),
        }
    }
}

/// Build the create hook implementing the policy.
pub fn first_user_elevation_hook(policy: FirstUserElevation) -> CreateHook {
    Arc::new(
        move |client: &dyn PayloadClient, collection: &str, mut data: serde_json::Value| {
            let policy = policy.clone();
            Box::pin(async move {
                let is_first = match client
                    .count(collection, &DocWhere::default(), OVERRIDE_ACCESS)
                    .await
                {
                    Ok(count) => count == 0,
                    Err(e) => {
                        tracing::warn!(
                            "[Payload Adapter] first-user check on '{collection}' failed, \
                             keeping default role: {e}"
                        );
                        false
                    }
                };

                if let Some(doc) = data.as_object_mut() {
                    if is_first {
                        doc.insert(
                            policy.role_field.clone(),
                            serde_json::Value::String(policy.elevated_role.clone()),
                        );
                    } else if !doc.contains_key(&policy.role_field) {
                        if let Some(default_role) = &policy.default_role {
                            doc.insert(
                                policy.role_field.clone(),
                                serde_json::Value::String(default_role.clone()),
                            );
                        }
                    }
                }
                Ok(data)
            })
        },
    )
}
