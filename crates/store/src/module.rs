use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use libris_kernel::{InitCtx, Module};
use serde_json::json;

use crate::Store;

/// Core module exposing the shared store to the lifecycle and a health probe.
pub struct StoreModule {
    store: Arc<Store>,
}

impl StoreModule {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for StoreModule {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let keys = self.store.snapshot().await.len();
        tracing::info!(
            module = self.name(),
            backend = self.store.backend_name(),
            configured = ?ctx.settings.storage.backend,
            keys,
            "store module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Store health check",
                        "tags": ["Store"],
                        "responses": {
                            "200": {
                                "description": "Backend name and the document keys currently held",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "object" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "store module stopped");
        Ok(())
    }
}

async fn health_check(State(store): State<Arc<Store>>) -> Json<serde_json::Value> {
    let keys: Vec<String> = store.snapshot().await.into_keys().collect();
    Json(json!({
        "backend": store.backend_name(),
        "keys": keys,
    }))
}

pub fn create_module(store: Arc<Store>) -> Arc<dyn Module> {
    Arc::new(StoreModule::new(store))
}
