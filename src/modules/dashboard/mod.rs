pub mod stats;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, middleware, routing::get, Json, Router};
use libris_authz::require_authenticated;
use libris_http::error::AppError;
use libris_kernel::Module;
use serde_json::json;

use crate::repository::LibraryRepository;
use crate::utils;
use stats::DashboardStats;

/// Landing page after login: catalog and loan figures.
pub struct DashboardModule {
    repository: LibraryRepository,
}

impl DashboardModule {
    pub fn new(repository: LibraryRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Module for DashboardModule {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(dashboard))
            .route_layer(middleware::from_fn(require_authenticated))
            .route("/health", get(health_check))
            .with_state(self.repository.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Catalog and loan statistics",
                        "tags": ["Dashboard"],
                        "responses": {
                            "200": {
                                "description": "Figures recomputed from the current library",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/DashboardStats" }
                                    }
                                }
                            },
                            "401": {
                                "description": "Not logged in",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Dashboard health check",
                        "tags": ["Dashboard"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "DashboardStats": {
                        "type": "object",
                        "properties": {
                            "totalBooks": { "type": "integer" },
                            "borrowedBooks": { "type": "integer" },
                            "availableBooks": { "type": "integer" },
                            "pendingReturns": { "type": "integer" },
                            "pendingBorrowers": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "integer" },
                                        "name": { "type": "string" },
                                        "email": { "type": "string" },
                                        "membershipId": { "type": "string" },
                                        "pendingCount": { "type": "integer" },
                                        "pendingBooks": {
                                            "type": "array",
                                            "items": {
                                                "type": "object",
                                                "properties": {
                                                    "id": { "type": "string" },
                                                    "title": { "type": "string" },
                                                    "returnDate": { "type": "string", "format": "date" },
                                                    "overdue": { "type": "boolean" }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        },
                        "required": [
                            "totalBooks",
                            "borrowedBooks",
                            "availableBooks",
                            "pendingReturns",
                            "pendingBorrowers"
                        ]
                    }
                }
            }
        }))
    }
}

async fn health_check() -> &'static str {
    "dashboard module is healthy"
}

async fn dashboard(
    State(repository): State<LibraryRepository>,
) -> Result<Json<DashboardStats>, AppError> {
    let library = repository.load().await?;
    Ok(Json(DashboardStats::compute(&library, utils::today())))
}

pub fn create_module(repository: LibraryRepository) -> Arc<dyn Module> {
    Arc::new(DashboardModule::new(repository))
}
