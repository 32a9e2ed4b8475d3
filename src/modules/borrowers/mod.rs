pub mod models;
pub mod records;
mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Module};
use serde_json::json;

use crate::repository::LibraryRepository;

/// Records page: borrowers, their checked-out books, due dates and bills.
pub struct BorrowersModule {
    repository: LibraryRepository,
    loan_period_days: u32,
}

impl BorrowersModule {
    pub fn new(repository: LibraryRepository, loan_period_days: u32) -> Self {
        Self {
            repository,
            loan_period_days,
        }
    }
}

#[async_trait]
impl Module for BorrowersModule {
    fn name(&self) -> &'static str {
        "borrowers"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let library = self.repository.load().await?;
        let pending = library
            .borrowers
            .iter()
            .filter(|borrower| borrower.has_pending())
            .count();
        tracing::info!(
            module = self.name(),
            borrowers = library.borrowers.len(),
            pending,
            loan_period_days = self.loan_period_days,
            "borrowers module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(routes::BorrowersState {
            repository: self.repository.clone(),
            loan_period_days: self.loan_period_days,
        })
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let borrower = json!({
            "description": "The borrower with derived status",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Borrower" } }
            }
        });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List borrowers",
                        "tags": ["Borrowers"],
                        "parameters": [
                            {
                                "name": "search",
                                "in": "query",
                                "required": false,
                                "description": "Case-insensitive match on name, email or membership id",
                                "schema": { "type": "string" }
                            },
                            {
                                "name": "status",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "string", "enum": ["all", "pending", "clear"] }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching borrowers",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Borrower" }
                                        }
                                    }
                                }
                            },
                            "401": error("Not logged in")
                        }
                    },
                    "post": {
                        "summary": "Register a borrower and check out books",
                        "tags": ["Borrowers"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/NewBorrower" }
                                }
                            }
                        },
                        "responses": {
                            "201": borrower,
                            "404": error("Selected book not found"),
                            "409": error("Selected book already on loan"),
                            "422": error("Validation error")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a borrower",
                        "tags": ["Borrowers"],
                        "parameters": [id_param],
                        "responses": {
                            "200": borrower,
                            "404": error("Borrower not found")
                        }
                    },
                    "put": {
                        "summary": "Edit contact details and returned flags",
                        "tags": ["Borrowers"],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BorrowerUpdate" }
                                }
                            }
                        },
                        "responses": {
                            "200": borrower,
                            "404": error("Borrower not found"),
                            "409": error("Book is on loan to another borrower"),
                            "422": error("Validation error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a borrower and release their books",
                        "tags": ["Borrowers"],
                        "parameters": [
                            id_param,
                            {
                                "name": "confirm",
                                "in": "query",
                                "required": true,
                                "schema": { "type": "boolean" }
                            }
                        ],
                        "responses": {
                            "200": borrower,
                            "400": error("Deletion not confirmed"),
                            "404": error("Borrower not found")
                        }
                    }
                },
                "/{id}/books/{bookId}/toggle": {
                    "post": {
                        "summary": "Flip the returned flag of one borrowed book",
                        "tags": ["Borrowers"],
                        "parameters": [
                            id_param,
                            {
                                "name": "bookId",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string" }
                            }
                        ],
                        "responses": {
                            "200": borrower,
                            "404": error("Borrower or entry not found"),
                            "409": error("Book is on loan to another borrower")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Borrowers health check",
                        "tags": ["Borrowers"],
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
                    "BorrowedBookEntry": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Catalog id of the book" },
                            "title": { "type": "string" },
                            "returnDate": { "type": "string", "format": "date" },
                            "returned": { "type": "boolean" }
                        },
                        "required": ["id", "title", "returnDate", "returned"]
                    },
                    "Borrower": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "phone": { "type": "string" },
                            "address": { "type": "string" },
                            "membershipId": { "type": "string" },
                            "totalBill": { "type": "string", "description": "Decimal amount" },
                            "borrowedBooks": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/BorrowedBookEntry" }
                            },
                            "pendingCount": { "type": "integer" },
                            "statusLabel": { "type": "string" }
                        },
                        "required": ["id", "name", "email", "membershipId", "totalBill", "borrowedBooks"]
                    },
                    "NewBorrower": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "phone": { "type": "string" },
                            "address": { "type": "string" },
                            "membershipId": { "type": "string" },
                            "selectedBooks": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["name", "email", "phone", "address"]
                    },
                    "BorrowerUpdate": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "phone": { "type": "string" },
                            "address": { "type": "string" },
                            "returns": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "bookId": { "type": "string" },
                                        "returned": { "type": "boolean" }
                                    },
                                    "required": ["bookId", "returned"]
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "borrowers module stopped");
        Ok(())
    }
}

pub fn create_module(repository: LibraryRepository, loan_period_days: u32) -> Arc<dyn Module> {
    Arc::new(BorrowersModule::new(repository, loan_period_days))
}
