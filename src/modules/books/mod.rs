pub mod catalog;
pub mod models;
mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Module};
use serde_json::json;

use crate::repository::LibraryRepository;

/// Catalog page: CRUD over the books document with search and status filters.
pub struct BooksModule {
    repository: LibraryRepository,
}

impl BooksModule {
    pub fn new(repository: LibraryRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let library = self.repository.load().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = library.books.len(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.repository.clone())
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
        let book = json!({
            "description": "The book",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
            }
        });
        let draft_body = json!({
            "required": true,
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/BookDraft" } }
            }
        });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "search",
                                "in": "query",
                                "required": false,
                                "description": "Case-insensitive match on title, author or ISBN",
                                "schema": { "type": "string" }
                            },
                            {
                                "name": "status",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "string", "enum": ["all", "available", "borrowed"] }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "401": error("Not logged in")
                        }
                    },
                    "post": {
                        "summary": "Add a book",
                        "tags": ["Books"],
                        "requestBody": draft_body,
                        "responses": {
                            "201": book,
                            "401": error("Not logged in"),
                            "422": error("Validation error")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": book,
                            "404": error("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "requestBody": draft_body,
                        "responses": {
                            "200": book,
                            "404": error("Book not found"),
                            "409": error("Status contradicts the borrow records"),
                            "422": error("Validation error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
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
                            "200": book,
                            "400": error("Deletion not confirmed"),
                            "404": error("Book not found"),
                            "409": error("Book is on loan")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
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
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "imageUrl": { "type": "string" },
                            "status": { "type": "string", "enum": ["available", "borrowed"] },
                            "price": { "type": "string", "description": "Decimal amount" },
                            "isbn": { "type": "string" },
                            "publisher": { "type": "string" },
                            "publishedYear": { "type": ["integer", "null"] },
                            "description": { "type": "string" },
                            "genre": { "type": "string" },
                            "pages": { "type": ["integer", "null"] }
                        },
                        "required": ["id", "title", "author", "status", "price"]
                    },
                    "BookDraft": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "imageUrl": { "type": "string" },
                            "status": {
                                "type": "string",
                                "enum": ["available", "borrowed"],
                                "description": "Ignored on create; must match the borrow records on update"
                            },
                            "price": { "type": ["number", "string"] },
                            "isbn": { "type": "string" },
                            "publisher": { "type": "string" },
                            "publishedYear": { "type": ["integer", "string"] },
                            "description": { "type": "string" },
                            "genre": { "type": "string" },
                            "pages": { "type": ["integer", "string"] }
                        },
                        "required": ["title", "author"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(repository: LibraryRepository) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository))
}
