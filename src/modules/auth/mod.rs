use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use libris_authz::{clear_authenticated, is_authenticated, mark_authenticated};
use libris_http::error::AppError;
use libris_http::extract::Json;
use libris_kernel::{settings::AuthSettings, InitCtx, Module};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

/// Login page: a fixed credential pair from configuration opens the session gate.
pub struct AuthModule {
    credentials: Arc<AuthSettings>,
}

impl AuthModule {
    pub fn new(credentials: AuthSettings) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct SessionStatus {
    authenticated: bool,
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            username = %self.credentials.username,
            session_ttl_secs = self.credentials.session_ttl_secs,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/session", get(session_status))
            .route("/health", get(health_check))
            .with_state(self.credentials.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let status = json!({
            "description": "Session state",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/SessionStatus" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/login": {
                    "post": {
                        "summary": "Log in with the configured credentials",
                        "tags": ["Auth"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "username": { "type": "string" },
                                            "password": { "type": "string" }
                                        },
                                        "required": ["username", "password"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": status,
                            "401": {
                                "description": "Invalid credentials",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/logout": {
                    "post": {
                        "summary": "Log out",
                        "tags": ["Auth"],
                        "responses": { "200": status }
                    }
                },
                "/session": {
                    "get": {
                        "summary": "Whether this session is logged in",
                        "tags": ["Auth"],
                        "responses": { "200": status }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Auth health check",
                        "tags": ["Auth"],
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
                    "SessionStatus": {
                        "type": "object",
                        "properties": { "authenticated": { "type": "boolean" } },
                        "required": ["authenticated"]
                    }
                }
            }
        }))
    }
}

async fn health_check() -> &'static str {
    "auth module is healthy"
}

async fn login(
    State(credentials): State<Arc<AuthSettings>>,
    session: Session,
    Json(attempt): Json<Credentials>,
) -> Result<Json<SessionStatus>, AppError> {
    let accepted = attempt.username == credentials.username
        && attempt.password == credentials.password.expose_secret();

    if !accepted {
        tracing::warn!(username = %attempt.username, "login rejected");
        return Err(AppError::unauthorized("invalid username or password"));
    }

    mark_authenticated(&session)
        .await
        .context("failed to store the session flag")?;
    tracing::info!(username = %attempt.username, "login accepted");

    Ok(Json(SessionStatus {
        authenticated: true,
    }))
}

async fn logout(session: Session) -> Result<Json<SessionStatus>, AppError> {
    clear_authenticated(&session)
        .await
        .context("failed to clear the session flag")?;
    tracing::info!("logged out");

    Ok(Json(SessionStatus {
        authenticated: false,
    }))
}

async fn session_status(session: Session) -> Json<SessionStatus> {
    Json(SessionStatus {
        authenticated: is_authenticated(&session).await,
    })
}

pub fn create_module(credentials: AuthSettings) -> Arc<dyn Module> {
    Arc::new(AuthModule::new(credentials))
}
