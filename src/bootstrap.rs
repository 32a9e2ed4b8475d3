//! Wiring shared by the server binary and the CLI.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use libris_store::Store;

use crate::modules;
use crate::repository::LibraryRepository;

/// Open the configured store and make sure it holds a usable library.
pub async fn open_repository(settings: &Settings) -> anyhow::Result<LibraryRepository> {
    let store = Store::from_settings(&settings.storage)
        .await
        .with_context(|| format!("failed to open {:?} store", settings.storage.backend))?;

    let repository = LibraryRepository::new(Arc::new(store));
    repository
        .hydrate()
        .await
        .context("failed to prepare library data")?;
    Ok(repository)
}

/// Core `store` module plus every page module, sharing one repository.
pub fn build_registry(settings: &Settings, repository: &LibraryRepository) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_core(libris_store::create_module(repository.store().clone()));
    modules::register_all(&mut registry, repository, settings);
    registry
}

/// The full HTTP application over `repository`, without binding a socket.
pub fn router(settings: &Settings, repository: &LibraryRepository) -> Router {
    let registry = build_registry(settings, repository);
    libris_http::build_router(&registry, settings)
}

/// Run the HTTP server until Ctrl-C / SIGTERM, driving the module lifecycle around it.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        storage = ?settings.storage.backend,
        "libris bootstrap starting"
    );

    let repository = open_repository(&settings).await?;
    let registry = build_registry(&settings, &repository);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;
    tracing::info!(modules = ?registry.module_names(), "libris bootstrap complete");

    let served =
        libris_http::start_server(&registry, &settings, libris_http::shutdown_signal()).await;

    let stopped = registry.stop_all().await;
    served?;
    stopped
}
