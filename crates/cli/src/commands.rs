use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use libris_app::remote::MockApiClient;
use libris_app::{bootstrap, seed, utils, DashboardStats, LibraryRepository};
use libris_kernel::settings::Settings;
use libris_store::Store;

/// Repository over the configured store, as persisted: no seeding, no repair.
///
/// With `strict`, an unreadable document is an error instead of an empty store.
async fn raw_repository(settings: &Settings, strict: bool) -> anyhow::Result<LibraryRepository> {
    let backend = libris_store::backend_for(&settings.storage);
    let store = if strict {
        Store::open(backend).await
    } else {
        Store::open_or_reset(backend).await
    }
    .with_context(|| format!("failed to open {:?} store", settings.storage.backend))?;
    Ok(LibraryRepository::new(Arc::new(store)))
}

pub async fn seed(settings: &Settings) -> anyhow::Result<ExitCode> {
    let repository = raw_repository(settings, false).await?;
    let library = repository
        .replace(seed::sample_library())
        .await
        .context("failed to write sample data")?;

    println!(
        "seeded {} books and {} borrowers",
        library.books.len(),
        library.borrowers.len()
    );
    Ok(ExitCode::SUCCESS)
}

pub async fn import(settings: &Settings) -> anyhow::Result<ExitCode> {
    let client = MockApiClient::new(&settings.remote)?;
    let fetched = client
        .fetch_library()
        .await
        .with_context(|| format!("failed to fetch library from {}", client.base_url()))?;

    let drifted = fetched.violations().len();
    let repository = raw_repository(settings, false).await?;
    let library = repository
        .replace(fetched)
        .await
        .context("failed to store imported library")?;

    println!(
        "imported {} books and {} borrowers from {} ({} statuses corrected)",
        library.books.len(),
        library.borrowers.len(),
        client.base_url(),
        drifted
    );
    Ok(ExitCode::SUCCESS)
}

pub async fn stats(settings: &Settings) -> anyhow::Result<ExitCode> {
    let repository = bootstrap::open_repository(settings).await?;
    let library = repository.load().await?;
    let stats = DashboardStats::compute(&library, utils::today());

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(ExitCode::SUCCESS)
}

pub async fn check(settings: &Settings) -> anyhow::Result<ExitCode> {
    let repository = raw_repository(settings, true).await?;
    let library = repository
        .load()
        .await
        .context("stored library is unreadable")?;

    let violations = library.violations();
    if violations.is_empty() {
        println!(
            "ok: {} books consistent with {} borrowers",
            library.books.len(),
            library.borrowers.len()
        );
        return Ok(ExitCode::SUCCESS);
    }

    for violation in &violations {
        println!(
            "book {} ({}) is {} but should be {}",
            violation.book_id, violation.title, violation.recorded, violation.expected
        );
    }
    tracing::warn!(violations = violations.len(), "library is inconsistent");
    Ok(ExitCode::FAILURE)
}
