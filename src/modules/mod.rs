pub mod auth;
pub mod books;
pub mod borrowers;
pub mod dashboard;

use libris_http::error::AppError;
use libris_kernel::{settings::Settings, ModuleRegistry};
use serde::Deserialize;

use crate::repository::LibraryRepository;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, repository: &LibraryRepository, settings: &Settings) {
    registry.register_custom(auth::create_module(settings.auth.clone()));
    registry.register_custom(dashboard::create_module(repository.clone()));
    registry.register_custom(books::create_module(repository.clone()));
    registry.register_custom(borrowers::create_module(
        repository.clone(),
        settings.loans.period_days,
    ));
}

/// `?confirm=true` on destructive requests.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Confirmation {
    #[serde(default)]
    pub confirm: bool,
}

impl Confirmation {
    pub(crate) fn require(&self, what: &str) -> Result<(), AppError> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::bad_request(format!(
                "deleting {what} requires confirm=true"
            )))
        }
    }
}
