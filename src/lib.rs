//! Libris application library
//!
//! Page modules (auth, dashboard, catalog, borrower records), the library aggregate with
//! its consistency rules, persistence through the kernel store, and the mock REST client.

pub mod bootstrap;
pub mod error;
pub mod library;
pub mod modules;
pub mod remote;
pub mod repository;
pub mod seed;
pub mod utils;

pub use error::{FieldError, LibraryError};
pub use library::{Library, Violation};
pub use modules::dashboard::stats::DashboardStats;
pub use repository::LibraryRepository;
