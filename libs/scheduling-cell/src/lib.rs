pub mod catalog;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the catalog, models and services for external use
pub use catalog::SlotCatalog;
pub use models::*;
pub use services::*;
