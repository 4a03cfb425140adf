pub mod manager;
pub mod models;
pub mod pg;
pub mod repository;
pub mod retry;

pub use manager::{DatabaseError, DatabaseManager};
pub use pg::PgStore;
pub use repository::{CatalogStore, DbResult, DirectoryStore, ResponseStore};
pub use retry::RetryPolicy;
