// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT auth) → Elevated (JWT auth + admin role)

pub mod public;    // Tier 1: token acquisition (/api/auth/login, /api/auth/register)
pub mod protected; // Tier 2: any authenticated user (/api/auth/me, /api/form/:id ...)
pub mod elevated;  // Tier 3: admin role required (/api/admin/*, role and catalog management)

use crate::database::{DatabaseManager, PgStore};
use crate::error::ApiError;

/// Store over the shared pool; 503 when the database is not reachable
pub(crate) async fn store() -> Result<PgStore, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    Ok(PgStore::new(pool))
}
