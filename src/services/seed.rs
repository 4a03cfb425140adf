//! Startup seeding: base roles and an optional first admin account

use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::config;
use crate::database::models::NewUser;
use crate::database::repository::DirectoryStore;
use crate::services::error::ServiceResult;

pub const USER_ROLE: &str = "User";

#[derive(Debug, Clone)]
pub struct SeedSettings {
    pub roles: Vec<String>,
    pub admin_role: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl SeedSettings {
    pub fn from_config() -> Self {
        let identity = &config::config().identity;
        let mut roles = vec![identity.admin_role.clone(), USER_ROLE.to_string()];
        roles.extend(identity.default_roles.iter().cloned());
        Self {
            roles,
            admin_role: identity.admin_role.clone(),
            admin_email: identity.seed_admin_email.clone(),
            admin_password: identity.seed_admin_password.clone(),
        }
    }
}

/// Idempotent: existing roles and an already-registered admin email are left alone
pub async fn run<S: DirectoryStore>(store: &S, settings: &SeedSettings) -> ServiceResult<()> {
    for role in &settings.roles {
        if store.find_role(role).await?.is_none() {
            store.insert_role(role).await?;
            info!("Seeded role '{}'", role);
        }
    }

    let (email, password) = match (&settings.admin_email, &settings.admin_password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => (email.trim(), password),
        (Some(_), None) | (None, Some(_)) => {
            warn!("Seed admin needs both ZERO_SEED_ADMIN_EMAIL and ZERO_SEED_ADMIN_PASSWORD; skipping");
            return Ok(());
        }
        _ => return Ok(()),
    };

    if store.find_user_by_email(email).await?.is_some() {
        return Ok(());
    }

    let user = store
        .insert_user(&NewUser {
            email: email.to_string(),
            first_name: "Admin".to_string(),
            last_name: "Zero".to_string(),
            izaro_code: "ADMIN".to_string(),
            password_hash: hash_password(password).await?,
        })
        .await?;
    store.add_roles(user.id, &[settings.admin_role.clone()]).await?;
    info!("Seeded admin user {} <{}>", user.id, user.email);
    Ok(())
}
