//! Safety rules for taking the admin role away from a user.

use std::fmt;
use uuid::Uuid;

use crate::config;
use crate::database::models::{normalize_key, UpdateOutcome, User, UserUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardViolation {
    /// The acting admin would lose their own admin role
    SelfDemotion,
    /// No other user would be left holding the admin role
    LastAdmin,
}

impl fmt::Display for GuardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardViolation::SelfDemotion => write!(f, "You cannot remove the admin role from yourself"),
            GuardViolation::LastAdmin => write!(f, "At least one user must keep the admin role"),
        }
    }
}

/// Policy parameterized by the configured admin role name
#[derive(Debug, Clone)]
pub struct AdminGuard {
    admin_role: String,
}

impl AdminGuard {
    pub fn new(admin_role: impl Into<String>) -> Self {
        Self {
            admin_role: admin_role.into(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(config::config().identity.admin_role.clone())
    }

    pub fn is_admin_role(&self, role: &str) -> bool {
        normalize_key(role) == normalize_key(&self.admin_role)
    }

    pub fn holds_admin(&self, roles: &[String]) -> bool {
        roles.iter().any(|r| self.is_admin_role(r))
    }

    /// True when going from `current` to `requested` drops the admin role
    pub fn removes_admin(&self, current: &[String], requested: &[String]) -> bool {
        self.holds_admin(current) && !self.holds_admin(requested)
    }

    /// Refuse an admin taking the admin role from themselves. The last-admin
    /// rule needs the holder count and is settled by the store with the write.
    pub fn check_actor(&self, acting_user: Uuid, target: Uuid) -> Result<(), GuardViolation> {
        if acting_user == target {
            return Err(GuardViolation::SelfDemotion);
        }
        Ok(())
    }

    /// Update that refuses to leave the admin role without a holder
    pub fn protect(&self, update: UserUpdate) -> UserUpdate {
        UserUpdate {
            protected_role: Some(self.admin_role.clone()),
            ..update
        }
    }
}

/// The updated user, or `LastAdmin` when the store refused the write
pub fn settle(outcome: UpdateOutcome) -> Result<User, GuardViolation> {
    match outcome {
        UpdateOutcome::Applied(user) => Ok(user),
        UpdateOutcome::LastHolder => Err(GuardViolation::LastAdmin),
    }
}
