use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::admin::{CreateUserRequest, UpdateUserRequest, UserListItem, UserListQuery};
use crate::auth::identity::{is_valid_email, PasswordPolicy};
use crate::auth::password::hash_password;
use crate::database::models::{normalize_key, NewUser, User, UserProfile, UserUpdate};
use crate::database::repository::DirectoryStore;
use crate::services::admin_guard::{self, AdminGuard};
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::{PagedResult, Paging};

/// Admin-facing user directory
pub struct UserService<S> {
    store: S,
    guard: AdminGuard,
    policy: PasswordPolicy,
}

impl<S: DirectoryStore> UserService<S> {
    pub fn new(store: S, guard: AdminGuard, policy: PasswordPolicy) -> Self {
        Self { store, guard, policy }
    }

    pub fn from_config(store: S) -> Self {
        Self::new(store, AdminGuard::from_config(), PasswordPolicy::from_config())
    }

    /// Search is pushed to the store; the role filter is applied to the
    /// fetched page, so `total_count` counts search matches only.
    pub async fn list(&self, query: UserListQuery) -> ServiceResult<PagedResult<UserListItem>> {
        let paging = Paging::from_query(query.page, query.page_size);
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let role = query.role.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if let Some(role) = role {
            if self.store.find_role(role).await?.is_none() {
                return Ok(PagedResult::empty(paging));
            }
        }

        let (total, users) = self.store.search_users(search, paging.offset(), paging.limit()).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            let roles = self.store.roles_of(user.id).await?;
            if let Some(role) = role {
                if !roles.iter().any(|r| normalize_key(r) == normalize_key(role)) {
                    continue;
                }
            }
            items.push(UserListItem::new(user, roles));
        }

        Ok(PagedResult::new(paging, total, items))
    }

    pub async fn get(&self, user_id: Uuid) -> ServiceResult<UserListItem> {
        let user = self.require_user(user_id).await?;
        let roles = self.store.roles_of(user.id).await?;
        Ok(UserListItem::new(user, roles))
    }

    pub async fn create(&self, request: CreateUserRequest) -> ServiceResult<UserListItem> {
        let profile = validate_profile(&request.email, &request.first_name, &request.last_name, &request.izaro_code)?;

        if self.store.find_user_by_email(&profile.email).await?.is_some() {
            return Err(ServiceError::Conflict("Email is already in use by another user".to_string()));
        }

        let errors = self.policy.violations(&request.password);
        if !errors.is_empty() {
            return Err(ServiceError::Identity(errors));
        }

        let user = self
            .store
            .insert_user(&NewUser {
                email: profile.email,
                first_name: profile.first_name,
                last_name: profile.last_name,
                izaro_code: profile.izaro_code,
                password_hash: hash_password(&request.password).await?,
            })
            .await?;
        info!("Created user {} <{}>", user.id, user.email);

        let roles = self.store.roles_of(user.id).await?;
        Ok(UserListItem::new(user, roles))
    }

    /// Update profile fields and, when `roles` is present, replace the role set.
    /// Profile and role writes land in one store transaction.
    pub async fn update(&self, acting_user: Uuid, user_id: Uuid, request: UpdateUserRequest) -> ServiceResult<UserListItem> {
        let user = self.require_user(user_id).await?;
        let profile = validate_profile(&request.email, &request.first_name, &request.last_name, &request.izaro_code)?;

        if normalize_key(&profile.email) != user.normalized_email {
            if let Some(existing) = self.store.find_user_by_email(&profile.email).await? {
                if existing.id != user.id {
                    return Err(ServiceError::Conflict("Email is already in use by another user".to_string()));
                }
            }
        }

        let change = match request.roles {
            Some(requested) => self.plan_role_change(acting_user, &user, requested).await?,
            None => RoleChange::default(),
        };

        let update = self.guard.protect(UserUpdate {
            profile: Some(profile),
            add_roles: change.to_add,
            remove_roles: change.to_remove,
            ..UserUpdate::default()
        });
        let outcome = self.store.apply_user_update(user.id, &update).await?;
        let user = admin_guard::settle(outcome).map_err(|violation| {
            warn!("Refused admin removal on {} by {}: {}", user.id, acting_user, violation);
            ServiceError::BadRequest(violation.to_string())
        })?;

        if update.changes_roles() {
            info!(
                "User {} roles changed by {}: +{:?} -{:?}",
                user.id, acting_user, update.add_roles, update.remove_roles
            );
        }

        let roles = self.store.roles_of(user.id).await?;
        Ok(UserListItem::new(user, roles))
    }

    async fn plan_role_change(&self, acting_user: Uuid, user: &User, requested: Vec<String>) -> ServiceResult<RoleChange> {
        let requested = dedupe_roles(requested);

        let known = self.store.list_roles().await?;
        let unknown: Vec<String> = requested
            .iter()
            .filter(|r| !known.iter().any(|k| normalize_key(&k.name) == normalize_key(r)))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ServiceError::validation_with("Unknown roles", json!({ "roles": unknown })));
        }

        let current = self.store.roles_of(user.id).await?;
        if self.guard.removes_admin(&current, &requested) {
            if let Err(violation) = self.guard.check_actor(acting_user, user.id) {
                warn!("Refused admin removal on {} by {}: {}", user.id, acting_user, violation);
                return Err(ServiceError::BadRequest(violation.to_string()));
            }
        }

        let to_add = requested
            .iter()
            .filter(|r| !current.iter().any(|c| normalize_key(c) == normalize_key(r)))
            .cloned()
            .collect();
        let to_remove = current
            .iter()
            .filter(|c| !requested.iter().any(|r| normalize_key(r) == normalize_key(c)))
            .cloned()
            .collect();

        Ok(RoleChange { to_add, to_remove })
    }

    async fn require_user(&self, user_id: Uuid) -> ServiceResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }
}

#[derive(Default)]
struct RoleChange {
    to_add: Vec<String>,
    to_remove: Vec<String>,
}

/// Trim, drop blanks and de-duplicate ignoring case, keeping first spelling
pub fn dedupe_roles(roles: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for role in roles {
        let role = role.trim();
        if role.is_empty() || out.iter().any(|r| normalize_key(r) == normalize_key(role)) {
            continue;
        }
        out.push(role.to_string());
    }
    out
}

/// Required profile fields; every failing field is reported in `details`
fn validate_profile(email: &str, first_name: &str, last_name: &str, izaro_code: &str) -> ServiceResult<UserProfile> {
    let mut errors = Map::new();
    let email = email.trim();
    if email.is_empty() {
        errors.insert("email".to_string(), Value::from("Email is required"));
    } else if !is_valid_email(email) {
        errors.insert("email".to_string(), Value::from("Email is not a valid address"));
    }
    for (key, value, label) in [
        ("firstName", first_name, "First name"),
        ("lastName", last_name, "Last name"),
        ("izaroCode", izaro_code, "Izaro code"),
    ] {
        if value.trim().is_empty() {
            errors.insert(key.to_string(), Value::from(format!("{} is required", label)));
        }
    }

    if !errors.is_empty() {
        return Err(ServiceError::validation_with("Invalid user data", Value::Object(errors)));
    }

    Ok(UserProfile {
        email: email.to_string(),
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        izaro_code: izaro_code.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    async fn service() -> UserService<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_role("Admin").await.unwrap();
        store.insert_role("User").await.unwrap();
        store.insert_role("Inspector").await.unwrap();
        UserService::new(store, AdminGuard::new("Admin"), PasswordPolicy::default())
    }

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Etxeberria".to_string(),
            izaro_code: "IZ-1".to_string(),
            password: "Secret123".to_string(),
        }
    }

    fn update_request(user: &UserListItem, roles: Option<Vec<&str>>) -> UpdateUserRequest {
        UpdateUserRequest {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            izaro_code: user.izaro_code.clone(),
            roles: roles.map(|r| r.into_iter().map(String::from).collect()),
        }
    }

    async fn admin(service: &UserService<MemoryStore>, email: &str) -> UserListItem {
        let user = service.create(create_request(email)).await.unwrap();
        service.store.add_roles(user.id, &["Admin".to_string()]).await.unwrap();
        service.get(user.id).await.unwrap()
    }

    #[tokio::test]
    async fn create_validates_and_rejects_duplicates() {
        let service = service().await;
        let created = service.create(create_request("ana@example.com")).await.unwrap();
        assert_eq!(created.email, "ana@example.com");
        assert!(created.roles.is_empty());

        let dup = service.create(create_request("ANA@example.com")).await.unwrap_err();
        assert!(matches!(dup, ServiceError::Conflict(_)));

        let bad_email = service.create(create_request("not-an-email")).await.unwrap_err();
        assert!(matches!(bad_email, ServiceError::Validation { .. }));

        let mut weak = create_request("weak@example.com");
        weak.password = "short".to_string();
        assert!(matches!(service.create(weak).await, Err(ServiceError::Identity(_))));
    }

    #[tokio::test]
    async fn list_normalizes_paging_and_searches() {
        let service = service().await;
        for email in ["c@example.com", "a@example.com", "b@other.org"] {
            service.create(create_request(email)).await.unwrap();
        }

        let page = service
            .list(UserListQuery {
                page: Some(0),
                page_size: Some(500),
                search: Some("EXAMPLE".to_string()),
                role: None,
            })
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);
        assert_eq!(page.total_count, 2);
        let emails: Vec<&str> = page.items.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["a@example.com", "c@example.com"]);
    }

    #[tokio::test]
    async fn unknown_role_filter_yields_empty_page() {
        let service = service().await;
        service.create(create_request("a@example.com")).await.unwrap();
        let page = service
            .list(UserListQuery {
                role: Some("Ghost".to_string()),
                ..UserListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn role_filter_applies_to_fetched_page_only() {
        let service = service().await;
        admin(&service, "boss@example.com").await;
        service.create(create_request("plain@example.com")).await.unwrap();

        let page = service
            .list(UserListQuery {
                role: Some("admin".to_string()),
                ..UserListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].email, "boss@example.com");
    }

    #[tokio::test]
    async fn update_replaces_roles_with_trimmed_unique_names() {
        let service = service().await;
        let boss = admin(&service, "boss@example.com").await;
        let user = service.create(create_request("ana@example.com")).await.unwrap();

        let updated = service
            .update(boss.id, user.id, update_request(&user, Some(vec![" inspector ", "INSPECTOR", "", "User"])))
            .await
            .unwrap();
        assert_eq!(updated.roles, vec!["Inspector".to_string(), "User".to_string()]);

        let updated = service
            .update(boss.id, user.id, update_request(&updated, Some(vec!["User"])))
            .await
            .unwrap();
        assert_eq!(updated.roles, vec!["User".to_string()]);
    }

    #[tokio::test]
    async fn update_rejects_unknown_roles_without_writing() {
        let service = service().await;
        let boss = admin(&service, "boss@example.com").await;
        let user = service.create(create_request("ana@example.com")).await.unwrap();
        let mut request = update_request(&user, Some(vec!["User", "Ghost"]));
        request.first_name = "Changed".to_string();

        match service.update(boss.id, user.id, request).await.unwrap_err() {
            ServiceError::Validation { details: Some(details), .. } => {
                assert_eq!(details["roles"], json!(["Ghost"]));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(service.get(user.id).await.unwrap().first_name, "Ana");
    }

    #[tokio::test]
    async fn update_rejects_email_owned_by_someone_else() {
        let service = service().await;
        let boss = admin(&service, "boss@example.com").await;
        let user = service.create(create_request("ana@example.com")).await.unwrap();
        let mut request = update_request(&user, None);
        request.email = "BOSS@example.com".to_string();
        assert!(matches!(
            service.update(boss.id, user.id, request).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn admin_cannot_remove_own_admin_role() {
        let service = service().await;
        let boss = admin(&service, "boss@example.com").await;
        admin(&service, "other@example.com").await;

        let err = service
            .update(boss.id, boss.id, update_request(&boss, Some(vec!["User"])))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert!(service.get(boss.id).await.unwrap().roles.contains(&"Admin".to_string()));
    }

    #[tokio::test]
    async fn last_admin_cannot_be_demoted() {
        let service = service().await;
        let only_admin = admin(&service, "boss@example.com").await;
        let acting = Uuid::new_v4();

        let err = service
            .update(acting, only_admin.id, update_request(&only_admin, Some(vec![])))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn admin_can_demote_another_admin() {
        let service = service().await;
        let boss = admin(&service, "boss@example.com").await;
        let other = admin(&service, "other@example.com").await;

        let updated = service
            .update(boss.id, other.id, update_request(&other, Some(vec!["User"])))
            .await
            .unwrap();
        assert_eq!(updated.roles, vec!["User".to_string()]);
    }

    #[tokio::test]
    async fn refused_demotion_leaves_profile_untouched() {
        let service = service().await;
        let only_admin = admin(&service, "boss@example.com").await;
        let mut request = update_request(&only_admin, Some(vec!["User"]));
        request.first_name = "Renamed".to_string();

        let err = service.update(Uuid::new_v4(), only_admin.id, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let after = service.get(only_admin.id).await.unwrap();
        assert_eq!(after.first_name, "Ana");
        assert_eq!(after.roles, vec!["Admin".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_demotions_through_update_keep_one_admin() {
        let service = UserService::new(MemoryStore::interleaved(), AdminGuard::new("Admin"), PasswordPolicy::default());
        service.store.insert_role("Admin").await.unwrap();
        service.store.insert_role("User").await.unwrap();
        let a = admin(&service, "a@example.com").await;
        let b = admin(&service, "b@example.com").await;

        let (first, second) = tokio::join!(
            service.update(a.id, b.id, update_request(&b, Some(vec!["User"]))),
            service.update(b.id, a.id, update_request(&a, Some(vec!["User"]))),
        );
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);

        let admins = service
            .list(UserListQuery {
                role: Some("Admin".to_string()),
                ..UserListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(admins.items.len(), 1);
    }

    #[test]
    fn dedupe_keeps_first_spelling() {
        let roles = vec![" Admin".to_string(), "admin".to_string(), " ".to_string(), "User".to_string()];
        assert_eq!(dedupe_roles(roles), vec!["Admin".to_string(), "User".to_string()]);
    }
}
