use tracing::{info, warn};
use uuid::Uuid;

use crate::api::auth::{LoginRequest, MeResponse, RegisterRequest, TokenResponse};
use crate::auth::identity::{is_valid_email, PasswordPolicy};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::TokenIssuer;
use crate::config;
use crate::database::models::NewUser;
use crate::database::repository::DirectoryStore;
use crate::services::error::{ServiceError, ServiceResult};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Registration, login and the caller's own profile
pub struct AuthService<S> {
    store: S,
    tokens: TokenIssuer,
    policy: PasswordPolicy,
    default_roles: Vec<String>,
    allow_registration: bool,
}

impl<S: DirectoryStore> AuthService<S> {
    pub fn new(store: S, tokens: TokenIssuer, policy: PasswordPolicy) -> Self {
        Self {
            store,
            tokens,
            policy,
            default_roles: Vec::new(),
            allow_registration: true,
        }
    }

    pub fn from_config(store: S) -> Self {
        let identity = &config::config().identity;
        Self {
            default_roles: identity.default_roles.clone(),
            allow_registration: identity.allow_registration,
            ..Self::new(store, TokenIssuer::from_config(), PasswordPolicy::from_config())
        }
    }

    pub fn with_default_roles(mut self, roles: Vec<String>) -> Self {
        self.default_roles = roles;
        self
    }

    pub fn with_registration(mut self, allow: bool) -> Self {
        self.allow_registration = allow;
        self
    }

    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<TokenResponse> {
        if !self.allow_registration {
            return Err(ServiceError::Forbidden("Registration is disabled".to_string()));
        }

        let email = request.email.trim();
        if !email.is_empty() && self.store.find_user_by_email(email).await?.is_some() {
            return Err(ServiceError::Conflict("Email is already registered".to_string()));
        }

        let mut errors = Vec::new();
        if !is_valid_email(email) {
            errors.push(format!("Email '{}' is invalid.", email));
        }
        for (value, label) in [
            (&request.first_name, "First name"),
            (&request.last_name, "Last name"),
            (&request.izaro_code, "Izaro code"),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{} is required.", label));
            }
        }
        errors.extend(self.policy.violations(&request.password));
        if !errors.is_empty() {
            return Err(ServiceError::Identity(errors));
        }

        let user = self
            .store
            .insert_user(&NewUser {
                email: email.to_string(),
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                izaro_code: request.izaro_code.trim().to_string(),
                password_hash: hash_password(&request.password).await?,
            })
            .await?;

        if !self.default_roles.is_empty() {
            self.store.add_roles(user.id, &self.default_roles).await?;
        }
        info!("Registered user {} <{}>", user.id, user.email);

        let roles = self.store.roles_of(user.id).await?;
        Ok(self.tokens.issue(&user, &roles)?.into())
    }

    /// Unknown email and wrong password fail identically
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<TokenResponse> {
        let Some(user) = self.store.find_user_by_email(request.email.trim()).await? else {
            warn!("Login failed for unknown email");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&request.password, &user.password_hash).await {
            warn!("Login failed for user {}", user.id);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let roles = self.store.roles_of(user.id).await?;
        info!("User {} logged in", user.id);
        Ok(self.tokens.issue(&user, &roles)?.into())
    }

    pub async fn me(&self, user_id: Uuid) -> ServiceResult<MeResponse> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        let roles = self.store.roles_of(user.id).await?;
        Ok(MeResponse {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            izaro_code: user.izaro_code,
            roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use chrono::Duration;

    fn tokens() -> TokenIssuer {
        TokenIssuer::new("auth-test-secret-auth-test-secret", "zero-api", "zero-frontend", Duration::minutes(5))
    }

    fn service() -> AuthService<MemoryStore> {
        AuthService::new(MemoryStore::new(), tokens(), PasswordPolicy::default())
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Etxeberria".to_string(),
            izaro_code: "IZ-1".to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = service();
        let registered = service.register(register_request("ana@example.com", "Secret123")).await.unwrap();
        let claims = tokens().validate(&registered.token).unwrap();
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.izaro_code, "IZ-1");

        let login = service.login(login_request("ANA@example.com", "Secret123")).await.unwrap();
        assert_eq!(tokens().validate(&login.token).unwrap().sub, claims.sub);

        let me = service.me(claims.sub).await.unwrap();
        assert_eq!(me.first_name, "Ana");
        assert!(me.roles.is_empty());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let service = service();
        service.register(register_request("ana@example.com", "Secret123")).await.unwrap();
        let err = service.register(register_request("ana@example.com", "Secret123")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn identity_errors_are_collected() {
        let service = service();
        match service.register(register_request("nope", "abc")).await.unwrap_err() {
            ServiceError::Identity(errors) => assert_eq!(errors.len(), 4),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let service = service();
        service.register(register_request("ana@example.com", "Secret123")).await.unwrap();

        let wrong = service.login(login_request("ana@example.com", "Secret124")).await.unwrap_err();
        let unknown = service.login(login_request("who@example.com", "Secret123")).await.unwrap_err();
        match (wrong, unknown) {
            (ServiceError::Unauthorized(a), ServiceError::Unauthorized(b)) => assert_eq!(a, b),
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[tokio::test]
    async fn disabled_registration_is_forbidden() {
        let service = service().with_registration(false);
        let err = service.register(register_request("ana@example.com", "Secret123")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn new_users_receive_default_roles() {
        let store = MemoryStore::new();
        store.insert_role("User").await.unwrap();
        let service = AuthService::new(store, tokens(), PasswordPolicy::default()).with_default_roles(vec!["User".to_string()]);

        let registered = service.register(register_request("ana@example.com", "Secret123")).await.unwrap();
        assert!(tokens().validate(&registered.token).unwrap().has_role("User"));
    }

    #[tokio::test]
    async fn me_for_deleted_user_is_not_found() {
        assert!(matches!(service().me(Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
    }
}
