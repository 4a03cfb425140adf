mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{call, token_with_roles};
use zero_api::app::router;
use zero_api::auth::TokenIssuer;
use zero_api::config::config;

#[tokio::test]
async fn protected_routes_require_a_token() {
    for (method, uri) in [
        (Method::GET, "/api/auth/me"),
        (Method::GET, "/api/form/1"),
        (Method::POST, "/api/form/1/responses"),
        (Method::GET, "/api/form/responses/0b9c3d5e-3f4a-4c4e-9b6a-1f2e3d4c5b6a"),
    ] {
        let (status, body) = call(router(), method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let (status, _) = call(router(), Method::GET, "/api/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_non_admin_tokens() {
    let token = token_with_roles(&["User"]);

    for (method, uri) in [
        (Method::GET, "/api/admin/users"),
        (Method::GET, "/api/auth/roles"),
        (Method::GET, "/api/form/forms"),
        (Method::GET, "/api/form/categories"),
        (Method::GET, "/api/form/form-field-types"),
        (Method::GET, "/api/form/7/responses"),
        (Method::DELETE, "/api/auth/users/0b9c3d5e-3f4a-4c4e-9b6a-1f2e3d4c5b6a/roles/Admin"),
    ] {
        let (status, body) = call(router(), method.clone(), uri, Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(body["code"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn admin_role_match_ignores_case() {
    let admin_role = config().identity.admin_role.to_lowercase();
    let token = token_with_roles(&[admin_role.as_str()]);

    let (status, _) = call(router(), Method::GET, "/api/form/form-field-types", Some(&token)).await;
    assert_ne!(status, StatusCode::UNAUTHORIZED);
    assert_ne!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejects_tokens_from_another_issuer() {
    let security = &config().security;
    let foreign = TokenIssuer::new(
        security.jwt_secret.clone(),
        "someone-else",
        security.jwt_audience.clone(),
        Duration::minutes(5),
    );
    let token = foreign
        .issue(&sample_user(), &["Admin".to_string()])
        .unwrap()
        .token;

    let (status, _) = call(router(), Method::GET, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejects_expired_tokens() {
    let security = &config().security;
    let expired = TokenIssuer::new(
        security.jwt_secret.clone(),
        security.jwt_issuer.clone(),
        security.jwt_audience.clone(),
        Duration::minutes(-10),
    );
    let token = expired.issue(&sample_user(), &[]).unwrap().token;

    let (status, _) = call(router(), Method::GET, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn sample_user() -> zero_api::database::models::User {
    let now = chrono::Utc::now();
    zero_api::database::models::User {
        id: uuid::Uuid::new_v4(),
        email: "outsider@example.com".to_string(),
        normalized_email: "OUTSIDER@EXAMPLE.COM".to_string(),
        first_name: "Out".to_string(),
        last_name: "Sider".to_string(),
        izaro_code: "IZ-000".to_string(),
        password_hash: String::new(),
        created_at: now,
        updated_at: now,
    }
}
