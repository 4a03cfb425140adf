mod common;

use axum::http::{Method, StatusCode};
use common::{call, token_with_roles};
use zero_api::app::router;
use zero_api::config::config;

#[tokio::test]
async fn body_without_json_content_type_gets_the_error_envelope() {
    let token = token_with_roles(&["User"]);
    let (status, body) = call(router(), Method::POST, "/api/form/1/responses", Some(&token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_path_ids_get_the_error_envelope() {
    let token = token_with_roles(&["User"]);

    for uri in ["/api/form/abc", "/api/form/responses/not-a-uuid"] {
        let (status, body) = call(router(), Method::GET, uri, Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "VALIDATION_ERROR", "{}", uri);
    }
}

#[tokio::test]
async fn malformed_query_strings_get_the_error_envelope() {
    let admin_role = config().identity.admin_role.clone();
    let token = token_with_roles(&[admin_role.as_str()]);
    let (status, body) = call(router(), Method::GET, "/api/form/forms?page=first", Some(&token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
