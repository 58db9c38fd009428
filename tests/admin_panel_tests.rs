/// Tests for admin panel API endpoints
mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_reject_members() {
    let app = app().await;
    let (token, id) = member(&app, "a@x.com", "earth").await;

    let admin_calls = [
        (Method::GET, "/api/admin/users".to_string()),
        (Method::POST, format!("/api/admin/users/{}/promote", id)),
        (Method::GET, "/api/ranks".to_string()),
    ];
    for (method, uri) in admin_calls {
        let (status, body) = send(&app, method, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["error"], "Forbidden");
        assert_eq!(body["redirect"], "home");
    }
}

#[tokio::test]
async fn test_list_users_with_stats() {
    let app = app().await;
    member(&app, "a@x.com", "fire").await;
    member(&app, "b@x.com", "fire").await;
    register(&app, "c@x.com", "pw").await;
    let admin = superuser(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("password").is_none()));
    // The superuser is never a directory row
    assert!(users.iter().all(|u| u["email"] != SUPERUSER_EMAIL));

    assert_eq!(body["stats"]["totalUsers"], 3);
    assert_eq!(body["stats"]["withoutElement"], 1);
    let fire = body["stats"]["perElement"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["element"] == "fire")
        .unwrap()
        .clone();
    assert_eq!(fire["count"], 2);
}

#[tokio::test]
async fn test_promote_grants_admin_rights() {
    let app = app().await;
    let (token, id) = member(&app, "a@x.com", "water").await;
    let admin = superuser(&app).await;

    let uri = format!("/api/admin/users/{}/promote", id);
    let (status, body) = send(&app, Method::POST, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    // Same token, new rights
    let (status, _) = send(&app, Method::GET, "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/api/elements/earth/images", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, "/api/admin/users/missing/promote", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_rank_label() {
    let app = app().await;
    let (_, id) = member(&app, "a@x.com", "water").await;
    let admin = superuser(&app).await;

    let uri = format!("/api/admin/users/{}/rank", id);
    let (status, body) = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({"rank": "Tide Keeper"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rank"], "Tide Keeper");

    let (_, body) = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({"rank": null}))).await;
    assert!(body["rank"].is_null());
}

#[tokio::test]
async fn test_edit_user() {
    let app = app().await;
    let (_, id) = member(&app, "a@x.com", "water").await;
    register(&app, "b@x.com", "pw").await;
    let admin = superuser(&app).await;
    let uri = format!("/api/admin/users/{}", id);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({"email": "new@x.com", "password": "fresh"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "new@x.com");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "new@x.com", "password": "fresh"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({"email": "b@x.com"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({"password": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let app = app().await;
    let (token, id) = member(&app, "a@x.com", "water").await;
    let admin = superuser(&app).await;
    let uri = format!("/api/admin/users/{}", id);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ConfirmationRequired");
    let (_, body) = send(&app, Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    let confirmed = format!("{}?confirm=true", uri);
    let (status, body) = send(&app, Method::DELETE, &confirmed, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], id.as_str());

    // The deleted account's session no longer resolves
    let (status, _) = send(&app, Method::GET, "/api/home", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, &confirmed, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rank_catalog() {
    let app = app().await;
    let admin = superuser(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/ranks", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["water", "fire", "earth", "wind"]);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/ranks/earth",
        Some(&admin),
        Some(json!({"description": "Steady as stone"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Steady as stone");
    assert_eq!(body["order"], 3);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/ranks/lava",
        Some(&admin),
        Some(json!({"description": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_superuser_home() {
    let app = app().await;
    let admin = superuser(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/home", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["id"], "admin-001");
    assert_eq!(body["identity"]["role"], "admin");
    assert_eq!(body["forbiddenLanding"], "element/forbidden");
    assert!(body["elements"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["access"]["via"] == "admin"));
}
