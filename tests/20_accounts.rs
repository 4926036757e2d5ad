mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{unique, TestApp, PASSWORD};

#[tokio::test]
async fn duplicate_username_is_a_field_error() -> Result<()> {
    let Some(app) = TestApp::new().await? else { return Ok(()) };
    let username = unique("dup");
    let body = json!({ "username": username, "password": PASSWORD, "email": "dup@example.com" });

    let (status, created) = app.post("/api/auth/register", None, body.clone()).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({ "message": "User registered successfully" }));

    let (status, err) = app.post("/api/auth/register", None, body).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["field_errors"]["username"], "A user with that username already exists.");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(&username)
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[tokio::test]
async fn weak_passwords_are_rejected() -> Result<()> {
    let Some(app) = TestApp::new().await? else { return Ok(()) };

    for password in ["short", "12345678901", "password"] {
        let (status, err) = app
            .post("/api/auth/register", None, json!({ "username": unique("weak"), "password": password }))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} was accepted", password);
        assert!(err["field_errors"]["password"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let Some(app) = TestApp::new().await? else { return Ok(()) };
    let (username, _) = app.signed_in_user().await?;

    let (wrong_status, wrong_body) = app
        .post("/api/auth/login", None, json!({ "username": username, "password": "Wrong-Horse-42" }))
        .await?;
    let (unknown_status, unknown_body) = app
        .post("/api/auth/login", None, json!({ "username": unique("ghost"), "password": PASSWORD }))
        .await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "Invalid Credentials");

    let (nul_status, nul_body) = app
        .post("/api/auth/login", None, json!({ "username": "a\u{0}", "password": PASSWORD }))
        .await?;
    assert_eq!(nul_status, StatusCode::UNAUTHORIZED);
    assert_eq!(nul_body, wrong_body);
    Ok(())
}

#[tokio::test]
async fn profile_and_refresh() -> Result<()> {
    let Some(app) = TestApp::new().await? else { return Ok(()) };
    let username = unique("prof");
    app.post(
        "/api/auth/register",
        None,
        json!({ "username": username, "password": PASSWORD, "email": "prof@example.com" }),
    )
    .await?;
    let (_, tokens) = app
        .post("/api/auth/login", None, json!({ "username": username, "password": PASSWORD }))
        .await?;
    let access = tokens["access"].as_str().unwrap_or_default().to_string();
    let refresh = tokens["refresh"].as_str().unwrap_or_default().to_string();

    let (status, profile) = app.get("/api/auth/profile", &access).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], username.as_str());
    assert_eq!(profile["email"], "prof@example.com");
    assert!(profile["id"].is_i64());
    assert!(profile.get("password_hash").is_none());

    // A refresh token is not an access token
    let (status, _) = app.get("/api/auth/profile", &refresh).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, renewed) = app
        .post("/api/auth/token/refresh", None, json!({ "refresh": refresh }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let renewed_access = renewed["access"].as_str().unwrap_or_default();
    let (status, _) = app.get("/api/auth/profile", renewed_access).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn change_password_requires_the_old_one() -> Result<()> {
    let Some(app) = TestApp::new().await? else { return Ok(()) };
    let (username, access) = app.signed_in_user().await?;
    let new_password = "Battery-Staple-77";

    let (status, err) = app
        .post(
            "/api/auth/change-password",
            Some(&access),
            json!({ "old_password": "not-it-at-all", "new_password": new_password }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Old password is incorrect");

    let (status, ok) = app
        .post(
            "/api/auth/change-password",
            Some(&access),
            json!({ "old_password": PASSWORD, "new_password": new_password }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ok["message"], "Password changed successfully");

    let (status, _) = app
        .post("/api/auth/login", None, json!({ "username": username, "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/auth/login", None, json!({ "username": username, "password": new_password }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    // Issued tokens outlive the password change
    let (status, _) = app.get("/api/auth/profile", &access).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
