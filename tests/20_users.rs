mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{assert_no_secrets, TestServer, PASSWORD};

#[tokio::test]
async fn admin_lists_users_with_pagination() -> Result<()> {
    let server = TestServer::spawn().await?;
    for name in ["u1", "u2", "u3"] {
        server.register(name).await?;
    }
    let admin = server.admin_token().await?;

    let res = server
        .client
        .get(server.url("/users?role=user&per_page=2&page=1"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;

    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["pagination"], json!({ "page": 1, "per_page": 2, "total": 3 }));
    assert_no_secrets(&body);
    Ok(())
}

#[tokio::test]
async fn regular_users_cannot_list_or_create_users() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.register("eve").await?;

    let res = server.client.get(server.url("/users")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .post(server.url("/users"))
        .bearer_auth(&token)
        .json(&json!({ "username": "mallory", "email": "m@example.com", "password": PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_creates_users_with_roles() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;

    let res = server
        .client
        .post(server.url("/users"))
        .bearer_auth(&admin)
        .json(&json!({
            "username": "ops",
            "email": "ops@example.com",
            "password": PASSWORD,
            "role": "admin"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["role"], "admin");
    assert_no_secrets(&body);
    Ok(())
}

#[tokio::test]
async fn users_see_themselves_with_medias_but_not_others() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = server.register("fay").await?;
    let (_, other) = server.register("gus").await?;

    server
        .client
        .post(server.url("/medias"))
        .bearer_auth(&token)
        .json(&json!({ "filename": "a.png", "mimetype": "image/png", "size": 12 }))
        .send()
        .await?;

    let res = server
        .client
        .get(server.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["username"], "fay");
    assert_eq!(body["medias"][0]["filename"], "a.png");
    assert_no_secrets(&body);

    let res = server
        .client
        .get(server.url(&format!("/users/{}", other)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn missing_user_is_404() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;

    let res = server.client.get(server.url("/users/999")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .get(server.url("/users/999/medias"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn patch_merges_and_put_replaces() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = server.register("hal").await?;

    let res = server
        .client
        .patch(server.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "email": "hal@new.example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["username"], "hal");
    assert_eq!(body["email"], "hal@new.example.com");

    let res = server
        .client
        .put(server.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "username": "hal9000", "email": "hal@example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["username"], "hal9000");

    // role changes are reserved to administrators
    let res = server
        .client
        .patch(server.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "role": "admin" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn delete_requires_numeric_id() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;

    let res = server.client.delete(server.url("/users/abc")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::EXPECTATION_FAILED);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "ID parameter must be a number");
    Ok(())
}

#[tokio::test]
async fn admin_deletes_user_and_their_medias() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = server.register("ivy").await?;
    let admin = server.admin_token().await?;

    let media: Value = server
        .client
        .post(server.url("/medias"))
        .bearer_auth(&token)
        .json(&json!({ "filename": "b.png", "mimetype": "image/png", "size": 1 }))
        .send()
        .await?
        .json()
        .await?;

    // users cannot delete accounts, not even their own
    let res = server
        .client
        .delete(server.url(&format!("/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .delete(server.url(&format!("/users/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await?.is_empty());

    let res = server
        .client
        .get(server.url(&format!("/medias/{}", media["id"])))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .delete(server.url(&format!("/users/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
