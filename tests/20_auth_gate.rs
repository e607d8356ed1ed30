mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn protected_routes_require_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/api/comissoes", "/api/projetos", "/api/auth/whoami", "/api/sugestoes/estatisticas"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let body: Value = res.json().await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn rejects_tokens_signed_with_another_secret() -> Result<()> {
    let server = common::ensure_server().await?;
    let claims = oab_comissoes_api::auth::Claims::new(uuid::Uuid::new_v4(), "intruso".into(), None, false, 1);
    let forged = oab_comissoes_api::auth::encode_token(&claims, "some-other-secret")?;

    let res = reqwest::Client::new()
        .get(server.url("/api/comissoes"))
        .bearer_auth(forged)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn pending_password_change_only_reaches_session_routes() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::bearer(true);

    let res = client
        .get(server.url("/api/projetos"))
        .header("authorization", &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");

    let res = client
        .delete(server.url("/api/auth/session"))
        .header("authorization", &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Validation runs before the database is needed
    let res = client
        .put(server.url("/api/auth/password"))
        .header("authorization", &token)
        .json(&json!({ "nova_senha": "123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["nova_senha"].is_string());
    Ok(())
}
