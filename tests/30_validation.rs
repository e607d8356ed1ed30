mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn post(path: &str, body: Value) -> Result<(StatusCode, Value)> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url(path))
        .header("authorization", common::bearer(false))
        .json(&body)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

#[tokio::test]
async fn blank_search_term_returns_empty_list() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .get(server.url("/api/buscar"))
        .query(&[("termo", "   ")])
        .header("authorization", common::bearer(false))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn project_creation_validates_before_writing() -> Result<()> {
    let (status, body) = post("/api/projetos", json!({ "status": "planejamento", "comissoes": [] })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["nome"].is_string());

    let (status, body) = post(
        "/api/projetos",
        json!({ "nome": "Portal", "status": "arquivado", "comissoes": [{ "comissao_id": "x" }] }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn idea_generator_checks_input_then_configuration() -> Result<()> {
    let (status, body) = post("/api/ideia", json!({ "ideia": "  " })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["ideia"].is_string());

    let (status, body) = post("/api/ideia", json!({ "ideia": "portal de transparência" })).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn find_refuses_unlisted_tables_and_operators() -> Result<()> {
    let (status, body) = post("/api/find/usuarios", json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = post("/api/find/comissoes", json!({ "where": { "nome": { "$regex": "^A" } } })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_answer_with_error_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "nome_usuario": "x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].as_str().unwrap_or_default().contains("senha"));

    let res = reqwest::Client::new()
        .get(server.url("/api/projetos"))
        .query(&[("comissao_id", "nao-e-uuid")])
        .header("authorization", common::bearer(false))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn non_text_tags_do_not_reject_project_payload() -> Result<()> {
    // Passes extraction and validation, then reaches the (unreachable) database
    let (status, body) = post(
        "/api/projetos",
        json!({
            "nome": "Portal",
            "status": "planejamento",
            "comissoes": [{ "comissao_id": "x" }, "solto"],
            "tags": ["ia", 7]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    Ok(())
}
