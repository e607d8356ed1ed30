use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{RecuperacaoSolicitada, Sessao};

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: String,
}

/// POST /auth/recover
pub async fn request_recovery(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecoverRequest>,
) -> ApiResult<RecuperacaoSolicitada> {
    let solicitacao = state.auth().request_recovery(&request.email).await?;
    Ok(ApiResponse::success(solicitacao))
}

/// POST /auth/recover/verify - session that must set a new password
pub async fn verify_recovery(State(state): State<AppState>, ApiJson(request): ApiJson<VerifyRequest>) -> ApiResult<Sessao> {
    let sessao = state.auth().verify_recovery_token(&request.token).await?;
    Ok(ApiResponse::success(sessao))
}
