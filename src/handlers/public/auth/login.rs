use axum::extract::State;

use crate::app::AppState;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{LoginRequest, Sessao};

/// POST /auth/login - Authenticate and receive a JWT
///
/// Input: `{ "nome_usuario": "...", "senha": "..." }`
///
/// Accounts still on their first access only accept the default password;
/// the returned session then carries `require_password_change: true` and
/// is limited to the session routes until the password is replaced.
pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<Sessao> {
    let sessao = state.auth().login(request).await?;
    Ok(ApiResponse::success(sessao))
}
