use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::handlers::extract::ApiJson;
use crate::database::models::Usuario;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::auth_service::Sessao;

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    #[serde(default)]
    pub nova_senha: String,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub usuario: Usuario,
    pub require_password_change: bool,
}

#[derive(Debug, Serialize)]
pub struct LogoutAck {
    pub message: String,
    pub user_id: Uuid,
}

/// GET /api/auth/whoami - fresh user row for the token's subject
pub async fn whoami(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<WhoAmI> {
    let usuario = state.auth().whoami(user.user_id).await?;
    Ok(ApiResponse::success(WhoAmI { usuario, require_password_change: user.require_password_change }))
}

/// PUT /api/auth/password - replace the password, returns a settled session
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<PasswordRequest>,
) -> ApiResult<Sessao> {
    let sessao = state.auth().change_password(user.user_id, &request.nova_senha).await?;
    Ok(ApiResponse::success(sessao))
}

/// DELETE /api/auth/session
///
/// Tokens are stateless; the client discards its copy. This only
/// acknowledges and logs the logout.
pub async fn logout(Extension(user): Extension<AuthUser>) -> ApiResult<LogoutAck> {
    tracing::info!("User {} logged out", user.nome_usuario);
    Ok(ApiResponse::success(LogoutAck { message: "Sessão encerrada".to_string(), user_id: user.user_id }))
}
