use axum::extract::State;

use crate::app::AppState;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{CadastroRequest, UsuarioCadastrado};

/// POST /auth/register - Create the account of a committee
///
/// The username is derived from the committee name and the account starts
/// with the default password.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CadastroRequest>,
) -> ApiResult<UsuarioCadastrado> {
    let cadastro = state.auth().register(request).await?;
    Ok(ApiResponse::created(cadastro))
}
