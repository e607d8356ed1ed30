use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::database::models::{Membro, MembroComissaoRow};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::membro_service::NovoMembro;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub comissao_id: Option<Uuid>,
}

/// GET /api/membros[?comissao_id=]
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<ListQuery>) -> ApiResult<Vec<MembroComissaoRow>> {
    Ok(ApiResponse::success(state.membros().list(query.comissao_id).await?))
}

/// POST /api/membros
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<NovoMembro>) -> ApiResult<Membro> {
    Ok(ApiResponse::created(state.membros().add(input).await?))
}
