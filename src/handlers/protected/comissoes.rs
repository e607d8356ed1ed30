use axum::extract::{Path, State};
use serde::Deserialize;

use super::super::parse_id;
use crate::app::AppState;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::database::models::Comissao;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::comissao_service::{ComissaoPatch, ComissaoSimilar, NovaComissao};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub ativa: Option<bool>,
}

/// GET /api/comissoes[?ativa=true]
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<ListQuery>) -> ApiResult<Vec<Comissao>> {
    Ok(ApiResponse::success(state.comissoes().list(query.ativa).await?))
}

/// GET /api/comissoes/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Comissao> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.comissoes().get(id).await?))
}

/// POST /api/comissoes
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<NovaComissao>) -> ApiResult<Comissao> {
    Ok(ApiResponse::created(state.comissoes().create(input).await?))
}

/// PATCH /api/comissoes/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ComissaoPatch>,
) -> ApiResult<Comissao> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.comissoes().update(id, patch).await?))
}

/// GET /api/comissoes/:id/similares - committees sharing projects
pub async fn similar(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<ComissaoSimilar>> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.comissoes().similar(id).await?))
}
