use axum::extract::{Path, State};
use serde::Deserialize;

use super::super::parse_id;
use crate::app::AppState;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::database::models::SugestaoIntegracao;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::sugestao_service::{EstatisticasSugestoes, NovaSugestao, SugestaoFiltro, SugestaoPatch};
use crate::types::split_list;

#[derive(Debug, Deserialize)]
pub struct SistemasQuery {
    #[serde(default)]
    pub sistemas: String,
}

#[derive(Debug, Deserialize)]
pub struct TagsQuery {
    #[serde(default)]
    pub tags: String,
}

/// GET /api/sugestoes[?tipo=&nivel_complexidade=&area_aplicacao=&search=&order_by=&ascending=]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filtro): ApiQuery<SugestaoFiltro>,
) -> ApiResult<Vec<SugestaoIntegracao>> {
    Ok(ApiResponse::success(state.sugestoes().list(&filtro).await?))
}

/// GET /api/sugestoes/compatibilidade?sistemas=pje,sei
pub async fn by_compatibility(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SistemasQuery>,
) -> ApiResult<Vec<SugestaoIntegracao>> {
    let sistemas = split_list(&query.sistemas);
    Ok(ApiResponse::success(state.sugestoes().by_compatibility(sistemas).await?))
}

/// GET /api/sugestoes/tags?tags=ia,automacao
pub async fn by_tags(State(state): State<AppState>, ApiQuery(query): ApiQuery<TagsQuery>) -> ApiResult<Vec<SugestaoIntegracao>> {
    let tags = split_list(&query.tags);
    Ok(ApiResponse::success(state.sugestoes().by_tags(tags).await?))
}

/// GET /api/sugestoes/estatisticas
pub async fn stats(State(state): State<AppState>) -> ApiResult<EstatisticasSugestoes> {
    Ok(ApiResponse::success(state.sugestoes().stats().await?))
}

/// GET /api/sugestoes/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SugestaoIntegracao> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.sugestoes().get(id).await?))
}

/// POST /api/sugestoes
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<NovaSugestao>) -> ApiResult<SugestaoIntegracao> {
    Ok(ApiResponse::created(state.sugestoes().create(input).await?))
}

/// PATCH /api/sugestoes/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<SugestaoPatch>,
) -> ApiResult<SugestaoIntegracao> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.sugestoes().update(id, patch).await?))
}

/// DELETE /api/sugestoes/:id - deactivates, the row is kept
pub async fn deactivate(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SugestaoIntegracao> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.sugestoes().deactivate(id).await?))
}
