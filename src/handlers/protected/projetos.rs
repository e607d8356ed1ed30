use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::super::parse_id;
use crate::app::AppState;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::database::models::Projeto;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::projeto_service::{
    EstatisticasProjetos, NovoProjeto, ProjetoCriado, ProjetoDetalhe, ProjetoFiltro, ProjetoPatch, ProjetoResumo,
    SugestaoProjeto,
};

/// GET /api/projetos[?status=&comissao_id=] - one summary per project
pub async fn list(State(state): State<AppState>, ApiQuery(filtro): ApiQuery<ProjetoFiltro>) -> ApiResult<Vec<ProjetoResumo>> {
    Ok(ApiResponse::success(state.projetos().list(filtro).await?))
}

/// GET /api/projetos/:id - project with committees (role as `papel`) and tags
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ProjetoDetalhe> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.projetos().get(id).await?))
}

/// POST /api/projetos
///
/// Inserts the project, then links each committee and adds each tag one by
/// one. Dependent failures do not undo the project; they are listed in
/// `relatorio.falhas` and the response is still 201.
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<NovoProjeto>) -> ApiResult<ProjetoCriado> {
    Ok(ApiResponse::created(state.projetos().create(input).await?))
}

/// PATCH /api/projetos/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProjetoPatch>,
) -> ApiResult<Projeto> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.projetos().update(id, patch).await?))
}

/// DELETE /api/projetos/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.projetos().delete(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// GET /api/projetos/:id/integracoes - projects ranked by shared committees
pub async fn integration_suggestions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<SugestaoProjeto>> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.projetos().integration_suggestions(id).await?))
}

/// GET /api/projetos/estatisticas
pub async fn stats(State(state): State<AppState>) -> ApiResult<EstatisticasProjetos> {
    Ok(ApiResponse::success(state.projetos().stats().await?))
}
