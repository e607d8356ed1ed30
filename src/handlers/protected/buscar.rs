use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::handlers::extract::ApiQuery;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::busca_service::BuscaResultado;

#[derive(Debug, Deserialize)]
pub struct BuscaQuery {
    #[serde(default)]
    pub termo: String,
}

/// GET /api/buscar?termo= - projects and committees ranked by match weight
pub async fn search(State(state): State<AppState>, ApiQuery(query): ApiQuery<BuscaQuery>) -> ApiResult<Vec<BuscaResultado>> {
    Ok(ApiResponse::success(state.busca().search(&query.termo).await?))
}
