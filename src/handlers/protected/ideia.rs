use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct IdeiaRequest {
    #[serde(default)]
    pub ideia: String,
}

/// POST /api/ideia - relay a project idea to the completion API
pub async fn generate(State(state): State<AppState>, ApiJson(request): ApiJson<IdeiaRequest>) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.ideia.generate(&request.ideia).await?))
}
