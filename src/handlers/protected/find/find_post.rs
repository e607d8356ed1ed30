use axum::extract::{Path, State};
use serde_json::Value;

use super::is_findable;
use crate::app::AppState;
use crate::handlers::extract::ApiJson;
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/find/:table - Advanced filtered search
///
/// Accepts a FilterData JSON body with:
/// - select: fields to return
/// - where: filter conditions (`$eq $ne $gt $gte $lt $lte $like $ilike $in
///   $between $any $all $size $and $or $not`)
/// - order: sort order
/// - limit/offset: pagination, capped by `filter.max_limit`
pub async fn find_post(
    State(state): State<AppState>,
    Path(table): Path<String>,
    ApiJson(filter_data): ApiJson<FilterData>,
) -> ApiResult<Vec<Value>> {
    if !is_findable(&table) {
        return Err(ApiError::bad_request(format!("Table '{}' is not available for find", table)));
    }

    // Reject malformed filters with 400 before touching the pool
    let max_limit = state.config.filter.max_limit;
    let mut candidate = Filter::new(table.as_str())?.with_max_limit(max_limit);
    candidate.assign(filter_data.clone())?;
    candidate.to_json_sql()?;

    let rows = Repository::<(Value,)>::new(table.as_str(), state.pool.clone())
        .with_max_limit(max_limit)
        .select_json(filter_data)
        .await?;

    tracing::debug!("find on {} returned {} rows", table, rows.len());
    Ok(ApiResponse::success(rows))
}
