use serde::Serialize;
use serde_json::{json, Value};
use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Filter-driven reads over one table or view
pub struct Repository<T> {
    table_name: String,
    pool: PgPool,
    max_limit: Option<i32>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table_name: table_name.into(),
            pool,
            max_limit: None,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn with_max_limit(mut self, max_limit: Option<i32>) -> Self {
        self.max_limit = max_limit;
        self
    }

    fn builder(&self) -> Result<QueryBuilder<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name, self.max_limit)
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.builder()?.filter(filter_data)?.select_all(&self.pool).await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        let filter_data = FilterData { limit: Some(1), ..filter_data };
        self.builder()?.filter(filter_data)?.select_optional(&self.pool).await
    }

    pub async fn select_404(&self, filter_data: FilterData) -> Result<T, DatabaseError> {
        self.select_one(filter_data)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Record not found in {}", self.table_name)))
    }

    pub async fn select_by_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.select_404(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await
    }

    pub async fn select_json(&self, filter_data: FilterData) -> Result<Vec<Value>, DatabaseError> {
        self.builder()?.filter(filter_data)?.select_json(&self.pool).await
    }
}
