use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgPool, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

/// Runs a `Filter` against one table and decodes rows into `T`
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>, max_limit: Option<i32>) -> Result<Self, DatabaseError> {
        let filter = Filter::new(table_name)?.with_max_limit(max_limit);
        Ok(Self { filter, _phantom: std::marker::PhantomData })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        log_sql(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        log_sql(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    /// Rows as JSON objects, one per matching record
    pub async fn select_json(self, pool: &PgPool) -> Result<Vec<Value>, DatabaseError> {
        let sql_result = self.filter.to_json_sql()?;
        log_sql(&sql_result);
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        rows.iter()
            .map(|row| row.try_get::<Value, _>("row").map_err(DatabaseError::from))
            .collect()
    }
}

fn log_sql(sql_result: &SqlResult) {
    if crate::config::config().filter.debug_logging {
        tracing::debug!(query = %sql_result.query, params = ?sql_result.params, "filter query");
    }
}

/// Typed form of a JSON filter parameter. Scalar strings that look like UUIDs,
/// RFC 3339 timestamps or ISO dates bind with that Postgres type so they
/// compare against uuid/timestamptz/date columns. Arrays are the operands of
/// `$any`/`$all` and always bind as `text[]`.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Text(&'a str),
    TextArray(Vec<String>),
    Json(&'a Value),
}

impl<'a> BindValue<'a> {
    pub fn from_json(v: &'a Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::Int(i)
                } else {
                    BindValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => {
                if let Ok(id) = Uuid::parse_str(s) {
                    BindValue::Uuid(id)
                } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                    BindValue::Timestamp(ts.with_timezone(&Utc))
                } else if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    BindValue::Date(date)
                } else {
                    BindValue::Text(s)
                }
            }
            Value::Array(items) => BindValue::TextArray(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(_) => BindValue::Json(v),
        }
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match BindValue::from_json(v) {
        BindValue::Null => q.bind(None::<String>),
        BindValue::Bool(b) => q.bind(b),
        BindValue::Int(i) => q.bind(i),
        BindValue::Float(f) => q.bind(f),
        BindValue::Uuid(id) => q.bind(id),
        BindValue::Timestamp(ts) => q.bind(ts),
        BindValue::Date(d) => q.bind(d),
        BindValue::Text(s) => q.bind(s),
        BindValue::TextArray(items) => q.bind(items),
        BindValue::Json(j) => q.bind(j),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match BindValue::from_json(v) {
        BindValue::Null => q.bind(None::<String>),
        BindValue::Bool(b) => q.bind(b),
        BindValue::Int(i) => q.bind(i),
        BindValue::Float(f) => q.bind(f),
        BindValue::Uuid(id) => q.bind(id),
        BindValue::Timestamp(ts) => q.bind(ts),
        BindValue::Date(d) => q.bind(d),
        BindValue::Text(s) => q.bind(s),
        BindValue::TextArray(items) => q.bind(items),
        BindValue::Json(j) => q.bind(j),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sniffs_typed_strings() {
        let id = Uuid::new_v4();
        let v = json!(id.to_string());
        assert_eq!(BindValue::from_json(&v), BindValue::Uuid(id));

        let v = json!("2024-03-01");
        assert!(matches!(BindValue::from_json(&v), BindValue::Date(_)));

        let v = json!("2024-03-01T10:00:00Z");
        assert!(matches!(BindValue::from_json(&v), BindValue::Timestamp(_)));

        let v = json!("%pje%");
        assert_eq!(BindValue::from_json(&v), BindValue::Text("%pje%"));
    }

    #[test]
    fn arrays_bind_as_text_even_when_date_shaped() {
        let v = json!(["2024-03-01", Uuid::nil().to_string(), "ia"]);
        assert_eq!(
            BindValue::from_json(&v),
            BindValue::TextArray(vec!["2024-03-01".into(), Uuid::nil().to_string(), "ia".into()])
        );
    }

    #[test]
    fn numbers_bind_as_int_or_float() {
        assert_eq!(BindValue::from_json(&json!(10)), BindValue::Int(10));
        assert_eq!(BindValue::from_json(&json!(0.5)), BindValue::Float(0.5));
        assert_eq!(BindValue::from_json(&json!(null)), BindValue::Null);
    }
}
