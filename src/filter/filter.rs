use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::is_identifier;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    max_limit: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            max_limit: None,
        })
    }

    /// Cap every limit (including an absent one) at `max`
    pub fn with_max_limit(mut self, max: Option<i32>) -> Self {
        self.max_limit = max;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        self.limit(data.limit, data.offset)?;
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column != "*" && !is_identifier(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i32>, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit {
            if l < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        }
        if let Some(off) = offset {
            if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }
        }

        self.limit = match (limit, self.max_limit) {
            (Some(l), Some(max)) if l > max => {
                tracing::debug!("Limit {} exceeds max {}, capping to max", l, max);
                Some(max)
            }
            (None, max) => max,
            (l, _) => l,
        };
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table_name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            FilterOrder::generate(&self.order_data),
            self.build_limit_clause(),
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    /// Same as `to_sql` but every row comes back as one JSON object column named `row`
    pub fn to_json_sql(&self) -> Result<SqlResult, FilterError> {
        let inner = self.to_sql()?;
        Ok(SqlResult {
            query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner.query),
            params: inner.params,
        })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, 0)?,
            None => (String::new(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(data: Value) -> Filter {
        let data: FilterData = serde_json::from_value(data).unwrap();
        let mut f = Filter::new("sugestoes_integracao").unwrap().with_max_limit(Some(100));
        f.assign(data).unwrap();
        f
    }

    #[test]
    fn builds_full_select() {
        let sql = filter(json!({
            "select": ["id", "nome"],
            "where": { "ativa": true },
            "order": "created_at desc",
            "limit": 10,
            "offset": 20
        }))
        .to_sql()
        .unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"id\", \"nome\" FROM \"sugestoes_integracao\" WHERE \"ativa\" = $1 ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![json!(true)]);
    }

    #[test]
    fn caps_limit_and_applies_default_cap() {
        let sql = filter(json!({ "limit": 5000 })).to_sql().unwrap();
        assert!(sql.query.ends_with("LIMIT 100"));
        let sql = filter(json!({})).to_sql().unwrap();
        assert!(sql.query.ends_with("LIMIT 100"));
    }

    #[test]
    fn wraps_rows_as_json() {
        let sql = filter(json!({ "where": { "tipo": "api" } })).to_json_sql().unwrap();
        assert!(sql.query.starts_with("SELECT row_to_json(t) AS row FROM (SELECT * FROM"));
        assert!(sql.query.ends_with(") t"));
    }

    #[test]
    fn rejects_bad_table_and_negative_limit() {
        assert!(Filter::new("usuarios; drop").is_err());
        let mut f = Filter::new("projetos").unwrap();
        assert!(f.limit(Some(-1), None).is_err());
    }
}
