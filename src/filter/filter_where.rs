use serde_json::Value;

use super::error::FilterError;
use super::is_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Maximum nesting of `$and`/`$or`/`$not` groups
pub const MAX_NESTED_DEPTH: u32 = 5;

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    depth: u32,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    fn new(starting_param_index: usize, depth: u32) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            depth,
            conditions: vec![],
        }
    }

    /// Render a WHERE body with placeholders numbered from `starting_param_index + 1`.
    /// Returns an empty string when there is nothing to filter on.
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        Self::generate_nested(where_data, starting_param_index, 0)
    }

    fn generate_nested(where_data: &Value, starting_param_index: usize, depth: u32) -> Result<(String, Vec<Value>), FilterError> {
        if depth > MAX_NESTED_DEPTH {
            return Err(FilterError::TooDeep(MAX_NESTED_DEPTH));
        }
        let mut filter_where = Self::new(starting_param_index, depth);
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions_snapshot = self.conditions.clone();
        for condition in &conditions_snapshot {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        Ok((sql_conditions.join(" AND "), self.param_values.clone()))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = Self::generate_nested(v, self.param_index, self.depth + 1)?;
                    if sql.is_empty() { continue; }
                    self.param_index += params.len();
                    self.param_values.extend(params);
                    sql_parts.push(format!("({})", sql));
                }
                if sql_parts.is_empty() {
                    return Ok(());
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                self.conditions.push(FilterWhereInfo {
                    column: format!("({})", sql_parts.join(joiner)),
                    operator: FilterOp::Raw,
                    data: Value::Null,
                });
                Ok(())
            }
            "$not" => {
                let (sql, params) = Self::generate_nested(value, self.param_index, self.depth + 1)?;
                if sql.is_empty() { return Ok(()); }
                self.param_index += params.len();
                self.param_values.extend(params);
                self.conditions.push(FilterWhereInfo {
                    column: format!("NOT ({})", sql),
                    operator: FilterOp::Raw,
                    data: Value::Null,
                });
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if !is_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
                }
            }
            // Implicit equality: { field: value }
            _ => self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }),
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Neq,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$any" => FilterOp::Any,
            "$all" => FilterOp::All,
            "$size" => FilterOp::Size,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        if condition.operator == FilterOp::Raw {
            return Ok(condition.column.clone());
        }

        let col = format!("\"{}\"", condition.column);
        let data = &condition.data;
        match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { Ok(format!("{} IS NULL", col)) }
                else { Ok(format!("{} = {}", col, self.scalar_param(data)?)) }
            }
            FilterOp::Neq => {
                if data.is_null() { Ok(format!("{} IS NOT NULL", col)) }
                else { Ok(format!("{} <> {}", col, self.scalar_param(data)?)) }
            }
            FilterOp::Gt => Ok(format!("{} > {}", col, self.scalar_param(data)?)),
            FilterOp::Gte => Ok(format!("{} >= {}", col, self.scalar_param(data)?)),
            FilterOp::Lt => Ok(format!("{} < {}", col, self.scalar_param(data)?)),
            FilterOp::Lte => Ok(format!("{} <= {}", col, self.scalar_param(data)?)),
            FilterOp::Like => Ok(format!("{} LIKE {}", col, self.scalar_param(data)?)),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", col, self.scalar_param(data)?)),
            FilterOp::In | FilterOp::NIn => {
                let values = Self::as_list(data);
                let negate = condition.operator == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(if negate { "1=1".to_string() } else { "1=0".to_string() });
                }
                let params = values.iter().map(|v| self.scalar_param(v)).collect::<Result<Vec<_>, _>>()?;
                let op = if negate { "NOT IN" } else { "IN" };
                Ok(format!("{} {} ({})", col, op, params.join(", ")))
            }
            FilterOp::Between => {
                match data {
                    Value::Array(values) if values.len() == 2 => {
                        let low = self.scalar_param(&values[0])?;
                        let high = self.scalar_param(&values[1])?;
                        Ok(format!("{} BETWEEN {} AND {}", col, low, high))
                    }
                    _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
                }
            }
            FilterOp::Any | FilterOp::All => {
                let values = Self::as_list(data);
                if values.is_empty() {
                    // Overlap with nothing never matches; containment of nothing always does
                    return Ok(if condition.operator == FilterOp::Any { "1=0".to_string() } else { "1=1".to_string() });
                }
                let op = if condition.operator == FilterOp::Any { "&&" } else { "@>" };
                Ok(format!("{} {} {}::text[]", col, op, self.text_array_param(&values)?))
            }
            FilterOp::Size => {
                if !data.is_number() {
                    return Err(FilterError::InvalidOperatorData("$size requires a number".to_string()));
                }
                Ok(format!("COALESCE(array_length({}, 1), 0) = {}", col, self.scalar_param(data)?))
            }
            FilterOp::Raw => unreachable!("handled above"),
        }
    }

    fn as_list(data: &Value) -> Vec<Value> {
        match data {
            Value::Array(values) => values.clone(),
            Value::Null => vec![],
            other => vec![other.clone()],
        }
    }

    /// One `text[]` parameter holding every element as text
    fn text_array_param(&mut self, values: &[Value]) -> Result<String, FilterError> {
        let items = values
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(Value::String(s.clone())),
                Value::Number(_) | Value::Bool(_) => Ok(Value::String(v.to_string())),
                other => Err(FilterError::InvalidOperatorData(format!("expected scalar array element, got {}", other))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.param_values.push(Value::Array(items));
        self.param_index += 1;
        Ok(format!("${}", self.param_index))
    }

    fn scalar_param(&mut self, value: &Value) -> Result<String, FilterError> {
        if value.is_array() || value.is_object() {
            return Err(FilterError::InvalidOperatorData(format!("expected scalar value, got {}", value)));
        }
        self.param_values.push(value.clone());
        self.param_index += 1;
        Ok(format!("${}", self.param_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "ativa": true, "descricao": null }), 0).unwrap();
        assert!(sql.contains("\"ativa\" = $1"));
        assert!(sql.contains("\"descricao\" IS NULL"));
        assert_eq!(params, vec![json!(true)]);
    }

    #[test]
    fn nested_or_keeps_placeholder_numbering() {
        let where_data = json!({
            "tipo": "api",
            "$or": [
                { "nome": { "$ilike": "%pje%" } },
                { "descricao": { "$ilike": "%pje%" } }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(params.len(), 3);
        assert!(sql.contains("$1"));
        assert!(sql.contains("$2"));
        assert!(sql.contains("$3"));
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn any_overlaps_arrays() {
        let (sql, params) = FilterWhere::generate(&json!({ "tags": { "$any": ["ia", "lgpd"] } }), 2).unwrap();
        assert_eq!(sql, "\"tags\" && $3::text[]");
        assert_eq!(params, vec![json!(["ia", "lgpd"])]);
    }

    #[test]
    fn array_operands_stay_text_whatever_they_look_like() {
        let id = "0b9d6f0e-6c1a-4d8e-9a43-3f1c2a7b8e10";
        let (sql, params) = FilterWhere::generate(
            &json!({ "ativo": true, "tags": { "$all": ["2024-03-01", id, 7] } }),
            0,
        )
        .unwrap();
        assert_eq!(sql, "\"ativo\" = $1 AND \"tags\" @> $2::text[]");
        assert_eq!(params, vec![json!(true), json!(["2024-03-01", id, "7"])]);
    }

    #[test]
    fn nested_array_operands_are_rejected() {
        assert!(matches!(
            FilterWhere::generate(&json!({ "tags": { "$any": [["ia"]] } }), 0),
            Err(FilterError::InvalidOperatorData(_))
        ));
    }

    #[test]
    fn empty_in_never_matches() {
        let (sql, params) = FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_unknown_operator_and_bad_columns() {
        assert!(matches!(
            FilterWhere::generate(&json!({ "nome": { "$regex": "x" } }), 0),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "nome; --": 1 }), 0),
            Err(FilterError::InvalidColumn(_))
        ));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut where_data = json!({ "nome": "x" });
        for _ in 0..(MAX_NESTED_DEPTH + 2) {
            where_data = json!({ "$not": where_data });
        }
        assert!(matches!(FilterWhere::generate(&where_data, 0), Err(FilterError::TooDeep(_))));
    }

    #[test]
    fn object_values_without_operators_are_equality() {
        let err = FilterWhere::generate(&json!({ "meta": { "a": 1 } }), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }
}
