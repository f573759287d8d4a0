use serde_json::Value;

use super::error::{is_identifier, FilterError};
use super::types::{FilterOp, FilterWhereInfo};

/// Renders a JSON where-clause into a parameterised SQL predicate.
///
/// Placeholders are numbered from `starting_param_index + 1` and stay
/// contiguous across nested `$and`/`$or`/`$not` groups.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
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
        let conditions_snapshot = std::mem::take(&mut self.conditions);
        for condition in &conditions_snapshot {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
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
                let combined = if arr.is_empty() {
                    // Empty conjunction is vacuously true, empty disjunction matches nothing
                    if op == "$and" { "1=1".to_string() } else { "1=0".to_string() }
                } else {
                    let mut sql_parts = Vec::with_capacity(arr.len());
                    for v in arr {
                        sql_parts.push(format!("({})", self.subclause(v)?));
                    }
                    let joiner = if op == "$and" { " AND " } else { " OR " };
                    format!("({})", sql_parts.join(joiner))
                };
                self.conditions.push(FilterWhereInfo { column: combined, operator: FilterOp::Raw, data: Value::Null });
                Ok(())
            }
            "$not" => {
                let sql = self.subclause(value)?;
                self.conditions.push(FilterWhereInfo { column: format!("NOT ({})", sql), operator: FilterOp::Raw, data: Value::Null });
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    /// Render a nested clause, continuing this clause's placeholder numbering
    fn subclause(&mut self, value: &Value) -> Result<String, FilterError> {
        let (sql, params) = Self::generate(value, self.param_index)?;
        self.param_index += params.len();
        self.param_values.extend(params);
        Ok(sql)
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if !is_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
                for (op_key, op_val) in obj {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.to_string()))?;
                    self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
                }
            }
            // Implicit equality: { field: value }
            _ => self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }),
        }
        Ok(())
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        if condition.operator == FilterOp::Raw {
            return Ok(condition.column.clone());
        }

        let quoted_column = format!("\"{}\"", condition.column);
        let data = &condition.data;
        Ok(match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { format!("{} IS NULL", quoted_column) }
                else { format!("{} = {}", quoted_column, self.param(data.clone())) }
            }
            FilterOp::Ne => {
                if data.is_null() { format!("{} IS NOT NULL", quoted_column) }
                else { format!("{} <> {}", quoted_column, self.param(data.clone())) }
            }
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(data.clone())),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(data.clone())),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(data.clone())),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(data.clone())),
            FilterOp::Like => format!("{} LIKE {}", quoted_column, self.param(data.clone())),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.param(data.clone())),
            FilterOp::In | FilterOp::NIn => {
                let negate = condition.operator == FilterOp::NIn;
                match data {
                    Value::Array(values) if values.is_empty() => {
                        if negate { "1=1".to_string() } else { "1=0".to_string() }
                    }
                    Value::Array(values) => {
                        let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                        let keyword = if negate { "NOT IN" } else { "IN" };
                        format!("{} {} ({})", quoted_column, keyword, params.join(", "))
                    }
                    other => {
                        let op = if negate { "<>" } else { "=" };
                        format!("{} {} {}", quoted_column, op, self.param(other.clone()))
                    }
                }
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => format!(
                    "{} BETWEEN {} AND {}",
                    quoted_column,
                    self.param(values[0].clone()),
                    self.param(values[1].clone())
                ),
                _ => return Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::Any => match data {
                Value::Array(values) if values.is_empty() => "1=0".to_string(),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    format!("{} && ARRAY[{}]", quoted_column, params.join(", "))
                }
                other => format!("{} && ARRAY[{}]", quoted_column, self.param(other.clone())),
            },
            FilterOp::All => match data {
                Value::Array(values) if values.is_empty() => "1=1".to_string(),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    format!("{} @> ARRAY[{}]", quoted_column, params.join(", "))
                }
                other => format!("{} @> ARRAY[{}]", quoted_column, self.param(other.clone())),
            },
            FilterOp::Size => {
                if !data.is_u64() {
                    return Err(FilterError::InvalidOperatorData("$size requires a non-negative integer".to_string()));
                }
                format!("COALESCE(cardinality({}), 0) = {}", quoted_column, self.param(data.clone()))
            }
            FilterOp::Raw => unreachable!("raw conditions are returned above"),
        })
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_where_matches_everything() {
        let (sql, params) = FilterWhere::generate(&json!({}), 0).unwrap();
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "website": null }), 0).unwrap();
        assert_eq!(sql, "\"website\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "website": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn nested_groups_number_placeholders_contiguously() {
        let where_data = json!({
            "$and": [
                { "title": "Home" },
                { "$or": [
                    { "website": { "$in": ["acme", "globex"] } },
                    { "website": null },
                    { "slug": "home" }
                ] }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(
            sql,
            "((\"title\" = $1) AND (((\"website\" IN ($2, $3)) OR (\"website\" IS NULL) OR (\"slug\" = $4))))"
        );
        assert_eq!(params, vec![json!("Home"), json!("acme"), json!("globex"), json!("home")]);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, params) = FilterWhere::generate(&json!({ "$and": [{ "id": "a" }, { "slug": "b" }] }), 2).unwrap();
        assert_eq!(sql, "((\"id\" = $3) AND (\"slug\" = $4))");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn array_overlap_and_size() {
        let (sql, _) = FilterWhere::generate(&json!({ "websites": { "$any": ["acme"] } }), 0).unwrap();
        assert_eq!(sql, "\"websites\" && ARRAY[$1]");

        let (sql, _) = FilterWhere::generate(&json!({ "websites": { "$size": 0 } }), 0).unwrap();
        assert_eq!(sql, "COALESCE(cardinality(\"websites\"), 0) = $1");
    }

    #[test]
    fn empty_or_matches_nothing() {
        let (sql, _) = FilterWhere::generate(&json!({ "$or": [] }), 0).unwrap();
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn rejects_unsafe_column_names() {
        let result = FilterWhere::generate(&json!({ "id\" OR 1=1 --": "x" }), 0);
        assert!(matches!(result, Err(FilterError::InvalidColumn(_))));
    }

    #[test]
    fn rejects_unknown_operators() {
        let result = FilterWhere::generate(&json!({ "title": { "$regex": "^a" } }), 0);
        assert!(matches!(result, Err(FilterError::UnsupportedOperator(_))));
    }
}
