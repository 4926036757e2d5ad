use super::error::FilterError;
use super::search::contains_pattern;
use super::types::{FilterOrderInfo, SortDirection, SqlParam, SqlResult};

/// Parameterized `SELECT` builder. Identifiers are validated and quoted,
/// values always travel as bind parameters.
pub struct Filter {
    table_name: String,
    conditions: Vec<String>,
    params: Vec<SqlParam>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_identifier(&table_name)
            .map_err(|_| FilterError::InvalidTableName(table_name.clone()))?;
        Ok(Self {
            table_name,
            conditions: vec![],
            params: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    pub fn where_eq(&mut self, column: &str, value: SqlParam) -> Result<&mut Self, FilterError> {
        self.compare(column, "=", value)
    }

    pub fn where_gte(&mut self, column: &str, value: SqlParam) -> Result<&mut Self, FilterError> {
        self.compare(column, ">=", value)
    }

    pub fn where_lte(&mut self, column: &str, value: SqlParam) -> Result<&mut Self, FilterError> {
        self.compare(column, "<=", value)
    }

    fn compare(&mut self, column: &str, op: &str, value: SqlParam) -> Result<&mut Self, FilterError> {
        Self::validate_identifier(column)?;
        let placeholder = self.bind(value);
        self.conditions.push(format!("\"{}\" {} {}", column, op, placeholder));
        Ok(self)
    }

    /// Exact match on the text value of a top-level key of a JSON column
    pub fn where_json_text(&mut self, column: &str, key: &str, value: &str) -> Result<&mut Self, FilterError> {
        Self::validate_identifier(column)?;
        let key_placeholder = self.bind(SqlParam::Text(key.to_string()));
        let value_placeholder = self.bind(SqlParam::Text(value.to_string()));
        self.conditions.push(format!(
            "\"{}\" ->> {} = {}",
            column, key_placeholder, value_placeholder
        ));
        Ok(self)
    }

    /// Case-insensitive substring match of every term against the column's text form
    pub fn search(&mut self, column: &str, terms: &[String]) -> Result<&mut Self, FilterError> {
        Self::validate_identifier(column)?;
        for term in terms {
            let placeholder = self.bind(SqlParam::Text(contains_pattern(term)));
            self.conditions.push(format!(
                "\"{}\"::text ILIKE {} ESCAPE '\\'",
                column, placeholder
            ));
        }
        Ok(self)
    }

    pub fn order(&mut self, column: &str, sort: SortDirection) -> Result<&mut Self, FilterError> {
        Self::validate_identifier(column)?;
        self.order_data.push(FilterOrderInfo { column: column.to_string(), sort });
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::parameter("limit", "Limit must be non-negative"));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::parameter("offset", "Offset must be non-negative"));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let query = [
            format!("SELECT * FROM \"{}\"", self.table_name),
            self.build_where_clause(),
            self.build_order_clause(),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params: self.params.clone() }
    }

    /// Same conditions, ignoring order and limit
    pub fn to_count_sql(&self) -> SqlResult {
        let query = [
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name),
            self.build_where_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params: self.params.clone() }
    }

    fn build_where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn build_order_clause(&self) -> String {
        if self.order_data.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .order_data
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }

    fn validate_identifier(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if valid {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_select() {
        let filter = Filter::new("employees").unwrap();
        let sql = filter.to_sql();
        assert_eq!(sql.query, "SELECT * FROM \"employees\"");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn conditions_are_numbered_in_order() {
        let mut filter = Filter::new("employees").unwrap();
        filter
            .where_eq("form_id", SqlParam::Int(4))
            .unwrap()
            .search("data", &["Ali".to_string(), "ops".to_string()])
            .unwrap()
            .where_json_text("data", "city", "Berlin")
            .unwrap()
            .order("id", SortDirection::Asc)
            .unwrap()
            .limit(10, Some(20))
            .unwrap();

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"employees\" WHERE \"form_id\" = $1 \
             AND \"data\"::text ILIKE $2 ESCAPE '\\' \
             AND \"data\"::text ILIKE $3 ESCAPE '\\' \
             AND \"data\" ->> $4 = $5 \
             ORDER BY \"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Int(4),
                SqlParam::Text("%Ali%".to_string()),
                SqlParam::Text("%ops%".to_string()),
                SqlParam::Text("city".to_string()),
                SqlParam::Text("Berlin".to_string()),
            ]
        );
    }

    #[test]
    fn count_ignores_order_and_limit() {
        let mut filter = Filter::new("employees").unwrap();
        filter
            .where_eq("form_id", SqlParam::Int(1))
            .unwrap()
            .order("id", SortDirection::Desc)
            .unwrap()
            .limit(5, None)
            .unwrap();

        let sql = filter.to_count_sql();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"employees\" WHERE \"form_id\" = $1");
        assert_eq!(sql.params, vec![SqlParam::Int(1)]);
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(matches!(Filter::new("employees; drop"), Err(FilterError::InvalidTableName(_))));
        let mut filter = Filter::new("employees").unwrap();
        assert!(filter.where_eq("data\" OR 1=1 --", SqlParam::Int(1)).is_err());
        assert!(filter.order("", SortDirection::Asc).is_err());
        assert!(filter.limit(-1, None).is_err());
    }
}
