use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use super::error::FilterError;
use super::filter::Filter;
use super::search::split_terms;
use super::types::{SortDirection, SqlParam};

/// Query-string prefix for exact matches on top-level payload keys, e.g. `data.city=Berlin`
pub const DATA_FILTER_PREFIX: &str = "data.";

/// Search, filter and pagination parameters accepted by the submission listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionQuery {
    pub search: Vec<String>,
    pub form: Option<i64>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub data: BTreeMap<String, String>,
    pub page: i64,
    pub page_size: i64,
}

impl SubmissionQuery {
    /// Unknown parameters are ignored; malformed known ones are rejected.
    /// `page_size` is capped at `max_page_size`.
    pub fn from_params(
        params: &HashMap<String, String>,
        default_page_size: i64,
        max_page_size: i64,
    ) -> Result<Self, FilterError> {
        let mut query = SubmissionQuery {
            page: 1,
            page_size: default_page_size.max(1),
            ..Default::default()
        };
        let max_page_size = max_page_size.max(1);

        for (key, value) in params {
            if key.contains('\0') || value.contains('\0') {
                return Err(FilterError::parameter(key, "Null characters are not allowed."));
            }
            match key.as_str() {
                "search" => query.search = split_terms(value),
                "form" => query.form = Some(parse_id("form", value)?),
                "created_after" => query.created_after = Some(parse_timestamp("created_after", value)?),
                "created_before" => query.created_before = Some(parse_timestamp("created_before", value)?),
                "page" => query.page = parse_positive("page", value)?,
                "page_size" => query.page_size = parse_positive("page_size", value)?,
                other => {
                    if let Some(data_key) = other.strip_prefix(DATA_FILTER_PREFIX) {
                        if data_key.is_empty() {
                            return Err(FilterError::parameter(other, "Missing data key"));
                        }
                        query.data.insert(data_key.to_string(), value.clone());
                    }
                }
            }
        }

        if query.page_size > max_page_size {
            tracing::debug!("page_size {} exceeds max {}, capping", query.page_size, max_page_size);
            query.page_size = max_page_size;
        }

        Ok(query)
    }

    /// Filter over `employees` with every condition but no ordering or paging
    pub fn to_filter(&self) -> Result<Filter, FilterError> {
        let mut filter = Filter::new("employees")?;

        if let Some(form) = self.form {
            filter.where_eq("form_id", SqlParam::Int(form))?;
        }
        if let Some(after) = self.created_after {
            filter.where_gte("created_at", SqlParam::Timestamp(after))?;
        }
        if let Some(before) = self.created_before {
            filter.where_lte("created_at", SqlParam::Timestamp(before))?;
        }
        for (key, value) in &self.data {
            filter.where_json_text("data", key, value)?;
        }
        if !self.search.is_empty() {
            filter.search("data", &self.search)?;
        }

        Ok(filter)
    }

    /// Filter for one page in insertion order
    pub fn to_page_filter(&self) -> Result<Filter, FilterError> {
        let mut filter = self.to_filter()?;
        filter
            .order("id", SortDirection::Asc)?
            .limit(self.page_size, Some(self.offset()))?;
        Ok(filter)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Pages needed for `count` rows; an empty result still has one page
    pub fn total_pages(&self, count: i64) -> i64 {
        if count <= 0 {
            1
        } else {
            (count + self.page_size - 1) / self.page_size
        }
    }
}

fn parse_id(field: &str, value: &str) -> Result<i64, FilterError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| FilterError::parameter(field, "A valid integer is required."))
}

fn parse_positive(field: &str, value: &str) -> Result<i64, FilterError> {
    match value.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(FilterError::parameter(field, "Must be a positive integer.")),
    }
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, FilterError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| FilterError::parameter(field, "Enter a valid RFC 3339 date/time."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults() {
        let query = SubmissionQuery::from_params(&HashMap::new(), 10, 100).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.offset(), 0);
        assert!(query.search.is_empty());
        assert_eq!(query.to_filter().unwrap().to_sql().query, "SELECT * FROM \"employees\"");
    }

    #[test]
    fn parses_known_parameters_and_ignores_the_rest() {
        let query = SubmissionQuery::from_params(
            &params(&[
                ("search", "ali, ops"),
                ("form", "12"),
                ("created_after", "2024-05-01T00:00:00Z"),
                ("data.city", "Berlin"),
                ("page", "3"),
                ("page_size", "25"),
                ("ordering", "-id"),
            ]),
            10,
            100,
        )
        .unwrap();

        assert_eq!(query.search, vec!["ali", "ops"]);
        assert_eq!(query.form, Some(12));
        assert!(query.created_after.is_some());
        assert_eq!(query.data.get("city").map(String::as_str), Some("Berlin"));
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn rejects_malformed_values() {
        for bad in [
            params(&[("form", "abc")]),
            params(&[("page", "0")]),
            params(&[("page_size", "-5")]),
            params(&[("created_before", "yesterday")]),
            params(&[("data.", "x")]),
        ] {
            assert!(
                matches!(
                    SubmissionQuery::from_params(&bad, 10, 100),
                    Err(FilterError::InvalidParameter { .. })
                ),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn caps_page_size() {
        let query = SubmissionQuery::from_params(&params(&[("page_size", "5000")]), 10, 100).unwrap();
        assert_eq!(query.page_size, 100);
    }

    #[test]
    fn null_characters_are_rejected() {
        for bad in [params(&[("search", "a\0")]), params(&[("data.city", "\0")]), params(&[("data.\0", "x")])] {
            assert!(matches!(
                SubmissionQuery::from_params(&bad, 10, 100),
                Err(FilterError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn zero_page_size_limits_fall_back_to_one() {
        let query = SubmissionQuery::from_params(&HashMap::new(), 0, 0).unwrap();
        assert_eq!(query.page_size, 1);
        assert_eq!(query.total_pages(3), 3);
    }

    #[test]
    fn page_filter_orders_by_insertion() {
        let query = SubmissionQuery::from_params(&params(&[("form", "2"), ("page", "2")]), 10, 100).unwrap();
        let sql = query.to_page_filter().unwrap().to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"employees\" WHERE \"form_id\" = $1 ORDER BY \"id\" ASC LIMIT 10 OFFSET 10"
        );
    }

    #[test]
    fn total_pages() {
        let query = SubmissionQuery { page: 1, page_size: 10, ..Default::default() };
        assert_eq!(query.total_pages(0), 1);
        assert_eq!(query.total_pages(10), 1);
        assert_eq!(query.total_pages(11), 2);
    }
}
