//! Document queries
//!
//! A [`Query`] describes which documents of a collection to read: equality,
//! membership and range filters over top-level JSON fields, a single sort
//! field, a `startAfter` cursor and a limit. [`render`] turns it into SQL for
//! the configured driver. Field names are compile-time constants and are
//! spliced into JSON paths; every value travels as a bound parameter.

use serde_json::Value;

use crate::config::DatabaseDriver;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Comparison used by range filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Cmp {
    fn as_sql(self) -> &'static str {
        match self {
            Cmp::Gt => ">",
            Cmp::Gte => ">=",
            Cmp::Lt => "<",
            Cmp::Lte => "<=",
        }
    }
}

/// A single predicate over a top-level document field
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field == value` (JSON equality, so `true` never matches `"true"`).
    /// A null value matches explicit nulls and absent fields.
    Eq(&'static str, Value),
    /// `field` equals any of the values
    In(&'static str, Vec<Value>),
    /// `field` is an array containing `value`
    ArrayContains(&'static str, Value),
    /// String comparison, used for timestamps
    Range(&'static str, Cmp, String),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn is_in<V: Into<Value>>(field: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field, values.into_iter().map(Into::into).collect())
    }

    pub fn contains(field: &'static str, value: impl Into<Value>) -> Self {
        Filter::ArrayContains(field, value.into())
    }

    pub fn range(field: &'static str, cmp: Cmp, value: impl Into<String>) -> Self {
        Filter::Range(field, cmp, value.into())
    }

    fn field(&self) -> &'static str {
        match self {
            Filter::Eq(f, _) | Filter::In(f, _) | Filter::ArrayContains(f, _) | Filter::Range(f, _, _) => f,
        }
    }
}

/// A query over one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<(&'static str, Direction)>,
    pub start_after: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a filter only when `value` is present
    pub fn filter_opt<T>(self, value: Option<T>, make: impl FnOnce(T) -> Filter) -> Self {
        match value {
            Some(v) => self.filter(make(v)),
            None => self,
        }
    }

    pub fn order_by(mut self, field: &'static str, direction: Direction) -> Self {
        self.order = Some((field, direction));
        self
    }

    /// Continue after the document with this id, in the current order
    pub fn start_after(mut self, id: Option<String>) -> Self {
        self.start_after = id.filter(|s| !s.is_empty());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Position of a resolved `startAfter` cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub value: String,
    pub id: String,
}

/// Rendered SQL plus its positional parameters, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub binds: Vec<String>,
}

fn check_field(field: &str) {
    debug_assert!(
        !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
        "invalid document field name: {field}"
    );
}

/// JSON value of a field, comparable with another JSON value
fn json_expr(driver: DatabaseDriver, field: &str) -> String {
    check_field(field);
    match driver {
        DatabaseDriver::Sqlite => format!("json_extract(data, '$.{}')", field),
        DatabaseDriver::Mysql => format!("JSON_EXTRACT(data, '$.{}')", field),
    }
}

/// Text value of a field, for ordering and range comparisons
fn text_expr(driver: DatabaseDriver, field: &str) -> String {
    match driver {
        DatabaseDriver::Sqlite => json_expr(driver, field),
        DatabaseDriver::Mysql => format!("JSON_UNQUOTE({})", json_expr(driver, field)),
    }
}

/// Placeholder for a bound JSON-encoded value
fn json_param(driver: DatabaseDriver) -> &'static str {
    match driver {
        DatabaseDriver::Sqlite => "json_extract(?, '$')",
        DatabaseDriver::Mysql => "CAST(? AS JSON)",
    }
}

fn render_filter(driver: DatabaseDriver, filter: &Filter, binds: &mut Vec<String>) -> String {
    match filter {
        Filter::Eq(field, Value::Null) => {
            let expr = json_expr(driver, field);
            match driver {
                DatabaseDriver::Sqlite => format!("{} IS NULL", expr),
                DatabaseDriver::Mysql => format!("({expr} IS NULL OR JSON_TYPE({expr}) = 'NULL')"),
            }
        }
        Filter::Eq(field, value) => {
            binds.push(value.to_string());
            format!("{} = {}", json_expr(driver, field), json_param(driver))
        }
        Filter::In(field, values) => {
            if values.is_empty() {
                return "1 = 0".to_string();
            }
            let parts: Vec<String> = values
                .iter()
                .map(|v| render_filter(driver, &Filter::Eq(field, v.clone()), binds))
                .collect();
            format!("({})", parts.join(" OR "))
        }
        Filter::ArrayContains(field, value) => {
            check_field(field);
            binds.push(value.to_string());
            match driver {
                DatabaseDriver::Sqlite => format!(
                    "EXISTS (SELECT 1 FROM json_each(data, '$.{}') WHERE json_each.value = json_extract(?, '$'))",
                    field
                ),
                DatabaseDriver::Mysql => format!(
                    "JSON_CONTAINS(JSON_EXTRACT(data, '$.{}'), CAST(? AS JSON))",
                    field
                ),
            }
        }
        Filter::Range(field, cmp, value) => {
            binds.push(value.clone());
            format!("{} {} ?", text_expr(driver, field), cmp.as_sql())
        }
    }
}

/// Render the WHERE clause shared by selects and counts
fn render_where(driver: DatabaseDriver, filters: &[Filter], binds: &mut Vec<String>) -> String {
    let mut clauses = vec!["collection = ?".to_string()];
    for filter in filters {
        debug_assert!(!filter.field().is_empty());
        clauses.push(render_filter(driver, filter, binds));
    }
    clauses.join(" AND ")
}

/// Render a SELECT of `id, data` for the query.
///
/// `cursor` is the already resolved position of `query.start_after`; it is
/// only meaningful together with an order.
pub fn render(driver: DatabaseDriver, collection: &str, query: &Query, cursor: Option<&Cursor>) -> Rendered {
    let mut binds = vec![collection.to_string()];
    let mut where_clause = render_where(driver, &query.filters, &mut binds);

    let data_column = match driver {
        DatabaseDriver::Sqlite => "data",
        DatabaseDriver::Mysql => "CAST(data AS CHAR) AS data",
    };

    let order_clause = match query.order {
        Some((field, direction)) => {
            let expr = text_expr(driver, field);
            let (dir, cmp) = match direction {
                Direction::Asc => ("ASC", ">"),
                Direction::Desc => ("DESC", "<"),
            };
            if let Some(cursor) = cursor {
                where_clause.push_str(&format!(
                    " AND ({expr} {cmp} ? OR ({expr} = ? AND id {cmp} ?))"
                ));
                binds.push(cursor.value.clone());
                binds.push(cursor.value.clone());
                binds.push(cursor.id.clone());
            }
            format!(" ORDER BY {expr} {dir}, id {dir}")
        }
        None => {
            if let Some(cursor) = cursor {
                where_clause.push_str(" AND id > ?");
                binds.push(cursor.id.clone());
            }
            " ORDER BY id ASC".to_string()
        }
    };

    let limit_clause = query
        .limit
        .map(|n| format!(" LIMIT {}", n))
        .unwrap_or_default();

    Rendered {
        sql: format!(
            "SELECT id, {} FROM documents WHERE {}{}{}",
            data_column, where_clause, order_clause, limit_clause
        ),
        binds,
    }
}

/// Render a COUNT over the filters
pub fn render_count(driver: DatabaseDriver, collection: &str, filters: &[Filter]) -> Rendered {
    let mut binds = vec![collection.to_string()];
    let where_clause = render_where(driver, filters, &mut binds);
    Rendered {
        sql: format!("SELECT COUNT(*) FROM documents WHERE {}", where_clause),
        binds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_equality_binds_json() {
        let q = Query::new().filter(Filter::eq("status", "OPEN")).filter(Filter::eq("published", true));
        let r = render(DatabaseDriver::Sqlite, "cases", &q, None);

        assert_eq!(
            r.sql,
            "SELECT id, data FROM documents WHERE collection = ? \
             AND json_extract(data, '$.status') = json_extract(?, '$') \
             AND json_extract(data, '$.published') = json_extract(?, '$') ORDER BY id ASC"
        );
        assert_eq!(r.binds, vec!["cases", "\"OPEN\"", "true"]);
    }

    #[test]
    fn test_render_in_expands_to_disjunction() {
        let q = Query::new().filter(Filter::is_in("status", ["OPEN", "ADJOURNED"]));
        let r = render(DatabaseDriver::Mysql, "cases", &q, None);

        assert!(r.sql.contains(
            "(JSON_EXTRACT(data, '$.status') = CAST(? AS JSON) OR JSON_EXTRACT(data, '$.status') = CAST(? AS JSON))"
        ));
        assert_eq!(r.binds, vec!["cases", "\"OPEN\"", "\"ADJOURNED\""]);
    }

    #[test]
    fn test_render_empty_in_matches_nothing() {
        let q = Query::new().filter(Filter::In("status", vec![]));
        let r = render(DatabaseDriver::Sqlite, "cases", &q, None);
        assert!(r.sql.contains("1 = 0"));
    }

    #[test]
    fn test_render_array_contains() {
        let q = Query::new().filter(Filter::contains("courts", "High Court"));

        let sqlite = render(DatabaseDriver::Sqlite, "users", &q, None);
        assert!(sqlite.sql.contains("json_each(data, '$.courts')"));

        let mysql = render(DatabaseDriver::Mysql, "users", &q, None);
        assert!(mysql.sql.contains("JSON_CONTAINS(JSON_EXTRACT(data, '$.courts'), CAST(? AS JSON))"));
        assert_eq!(mysql.binds[1], "\"High Court\"");
    }

    #[test]
    fn test_render_order_cursor_and_limit() {
        let q = Query::new()
            .order_by("createdAt", Direction::Desc)
            .start_after(Some("doc9".into()))
            .limit(25);
        let cursor = Cursor { value: "2024-01-01T00:00:00.000Z".into(), id: "doc9".into() };
        let r = render(DatabaseDriver::Sqlite, "blogs", &q, Some(&cursor));

        assert!(r.sql.ends_with(
            "ORDER BY json_extract(data, '$.createdAt') DESC, id DESC LIMIT 25"
        ));
        assert!(r.sql.contains(
            "(json_extract(data, '$.createdAt') < ? OR (json_extract(data, '$.createdAt') = ? AND id < ?))"
        ));
        assert_eq!(
            r.binds,
            vec!["blogs", "2024-01-01T00:00:00.000Z", "2024-01-01T00:00:00.000Z", "doc9"]
        );
    }

    #[test]
    fn test_render_ascending_cursor_uses_greater_than() {
        let q = Query::new().order_by("nextHearingDate", Direction::Asc);
        let cursor = Cursor { value: "a".into(), id: "x".into() };
        let r = render(DatabaseDriver::Mysql, "cases", &q, Some(&cursor));
        assert!(r.sql.contains("JSON_UNQUOTE(JSON_EXTRACT(data, '$.nextHearingDate')) > ?"));
        assert!(r.sql.contains("CAST(data AS CHAR) AS data"));
    }

    #[test]
    fn test_render_range_uses_text_comparison() {
        let q = Query::new().filter(Filter::range("remindMeDate", Cmp::Lte, "2024-06-01T00:00:00.000Z"));
        let r = render(DatabaseDriver::Mysql, "cases", &q, None);
        assert!(r.sql.contains("JSON_UNQUOTE(JSON_EXTRACT(data, '$.remindMeDate')) <= ?"));
    }

    #[test]
    fn test_render_null_equality_without_bind() {
        let q = Query::new().filter(Filter::eq("deletedAt", Value::Null));

        let sqlite = render(DatabaseDriver::Sqlite, "cases", &q, None);
        assert!(sqlite.sql.contains("json_extract(data, '$.deletedAt') IS NULL"));
        assert_eq!(sqlite.binds, vec!["cases"]);

        let mysql = render(DatabaseDriver::Mysql, "cases", &q, None);
        assert!(mysql.sql.contains("JSON_TYPE(JSON_EXTRACT(data, '$.deletedAt')) = 'NULL'"));
        assert_eq!(mysql.binds, vec!["cases"]);

        let q = Query::new().filter(Filter::In("status", vec![json!("OPEN"), Value::Null]));
        let r = render(DatabaseDriver::Sqlite, "cases", &q, None);
        assert!(r.sql.contains(
            "(json_extract(data, '$.status') = json_extract(?, '$') OR json_extract(data, '$.status') IS NULL)"
        ));
        assert_eq!(r.binds, vec!["cases", "\"OPEN\""]);
    }

    #[test]
    fn test_render_count() {
        let r = render_count(DatabaseDriver::Sqlite, "queryAnswers", &[Filter::eq("queryId", json!("q1"))]);
        assert_eq!(
            r.sql,
            "SELECT COUNT(*) FROM documents WHERE collection = ? AND json_extract(data, '$.queryId') = json_extract(?, '$')"
        );
        assert_eq!(r.binds, vec!["queryAnswers", "\"q1\""]);
    }

    #[test]
    fn test_filter_opt_and_blank_cursor() {
        let q = Query::new()
            .filter_opt(None::<String>, |v| Filter::eq("city", v))
            .filter_opt(Some("Pune".to_string()), |v| Filter::eq("city", v))
            .start_after(Some(String::new()));
        assert_eq!(q.filters, vec![Filter::eq("city", "Pune")]);
        assert!(q.start_after.is_none());
    }
}
