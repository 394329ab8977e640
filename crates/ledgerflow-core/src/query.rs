//! Parameterized SELECT builder
//!
//! Queries are assembled as an ordered list of predicates with their bound
//! values and rendered to SQL exactly once. Identifiers (tables, columns)
//! are `&'static str` owned by the compilers; request values only ever travel
//! as bound parameters.

use crate::time::DateRange;
use crate::types::Row;
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;

/// Timestamp column every entry and option table carries
pub const CREATED_AT: &str = "created_at";

/// A value bound to a `$n` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Date(NaiveDate),
    IntList(Vec<i64>),
    TextList(Vec<String>),
}

/// Projected column, optionally renamed in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub alias: Option<&'static str>,
}

impl Column {
    pub const fn plain(name: &'static str) -> Self {
        Self { name, alias: None }
    }

    pub const fn aliased(name: &'static str, alias: &'static str) -> Self {
        Self { name, alias: Some(alias) }
    }

    /// Key the column appears under in result rows
    pub fn output_name(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }
}

/// One WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = $n`
    Eq { column: &'static str, value: SqlParam },
    /// `column = ANY($n)`
    AnyOf { column: &'static str, values: SqlParam },
    /// `column::date BETWEEN $n AND $m` (or `= $n` for a single day)
    DateWithin { column: &'static str, range: DateRange },
    /// `column IS NOT NULL AND column <> ''`
    NotBlank { column: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: Direction,
}

/// SQL text plus the values for its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Structured SELECT against a single table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: &'static str,
    pub columns: Vec<Column>,
    pub distinct_on: Option<&'static str>,
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<OrderBy>,
}

impl SelectQuery {
    /// `SELECT * FROM table`
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            distinct_on: None,
            predicates: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: &[Column]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn distinct_on(mut self, column: &'static str) -> Self {
        self.distinct_on = Some(column);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order_by.push(OrderBy { column, direction });
        self
    }

    /// Render to Postgres SQL with `$n` placeholders
    pub fn render(&self) -> RenderedSql {
        let mut params: Vec<SqlParam> = Vec::new();
        let mut sql = String::from("SELECT ");

        if let Some(column) = self.distinct_on {
            sql.push_str(&format!("DISTINCT ON ({}) ", column));
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let projection: Vec<String> = self
                .columns
                .iter()
                .map(|c| match c.alias {
                    Some(alias) => format!("{} AS {}", c.name, alias),
                    None => c.name.to_string(),
                })
                .collect();
            sql.push_str(&projection.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(self.table);

        if !self.predicates.is_empty() {
            let clauses: Vec<String> = self
                .predicates
                .iter()
                .map(|p| render_predicate(p, &mut params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|o| match o.direction {
                    Direction::Asc => format!("{} ASC", o.column),
                    Direction::Desc => format!("{} DESC", o.column),
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        RenderedSql { sql, params }
    }

    /// Render wrapped so each row comes back as one JSON object.
    ///
    /// Postgres does not carry a subquery's ordering through to the outer
    /// select, so the ordering is repeated on `q` using output column names.
    /// The inner `ORDER BY` stays for `DISTINCT ON`.
    pub fn render_json_rows(&self) -> RenderedSql {
        let inner = self.render();
        let mut sql = format!("SELECT row_to_json(q) FROM ({}) q", inner.sql);

        let order: Vec<String> = self
            .order_by
            .iter()
            .filter_map(|o| {
                let column = self.output_column(o.column)?;
                Some(match o.direction {
                    Direction::Asc => format!("q.{} ASC", column),
                    Direction::Desc => format!("q.{} DESC", column),
                })
            })
            .collect();
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        RenderedSql { sql, params: inner.params }
    }

    /// Name a source column carries in the result rows, if it is projected
    fn output_column(&self, source: &'static str) -> Option<&'static str> {
        if self.columns.is_empty() {
            return Some(source);
        }
        self.columns
            .iter()
            .find(|c| c.name == source)
            .map(Column::output_name)
    }

    /// Evaluate the query against in-memory rows of `self.table`,
    /// following the same semantics as the rendered SQL.
    pub fn evaluate(&self, rows: &[Row]) -> Vec<Row> {
        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| self.predicates.iter().all(|p| p.matches(row)))
            .collect();

        matched.sort_by(|a, b| {
            for order in &self.order_by {
                let ordering = compare_values(a.get(order.column), b.get(order.column));
                let ordering = match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        if let Some(column) = self.distinct_on {
            let mut seen: Vec<Option<&Value>> = Vec::new();
            matched.retain(|row| {
                let key = row.get(column);
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            });
        }

        matched.into_iter().map(|row| self.project(row)).collect()
    }

    fn project(&self, row: &Row) -> Row {
        if self.columns.is_empty() {
            return row.clone();
        }
        self.columns
            .iter()
            .map(|c| {
                (
                    c.output_name().to_string(),
                    row.get(c.name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }
}

fn placeholder(params: &mut Vec<SqlParam>, value: SqlParam) -> String {
    params.push(value);
    format!("${}", params.len())
}

fn render_predicate(predicate: &Predicate, params: &mut Vec<SqlParam>) -> String {
    match predicate {
        Predicate::Eq { column, value } => {
            format!("{} = {}", column, placeholder(params, value.clone()))
        }
        Predicate::AnyOf { column, values } => {
            format!("{} = ANY({})", column, placeholder(params, values.clone()))
        }
        Predicate::DateWithin { column, range } => {
            if range.is_single_day() {
                format!("{}::date = {}", column, placeholder(params, SqlParam::Date(range.start)))
            } else {
                let start = placeholder(params, SqlParam::Date(range.start));
                let end = placeholder(params, SqlParam::Date(range.end));
                format!("{}::date BETWEEN {} AND {}", column, start, end)
            }
        }
        Predicate::NotBlank { column } => {
            format!("{} IS NOT NULL AND {} <> ''", column, column)
        }
    }
}

impl Predicate {
    /// In-memory counterpart of the rendered clause
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Eq { column, value } => param_matches(value, row.get(*column)),
            Predicate::AnyOf { column, values } => {
                let cell = row.get(*column);
                match values {
                    SqlParam::IntList(ids) => ids.iter().any(|id| param_matches(&SqlParam::Int(*id), cell)),
                    SqlParam::TextList(texts) => texts
                        .iter()
                        .any(|t| param_matches(&SqlParam::Text(t.clone()), cell)),
                    other => param_matches(other, cell),
                }
            }
            Predicate::DateWithin { column, range } => row
                .get(*column)
                .and_then(value_as_date)
                .map_or(false, |d| range.contains(&d)),
            Predicate::NotBlank { column } => match row.get(*column) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            },
        }
    }
}

fn param_matches(param: &SqlParam, cell: Option<&Value>) -> bool {
    match (param, cell) {
        (SqlParam::Int(expected), Some(Value::Number(n))) => n.as_i64() == Some(*expected),
        (SqlParam::Int(expected), Some(Value::String(s))) => s.trim().parse::<i64>().ok() == Some(*expected),
        (SqlParam::Text(expected), Some(Value::String(s))) => s == expected,
        (SqlParam::Text(expected), Some(Value::Number(n))) => n.to_string() == *expected,
        (SqlParam::Date(expected), Some(value)) => value_as_date(value) == Some(*expected),
        _ => false,
    }
}

/// Calendar date of a timestamp cell ("2025-03-15", "2025-03-15T10:00:00", ...)
pub fn value_as_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    let prefix = text.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Total order over JSON cells: nulls first, then numbers, then text
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            _ => 2,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_render_select_star_with_predicates() {
        let rendered = SelectQuery::from("receipts")
            .filter(Predicate::Eq { column: "user_id", value: SqlParam::Int(5) })
            .filter(Predicate::AnyOf { column: "party_id", values: SqlParam::IntList(vec![3, 7]) })
            .order_by(CREATED_AT, Direction::Desc)
            .render();

        assert_eq!(
            rendered.sql,
            "SELECT * FROM receipts WHERE user_id = $1 AND party_id = ANY($2) ORDER BY created_at DESC"
        );
        assert_eq!(
            rendered.params,
            vec![SqlParam::Int(5), SqlParam::IntList(vec![3, 7])]
        );
    }

    #[test]
    fn test_render_date_predicates() {
        let single = SelectQuery::from("payments")
            .filter(Predicate::DateWithin { column: CREATED_AT, range: DateRange::day(date(2025, 3, 15)) })
            .render();
        assert_eq!(single.sql, "SELECT * FROM payments WHERE created_at::date = $1");

        let period = SelectQuery::from("payments")
            .filter(Predicate::Eq { column: "user_id", value: SqlParam::Int(1) })
            .filter(Predicate::DateWithin {
                column: CREATED_AT,
                range: DateRange::new(date(2025, 4, 1), date(2026, 3, 31)),
            })
            .render();
        assert_eq!(
            period.sql,
            "SELECT * FROM payments WHERE user_id = $1 AND created_at::date BETWEEN $2 AND $3"
        );
        assert_eq!(period.params[1], SqlParam::Date(date(2025, 4, 1)));
        assert_eq!(period.params[2], SqlParam::Date(date(2026, 3, 31)));
    }

    #[test]
    fn test_render_projection_and_distinct() {
        let rendered = SelectQuery::from("receipts")
            .columns(&[Column::plain("id"), Column::aliased("payment_mode", "name")])
            .distinct_on("payment_mode")
            .filter(Predicate::NotBlank { column: "payment_mode" })
            .order_by("payment_mode", Direction::Asc)
            .render();
        assert_eq!(
            rendered.sql,
            "SELECT DISTINCT ON (payment_mode) id, payment_mode AS name FROM receipts \
             WHERE payment_mode IS NOT NULL AND payment_mode <> '' ORDER BY payment_mode ASC"
        );
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_json_rows_reapply_ordering_outside() {
        let rendered = SelectQuery::from("receipts")
            .filter(Predicate::Eq { column: "user_id", value: SqlParam::Int(3) })
            .order_by(CREATED_AT, Direction::Desc)
            .render_json_rows();
        assert_eq!(
            rendered.sql,
            "SELECT row_to_json(q) FROM (SELECT * FROM receipts WHERE user_id = $1 ORDER BY created_at DESC) q ORDER BY q.created_at DESC"
        );
        assert_eq!(rendered.params, vec![SqlParam::Int(3)]);
    }

    #[test]
    fn test_json_rows_order_by_aliased_output() {
        let rendered = SelectQuery::from("receipts")
            .columns(&[Column::plain("id"), Column::aliased("payment_mode", "name")])
            .distinct_on("payment_mode")
            .order_by("payment_mode", Direction::Asc)
            .order_by("id", Direction::Asc)
            .render_json_rows();
        assert!(rendered.sql.starts_with(
            "SELECT row_to_json(q) FROM (SELECT DISTINCT ON (payment_mode) id, payment_mode AS name FROM receipts ORDER BY payment_mode ASC, id ASC) q"
        ));
        assert!(rendered.sql.ends_with(") q ORDER BY q.name ASC, q.id ASC"));
    }

    #[test]
    fn test_values_never_inlined() {
        let rendered = SelectQuery::from("receipts")
            .filter(Predicate::AnyOf {
                column: "category",
                values: SqlParam::TextList(vec!["x'; DROP TABLE receipts; --".to_string()]),
            })
            .render();
        assert!(!rendered.sql.contains("DROP"));
        assert_eq!(rendered.params.len(), 1);
    }

    #[test]
    fn test_evaluate_filters_sorts_and_projects() {
        let rows = vec![
            row(json!({"id": 1, "user_id": 1, "payment_mode": "UPI", "created_at": "2025-03-15T09:00:00"})),
            row(json!({"id": 2, "user_id": 1, "payment_mode": "Cash", "created_at": "2025-03-16T09:00:00"})),
            row(json!({"id": 3, "user_id": 1, "payment_mode": "Cash", "created_at": "2025-03-14T09:00:00"})),
            row(json!({"id": 4, "user_id": 2, "payment_mode": "Bank", "created_at": "2025-03-15T09:00:00"})),
        ];

        let result = SelectQuery::from("receipts")
            .columns(&[Column::plain("id"), Column::aliased("payment_mode", "name")])
            .distinct_on("payment_mode")
            .filter(Predicate::Eq { column: "user_id", value: SqlParam::Int(1) })
            .order_by("payment_mode", Direction::Asc)
            .order_by("id", Direction::Asc)
            .evaluate(&rows);

        let names: Vec<&str> = result.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Cash", "UPI"]);
        assert_eq!(result[0]["id"], json!(2));
        assert_eq!(result[0].keys().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_date_predicate_matches_by_calendar_day() {
        let predicate = Predicate::DateWithin { column: CREATED_AT, range: DateRange::day(date(2025, 3, 15)) };
        assert!(predicate.matches(&row(json!({"created_at": "2025-03-15 23:59:59"}))));
        assert!(!predicate.matches(&row(json!({"created_at": "2025-03-14T23:59:59"}))));
        assert!(!predicate.matches(&row(json!({"created_at": null}))));
    }
}
