//! Entry filter compiler
//!
//! Turns the flat query-string vocabulary of the filter endpoint into a
//! `SelectQuery` over exactly one of the entry tables.

use crate::error::CoreResult;
use crate::query::{Direction, Predicate, SelectQuery, SqlParam, CREATED_AT};
use crate::time::{DateFilter, DateVocabulary};
use crate::types::{parse_id, param, required_param, split_id_list, split_list, EntryType, RequestParams};
use chrono::NaiveDate;

/// Validated entry filter request
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub user_id: i64,
    pub book_id: Option<i64>,
    pub entry_type: EntryType,
    pub date_filter: DateFilter,
    pub party_ids: Option<Vec<i64>>,
    pub categories: Option<Vec<String>>,
}

impl FilterSpec {
    /// Validate every parameter up front; nothing is queried on failure.
    pub fn from_params(params: &RequestParams) -> CoreResult<Self> {
        let user_id = parse_id("user_id", required_param(params, "user_id")?)?;
        let entry_type = required_param(params, "entryType")?.parse::<EntryType>()?;
        let book_id = param(params, "book_id")
            .map(|v| parse_id("book_id", v))
            .transpose()?;
        let date_filter = DateFilter::from_params(params, DateVocabulary::EntryFilter)?;
        let party_ids = split_id_list(params, "party_id")?;
        let categories = split_list(params, "category");

        Ok(Self {
            user_id,
            book_id,
            entry_type,
            date_filter,
            party_ids,
            categories,
        })
    }

    /// Build the query, newest entries first
    pub fn compile(&self, today: NaiveDate) -> SelectQuery {
        let mut query = SelectQuery::from(self.entry_type.table())
            .filter(Predicate::Eq { column: "user_id", value: SqlParam::Int(self.user_id) });

        if let Some(book_id) = self.book_id {
            query = query.filter(Predicate::Eq { column: "book_id", value: SqlParam::Int(book_id) });
        }

        if let Some(range) = self.date_filter.resolve(today) {
            query = query.filter(Predicate::DateWithin { column: CREATED_AT, range });
        }

        if let Some(ref ids) = self.party_ids {
            query = query.filter(Predicate::AnyOf {
                column: "party_id",
                values: SqlParam::IntList(ids.clone()),
            });
        }

        if let Some(ref categories) = self.categories {
            query = query.filter(Predicate::AnyOf {
                column: "category",
                values: SqlParam::TextList(categories.clone()),
            });
        }

        query.order_by(CREATED_AT, Direction::Desc)
    }
}

// ==================== Tests ====================
