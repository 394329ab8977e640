//! Field-option resolver
//!
//! Lists the candidate values for one of eight reference fields, either
//! narrowed to explicit ids/values or as the caller's full distinct set.

use crate::error::{CoreError, CoreResult};
use crate::query::{Column, Direction, Predicate, SelectQuery, SqlParam, CREATED_AT};
use crate::time::{DateFilter, DateVocabulary};
use crate::types::{param, parse_id, required_param, split_id_list, split_list, EntryType, RequestParams, Row};
use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// The closed set of option fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Party,
    Referencer,
    Category,
    GroupCategory,
    HeadAccount,
    PaymentMode,
    Grade,
    CustomField,
}

/// How a narrowing list is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrowing {
    /// Integer ids matched against `id`
    Ids,
    /// Raw values matched against the option column itself
    Values,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Party,
        FieldKind::Referencer,
        FieldKind::Category,
        FieldKind::GroupCategory,
        FieldKind::HeadAccount,
        FieldKind::PaymentMode,
        FieldKind::Grade,
        FieldKind::CustomField,
    ];

    /// Name as accepted in the `Field` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Party => "party",
            FieldKind::Referencer => "referencer",
            FieldKind::Category => "category",
            FieldKind::GroupCategory => "group category",
            FieldKind::HeadAccount => "head account",
            FieldKind::PaymentMode => "payment mode",
            FieldKind::Grade => "grade",
            FieldKind::CustomField => "custom field",
        }
    }

    /// Query parameter carrying the narrowing list
    pub fn narrowing_param(&self) -> &'static str {
        match self {
            FieldKind::Party => "party_id",
            FieldKind::Referencer => "Referencer_id",
            FieldKind::Category => "category_id",
            FieldKind::GroupCategory => "category_group_id",
            FieldKind::HeadAccount => "head_account_id",
            FieldKind::PaymentMode => "payment_mode",
            FieldKind::Grade => "grade_id",
            FieldKind::CustomField => "custom_field_id",
        }
    }

    pub fn narrowing(&self) -> Narrowing {
        match self {
            FieldKind::PaymentMode => Narrowing::Values,
            _ => Narrowing::Ids,
        }
    }

    /// Keys each option row carries in the response
    pub fn response_keys(&self) -> &'static [&'static str] {
        match self {
            FieldKind::Party => &["id", "party_name"],
            FieldKind::Category => &["id", "category_name"],
            FieldKind::GroupCategory => &["id", "group_name"],
            FieldKind::Referencer
            | FieldKind::HeadAccount
            | FieldKind::PaymentMode
            | FieldKind::Grade
            | FieldKind::CustomField => &["id", "name"],
        }
    }

    /// Backing table; payment modes come from the selected entry table
    pub fn table(&self, entry_type: EntryType) -> &'static str {
        match self {
            FieldKind::Party | FieldKind::Grade => "parties",
            FieldKind::Referencer => "book_referencers",
            FieldKind::Category => "categories",
            FieldKind::GroupCategory => "category_groups",
            FieldKind::HeadAccount => "head_accounts",
            FieldKind::PaymentMode => entry_type.table(),
            FieldKind::CustomField => "customer_fields",
        }
    }

    fn columns(&self) -> &'static [Column] {
        const PARTY: &[Column] = &[Column::plain("id"), Column::plain("party_name")];
        const NAME: &[Column] = &[Column::plain("id"), Column::plain("name")];
        const CATEGORY: &[Column] = &[
            Column::plain("id"),
            Column::plain("category_name"),
            Column::plain("amount"),
            Column::plain("category_group_id"),
        ];
        const GROUP: &[Column] = &[Column::plain("id"), Column::plain("group_name")];
        const PAYMENT_MODE: &[Column] = &[Column::plain("id"), Column::aliased("payment_mode", "name")];
        const GRADE: &[Column] = &[Column::plain("id"), Column::aliased("grade", "name")];
        const CUSTOM: &[Column] = &[Column::plain("id"), Column::aliased("field_name", "name")];

        match self {
            FieldKind::Party => PARTY,
            FieldKind::Referencer | FieldKind::HeadAccount => NAME,
            FieldKind::Category => CATEGORY,
            FieldKind::GroupCategory => GROUP,
            FieldKind::PaymentMode => PAYMENT_MODE,
            FieldKind::Grade => GRADE,
            FieldKind::CustomField => CUSTOM,
        }
    }

    /// Source column holding the display name
    fn name_column(&self) -> &'static str {
        match self {
            FieldKind::Party => "party_name",
            FieldKind::Category => "category_name",
            FieldKind::GroupCategory => "group_name",
            FieldKind::Referencer | FieldKind::HeadAccount => "name",
            FieldKind::PaymentMode => "payment_mode",
            FieldKind::Grade => "grade",
            FieldKind::CustomField => "field_name",
        }
    }

    /// Keep only the response keys of a fetched row
    pub fn trim_row(&self, row: &Row) -> Row {
        self.response_keys()
            .iter()
            .map(|key| {
                (
                    key.to_string(),
                    row.get(*key).cloned().unwrap_or(serde_json::Value::Null),
                )
            })
            .collect()
    }
}

impl std::str::FromStr for FieldKind {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        FieldKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidField { value: s.to_string() })
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Narrowing list, already parsed for the field's matching mode
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Ids(Vec<i64>),
    Values(Vec<String>),
}

/// Validated field-option request
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOptionSpec {
    pub user_id: i64,
    pub field: FieldKind,
    pub entry_type: EntryType,
    pub selection: Option<Selection>,
    pub date_filter: DateFilter,
}

impl FieldOptionSpec {
    pub fn from_params(params: &RequestParams) -> CoreResult<Self> {
        let user_id = parse_id("user_id", required_param(params, "user_id")?)?;
        let field = required_param(params, "Field")?.parse::<FieldKind>()?;
        let entry_type = match param(params, "entryType") {
            Some(raw) => raw.parse::<EntryType>()?,
            None => EntryType::default(),
        };

        let key = field.narrowing_param();
        let selection = match field.narrowing() {
            Narrowing::Ids => split_id_list(params, key)?.map(Selection::Ids),
            Narrowing::Values => split_list(params, key).map(Selection::Values),
        };

        let date_filter = DateFilter::from_params(params, DateVocabulary::FieldOption)?;

        Ok(Self {
            user_id,
            field,
            entry_type,
            selection,
            date_filter,
        })
    }

    pub fn compile(&self, today: NaiveDate) -> SelectQuery {
        let field = self.field;
        let mut query = SelectQuery::from(field.table(self.entry_type))
            .columns(field.columns())
            .filter(Predicate::Eq { column: "user_id", value: SqlParam::Int(self.user_id) });

        if matches!(field, FieldKind::PaymentMode | FieldKind::Grade) {
            query = query.filter(Predicate::NotBlank { column: field.name_column() });
        }

        match self.selection {
            Some(Selection::Ids(ref ids)) => {
                query = query.filter(Predicate::AnyOf {
                    column: "id",
                    values: SqlParam::IntList(ids.clone()),
                });
            }
            Some(Selection::Values(ref values)) => {
                query = query.filter(Predicate::AnyOf {
                    column: field.name_column(),
                    values: SqlParam::TextList(values.clone()),
                });
            }
            None => {
                if let Some(range) = self.date_filter.resolve(today) {
                    query = query.filter(Predicate::DateWithin { column: CREATED_AT, range });
                }
            }
        }

        match field {
            FieldKind::PaymentMode => query
                .distinct_on("payment_mode")
                .order_by("payment_mode", Direction::Asc)
                .order_by("id", Direction::Asc),
            FieldKind::Grade => query
                .order_by("id", Direction::Asc)
                .order_by("grade", Direction::Asc),
            _ => query.order_by(field.name_column(), Direction::Asc),
        }
    }
}

// ==================== Tests ====================
