//! Date-filter modes and their resolution to concrete date ranges
//!
//! Both the entry filter and the field-option lookup accept the same modes,
//! but they spell the financial-year keys differently: the entry filter takes
//! `currentfinancialyear`/`lastfinancialyear`, field options take
//! `currentfinanceyear`/`lastfinanceyear`. Clients depend on both spellings.

use crate::error::{CoreError, CoreResult};
use crate::types::{param, RequestParams};
use chrono::{Datelike, NaiveDate};

/// First month of the financial year (April)
pub const FINANCIAL_YEAR_START_MONTH: u32 = 4;

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Single-day range
    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        *date >= self.start && *date <= self.end
    }

    /// Whole calendar month containing `year`/`month`
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .and_then(|d| d.pred_opt())?;
        Some(Self { start, end })
    }

    /// Financial year starting April 1 of `start_year`
    pub fn financial_year(start_year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(start_year, FINANCIAL_YEAR_START_MONTH, 1)?,
            end: NaiveDate::from_ymd_opt(start_year + 1, 3, 31)?,
        })
    }
}

/// Start year of the financial year containing `today`
pub fn financial_year_start(today: NaiveDate) -> i32 {
    if today.month() >= FINANCIAL_YEAR_START_MONTH {
        today.year()
    } else {
        today.year() - 1
    }
}

/// Which spelling of the mode keys a caller uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateVocabulary {
    /// Entry filter keys (`currentfinancialyear`)
    EntryFilter,
    /// Field-option keys (`currentfinanceyear`)
    FieldOption,
}

impl DateVocabulary {
    fn current_financial_year_key(&self) -> &'static str {
        match self {
            DateVocabulary::EntryFilter => "currentfinancialyear",
            DateVocabulary::FieldOption => "currentfinanceyear",
        }
    }

    fn last_financial_year_key(&self) -> &'static str {
        match self {
            DateVocabulary::EntryFilter => "lastfinancialyear",
            DateVocabulary::FieldOption => "lastfinanceyear",
        }
    }
}

/// Date-filter mode with its arguments already validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    All,
    CustomDate(NaiveDate),
    CustomPeriod { start: NaiveDate, end: NaiveDate },
    CurrentMonth,
    LastMonth,
    CurrentFinancialYear,
    LastFinancialYear,
}

impl Default for DateFilter {
    fn default() -> Self {
        DateFilter::All
    }
}

/// Lower-case a mode name and strip all whitespace ("Current Month" -> "currentmonth")
pub fn normalize_mode(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Parse a strict `YYYY-MM-DD` date
pub fn parse_date(field: &str, value: &str) -> CoreResult<NaiveDate> {
    let value = value.trim();
    let invalid = || CoreError::InvalidDateFormat {
        field: field.to_string(),
        value: value.to_string(),
    };
    if value.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

fn required_date(params: &RequestParams, field: &str) -> CoreResult<NaiveDate> {
    let value = param(params, field).ok_or_else(|| CoreError::missing(field))?;
    parse_date(field, value)
}

impl DateFilter {
    /// Read `dateFilter` plus its companion parameters (`CustomDate`,
    /// `startDate`, `endDate`) from a request.
    pub fn from_params(params: &RequestParams, vocabulary: DateVocabulary) -> CoreResult<Self> {
        let raw = match param(params, "dateFilter") {
            Some(raw) => raw,
            None => return Ok(DateFilter::All),
        };

        let mode = normalize_mode(raw);
        match mode.as_str() {
            "all" => Ok(DateFilter::All),
            "customdate" => Ok(DateFilter::CustomDate(required_date(params, "CustomDate")?)),
            "customperiod" => {
                let start = required_date(params, "startDate")?;
                let end = required_date(params, "endDate")?;
                Ok(DateFilter::CustomPeriod { start, end })
            }
            "currentmonth" => Ok(DateFilter::CurrentMonth),
            "lastmonth" => Ok(DateFilter::LastMonth),
            m if m == vocabulary.current_financial_year_key() => Ok(DateFilter::CurrentFinancialYear),
            m if m == vocabulary.last_financial_year_key() => Ok(DateFilter::LastFinancialYear),
            _ => Err(CoreError::InvalidDateFilter { value: raw.to_string() }),
        }
    }

    /// Concrete inclusive range for this mode evaluated at `today`.
    /// `None` means no date predicate.
    pub fn resolve(&self, today: NaiveDate) -> Option<DateRange> {
        match *self {
            DateFilter::All => None,
            DateFilter::CustomDate(date) => Some(DateRange::day(date)),
            DateFilter::CustomPeriod { start, end } => Some(DateRange::new(start, end)),
            DateFilter::CurrentMonth => DateRange::month(today.year(), today.month()),
            DateFilter::LastMonth => {
                if today.month() == 1 {
                    DateRange::month(today.year() - 1, 12)
                } else {
                    DateRange::month(today.year(), today.month() - 1)
                }
            }
            DateFilter::CurrentFinancialYear => DateRange::financial_year(financial_year_start(today)),
            DateFilter::LastFinancialYear => DateRange::financial_year(financial_year_start(today) - 1),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, DateFilter::All)
    }

    /// Get a human-readable description of the filter
    pub fn description(&self) -> String {
        match self {
            DateFilter::All => "All".to_string(),
            DateFilter::CustomDate(date) => format!("Custom Date ({})", date),
            DateFilter::CustomPeriod { start, end } => format!("Custom Period ({} to {})", start, end),
            DateFilter::CurrentMonth => "Current Month".to_string(),
            DateFilter::LastMonth => "Last Month".to_string(),
            DateFilter::CurrentFinancialYear => "Current Financial Year".to_string(),
            DateFilter::LastFinancialYear => "Last Financial Year".to_string(),
        }
    }
}

// ==================== Tests ====================
