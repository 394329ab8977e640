//! Fixed-layout PDF entries report
//!
//! Layout: title, generation metadata, the filters that produced the rows,
//! then a six-column table. Rows alternate shading, pages break when the
//! table reaches the bottom margin (the header row repeats), and page
//! numbers are stamped once every page exists.

use crate::format::{cell_number, cell_text, format_currency, truncate, MISSING};
use crate::{ExportError, ExportOptions, ExportResult};
use chrono::{DateTime, Utc};
use ledgerflow_core::types::param;
use ledgerflow_core::{CachedResult, DateFilter, DateVocabulary, RequestParams, Row};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Rect, Rgb};
use std::ops::Range;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 8.0;
const TABLE_BOTTOM: f32 = 22.0;
const FOOTER_Y: f32 = 10.0;
const TEXT_SIZE: f32 = 9.0;
/// Baseline of the first body row on a continuation page
const CONTINUATION_FIRST_ROW: f32 = PAGE_HEIGHT - MARGIN - ROW_HEIGHT;

type Rgb3 = (f32, f32, f32);

const BLACK: Rgb3 = (0.0, 0.0, 0.0);
const HEADER_SHADE: Rgb3 = (0.82, 0.87, 0.95);
const ROW_SHADE: Rgb3 = (0.95, 0.95, 0.95);
const CREDIT_RGB: Rgb3 = (0.0, 0.5, 0.0);
const OTHER_STATUS_RGB: Rgb3 = (0.75, 0.0, 0.0);

struct TableColumn {
    title: &'static str,
    x: f32,
    max_chars: usize,
}

const COLUMNS: [TableColumn; 6] = [
    TableColumn { title: "Receipt No", x: MARGIN, max_chars: 14 },
    TableColumn { title: "Date", x: 45.0, max_chars: 10 },
    TableColumn { title: "Party", x: 70.0, max_chars: 24 },
    TableColumn { title: "Amount", x: 115.0, max_chars: 20 },
    TableColumn { title: "Payment Mode", x: 150.0, max_chars: 14 },
    TableColumn { title: "Status", x: 178.0, max_chars: 10 },
];

fn color((r, g, b): Rgb3) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Status text colour: green for credit, red for anything else
fn status_rgb(status: &str) -> Rgb3 {
    if status.trim().eq_ignore_ascii_case("credit") {
        CREDIT_RGB
    } else {
        OTHER_STATUS_RGB
    }
}

/// Background of body row `index`; odd rows are shaded
fn row_shade(index: usize) -> Option<Rgb3> {
    (index % 2 == 1).then_some(ROW_SHADE)
}

/// Split `rows` body rows into pages.
///
/// The first page starts at `first_row_y` (below the title block and its
/// header row); later pages start just under their repeated header. A page
/// breaks once the next row would fall below the table bottom.
fn paginate(first_row_y: f32, rows: usize) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut y = first_row_y;
    for i in 0..rows {
        if y < TABLE_BOTTOM {
            pages.push(start..i);
            start = i;
            y = CONTINUATION_FIRST_ROW;
        }
        y -= ROW_HEIGHT;
    }
    pages.push(start..rows);
    pages
}

/// What the writer drew, counted while laying out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LayoutStats {
    pages: usize,
    header_rows: usize,
    shaded_rows: usize,
    footers: usize,
}

fn first_present<'a>(row: &'a Row, keys: &[&str]) -> Option<&'a serde_json::Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
}

/// The six display cells of one entry row
fn entry_cells(row: &Row, options: &ExportOptions) -> [String; 6] {
    let number = cell_text(first_present(row, &["receipt_no", "receipt_number", "entry_no", "id"]));
    let date = first_present(row, &["created_at", "date"])
        .and_then(|v| v.as_str())
        .map(|s| s.chars().take(10).collect::<String>())
        .unwrap_or_else(|| MISSING.to_string());
    let party = cell_text(first_present(row, &["party_name", "party", "party_id"]));
    let amount = row
        .get("amount")
        .and_then(cell_number)
        .map(|a| format_currency(a, &options.currency_symbol, options.decimal_places))
        .unwrap_or_else(|| MISSING.to_string());
    let mode = cell_text(row.get("payment_mode"));
    let status = cell_text(row.get("status"));
    [number, date, party, amount, mode, status]
}

/// Human-readable restatement of the filters behind a cached result
pub fn filter_summary(params: &RequestParams) -> Vec<String> {
    let mut lines = Vec::new();
    let not_all = |v: &&str| !v.eq_ignore_ascii_case("all");

    if let Some(raw) = param(params, "dateFilter").filter(not_all) {
        let text = DateFilter::from_params(params, DateVocabulary::EntryFilter)
            .or_else(|_| DateFilter::from_params(params, DateVocabulary::FieldOption))
            .map(|f| f.description())
            .unwrap_or_else(|_| raw.to_string());
        lines.push(format!("Date Filter: {}", text));
    }
    if let Some(entry_type) = param(params, "entryType").filter(not_all) {
        lines.push(format!("Entry Type: {}", entry_type));
    }
    if let Some(party) = param(params, "party_id").filter(not_all) {
        lines.push(format!("Party: {}", party));
    }
    if let Some(mode) = param(params, "payment_mode").filter(not_all) {
        lines.push(format!("Payment Mode: {}", mode));
    }
    lines
}

struct PdfWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layers: Vec<PdfLayerReference>,
    y: f32,
    stats: LayoutStats,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(ExportError::pdf)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(ExportError::pdf)?;
        let first = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            regular,
            bold,
            layers: vec![first],
            y: PAGE_HEIGHT - MARGIN,
            stats: LayoutStats { pages: 1, ..LayoutStats::default() },
        })
    }

    fn layer(&self) -> &PdfLayerReference {
        // `layers` always holds the first page
        &self.layers[self.layers.len() - 1]
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layers.push(self.doc.get_page(page).get_layer(layer));
        self.y = PAGE_HEIGHT - MARGIN;
        self.stats.pages += 1;
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer().use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn shade_row(&self, fill: Rgb3) {
        let layer = self.layer();
        layer.set_fill_color(color(fill));
        layer.add_rect(Rect::new(
            Mm(MARGIN - 2.0),
            Mm(self.y - 2.5),
            Mm(PAGE_WIDTH - MARGIN + 2.0),
            Mm(self.y + ROW_HEIGHT - 2.5),
        ));
        layer.set_fill_color(color(BLACK));
    }

    fn header_row(&mut self) {
        self.shade_row(HEADER_SHADE);
        for column in &COLUMNS {
            self.text(column.title, TEXT_SIZE, column.x, true);
        }
        self.y -= ROW_HEIGHT;
        self.stats.header_rows += 1;
    }

    fn body_row(&mut self, index: usize, cells: &[String; 6]) {
        if let Some(fill) = row_shade(index) {
            self.shade_row(fill);
            self.stats.shaded_rows += 1;
        }
        for (i, (column, cell)) in COLUMNS.iter().zip(cells.iter()).enumerate() {
            let text = truncate(cell, column.max_chars);
            if i == COLUMNS.len() - 1 {
                self.layer().set_fill_color(color(status_rgb(cell)));
                self.text(&text, TEXT_SIZE, column.x, true);
                self.layer().set_fill_color(color(BLACK));
            } else {
                self.text(&text, TEXT_SIZE, column.x, false);
            }
        }
        self.y -= ROW_HEIGHT;
    }

    fn stamp_page_numbers(&mut self) {
        let total = self.layers.len();
        for (i, layer) in self.layers.iter().enumerate() {
            layer.set_fill_color(color(BLACK));
            layer.use_text(
                format!("Page {} of {}", i + 1, total),
                8.0,
                Mm(PAGE_WIDTH / 2.0 - 10.0),
                Mm(FOOTER_Y),
                &self.regular,
            );
        }
        self.stats.footers += total;
    }

    fn finish(mut self) -> Result<(Vec<u8>, LayoutStats), ExportError> {
        self.stamp_page_numbers();
        let bytes = self.doc.save_to_bytes().map_err(ExportError::pdf)?;
        Ok((bytes, self.stats))
    }
}

/// Render a cached entry result as a PDF report
pub fn render_pdf(
    result: &CachedResult,
    generated_at: DateTime<Utc>,
    options: &ExportOptions,
) -> ExportResult<Vec<u8>> {
    render_with_stats(result, generated_at, options).map(|(bytes, _)| bytes)
}

fn render_with_stats(
    result: &CachedResult,
    generated_at: DateTime<Utc>,
    options: &ExportOptions,
) -> ExportResult<(Vec<u8>, LayoutStats)> {
    let mut w = PdfWriter::new("Entries Report")?;

    w.text("Entries Report", 18.0, MARGIN, true);
    w.y -= 9.0;
    w.text(
        &format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        TEXT_SIZE,
        MARGIN,
        false,
    );
    w.y -= 5.0;
    w.text(&format!("Total entries: {}", result.rows.len()), TEXT_SIZE, MARGIN, false);
    w.y -= 8.0;

    let summary = filter_summary(&result.params);
    if !summary.is_empty() {
        w.text("Filters", 11.0, MARGIN, true);
        w.y -= 6.0;
        for line in &summary {
            w.text(line, TEXT_SIZE, MARGIN + 2.0, false);
            w.y -= 5.0;
        }
        w.y -= 4.0;
    }

    w.header_row();
    if result.rows.is_empty() {
        w.text("No entries match these filters.", TEXT_SIZE, MARGIN, false);
    }
    for (page, range) in paginate(w.y, result.rows.len()).into_iter().enumerate() {
        if page > 0 {
            w.new_page();
            w.header_row();
        }
        for index in range {
            w.body_row(index, &entry_cells(&result.rows[index], options));
        }
    }

    log::debug!("Rendered PDF for {} across {} pages", result.token, w.layers.len());
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_core::{InMemoryReportCache, ReportCache};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_filter_summary_skips_all_and_absent() {
        let lines = filter_summary(&params(&[
            ("dateFilter", "All"),
            ("entryType", "receipt"),
            ("party_id", "all"),
        ]));
        assert_eq!(lines, vec!["Entry Type: receipt".to_string()]);
    }

    #[test]
    fn test_filter_summary_resolves_custom_values() {
        let lines = filter_summary(&params(&[
            ("dateFilter", "CustomPeriod"),
            ("startDate", "2025-01-01"),
            ("endDate", "2025-01-31"),
            ("payment_mode", "Cash"),
        ]));
        assert_eq!(
            lines,
            vec![
                "Date Filter: Custom Period (2025-01-01 to 2025-01-31)".to_string(),
                "Payment Mode: Cash".to_string(),
            ]
        );
    }

    #[test]
    fn test_entry_cells() {
        let row = json!({
            "id": 17, "receipt_no": "RCPT-0017", "created_at": "2025-03-15T10:00:00",
            "party_name": "Acme", "amount": 1250.5, "payment_mode": "UPI", "status": "credit"
        })
        .as_object()
        .cloned()
        .unwrap();
        let cells = entry_cells(&row, &ExportOptions::default());
        assert_eq!(cells[0], "RCPT-0017");
        assert_eq!(cells[1], "2025-03-15");
        assert_eq!(cells[2], "Acme");
        assert_eq!(cells[3], "Rs. 1,250.50");
        assert_eq!(cells[4], "UPI");
        assert_eq!(cells[5], "credit");
    }

    fn result_with(rows: usize) -> Arc<CachedResult> {
        let cache = InMemoryReportCache::new(Duration::from_secs(60));
        let rows = (0..rows)
            .map(|i| json!({"id": i, "status": "credit"}).as_object().cloned().unwrap())
            .collect();
        let token = cache.put(rows, params(&[("entryType", "receipt")]));
        cache.get(&token).unwrap()
    }

    #[test]
    fn test_paginate_splits_and_covers_rows() {
        let pages = paginate(200.0, 120);
        assert!(pages.len() > 1);
        assert_eq!(pages.first().unwrap().start, 0);
        assert_eq!(pages.last().unwrap().end, 120);
        for pair in pages.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        // Continuation pages hold a full table below the header.
        assert_eq!(pages[1].len(), 32);
        assert!(pages.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_paginate_small_and_empty() {
        assert_eq!(paginate(200.0, 3), vec![0..3]);
        assert_eq!(paginate(200.0, 0), vec![0..0]);
    }

    #[test]
    fn test_many_rows_repeat_header_and_footer_per_page() {
        let (bytes, stats) = render_with_stats(&result_with(120), Utc::now(), &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(stats.pages > 1);
        assert_eq!(stats.header_rows, stats.pages);
        assert_eq!(stats.footers, stats.pages);
        assert_eq!(stats.shaded_rows, 60);
    }

    #[test]
    fn test_few_rows_fit_one_page() {
        let (_, stats) = render_with_stats(&result_with(5), Utc::now(), &ExportOptions::default()).unwrap();
        assert_eq!(stats, LayoutStats { pages: 1, header_rows: 1, shaded_rows: 2, footers: 1 });

        let (_, stats) = render_with_stats(&result_with(0), Utc::now(), &ExportOptions::default()).unwrap();
        assert_eq!(stats, LayoutStats { pages: 1, header_rows: 1, shaded_rows: 0, footers: 1 });
    }

    #[test]
    fn test_status_and_row_colors() {
        assert_eq!(status_rgb("credit"), CREDIT_RGB);
        assert_eq!(status_rgb("Credit"), CREDIT_RGB);
        assert_eq!(status_rgb("debit"), OTHER_STATUS_RGB);
        assert_eq!(status_rgb("-"), OTHER_STATUS_RGB);
        assert_eq!(row_shade(0), None);
        assert_eq!(row_shade(1), Some(ROW_SHADE));
        assert_eq!(row_shade(2), None);
    }

    #[test]
    fn test_entry_cells_fallbacks() {
        let row = json!({"id": 3, "party_id": 9}).as_object().cloned().unwrap();
        let cells = entry_cells(&row, &ExportOptions::default());
        assert_eq!(cells[0], "3");
        assert_eq!(cells[2], "9");
        assert_eq!(cells[3], "-");
        assert_eq!(cells[5], "-");
    }
}
