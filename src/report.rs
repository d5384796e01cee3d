//! Assembly of expense reports: validation, aggregation and the final document.
//!
//! [`ReportBuilder::assemble`] performs every step that does not need a renderer: it rejects
//! empty requests, walks the expenses in input order, drops rows that cannot be used and sums
//! the rest.  [`ReportBuilder::build`] then hands the assembled [`ExpenseReport`] to a
//! [`RenderReport`] implementation.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use log::debug;
use rust_decimal::Decimal;

use crate::amount::format_amount;
use crate::error::{ReportError, ReportResult};
use crate::model::{ExpenseRecord, Label, ReportRequest, ReportTable, COLUMN_COUNT};
use crate::render::RenderReport;

/// Message returned when a request carries no expenses.
pub const NO_EXPENSES_MESSAGE: &str = "No expenses provided";

/// Caption printed in front of the signature rule.
pub const SIGNATURE_LABEL: &str = "Authorized Signature";

/// Text used for a month or year the request left out.
pub const MISSING_LABEL: &str = "Unknown";

/// Media type of rendered report documents.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Builds the download file name for a reporting period.
pub fn report_file_name(month: &str, year: &str) -> String {
    format!("{month}_{year}_Expenses_Report.pdf")
}

/// Everything that goes onto the page, in display-ready form.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseReport {
    title: String,
    subtitle: String,
    table: ReportTable,
    total: Decimal,
    skipped: usize,
    file_name: String,
}

impl ExpenseReport {
    /// Title line, e.g. `March Expenses Report`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Subtitle line with the year and generation date.
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    /// The expense table including header and total rows.
    pub fn table(&self) -> &ReportTable {
        &self.table
    }

    /// Exact sum of every kept price.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Number of submitted records that were left out of the table.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Suggested download name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Caption of the signature line.
    pub fn signature_label(&self) -> &str {
        SIGNATURE_LABEL
    }
}

/// A rendered report handed back to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDocument {
    /// Encoded document bytes.
    pub bytes: Vec<u8>,
    /// Suggested download name, `<month>_<year>_Expenses_Report.pdf`.
    pub file_name: String,
}

impl ReportDocument {
    /// Media type of the encoded bytes.
    pub fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }
}

/// Cell texts for a record, or `None` when the record cannot be shown.
fn table_cells(record: &ExpenseRecord) -> Option<([String; COLUMN_COUNT], Decimal)> {
    let date = record.date()?;
    let name = record.name()?;
    let category = record.category()?;
    let price = record.price()?.to_decimal()?;

    Some((
        [
            date.to_string(),
            name.to_string(),
            category.to_string(),
            format_amount(price),
        ],
        price,
    ))
}

fn label_text(label: Option<&Label>, field: &str) -> String {
    match label {
        Some(label) => label.to_string(),
        None => {
            debug!("Request has no {field}, using '{MISSING_LABEL}'");
            MISSING_LABEL.to_owned()
        }
    }
}

/// Turns report requests into documents.
///
/// The builder keeps no per-request state: the renderer is shared and immutable, and every call
/// to [`build`](Self::build) allocates its own table and buffer.
#[derive(Clone)]
pub struct ReportBuilder {
    renderer: Arc<dyn RenderReport>,
    generated_on: Option<NaiveDate>,
}

impl ReportBuilder {
    /// Creates a builder that renders through `renderer`.
    pub fn new(renderer: Arc<dyn RenderReport>) -> Self {
        Self {
            renderer,
            generated_on: None,
        }
    }

    /// Pins the generation date printed on reports instead of using today's date.
    pub fn with_generated_on(mut self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.generated_on = date.into();
        self
    }

    fn generation_date(&self) -> NaiveDate {
        self.generated_on
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Validates the request and assembles the report without rendering it.
    ///
    /// Records missing any field, or whose price is not a number, are skipped rather than
    /// rejected.  A missing month or year is shown as [`MISSING_LABEL`].  The only request level
    /// failures are an empty expense list and a total too large to represent.
    pub fn assemble(&self, request: &ReportRequest) -> ReportResult<ExpenseReport> {
        if request.expenses().is_empty() {
            return Err(ReportError::Validation(NO_EXPENSES_MESSAGE.to_owned()));
        }
        let month = label_text(request.month(), "month");
        let year = label_text(request.year(), "year");

        let mut table = ReportTable::new();
        let mut total = Decimal::ZERO;
        let mut skipped = 0;

        for (index, record) in request.expenses().iter().enumerate() {
            match table_cells(record) {
                Some((cells, price)) => {
                    total = total
                        .checked_add(price)
                        .ok_or(ReportError::TotalOverflow)?;
                    table.push_row(cells);
                }
                None => {
                    skipped += 1;
                    debug!("Skipping expense #{index}: missing field or unparseable price");
                }
            }
        }
        table.set_total(format_amount(total));

        Ok(ExpenseReport {
            title: format!("{month} Expenses Report"),
            subtitle: format!(
                "Year: {year} | Generated On: {}",
                self.generation_date().format("%d-%m-%Y")
            ),
            table,
            total,
            skipped,
            file_name: report_file_name(&month, &year),
        })
    }

    /// Validates, assembles and renders the request.
    pub fn build(&self, request: &ReportRequest) -> ReportResult<ReportDocument> {
        let report = self.assemble(request)?;
        let bytes = self.renderer.render(&report)?;

        Ok(ReportDocument {
            bytes,
            file_name: report.file_name,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{RowKind, AMOUNT_COLUMN};
    use serde_json::json;
    use std::str::FromStr;

    /// Renderer that records nothing and returns a fixed marker.
    pub(crate) struct StubRenderer;

    impl RenderReport for StubRenderer {
        fn render(&self, report: &ExpenseReport) -> ReportResult<Vec<u8>> {
            Ok(format!("%PDF-stub {}", report.table().total().cell(AMOUNT_COLUMN)).into_bytes())
        }
    }

    struct FailingRenderer;

    impl RenderReport for FailingRenderer {
        fn render(&self, _report: &ExpenseReport) -> ReportResult<Vec<u8>> {
            Err(ReportError::Render(genpdf::error::Error::new(
                "layout exploded",
                genpdf::error::ErrorKind::InvalidData,
            )))
        }
    }

    fn builder() -> ReportBuilder {
        ReportBuilder::new(Arc::new(StubRenderer))
            .with_generated_on(NaiveDate::from_ymd_opt(2024, 3, 31))
    }

    fn march_request() -> ReportRequest {
        ReportRequest::from_json(
            json!({
                "year": 2024,
                "month": "March",
                "expenses": [
                    {"date": "01-03", "name": "Rent", "category": "Housing", "price": "1,200.00"},
                    {"date": "05-03", "name": "Coffee", "category": "Food", "price": "4.5"}
                ]
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn march_scenario_totals_two_rows() {
        let report = builder().assemble(&march_request()).unwrap();

        assert_eq!(report.table().body().len(), 2);
        assert_eq!(report.table().rows().count(), 4);
        assert_eq!(report.table().total().kind(), RowKind::Total);
        assert_eq!(report.table().total().cell(AMOUNT_COLUMN), "1,204.50");
        assert_eq!(report.total(), Decimal::from_str("1204.5").unwrap());
        assert_eq!(report.file_name(), "March_2024_Expenses_Report.pdf");
        assert_eq!(report.title(), "March Expenses Report");
        assert_eq!(report.subtitle(), "Year: 2024 | Generated On: 31-03-2024");
    }

    #[test]
    fn body_rows_format_prices() {
        let report = builder().assemble(&march_request()).unwrap();
        let rent = &report.table().body()[0];
        assert_eq!(rent.cells(), &["01-03", "Rent", "Housing", "1,200.00"].map(String::from));
        assert_eq!(report.table().body()[1].cell(AMOUNT_COLUMN), "4.50");
    }

    #[test]
    fn empty_expenses_are_rejected() {
        let request = ReportRequest::new(2024, "March");
        let err = builder().build(&request).unwrap_err();

        assert!(matches!(err, ReportError::Validation(ref msg) if msg == NO_EXPENSES_MESSAGE));

        let explicit_empty =
            ReportRequest::from_json(br#"{"year": 2024, "month": "March", "expenses": []}"#)
                .unwrap();
        assert!(matches!(
            builder().assemble(&explicit_empty),
            Err(ReportError::Validation(_))
        ));
    }

    #[test]
    fn empty_expenses_win_over_missing_month() {
        let request = ReportRequest::from_json(br#"{"year": 2024}"#).unwrap();
        let err = builder().assemble(&request).unwrap_err();
        assert_eq!(err.to_string(), NO_EXPENSES_MESSAGE);
    }

    #[test]
    fn missing_month_still_renders_with_placeholder() {
        let request = ReportRequest::from_json(
            br#"{"year": 2024, "expenses": [{"date": "1", "name": "a", "category": "b", "price": 1}]}"#,
        )
        .unwrap();
        let document = builder().build(&request).unwrap();

        assert_eq!(document.file_name, "Unknown_2024_Expenses_Report.pdf");
        assert_eq!(document.bytes, b"%PDF-stub 1.00".to_vec());
    }

    #[test]
    fn missing_year_shows_placeholder_in_subtitle() {
        let request = ReportRequest::from_json(
            br#"{"month": "May", "expenses": [{"date": "1", "name": "a", "category": "b", "price": 1}]}"#,
        )
        .unwrap();
        let report = builder().assemble(&request).unwrap();

        assert_eq!(report.title(), "May Expenses Report");
        assert_eq!(report.subtitle(), "Year: Unknown | Generated On: 31-03-2024");
        assert_eq!(report.file_name(), "May_Unknown_Expenses_Report.pdf");
    }

    #[test]
    fn overflowing_total_is_an_error_not_a_panic() {
        let request = ReportRequest::new(2024, "September").with_expenses([
            ExpenseRecord::new("01-09", "Bond", "Finance", "70000000000000000000000000000"),
            ExpenseRecord::new("02-09", "Bond", "Finance", "70000000000000000000000000000"),
        ]);
        let err = builder().build(&request).unwrap_err();

        assert!(matches!(err, ReportError::TotalOverflow));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn largest_representable_prices_still_sum() {
        let request = ReportRequest::new(2024, "September").with_expenses([
            ExpenseRecord::new("01-09", "Bond", "Finance", "30000000000000000000000000000"),
            ExpenseRecord::new("02-09", "Bond", "Finance", "40000000000000000000000000000"),
        ]);
        let report = builder().assemble(&request).unwrap();

        assert_eq!(
            report.total(),
            Decimal::from_str("70000000000000000000000000000").unwrap()
        );
    }

    #[test]
    fn non_numeric_price_is_skipped() {
        let request = ReportRequest::new(2024, "April").with_expenses([
            ExpenseRecord::new("01-04", "Books", "Education", "abc"),
            ExpenseRecord::new("02-04", "Bus", "Transport", "2,500"),
        ]);
        let report = builder().assemble(&request).unwrap();

        assert_eq!(report.table().body().len(), 1);
        assert_eq!(report.table().body()[0].cell(1), "Bus");
        assert_eq!(report.total(), Decimal::from(2500));
        assert_eq!(report.table().total().cell(AMOUNT_COLUMN), "2,500.00");
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn record_missing_category_is_dropped() {
        let request = ReportRequest::from_json(
            json!({
                "year": "2024",
                "month": "May",
                "expenses": [
                    {"date": "01-05", "name": "Gym", "price": 30},
                    {"date": "02-05", "name": "Lunch", "category": "Food", "price": 12.25}
                ]
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();

        let document = builder().build(&request).unwrap();
        assert_eq!(document.file_name, "May_2024_Expenses_Report.pdf");
        assert_eq!(document.bytes, b"%PDF-stub 12.25".to_vec());
        assert_eq!(document.media_type(), "application/pdf");
    }

    #[test]
    fn all_records_dropped_still_yields_zero_total() {
        let request = ReportRequest::new(2024, "June")
            .with_expense(ExpenseRecord::new("01-06", "Mystery", "Misc", "n/a"));
        let report = builder().assemble(&request).unwrap();

        assert!(report.table().body().is_empty());
        assert_eq!(report.table().total().cell(AMOUNT_COLUMN), "0.00");
    }

    #[test]
    fn row_order_matches_input_order() {
        let names = ["Zebra", "Apple", "Mango", "Banana"];
        let request = ReportRequest::new(2024, "July").with_expenses(
            names
                .iter()
                .enumerate()
                .map(|(day, name)| ExpenseRecord::new(format!("{:02}-07", 31 - day), *name, "Misc", "1")),
        );
        let report = builder().assemble(&request).unwrap();

        let rendered: Vec<_> = report.table().body().iter().map(|row| row.cell(1)).collect();
        assert_eq!(rendered, names);
    }

    #[test]
    fn total_is_exact_sum_of_parseable_prices() {
        let prices = ["0.10", "0.20", "1,000.05", "bogus", "33.333", "-5"];
        let request = ReportRequest::new(2024, "August").with_expenses(
            prices
                .iter()
                .map(|price| ExpenseRecord::new("01-08", "Item", "Misc", *price)),
        );
        let report = builder().assemble(&request).unwrap();

        assert_eq!(report.total(), Decimal::from_str("1028.683").unwrap());
        assert_eq!(report.table().total().cell(AMOUNT_COLUMN), "1,028.68");
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn render_failures_propagate() {
        let builder = ReportBuilder::new(Arc::new(FailingRenderer));
        let err = builder.build(&march_request()).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("layout exploded"));
    }
}
