//! Data structures describing an expense report request and its assembled table.
//!
//! The request types sit at the HTTP boundary: they are deserialized from loosely typed JSON and
//! deliberately keep every expense field optional so malformed rows can be skipped instead of
//! failing the whole request.  The table types mirror what ends up on the page but avoid
//! referencing the rendering crate, so the assembled report can be inspected without fonts.

use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::amount::parse_price;

/// Number of columns in the expense table.
pub const COLUMN_COUNT: usize = 4;

/// Column titles shown in the header row.
pub const HEADER_TITLES: [&str; COLUMN_COUNT] = ["Date", "Description", "Category", "Amount"];

/// Label placed in the category cell of the total row.
pub const TOTAL_LABEL: &str = "Total Expenses:";

/// Index of the description column.
pub const DESCRIPTION_COLUMN: usize = 1;

/// Index of the amount column.
pub const AMOUNT_COLUMN: usize = 3;

/// Horizontal placement of text inside a table cell.
///
/// The variants map directly to [`genpdf::Alignment`] once the table is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Left aligned content.
    Left,
    /// Center aligned content.
    #[default]
    Center,
    /// Right aligned content.
    Right,
}

/// A free-form value that may arrive either as JSON text or as a JSON number.
///
/// Years are commonly sent as `2024` or `"2024"`, and prices as `4.5` or `"1,200.00"`; both
/// spellings are kept verbatim so they display exactly as supplied.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Textual value.
    Text(String),
    /// Numeric value.
    Number(Number),
}

impl Label {
    /// Converts a JSON value into a label, treating anything but text or numbers as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(number) => Some(Self::Number(number.clone())),
            _ => None,
        }
    }

    /// Interprets the label as a price, stripping thousands separators from text.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Text(text) => parse_price(text),
            Self::Number(number) => parse_price(&number.to_string()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for Label {
    fn from(value: i32) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

/// A single expense line as submitted by the caller.
///
/// Every field is optional.  A field counts as present only when it holds text or a number;
/// `null`, booleans, objects and arrays are treated as missing.  Entries that are not JSON
/// objects at all deserialize into a record with every field missing.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct ExpenseRecord {
    date: Option<Label>,
    name: Option<Label>,
    category: Option<Label>,
    price: Option<Label>,
}

impl ExpenseRecord {
    /// Creates a record with every field present.
    pub fn new(
        date: impl Into<Label>,
        name: impl Into<Label>,
        category: impl Into<Label>,
        price: impl Into<Label>,
    ) -> Self {
        Self {
            date: Some(date.into()),
            name: Some(name.into()),
            category: Some(category.into()),
            price: Some(price.into()),
        }
    }

    /// Returns the date label, if present.
    pub fn date(&self) -> Option<&Label> {
        self.date.as_ref()
    }

    /// Returns the description, if present.
    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    /// Returns the category, if present.
    pub fn category(&self) -> Option<&Label> {
        self.category.as_ref()
    }

    /// Returns the raw price, if present.
    pub fn price(&self) -> Option<&Label> {
        self.price.as_ref()
    }
}

impl From<Value> for ExpenseRecord {
    fn from(value: Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::default();
        };
        let field = |key: &str| fields.get(key).and_then(Label::from_value);

        Self {
            date: field("date"),
            name: field("name"),
            category: field("category"),
            price: field("price"),
        }
    }
}

/// The decoded body of a report request.
///
/// `year` and `month` are optional at the decoding stage so the missing-expenses check can run
/// first; the report builder rejects requests that lack either label.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    year: Option<Label>,
    #[serde(default)]
    month: Option<Label>,
    #[serde(default)]
    expenses: Option<Vec<ExpenseRecord>>,
}

impl ReportRequest {
    /// Creates a request for the given period with no expenses.
    pub fn new(year: impl Into<Label>, month: impl Into<Label>) -> Self {
        Self {
            year: Some(year.into()),
            month: Some(month.into()),
            expenses: None,
        }
    }

    /// Decodes a request from a JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns the year label, if present.
    pub fn year(&self) -> Option<&Label> {
        self.year.as_ref()
    }

    /// Returns the month label, if present.
    pub fn month(&self) -> Option<&Label> {
        self.month.as_ref()
    }

    /// Returns the submitted expenses in input order.
    pub fn expenses(&self) -> &[ExpenseRecord] {
        self.expenses.as_deref().unwrap_or_default()
    }

    /// Appends an expense and returns the updated request.
    pub fn with_expense(mut self, expense: ExpenseRecord) -> Self {
        self.expenses.get_or_insert_with(Vec::new).push(expense);
        self
    }

    /// Extends the request with multiple expenses and returns the updated instance.
    pub fn with_expenses<I>(mut self, expenses: I) -> Self
    where
        I: IntoIterator<Item = ExpenseRecord>,
    {
        self.expenses.get_or_insert_with(Vec::new).extend(expenses);
        self
    }
}

/// Role of a row within the expense table; drives styling and alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    /// Column titles.
    Header,
    /// A kept expense record.
    Body,
    /// The grand total.
    Total,
}

/// One row of display-ready cell text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    kind: RowKind,
    cells: [String; COLUMN_COUNT],
}

impl TableRow {
    /// Creates a row of the given kind.
    pub fn new(kind: RowKind, cells: [String; COLUMN_COUNT]) -> Self {
        Self { kind, cells }
    }

    /// Returns the kind of row.
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Returns the cell texts from left to right.
    pub fn cells(&self) -> &[String; COLUMN_COUNT] {
        &self.cells
    }

    /// Returns the text of a single cell.
    pub fn cell(&self, column: usize) -> &str {
        &self.cells[column]
    }

    /// Alignment of the given column for this row.
    ///
    /// Headers are centered throughout.  Amounts are right aligned in body and total rows, and
    /// descriptions are left aligned in body rows only.
    pub fn alignment(&self, column: usize) -> HorizontalAlignment {
        match (self.kind, column) {
            (RowKind::Header, _) => HorizontalAlignment::Center,
            (_, AMOUNT_COLUMN) => HorizontalAlignment::Right,
            (RowKind::Body, DESCRIPTION_COLUMN) => HorizontalAlignment::Left,
            _ => HorizontalAlignment::Center,
        }
    }
}

/// Header row, body rows and the closing total row of an expense report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportTable {
    header: TableRow,
    body: Vec<TableRow>,
    total: TableRow,
}

impl ReportTable {
    /// Creates a table with the standard header and a zero total.
    pub fn new() -> Self {
        Self {
            header: TableRow::new(RowKind::Header, HEADER_TITLES.map(str::to_owned)),
            body: Vec::new(),
            total: TableRow::new(
                RowKind::Total,
                [
                    String::new(),
                    String::new(),
                    TOTAL_LABEL.to_owned(),
                    String::new(),
                ],
            ),
        }
    }

    /// Appends a body row.
    pub fn push_row(&mut self, cells: [String; COLUMN_COUNT]) {
        self.body.push(TableRow::new(RowKind::Body, cells));
    }

    /// Sets the formatted amount shown in the total row.
    pub fn set_total(&mut self, formatted: impl Into<String>) {
        self.total.cells[AMOUNT_COLUMN] = formatted.into();
    }

    /// Returns the header row.
    pub fn header(&self) -> &TableRow {
        &self.header
    }

    /// Returns the body rows in input order.
    pub fn body(&self) -> &[TableRow] {
        &self.body
    }

    /// Returns the total row.
    pub fn total(&self) -> &TableRow {
        &self.total
    }

    /// Iterates over all rows: header, body rows, total.
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        std::iter::once(&self.header)
            .chain(self.body.iter())
            .chain(std::iter::once(&self.total))
    }
}

impl Default for ReportTable {
    fn default() -> Self {
        Self::new()
    }
}
