//! Core entry point for the expense_report crate.
//!
//! Expense lists posted as JSON are validated, summed and laid out as an A4 PDF report with a
//! shaded table, a total row and a signature line.  [`report::ReportBuilder`] holds the domain
//! logic and knows nothing about HTTP; [`server`] wraps it in a small axum router.

pub mod amount;
pub mod builder;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod model;
pub mod render;
pub mod report;
pub mod server;

pub use error::{ReportError, ReportResult};
pub use model::{ExpenseRecord, Label, ReportRequest};
pub use render::{PdfRenderer, RenderReport};
pub use report::{ExpenseReport, ReportBuilder, ReportDocument};
