//! Rendering of assembled expense reports into PDF bytes.

use std::path::Path;

use genpdf::elements::{Break, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::{Alignment, Element, Margins, PaperSize};
use log::info;

use crate::builder::DocumentBuilder;
use crate::elements::{points_to_mm, ExpenseTable, SignatureLine};
use crate::error::{ReportError, ReportResult};
use crate::fonts;
use crate::report::ExpenseReport;

/// Page margin on every side, in inches.
pub const PAGE_MARGIN_IN: f64 = 0.55;

const FOOTER_HEIGHT_MM: f64 = 8.0;
const TITLE_COLOR: Color = Color::Rgb(0x2c, 0x3e, 0x50);
const SUBTITLE_COLOR: Color = Color::Rgb(0x7f, 0x8c, 0x8d);
const FOOTER_COLOR: Color = Color::Rgb(0x95, 0xa5, 0xa6);

/// Turns an [`ExpenseReport`] into a finished document.
///
/// Implementations must not keep state between calls; every report gets a fresh buffer.
pub trait RenderReport: Send + Sync {
    /// Renders the report and returns the encoded document.
    fn render(&self, report: &ExpenseReport) -> ReportResult<Vec<u8>>;
}

/// `genpdf` backed renderer producing A4 PDF documents.
pub struct PdfRenderer {
    font_family: FontFamily<FontData>,
}

impl PdfRenderer {
    /// Creates a renderer using an already loaded font family.
    pub fn new(font_family: FontFamily<FontData>) -> Self {
        Self { font_family }
    }

    /// Creates a renderer, loading fonts from `fonts_dir` or the default search locations.
    pub fn from_fonts_dir(fonts_dir: Option<&Path>) -> ReportResult<Self> {
        let family = fonts::load_font_family(fonts_dir).map_err(ReportError::FontLoad)?;
        Ok(Self::new(family))
    }

    fn document(&self, report: &ExpenseReport) -> genpdf::Document {
        let margin = points_to_mm(PAGE_MARGIN_IN * 72.0);

        let mut document = DocumentBuilder::new(self.font_family.clone())
            .with_title(report.title())
            .with_paper_size(PaperSize::A4)
            .with_margins(Margins::all(margin))
            .with_font_size(10)
            .with_footer(FOOTER_HEIGHT_MM, |page| {
                Paragraph::new(format!("Page {}", page))
                    .aligned(Alignment::Center)
                    .styled(Style::new().with_font_size(8).with_color(FOOTER_COLOR))
            })
            .build();

        document.push(
            Paragraph::new(report.title())
                .aligned(Alignment::Center)
                .styled(Style::new().bold().with_font_size(26).with_color(TITLE_COLOR)),
        );
        document.push(Break::new(0.6));
        document.push(
            Paragraph::new(report.subtitle())
                .aligned(Alignment::Center)
                .styled(Style::new().with_font_size(14).with_color(SUBTITLE_COLOR)),
        );
        document.push(Break::new(2.5));
        document.push(ExpenseTable::new(report.table().clone()));
        document.push(Break::new(3.0));
        document.push(SignatureLine::new(report.signature_label()));

        document
    }
}

impl RenderReport for PdfRenderer {
    fn render(&self, report: &ExpenseReport) -> ReportResult<Vec<u8>> {
        let document = self.document(report);

        let mut buffer = Vec::new();
        document.render(&mut buffer)?;

        info!(
            "Rendered '{}' ({} rows, {} skipped, {} bytes)",
            report.file_name(),
            report.table().body().len(),
            report.skipped(),
            buffer.len()
        );
        Ok(buffer)
    }
}
