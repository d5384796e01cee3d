//! Custom `genpdf` elements used by the expense report layout.
//!
//! `genpdf`'s own table layout cannot shade cells, so [`ExpenseTable`] draws every row itself:
//! a filled background, white grid lines, then the cell text positioned according to the row's
//! alignment rules.  Cell text wraps inside its column and the row grows to fit it.  The table
//! paginates on its own, repeating the header row at the top of every continuation page.
//!
//! `genpdf` only strokes paths at the PDF default width of one point, so solid areas are painted
//! as stacks of overlapping strokes.

use genpdf::error::Error;
use genpdf::style::{Color, Style};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Size};

use crate::model::{HorizontalAlignment, ReportTable, RowKind, TableRow, COLUMN_COUNT};

const MM_PER_INCH: f64 = 25.4;
const MM_PER_POINT: f64 = MM_PER_INCH / 72.0;
const CELL_HORIZONTAL_PADDING_MM: f64 = 6.0 * MM_PER_POINT;
const STROKE_WIDTH_MM: f64 = MM_PER_POINT;
const FILL_STEP_MM: f64 = STROKE_WIDTH_MM * 0.6;
const TOTAL_RULE_THICKNESS_MM: f64 = 2.0 * MM_PER_POINT;
const SIGNATURE_RULE_MM: f64 = 60.0;

/// Column widths in inches: date, description, category, amount.
pub const COLUMN_WIDTHS_IN: [f64; COLUMN_COUNT] = [1.1, 2.6, 1.3, 1.2];

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts a length in points to millimetres.
pub fn points_to_mm(points: f64) -> f64 {
    points * MM_PER_POINT
}

impl From<HorizontalAlignment> for Alignment {
    fn from(alignment: HorizontalAlignment) -> Self {
        match alignment {
            HorizontalAlignment::Left => Alignment::Left,
            HorizontalAlignment::Center => Alignment::Center,
            HorizontalAlignment::Right => Alignment::Right,
        }
    }
}

fn stroke(area: &render::Area<'_>, from: (f64, f64), to: (f64, f64), color: Color) {
    area.draw_line(
        vec![
            Position::new(mm_from_f64(from.0), mm_from_f64(from.1)),
            Position::new(mm_from_f64(to.0), mm_from_f64(to.1)),
        ],
        Style::new().with_color(color),
    );
}

/// Vertical positions of the strokes that cover a band of `height` millimetres starting at `y`.
///
/// Neighbouring strokes are closer than the stroke width, and the outermost strokes stay inside
/// the band.
fn fill_offsets(y: f64, height: f64) -> Vec<f64> {
    let half = STROKE_WIDTH_MM / 2.0;
    if height <= STROKE_WIDTH_MM {
        return vec![y + height / 2.0];
    }

    let first = y + half;
    let last = y + height - half;
    let steps = ((last - first) / FILL_STEP_MM).ceil() as usize;
    (0..=steps)
        .map(|step| (first + step as f64 * FILL_STEP_MM).min(last))
        .collect()
}

/// Paints a solid rectangle as horizontal strokes.
fn fill_rect(area: &render::Area<'_>, x: f64, y: f64, width: f64, height: f64, color: Color) {
    for line_y in fill_offsets(y, height) {
        stroke(area, (x, line_y), (x + width, line_y), color);
    }
}

/// Splits `text` into lines no wider than `max_width`.
///
/// Lines break between words; a word wider than a whole line is broken between characters.
/// Runs of whitespace collapse to a single space.  Always returns at least one line.
fn wrap_text(text: &str, max_width: f64, width: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if width(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if width(word) <= max_width {
            current = word.to_owned();
            continue;
        }

        for c in word.chars() {
            current.push(c);
            if current.chars().count() > 1 && width(&current) > max_width {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Visual attributes of one kind of table row.
#[derive(Clone, Copy, Debug)]
struct RowStyle {
    background: Color,
    text_color: Color,
    bold: bool,
    font_size: u8,
    /// Space above and below the text, in points.
    vertical_padding: f64,
}

impl RowStyle {
    fn text_style(&self, base: Style) -> Style {
        let mut style = base;
        style.set_font_size(self.font_size);
        style.set_color(self.text_color);
        if self.bold {
            style.set_bold();
        }
        style
    }
}

/// Colours and row styles of the expense table.
#[derive(Clone, Copy, Debug)]
struct TableTheme {
    header: RowStyle,
    body: RowStyle,
    total: RowStyle,
    /// Grid lines separating header and body cells.
    grid: Color,
    /// Rule drawn above the total row.
    total_rule: Color,
}

impl Default for TableTheme {
    fn default() -> Self {
        Self {
            header: RowStyle {
                background: Color::Rgb(0x29, 0x80, 0xb9),
                text_color: Color::Rgb(0xff, 0xff, 0xff),
                bold: true,
                font_size: 12,
                vertical_padding: 12.0,
            },
            body: RowStyle {
                background: Color::Rgb(0xec, 0xf0, 0xf1),
                text_color: Color::Rgb(0x00, 0x00, 0x00),
                bold: false,
                font_size: 10,
                vertical_padding: 3.0,
            },
            total: RowStyle {
                background: Color::Rgb(0xbd, 0xc3, 0xc7),
                text_color: Color::Rgb(0x2c, 0x3e, 0x50),
                bold: true,
                font_size: 12,
                vertical_padding: 3.0,
            },
            grid: Color::Rgb(0xff, 0xff, 0xff),
            total_rule: Color::Rgb(0x2c, 0x3e, 0x50),
        }
    }
}

impl TableTheme {
    fn row_style(&self, kind: RowKind) -> &RowStyle {
        match kind {
            RowKind::Header => &self.header,
            RowKind::Body => &self.body,
            RowKind::Total => &self.total,
        }
    }
}

/// Wrapped cell text and the resulting height of one row.
struct RowLayout {
    lines: [Vec<String>; COLUMN_COUNT],
    line_height: f64,
    height: f64,
}

/// Shaded expense table that flows across pages.
pub struct ExpenseTable {
    table: ReportTable,
    column_widths: [f64; COLUMN_COUNT],
    theme: TableTheme,
    next_body_row: usize,
    finished: bool,
}

impl ExpenseTable {
    /// Creates a table element with the standard column widths and theme.
    pub fn new(table: ReportTable) -> Self {
        Self {
            table,
            column_widths: COLUMN_WIDTHS_IN.map(|inches| inches * MM_PER_INCH),
            theme: TableTheme::default(),
            next_body_row: 0,
            finished: false,
        }
    }

    /// Sets the column widths in millimetres and returns the updated element.
    pub fn with_column_widths(mut self, widths: [f64; COLUMN_COUNT]) -> Self {
        self.column_widths = widths;
        self
    }

    /// Column widths scaled down proportionally when the area is narrower than the table.
    fn fitted_widths(&self, available: f64) -> [f64; COLUMN_COUNT] {
        let natural: f64 = self.column_widths.iter().sum();
        if natural <= available || natural <= f64::EPSILON {
            self.column_widths
        } else {
            let scale = available / natural;
            self.column_widths.map(|width| width * scale)
        }
    }

    fn layout_row(
        &self,
        context: &genpdf::Context,
        base: Style,
        row: &TableRow,
        widths: &[f64; COLUMN_COUNT],
    ) -> RowLayout {
        let row_style = self.theme.row_style(row.kind());
        let text_style = row_style.text_style(base);
        let width_of = |s: &str| mm_to_f64(text_style.str_width(&context.font_cache, s));

        let lines: [Vec<String>; COLUMN_COUNT] = std::array::from_fn(|column| {
            let inner = widths[column] - 2.0 * CELL_HORIZONTAL_PADDING_MM;
            wrap_text(row.cell(column), inner, &width_of)
        });
        let line_count = lines.iter().map(Vec::len).max().unwrap_or(1);
        let line_height = mm_to_f64(text_style.line_height(&context.font_cache));

        RowLayout {
            lines,
            line_height,
            height: line_count as f64 * line_height + 2.0 * points_to_mm(row_style.vertical_padding),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        base: Style,
        row: &TableRow,
        layout: &RowLayout,
        x_origin: f64,
        widths: &[f64; COLUMN_COUNT],
        top: f64,
    ) -> Result<(), Error> {
        let row_style = self.theme.row_style(row.kind());
        let height = layout.height;
        let table_width: f64 = widths.iter().sum();

        fill_rect(area, x_origin, top, table_width, height, row_style.background);

        match row.kind() {
            RowKind::Total => fill_rect(
                area,
                x_origin,
                top,
                table_width,
                TOTAL_RULE_THICKNESS_MM,
                self.theme.total_rule,
            ),
            RowKind::Header | RowKind::Body => {
                let mut x = x_origin;
                for width in &widths[..COLUMN_COUNT - 1] {
                    x += width;
                    stroke(area, (x, top), (x, top + height), self.theme.grid);
                }
                stroke(
                    area,
                    (x_origin, top + height),
                    (x_origin + table_width, top + height),
                    self.theme.grid,
                );
            }
        }

        let text_style = row_style.text_style(base);
        let text_top = top + points_to_mm(row_style.vertical_padding);
        let mut x = x_origin;
        for (column, width) in widths.iter().enumerate() {
            let alignment = Alignment::from(row.alignment(column));
            for (index, line) in layout.lines[column].iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let text_width = mm_to_f64(text_style.str_width(&context.font_cache, line));
                let offset = match alignment {
                    Alignment::Left => CELL_HORIZONTAL_PADDING_MM,
                    Alignment::Center => (width - text_width) / 2.0,
                    Alignment::Right => width - CELL_HORIZONTAL_PADDING_MM - text_width,
                };
                area.print_str(
                    &context.font_cache,
                    Position::new(
                        mm_from_f64(x + offset),
                        mm_from_f64(text_top + index as f64 * layout.line_height),
                    ),
                    text_style,
                    line,
                )?;
            }
            x += width;
        }

        Ok(())
    }
}

impl Element for ExpenseTable {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.finished {
            return Ok(result);
        }

        let available_width = mm_to_f64(area.size().width);
        let available_height = mm_to_f64(area.size().height);
        let widths = self.fitted_widths(available_width);
        let table_width: f64 = widths.iter().sum();
        let x_origin = ((available_width - table_width) / 2.0).max(0.0);

        let header = self.table.header();
        let header_layout = self.layout_row(context, style, header, &widths);
        let first_row = self
            .table
            .body()
            .get(self.next_body_row)
            .unwrap_or_else(|| self.table.total());
        let first_layout = self.layout_row(context, style, first_row, &widths);
        if header_layout.height + first_layout.height > available_height {
            result.has_more = true;
            return Ok(result);
        }

        self.draw_row(context, &area, style, header, &header_layout, x_origin, &widths, 0.0)?;
        let mut cursor = header_layout.height;

        while let Some(row) = self.table.body().get(self.next_body_row) {
            let layout = self.layout_row(context, style, row, &widths);
            if cursor + layout.height > available_height {
                result.size = Size::new(mm_from_f64(available_width), mm_from_f64(cursor));
                result.has_more = true;
                return Ok(result);
            }
            self.draw_row(context, &area, style, row, &layout, x_origin, &widths, cursor)?;
            cursor += layout.height;
            self.next_body_row += 1;
        }

        let total = self.table.total();
        let total_layout = self.layout_row(context, style, total, &widths);
        if cursor + total_layout.height > available_height {
            result.size = Size::new(mm_from_f64(available_width), mm_from_f64(cursor));
            result.has_more = true;
            return Ok(result);
        }

        self.draw_row(context, &area, style, total, &total_layout, x_origin, &widths, cursor)?;
        cursor += total_layout.height;
        self.finished = true;

        result.size = Size::new(mm_from_f64(available_width), mm_from_f64(cursor));
        Ok(result)
    }
}

/// A signature caption followed by a drawn rule to sign on.
pub struct SignatureLine {
    label: String,
}

impl SignatureLine {
    /// Creates a left-aligned signature line with the given caption and a 60 mm rule.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Element for SignatureLine {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();

        let line_height = mm_to_f64(style.line_height(&context.font_cache));
        if line_height > mm_to_f64(area.size().height) {
            result.has_more = true;
            return Ok(result);
        }

        let caption = format!("{} ", self.label);
        let caption_width = mm_to_f64(style.str_width(&context.font_cache, &caption));

        if !area.print_str(
            &context.font_cache,
            Position::new(mm_from_f64(0.0), mm_from_f64(0.0)),
            style,
            &caption,
        )? {
            result.has_more = true;
            return Ok(result);
        }

        // Baseline sits roughly four fifths down the line box.
        let baseline = line_height * 0.8;
        stroke(
            &area,
            (caption_width, baseline),
            (caption_width + SIGNATURE_RULE_MM, baseline),
            style.color().unwrap_or(Color::Rgb(0, 0, 0)),
        );

        result.size = Size::new(
            mm_from_f64(caption_width + SIGNATURE_RULE_MM),
            mm_from_f64(line_height),
        );
        Ok(result)
    }
}
