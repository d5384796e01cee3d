//! Construction of `genpdf::Document` instances with the report page setup.

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style;
use genpdf::{self, Element, Margins, Mm, PageDecorator, Position, Size};

type FooterFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Builder for `genpdf::Document` instances.
///
/// The font family is supplied by the caller so it can be loaded once and reused for every
/// document.
pub struct DocumentBuilder {
    font_family: FontFamily<FontData>,
    title: Option<String>,
    paper_size: Option<Size>,
    margins: Option<Margins>,
    font_size: Option<u8>,
    footer: Option<PageFooter>,
}

impl DocumentBuilder {
    /// Creates a builder for documents set in `font_family`.
    pub fn new(font_family: FontFamily<FontData>) -> Self {
        Self {
            font_family,
            title: None,
            paper_size: None,
            margins: None,
            font_size: None,
            footer: None,
        }
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the paper size of the document.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied on every page.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Sets the default font size in points.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Reserves a footer band of `height` on every page, filled by `footer(page_number)`.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(PageFooter::new(height, footer));
        self
    }

    /// Builds the document with the page decorator installed; content is pushed by the caller.
    pub fn build(self) -> genpdf::Document {
        let mut document = genpdf::Document::new(self.font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }

        if let Some(font_size) = self.font_size {
            document.set_font_size(font_size);
        }

        document.set_page_decorator(ReportPageDecorator {
            page: 0,
            margins: self.margins,
            footer: self.footer,
        });

        document
    }
}

/// Page-number footer: a fixed band at the bottom of each page plus the element drawn in it.
pub struct PageFooter {
    height: Mm,
    factory: Box<FooterFactory>,
}

impl PageFooter {
    /// Reserves `height` at the bottom of each page and fills it with `factory(page_number)`.
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }

    /// Draws the footer for `page` and returns the area left for the page body.
    fn apply<'a>(
        &self,
        page: usize,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let available = area.size().height;
        if self.height > available {
            return Err(Error::new(
                "Page footer is taller than the page body",
                ErrorKind::InvalidData,
            ));
        }

        let mut band = area.clone();
        band.add_offset(Position::new(0, available - self.height));
        let rendered = (self.factory)(page).render(context, band, style)?;
        if rendered.has_more {
            return Err(Error::new(
                format!("Footer of page {page} does not fit into its band"),
                ErrorKind::PageSizeExceeded,
            ));
        }

        area.set_height(available - self.height);
        Ok(area)
    }
}

/// Counts pages, applies the report margins and reserves the footer band.
struct ReportPageDecorator {
    page: usize,
    margins: Option<Margins>,
    footer: Option<PageFooter>,
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        match &self.footer {
            Some(footer) => footer.apply(self.page, context, area, style),
            None => Ok(area),
        }
    }
}
