use std::sync::Arc;

use chrono::NaiveDate;
use expense_report::fonts;
use expense_report::{ExpenseRecord, PdfRenderer, ReportBuilder, ReportRequest};
use lopdf::content::Content;
use sha2::{Digest, Sha256};

const HEADER_FILL: (u8, u8, u8) = (0x29, 0x80, 0xb9);
const BODY_FILL: (u8, u8, u8) = (0xec, 0xf0, 0xf1);
const TOTAL_FILL: (u8, u8, u8) = (0xbd, 0xc3, 0xc7);
const TOTAL_INK: (u8, u8, u8) = (0x2c, 0x3e, 0x50);
const WHITE: (u8, u8, u8) = (0xff, 0xff, 0xff);

fn builder() -> Option<ReportBuilder> {
    if !fonts::fonts_available(None) {
        return None;
    }

    let renderer = PdfRenderer::from_fonts_dir(None).expect("load report fonts");
    Some(
        ReportBuilder::new(Arc::new(renderer))
            .with_generated_on(NaiveDate::from_ymd_opt(2024, 3, 31)),
    )
}

fn march_request() -> ReportRequest {
    ReportRequest::new(2024, "March").with_expenses([
        ExpenseRecord::new("01-03", "Rent", "Housing", "1,200.00"),
        ExpenseRecord::new("05-03", "Coffee", "Food", "4.5"),
        ExpenseRecord::new("09-03", "Broken row", "Misc", "abc"),
    ])
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    let document = builder()?
        .build(&march_request())
        .expect("render sample pdf");
    Some(document.bytes)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    for tag in [
        &b"/CreationDate("[..],
        b"/ModDate(",
        b"/Producer(",
    ] {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    for (start, end) in [
        (&b"<xmp:CreateDate>"[..], &b"</xmp:CreateDate>"[..]),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ] {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn first_page_content(bytes: &[u8]) -> Content {
    let document = lopdf::Document::load_mem(bytes).expect("rendered PDF parses");
    let page_id = *document
        .get_pages()
        .values()
        .next()
        .expect("document has a page");
    let content = document
        .get_page_content(page_id)
        .expect("page content is readable");
    Content::decode(&content).expect("page content decodes")
}

/// Colour operands of every `operator` operation, as 0-255 channel values.
fn colours(content: &Content, operator: &str) -> Vec<(u8, u8, u8)> {
    content
        .operations
        .iter()
        .filter(|operation| operation.operator == operator && operation.operands.len() == 3)
        .filter_map(|operation| {
            let channel = |index: usize| {
                operation.operands[index]
                    .as_float()
                    .ok()
                    .map(|value| (value * 255.0).round() as u8)
            };
            Some((channel(0)?, channel(1)?, channel(2)?))
        })
        .collect()
}

fn count_operations(content: &Content, operators: &[&str]) -> usize {
    content
        .operations
        .iter()
        .filter(|operation| operators.contains(&operation.operator.as_str()))
        .count()
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_parseable_pdf() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!(
            "Skipping renders_parseable_pdf: no fonts found. Set EXPENSE_REPORT_FONTS_DIR or install Liberation/DejaVu fonts."
        );
        return;
    };

    assert!(bytes.starts_with(b"%PDF"), "output should carry a PDF header");
    let document = lopdf::Document::load_mem(&bytes).expect("rendered PDF parses");
    assert_eq!(document.get_pages().len(), 1);
}

#[test]
fn table_rows_are_shaded_with_their_theme_colours() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping table_rows_are_shaded_with_their_theme_colours: no fonts found.");
        return;
    };

    let content = first_page_content(&bytes);
    let strokes = colours(&content, "RG");
    let count = |colour: (u8, u8, u8)| strokes.iter().filter(|&&c| c == colour).count();

    // Solid backgrounds are built from many overlapping strokes, not a single line.
    assert!(count(HEADER_FILL) > 10, "header fill strokes: {}", count(HEADER_FILL));
    assert!(count(BODY_FILL) > 10, "body fill strokes: {}", count(BODY_FILL));
    assert!(count(TOTAL_FILL) > 10, "total fill strokes: {}", count(TOTAL_FILL));
    assert!(count(TOTAL_INK) >= 2, "rule above the total is missing");
    assert!(count(WHITE) > 0, "grid lines are missing");
    assert!(count_operations(&content, &["S"]) > 100);
}

#[test]
fn page_carries_title_text_and_cell_colours() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping page_carries_title_text_and_cell_colours: no fonts found.");
        return;
    };

    let title = b"March Expenses Report";
    assert!(
        bytes.windows(title.len()).any(|window| window == title),
        "document title should be stored in the metadata"
    );

    let content = first_page_content(&bytes);
    // Title, subtitle, four header cells, two rows of four cells, the total label and amount,
    // the signature caption and the page footer.
    assert!(count_operations(&content, &["Tj", "TJ"]) >= 18);

    let text_colours = colours(&content, "rg");
    assert!(text_colours.contains(&WHITE), "header text should be white");
    assert!(text_colours.contains(&TOTAL_INK), "total row text colour is missing");
}

#[test]
fn rendering_is_deterministic() {
    let Some(bytes_a) = render_sample_pdf() else {
        eprintln!("Skipping rendering_is_deterministic: no fonts found.");
        return;
    };
    let Some(bytes_b) = render_sample_pdf() else {
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn long_reports_flow_onto_more_pages() {
    let Some(builder) = builder() else {
        eprintln!("Skipping long_reports_flow_onto_more_pages: no fonts found.");
        return;
    };

    let request = ReportRequest::new(2024, "December").with_expenses((1..=120).map(|n| {
        ExpenseRecord::new(
            format!("{:02}-12", n % 31 + 1),
            format!("Line item number {n} with a description long enough to wrap onto a second line in its column"),
            "Operations",
            format!("{n},000.{:02}", n % 100),
        )
    }));

    let document = builder.build(&request).expect("render long report");
    assert_eq!(document.file_name, "December_2024_Expenses_Report.pdf");

    let pdf = lopdf::Document::load_mem(&document.bytes).expect("rendered PDF parses");
    assert!(
        pdf.get_pages().len() >= 3,
        "120 rows should span several A4 pages, got {}",
        pdf.get_pages().len()
    );
}
