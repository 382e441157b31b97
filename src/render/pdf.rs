//! Minimal PDF 1.4 writer for laid-out pages.
//!
//! Only the two standard Helvetica faces are used, so no fonts are embedded.
//! Text is encoded as WinAnsi; characters outside it print as `?`.

use std::io::Write;

use crate::render::{
    RenderError,
    layout::{Align, Page, PageGeometry, Primitive, TextRun},
    metrics::{FontStyle, PT_TO_MM, text_width_mm},
};

/// Distance from the top of a line box to the baseline, as a fraction of the font size
const ASCENT: f32 = 0.85;

pub fn pdf_file_name(contract_id: &str) -> String {
    format!("Contract-{}.pdf", contract_id)
}

fn mm_to_pt(mm: f32) -> f32 {
    mm / PT_TO_MM
}

fn encode_char(c: char) -> u8 {
    match c {
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2026}' => 0x85,
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
        _ => b'?',
    }
}

/// Encodes `text` as a PDF literal string body.
fn encode_text(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        let byte = encode_char(c);
        if matches!(byte, b'(' | b')' | b'\\') {
            bytes.push(b'\\');
        }
        bytes.push(byte);
    }
    bytes
}

fn font_name(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Regular => "F1",
        FontStyle::Bold => "F2",
    }
}

fn write_text(stream: &mut Vec<u8>, run: &TextRun, page_height: f32) {
    let width = text_width_mm(&run.text, run.size, run.style);
    let left = match run.align {
        Align::Left => run.x,
        Align::Center => run.x - width / 2.0,
        Align::Right => run.x - width,
    };
    let baseline = run.y + run.size * PT_TO_MM * ASCENT;

    stream.extend_from_slice(
        format!(
            "BT /{} {:.2} Tf {:.2} {:.2} Td (",
            font_name(run.style),
            run.size,
            mm_to_pt(left),
            mm_to_pt(page_height - baseline)
        )
        .as_bytes(),
    );
    stream.extend_from_slice(&encode_text(&run.text));
    stream.extend_from_slice(b") Tj ET\n");
}

fn content_stream(page: &Page, geometry: PageGeometry) -> Vec<u8> {
    let mut stream = Vec::new();
    let height = geometry.height;

    for primitive in &page.primitives {
        match primitive {
            Primitive::Text(run) => write_text(&mut stream, run, height),
            Primitive::Line {
                x1,
                y1,
                x2,
                y2,
                width,
            } => stream.extend_from_slice(
                format!(
                    "{:.2} w {:.2} {:.2} m {:.2} {:.2} l S\n",
                    mm_to_pt(*width),
                    mm_to_pt(*x1),
                    mm_to_pt(height - y1),
                    mm_to_pt(*x2),
                    mm_to_pt(height - y2)
                )
                .as_bytes(),
            ),
            Primitive::Rect {
                x,
                y,
                width,
                height: rect_height,
                gray,
            } => stream.extend_from_slice(
                format!(
                    "q {:.3} g {:.2} {:.2} {:.2} {:.2} re f Q\n",
                    gray,
                    mm_to_pt(*x),
                    mm_to_pt(height - y - rect_height),
                    mm_to_pt(*width),
                    mm_to_pt(*rect_height)
                )
                .as_bytes(),
            ),
        }
    }

    stream
}

/// Serializes `pages` as a complete PDF document.
///
/// Object layout: 1 catalog, 2 page tree, 3-4 fonts, then a page object and
/// its content stream for every page.
pub fn write_pdf(
    pages: &[Page],
    geometry: PageGeometry,
    out: &mut impl Write,
) -> Result<(), RenderError> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 5 + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut object = |buffer: &mut Vec<u8>, body: &[u8]| {
        offsets.push(buffer.len());
        let id = offsets.len();
        buffer.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        buffer.extend_from_slice(body);
        buffer.extend_from_slice(b"\nendobj\n");
    };

    object(&mut buffer, b"<< /Type /Catalog /Pages 2 0 R >>");
    object(
        &mut buffer,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            pages.len()
        )
        .as_bytes(),
    );
    object(
        &mut buffer,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    object(
        &mut buffer,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );

    let media_box = format!(
        "[0 0 {:.2} {:.2}]",
        mm_to_pt(geometry.width),
        mm_to_pt(geometry.height)
    );
    for (page, id) in pages.iter().zip(&page_ids) {
        object(
            &mut buffer,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox {} /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                media_box,
                id + 1
            )
            .as_bytes(),
        );

        let stream = content_stream(page, geometry);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        object(&mut buffer, &body);
    }

    let xref_offset = buffer.len();
    buffer.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    buffer.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        buffer.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    buffer.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out.write_all(&buffer)?;
    out.flush()?;
    Ok(())
}
