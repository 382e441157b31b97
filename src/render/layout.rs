//! Manual page layout for the print rendering.
//!
//! Content is flowed onto fixed-size pages with a vertical cursor measured in
//! millimetres from the top edge. A block that would cross the usable bottom
//! moves to a new page, and section headings always open a fresh page. Page
//! footers need the final page count, so they are stamped in a second pass
//! once every page exists.

use crate::models::draft::SectionKey;
use crate::render::{
    Content, ContractDocument, DOCUMENT_TITLE, RenderError, client_address, money,
    or_placeholder,
    metrics::{FontStyle, PT_TO_MM, text_width_mm, wrap},
};

pub const TITLE_SIZE: f32 = 18.0;
pub const HEADING_SIZE: f32 = 14.0;
pub const SUBHEADING_SIZE: f32 = 11.5;
pub const BODY_SIZE: f32 = 10.5;
pub const SMALL_SIZE: f32 = 9.0;

/// Line height as a multiple of the font size
const LINE_SPACING: f32 = 1.35;
/// Vertical gap after every block, in mm
pub const BLOCK_SPACING: f32 = 4.0;
const LIST_INDENT: f32 = 6.0;
const SIGNATURE_HEIGHT: f32 = 30.0;
const COLUMN_GAP: f32 = 10.0;
/// Height of the shaded party summary on the cover, in mm
const PARTY_BOX_HEIGHT: f32 = 62.0;
/// Cover metadata values start this far right of the labels
const METADATA_INDENT: f32 = 40.0;

/// Illustrative page numbers printed in the table of contents. They are not
/// derived from the actual layout.
const CONTENTS: [(&str, Option<SectionKey>, u32); 11] = [
    ("Confidentiality Agreement", None, 3),
    ("Contract Summary", None, 4),
    ("Project Overview", Some(SectionKey::ProjectOverview), 5),
    ("Timeline & Milestones", Some(SectionKey::Timeline), 6),
    ("Payment Terms", Some(SectionKey::PaymentTerms), 7),
    ("Client Responsibilities", Some(SectionKey::ClientResponsibilities), 8),
    ("Provider Responsibilities", Some(SectionKey::ProviderResponsibilities), 9),
    ("Intellectual Property", Some(SectionKey::IntellectualProperty), 10),
    ("Warranty & Support", Some(SectionKey::Warranty), 11),
    ("Termination", Some(SectionKey::Termination), 12),
    ("Signatures", None, 13),
];

/// Page size and margins, all in mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin_top: 20.0,
        margin_bottom: 20.0,
        margin_left: 20.0,
        margin_right: 20.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn right(&self) -> f32 {
        self.width - self.margin_right
    }

    pub fn usable_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }

    fn validate(&self) -> Result<(), RenderError> {
        if self.content_width() < 2.0 * COLUMN_GAP + 40.0 {
            return Err(RenderError::InvalidGeometry(format!(
                "content width {:.1}mm is too narrow",
                self.content_width()
            )));
        }
        if self.usable_bottom() - self.margin_top < 4.0 * SIGNATURE_HEIGHT {
            return Err(RenderError::InvalidGeometry(format!(
                "usable height {:.1}mm is too short",
                self.usable_bottom() - self.margin_top
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A single line of text. `y` is the top of the line box; `x` is the anchor
/// named by `align`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub size: f32,
    pub style: FontStyle,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Text(TextRun),
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
    },
    /// Filled rectangle, `gray` from 0 (black) to 1 (white)
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gray: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Cover,
    Contents,
    Confidentiality,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub kind: PageKind,
    pub primitives: Vec<Primitive>,
    /// `"<page> of <total>"`, written by [`stamp_footers`]
    pub footer: Option<String>,
}

impl Page {
    fn new(kind: PageKind) -> Self {
        Self {
            kind,
            primitives: vec![],
            footer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParty {
    pub label: String,
    /// Empty leaves the name line blank
    pub name: String,
}

/// Units of flowed content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    /// Always starts a fresh page
    Heading(String),
    Subheading(String),
    Paragraph(String),
    ListItem(String),
    Signatures(SignatureParty, SignatureParty),
}

/// Cursor-based page flow.
pub struct Layout {
    geometry: PageGeometry,
    pages: Vec<Page>,
    cursor: f32,
}

impl Layout {
    pub fn new(geometry: PageGeometry) -> Result<Self, RenderError> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            pages: vec![],
            cursor: geometry.margin_top,
        })
    }

    pub fn start_page(&mut self, kind: PageKind) {
        self.pages.push(Page::new(kind));
        self.cursor = self.geometry.margin_top;
    }

    /// A page counts as fresh until something is drawn on it.
    fn is_fresh(&self) -> bool {
        self.pages
            .last()
            .is_none_or(|page| page.primitives.is_empty())
    }

    fn current_kind(&self) -> PageKind {
        self.pages
            .last()
            .map(|page| page.kind)
            .unwrap_or(PageKind::Body)
    }

    fn push(&mut self, primitive: Primitive) {
        if self.pages.is_empty() {
            self.start_page(PageKind::Body);
        }
        if let Some(page) = self.pages.last_mut() {
            page.primitives.push(primitive);
        }
    }

    fn text(&mut self, x: f32, y: f32, text: &str, size: f32, style: FontStyle, align: Align) {
        self.push(Primitive::Text(TextRun {
            x,
            y,
            text: text.to_string(),
            size,
            style,
            align,
        }));
    }

    fn break_if_needed(&mut self, height: f32) {
        if !self.is_fresh() && self.cursor + height > self.geometry.usable_bottom() {
            self.start_page(self.current_kind());
        }
    }

    pub fn place(&mut self, block: &Block) {
        match block {
            Block::Title(text) => {
                self.place_lines(text, TITLE_SIZE, FontStyle::Bold, 0.0, Align::Center, false)
            }
            Block::Heading(text) => {
                if !self.is_fresh() {
                    self.start_page(self.current_kind());
                }
                self.place_lines(text, HEADING_SIZE, FontStyle::Bold, 0.0, Align::Left, false);
                let y = self.cursor + 1.0;
                self.push(Primitive::Line {
                    x1: self.geometry.margin_left,
                    y1: y,
                    x2: self.geometry.right(),
                    y2: y,
                    width: 0.4,
                });
                self.cursor += 2.0;
            }
            Block::Subheading(text) => self.place_lines(
                text,
                SUBHEADING_SIZE,
                FontStyle::Bold,
                0.0,
                Align::Left,
                false,
            ),
            Block::Paragraph(text) => {
                self.place_lines(text, BODY_SIZE, FontStyle::Regular, 0.0, Align::Left, false)
            }
            Block::ListItem(text) => self.place_lines(
                text,
                BODY_SIZE,
                FontStyle::Regular,
                LIST_INDENT,
                Align::Left,
                true,
            ),
            Block::Signatures(left, right) => self.place_signatures(left, right),
        }
        self.cursor += BLOCK_SPACING;
    }

    fn place_lines(
        &mut self,
        text: &str,
        size: f32,
        style: FontStyle,
        indent: f32,
        align: Align,
        bullet: bool,
    ) {
        let lines = wrap(text, size, style, self.geometry.content_width() - indent);
        if lines.is_empty() {
            return;
        }

        let line_height = size * PT_TO_MM * LINE_SPACING;
        self.break_if_needed(line_height * lines.len() as f32);

        let left = self.geometry.margin_left;
        let x = match align {
            Align::Left => left + indent,
            Align::Center => left + self.geometry.content_width() / 2.0,
            Align::Right => self.geometry.right(),
        };

        for (index, line) in lines.iter().enumerate() {
            // Only reached mid-block when the block is taller than a page
            self.break_if_needed(line_height);
            if bullet && index == 0 {
                self.text(left + 1.5, self.cursor, "\u{2022}", size, style, Align::Left);
            }
            self.text(x, self.cursor, line, size, style, align);
            self.cursor += line_height;
        }
    }

    fn place_signatures(&mut self, left: &SignatureParty, right: &SignatureParty) {
        self.break_if_needed(SIGNATURE_HEIGHT);

        let column = (self.geometry.content_width() - COLUMN_GAP) / 2.0;
        let top = self.cursor;
        for (x, party) in [
            (self.geometry.margin_left, left),
            (self.geometry.margin_left + column + COLUMN_GAP, right),
        ] {
            self.text(x, top, &party.label, BODY_SIZE, FontStyle::Bold, Align::Left);
            self.push(Primitive::Line {
                x1: x,
                y1: top + 16.0,
                x2: x + column,
                y2: top + 16.0,
                width: 0.3,
            });
            if !party.name.trim().is_empty() {
                self.text(x, top + 18.0, party.name.trim(), BODY_SIZE, FontStyle::Regular, Align::Left);
            }
            self.text(x, top + 23.5, "Date: ________________", SMALL_SIZE, FontStyle::Regular, Align::Left);
        }
        self.cursor = top + SIGNATURE_HEIGHT;
    }

    /// Draws `text` wrapped to `width` starting at `y`; returns the y below it.
    fn draw_wrapped(&mut self, x: f32, y: f32, width: f32, text: &str, size: f32, style: FontStyle) -> f32 {
        let lines = wrap(text, size, style, width);
        self.draw_lines(x, y, &lines, size, style, Align::Left)
    }

    fn draw_lines(&mut self, x: f32, y: f32, lines: &[String], size: f32, style: FontStyle, align: Align) -> f32 {
        let mut y = y;
        for line in lines {
            self.text(x, y, line, size, style, align);
            y += line_height(size);
        }
        y
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }
}

/// Keeps the first `max_lines` of `lines`; when some are dropped the last
/// kept line ends in an ellipsis that still fits `width`.
fn truncate_lines(
    mut lines: Vec<String>,
    max_lines: usize,
    size: f32,
    style: FontStyle,
    width: f32,
) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let mut kept = last.trim_end().to_string();
        loop {
            let candidate = format!("{}\u{2026}", kept);
            if kept.is_empty() || text_width_mm(&candidate, size, style) <= width {
                *last = candidate;
                break;
            }
            kept.pop();
        }
    }
    lines
}

/// Wraps `text` to `width` and caps it at `max_lines`.
fn bounded_lines(text: &str, size: f32, style: FontStyle, width: f32, max_lines: usize) -> Vec<String> {
    truncate_lines(wrap(text, size, style, width), max_lines, size, style, width)
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

/// Lays out front matter and body without footers.
pub fn paginate(
    document: &ContractDocument<'_>,
    geometry: PageGeometry,
) -> Result<Vec<Page>, RenderError> {
    let mut layout = Layout::new(geometry)?;

    draw_cover(&mut layout, document);
    draw_contents(&mut layout, document);
    draw_confidentiality(&mut layout, document);

    layout.start_page(PageKind::Body);
    for block in body_blocks(document) {
        layout.place(&block);
    }

    Ok(layout.finish())
}

/// Second pass: writes `"<page> of <total>"` right-aligned in every footer.
pub fn stamp_footers(pages: &mut [Page], geometry: PageGeometry) {
    let total = pages.len();
    let y = geometry.height - geometry.margin_bottom / 2.0 - SMALL_SIZE * PT_TO_MM / 2.0;

    for (index, page) in pages.iter_mut().enumerate() {
        let footer = format!("{} of {}", index + 1, total);
        page.primitives.push(Primitive::Text(TextRun {
            x: geometry.right(),
            y,
            text: footer.clone(),
            size: SMALL_SIZE,
            style: FontStyle::Regular,
            align: Align::Right,
        }));
        page.footer = Some(footer);
    }
}

/// A4 pages with front matter, body and stamped footers.
pub fn render_paginated(document: &ContractDocument<'_>) -> Result<Vec<Page>, RenderError> {
    let geometry = PageGeometry::A4;
    let mut pages = paginate(document, geometry)?;
    stamp_footers(&mut pages, geometry);
    Ok(pages)
}

/// Every cover element is bounded: long values wrap and are cut with an
/// ellipsis instead of running off the page or into the notice.
fn draw_cover(layout: &mut Layout, document: &ContractDocument<'_>) {
    let g = layout.geometry;
    let left = g.margin_left;
    let center = left + g.content_width() / 2.0;
    let draft = document.draft;
    let provider = document.provider;

    layout.start_page(PageKind::Cover);

    layout.push(Primitive::Rect {
        x: left,
        y: g.margin_top,
        width: 22.0,
        height: 22.0,
        gray: 0.85,
    });
    layout.text(left + 11.0, g.margin_top + 9.0, "LOGO", SMALL_SIZE, FontStyle::Bold, Align::Center);
    let header_width = g.content_width() - 28.0;
    let name = bounded_lines(&provider.name, 16.0, FontStyle::Bold, header_width, 1);
    layout.draw_lines(left + 28.0, g.margin_top + 3.0, &name, 16.0, FontStyle::Bold, Align::Left);
    let location = bounded_lines(&provider.location, BODY_SIZE, FontStyle::Regular, header_width, 1);
    layout.draw_lines(left + 28.0, g.margin_top + 12.0, &location, BODY_SIZE, FontStyle::Regular, Align::Left);

    layout.text(center, 80.0, DOCUMENT_TITLE, 22.0, FontStyle::Bold, Align::Center);
    let prepared_for = bounded_lines(
        &format!("Prepared for {}", or_placeholder(&draft.client.name)),
        12.0,
        FontStyle::Regular,
        g.content_width(),
        2,
    );
    layout.draw_lines(center, 93.0, &prepared_for, 12.0, FontStyle::Regular, Align::Center);

    let metadata = [
        ("Contract No", document.contract_id.to_string()),
        ("Date", document.contract_date()),
        ("Project", or_placeholder(&draft.project.name).to_string()),
        ("Total Investment", money(&draft.project.total_cost)),
    ];
    let value_width = g.content_width() - METADATA_INDENT;
    let mut y = 112.0;
    for (label, value) in metadata {
        layout.text(left, y, &format!("{}:", label), 11.0, FontStyle::Bold, Align::Left);
        let lines = bounded_lines(&value, 11.0, FontStyle::Regular, value_width, 2);
        let bottom = layout.draw_lines(left + METADATA_INDENT, y, &lines, 11.0, FontStyle::Regular, Align::Left);
        y = (y + 7.0).max(bottom + 2.0);
    }

    // Two-column party summary, moved down when the metadata wrapped
    let top = (y + 8.0).max(150.0);
    let column = (g.content_width() - COLUMN_GAP) / 2.0;
    layout.push(Primitive::Rect {
        x: left,
        y: top - 4.0,
        width: g.content_width(),
        height: PARTY_BOX_HEIGHT,
        gray: 0.95,
    });

    let client_lines = [
        or_placeholder(&draft.client.name).to_string(),
        draft.client.company.trim().to_string(),
        client_address(&draft.client),
        draft.client.email.trim().to_string(),
        draft.client.phone.trim().to_string(),
    ];
    let provider_lines = [
        provider.name.clone(),
        provider.location.clone(),
        provider.email.clone(),
    ];
    let party_top = top + 7.0;
    let party_bottom = top - 4.0 + PARTY_BOX_HEIGHT - 2.0;
    let max_lines = ((party_bottom - party_top) / line_height(BODY_SIZE)).floor() as usize;
    let party_width = column - 6.0;
    for (x, title, entries) in [
        (left + 4.0, "SERVICE PROVIDER", &provider_lines[..]),
        (left + column + COLUMN_GAP, "CLIENT", &client_lines[..]),
    ] {
        layout.text(x, top, title, 11.0, FontStyle::Bold, Align::Left);
        let wrapped = entries
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .flat_map(|entry| wrap(entry, BODY_SIZE, FontStyle::Regular, party_width))
            .collect();
        let lines = truncate_lines(wrapped, max_lines, BODY_SIZE, FontStyle::Regular, party_width);
        layout.draw_lines(x, party_top, &lines, BODY_SIZE, FontStyle::Regular, Align::Left);
    }

    let notice_top = g.usable_bottom() - 24.0;
    layout.push(Primitive::Line {
        x1: left,
        y1: notice_top,
        x2: g.right(),
        y2: notice_top,
        width: 0.3,
    });
    layout.draw_wrapped(
        left,
        notice_top + 3.0,
        g.content_width(),
        "CONFIDENTIAL: This document contains proprietary information intended solely for the parties named above. It may not be copied or distributed without written consent of both parties.",
        SMALL_SIZE,
        FontStyle::Regular,
    );
}

fn draw_contents(layout: &mut Layout, document: &ContractDocument<'_>) {
    let g = layout.geometry;
    let size = 11.0;

    layout.start_page(PageKind::Contents);
    layout.place(&Block::Heading("TABLE OF CONTENTS".to_string()));

    let entries = CONTENTS.iter().filter(|(_, section, _)| {
        section.is_none_or(|key| key.is_included(&document.draft.included_sections))
    });

    let mut y = layout.cursor + 4.0;
    for (title, _, page) in entries {
        let number = page.to_string();
        let leader = dot_leader(title, &number, g.content_width(), size);
        let title_width = text_width_mm(title, size, FontStyle::Regular);

        layout.text(g.margin_left, y, title, size, FontStyle::Regular, Align::Left);
        layout.text(g.margin_left + title_width + 1.5, y, &leader, size, FontStyle::Regular, Align::Left);
        layout.text(g.right(), y, &number, size, FontStyle::Regular, Align::Right);
        y += 9.0;
    }
    layout.cursor = y;
}

/// Dots filling the gap between a title and its right-aligned page number.
fn dot_leader(title: &str, number: &str, width: f32, size: f32) -> String {
    let gap = 1.5;
    let available = width
        - text_width_mm(title, size, FontStyle::Regular)
        - text_width_mm(number, size, FontStyle::Regular)
        - 2.0 * gap;
    let dot = text_width_mm(".", size, FontStyle::Regular);
    let count = (available / dot).floor().max(0.0) as usize;
    ".".repeat(count)
}

fn draw_confidentiality(layout: &mut Layout, document: &ContractDocument<'_>) {
    let provider = document.provider.name.as_str();
    let client = or_placeholder(&document.draft.client.name);

    layout.start_page(PageKind::Confidentiality);
    let blocks = [
        Block::Heading("CONFIDENTIALITY AGREEMENT".to_string()),
        Block::Paragraph(format!(
            "This Confidentiality Agreement is entered into by {} and {} in connection with the services described in the attached agreement.",
            provider, client
        )),
        Block::Paragraph(
            "1. Confidential Information. Any business, technical, or financial information disclosed by either party, in any form, is confidential unless it is publicly available through no fault of the receiving party.".to_string(),
        ),
        Block::Paragraph(
            "2. Obligations. The receiving party will use confidential information only to perform under the agreement, will not disclose it to third parties, and will protect it with at least reasonable care.".to_string(),
        ),
        Block::Paragraph(
            "3. Duration. These obligations survive completion or termination of the agreement for a period of three (3) years.".to_string(),
        ),
        Block::Paragraph(
            "4. Return of Materials. On request, each party will return or destroy all confidential materials of the other party.".to_string(),
        ),
        Block::Signatures(
            SignatureParty {
                label: format!("For {}", provider),
                name: String::new(),
            },
            SignatureParty {
                label: "For the Client".to_string(),
                name: document.draft.client.name.clone(),
            },
        ),
    ];
    for block in &blocks {
        layout.place(block);
    }
}

fn body_blocks(document: &ContractDocument<'_>) -> Vec<Block> {
    let draft = document.draft;
    let mut blocks = vec![
        Block::Title(DOCUMENT_TITLE.to_string()),
        Block::Paragraph(format!(
            "Contract ID: {}    Date: {}",
            document.contract_id,
            document.contract_date()
        )),
        Block::Paragraph(format!(
            "This agreement is made between {} (\"Provider\"), located in {}, and {} (\"Client\").",
            document.provider.name,
            document.provider.location,
            or_placeholder(&draft.client.name)
        )),
    ];

    for section in document.sections() {
        blocks.push(Block::Heading(section.heading()));
        for content in section.content {
            match content {
                Content::Paragraph(text) => blocks.push(Block::Paragraph(text)),
                Content::Subheading(text) => blocks.push(Block::Subheading(text)),
                Content::Bullets(items) => blocks.extend(items.into_iter().map(Block::ListItem)),
                Content::Fields(fields) => blocks.extend(
                    fields
                        .into_iter()
                        .map(|(label, value)| Block::Paragraph(format!("{}: {}", label, value))),
                ),
            }
        }
    }

    blocks.push(Block::Subheading("Signatures".to_string()));
    blocks.push(Block::Paragraph(
        "By signing below, both parties agree to the terms and conditions of this agreement."
            .to_string(),
    ));
    blocks.push(Block::Signatures(
        SignatureParty {
            label: "Provider".to_string(),
            name: document.provider.name.clone(),
        },
        SignatureParty {
            label: "Client".to_string(),
            name: draft.client.name.clone(),
        },
    ));

    blocks
}
