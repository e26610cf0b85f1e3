// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-to-PDF writer using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument, warn};
use wandelwerk_core::config::{DocumentLayout, Pagination};

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Outcome of laying out one document, reported alongside the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutReport {
    /// Lines after wrapping.
    pub lines_total: usize,
    /// Lines that were actually drawn.
    pub lines_placed: usize,
    pub pages: usize,
}

impl LayoutReport {
    /// Whether some text did not make it onto the page.
    pub fn is_clipped(&self) -> bool {
        self.lines_placed < self.lines_total
    }
}

/// Renders plain text onto fixed-size pages with the built-in Helvetica font.
pub struct PdfWriter {
    layout: DocumentLayout,
}

impl PdfWriter {
    pub fn new(layout: DocumentLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.layout.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Page size in points.
    fn page_dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.page_dimensions();
        (w.into_pt().0, h.into_pt().0)
    }

    /// Characters per line, estimated from the average glyph width.
    fn max_chars_per_line(&self, page_w_pt: f32) -> usize {
        let usable = page_w_pt - 2.0 * self.layout.margin_pt;
        let per_char = AVG_GLYPH_WIDTH * self.layout.font_size_pt;
        ((usable / per_char).floor() as usize).max(1)
    }

    /// Baselines that fit between the first line and the bottom margin.
    fn lines_per_page(&self, page_h_pt: f32) -> usize {
        let first = page_h_pt - self.layout.top_offset_lines * self.layout.font_size_pt;
        let step = self.layout.font_size_pt * self.layout.line_height_factor;
        if first < self.layout.margin_pt || step <= 0.0 {
            return 1;
        }
        ((first - self.layout.margin_pt) / step).floor() as usize + 1
    }

    /// Create a PDF from plain text.
    ///
    /// The first baseline sits `top_offset_lines` font sizes below the top
    /// edge and each following line advances by `font_size * line_height_factor`.
    /// With [`Pagination::SinglePage`] lines below the bottom margin are
    /// dropped; with [`Pagination::MultiPage`] they continue on new pages.
    /// Empty text yields one blank page.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> (Vec<u8>, LayoutReport) {
        let (page_w, page_h) = self.page_dimensions();
        let (page_w_pt, page_h_pt) = self.page_dimensions_pt();
        let font_size = self.layout.font_size_pt;
        let step = font_size * self.layout.line_height_factor;
        let first_baseline = page_h_pt - self.layout.top_offset_lines * font_size;

        info!(
            paper = ?self.layout.paper_size,
            pagination = ?self.layout.pagination,
            title = %self.layout.title,
            "creating text PDF"
        );

        let wrapped = wrap_text(text, self.max_chars_per_line(page_w_pt));
        let per_page = self.lines_per_page(page_h_pt);
        let placed = match self.layout.pagination {
            Pagination::SinglePage => wrapped.len().min(per_page),
            Pagination::MultiPage => wrapped.len(),
        };

        let mut pages: Vec<PdfPage> = wrapped[..placed]
            .chunks(per_page)
            .map(|chunk| {
                let ops = chunk
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| !line.is_empty())
                    .flat_map(|(idx, line)| {
                        let y = first_baseline - idx as f32 * step;
                        text_line_ops(line, self.layout.margin_pt, y, font_size)
                    })
                    .collect();
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();

        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        let report = LayoutReport {
            lines_total: wrapped.len(),
            lines_placed: placed,
            pages: pages.len(),
        };
        if report.is_clipped() {
            warn!(
                dropped = report.lines_total - report.lines_placed,
                "text exceeds a single page; overflow was clipped"
            );
        }

        let mut doc = PdfDocument::new(&self.layout.title);
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            lines = report.lines_total,
            placed = report.lines_placed,
            pages = report.pages,
            warnings = warnings.len(),
            bytes = output.len(),
            "text layout complete"
        );

        (output, report)
    }
}

/// Operations drawing one line of text with its baseline at `(x, y)`.
fn text_line_ops(line: &str, x: f32, y: f32, font_size: f32) -> [Op; 5] {
    [
        Op::StartTextSection,
        Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(y) },
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(font_size),
            font: BuiltinFont::Helvetica,
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.to_owned())],
            font: BuiltinFont::Helvetica,
        },
        Op::EndTextSection,
    ]
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap text so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph. Words
/// longer than `max_width` are force-broken on character boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.lines() {
        // Tabs count as word separators; the built-in fonts have no tab glyph.
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut pieces = chars.chunks(max_width).peekable();
                while let Some(piece) = pieces.next() {
                    if pieces.peek().is_some() {
                        result.push(piece.iter().collect());
                    } else {
                        current = piece.iter().collect();
                        current_len = piece.len();
                    }
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current, word.to_owned()));
                current_len = word_len;
            }
        }

        if !current.is_empty() {
            result.push(current);
        }
    }

    // Trailing blank lines only push real text off the page.
    while result.last().is_some_and(|line| line.is_empty()) {
        result.pop();
    }
    result
}
