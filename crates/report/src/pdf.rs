//! Document export on A4 pages.
//!
//! Layout and drawing are split: [`layout`] places every text run and filled
//! rectangle in millimetres from the top-left corner, [`render`] draws them
//! with `printpdf` using the built-in Helvetica faces.

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, Rect, Rgb};

use crate::{
    ReportError, Result,
    model::{COLUMNS, Report, TITLE},
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const ROW_HEIGHT: f32 = 8.0;
const CELL_PADDING: f32 = 2.0;
/// Baseline offset of a cell's text from the top of its row.
const BASELINE: f32 = 5.5;
const TABLE_GAP: f32 = 20.0;
const BODY_SIZE: f32 = 9.0;
/// Distance between the baselines of a wrapped cell.
const LINE_HEIGHT: f32 = 4.0;
const PT_TO_MM: f32 = 0.3528;

const SUMMARY_WIDTHS: [f32; 2] = [85.0, 85.0];
const TRANSACTION_WIDTHS: [f32; 5] = [25.0, 40.0, 25.0, 30.0, 35.0];

const BLACK: Shade = Shade(0, 0, 0);
const WHITE: Shade = Shade(255, 255, 255);
const HEADER_FILL: Shade = Shade(59, 130, 246);
const STRIPE_FILL: Shade = Shade(245, 245, 245);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Shade(u8, u8, u8);

impl Shade {
    fn color(self) -> Color {
        let channel = |value: u8| f32::from(value) / 255.0;
        Color::Rgb(Rgb::new(channel(self.0), channel(self.1), channel(self.2), None))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Mark {
    Text {
        x: f32,
        /// Baseline, from the top edge.
        y: f32,
        size: f32,
        bold: bool,
        shade: Shade,
        text: String,
    },
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        shade: Shade,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Page {
    marks: Vec<Mark>,
}

impl Page {
    fn texts(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().filter_map(|mark| match mark {
            Mark::Text { text, .. } => Some(text.as_str()),
            Mark::Fill { .. } => None,
        })
    }
}

struct Layout {
    pages: Vec<Page>,
    /// Top of the next row, from the top edge of the current page.
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= PAGE_HEIGHT - MARGIN
    }

    fn text(&mut self, x: f32, y: f32, size: f32, bold: bool, shade: Shade, text: &str) {
        self.page().marks.push(Mark::Text {
            x,
            y,
            size,
            bold,
            shade,
            text: pdf_text(text),
        });
    }

    fn row(&mut self, row: &Row, widths: &[f32], bold: bool, fill: Option<Shade>, shade: Shade) {
        let y = self.y;
        if let Some(fill) = fill {
            self.page().marks.push(Mark::Fill {
                x: MARGIN,
                y,
                width: widths.iter().sum(),
                height: row.height,
                shade: fill,
            });
        }
        let mut x = MARGIN;
        for (lines, width) in row.cells.iter().zip(widths) {
            for (index, line) in lines.iter().enumerate() {
                self.page().marks.push(Mark::Text {
                    x: x + CELL_PADDING,
                    y: y + BASELINE + LINE_HEIGHT * index as f32,
                    size: BODY_SIZE,
                    bold,
                    shade,
                    text: line.clone(),
                });
            }
            x += width;
        }
        self.y += row.height;
    }

    /// A striped table with a filled header, repeated at the top of every
    /// page the body flows onto.
    fn table(&mut self, head: &[&str], widths: &[f32], rows: &[Vec<&str>]) {
        let head = Row::wrap(head, widths, true);
        let body: Vec<Row> = rows
            .iter()
            .map(|cells| Row::wrap(cells, widths, false))
            .collect();

        // Never leave a header alone at the bottom of a page.
        let first = body.first().map_or(0.0, |row| row.height);
        if !self.fits(head.height + first) {
            self.new_page();
        }
        self.row(&head, widths, true, Some(HEADER_FILL), WHITE);
        for (index, row) in body.iter().enumerate() {
            if !self.fits(row.height) {
                self.new_page();
                self.row(&head, widths, true, Some(HEADER_FILL), WHITE);
            }
            let fill = (index % 2 == 1).then_some(STRIPE_FILL);
            self.row(row, widths, false, fill, BLACK);
        }
    }
}

/// One table row with every cell broken into lines that fit its column.
struct Row {
    cells: Vec<Vec<String>>,
    height: f32,
}

impl Row {
    fn wrap(cells: &[&str], widths: &[f32], bold: bool) -> Self {
        let cells: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| wrap(&pdf_text(cell), width - CELL_PADDING * 2.0, bold))
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        Self {
            cells,
            height: ROW_HEIGHT + LINE_HEIGHT * (lines - 1) as f32,
        }
    }
}

/// Keeps the characters of the base fonts' WinAnsi encoding and replaces
/// the rest.
fn pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '₹' => out.push_str("Rs."),
            '\u{a0}' => out.push(' '),
            '\u{ad}' => out.push('-'),
            ' '..='~' | '\u{a1}'..='\u{ff}' => out.push(ch),
            '€' | '‚' | 'ƒ' | '„' | '…' | '†' | '‡' | 'ˆ' | '‰' | 'Š' | '‹' | 'Œ' | 'Ž' | '‘'
            | '’' | '“' | '”' | '•' | '–' | '—' | '˜' | '™' | 'š' | '›' | 'œ' | 'ž' | 'Ÿ' => {
                out.push(ch)
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Helvetica advance width in thousandths of an em.
fn advance(ch: char) -> u16 {
    match ch {
        'i' | 'j' | 'l' => 222,
        '\'' => 191,
        '|' => 260,
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | '[' | '\\' | ']' | 'I' | 'f' | 't' => 278,
        '(' | ')' | '-' | '`' | 'r' => 333,
        '{' | '}' => 334,
        '"' => 355,
        '*' => 389,
        '^' => 469,
        'J' | 'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
        '+' | '<' | '=' | '>' | '~' => 584,
        'F' | 'T' | 'Z' => 611,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' | '&' => 667,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'w' => 722,
        'G' | 'O' | 'Q' => 778,
        'M' | 'm' => 833,
        '%' => 889,
        'W' => 944,
        '@' => 1015,
        _ => 556,
    }
}

/// Width of `text` at the body size, in millimetres. Bold is measured with a
/// margin since its glyphs run wider.
fn text_width(text: &str, bold: bool) -> f32 {
    let ems: u32 = text.chars().map(|ch| u32::from(advance(ch))).sum();
    let width = ems as f32 / 1000.0 * BODY_SIZE * PT_TO_MM;
    if bold { width * 1.1 } else { width }
}

/// Breaks `text` into lines no wider than `room` millimetres. Lines break
/// after spaces and commas; a piece wider than a whole line is split between
/// characters. No character is dropped.
fn wrap(text: &str, room: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for piece in text.split_inclusive([' ', ',']) {
        let candidate = format!("{line}{piece}");
        if text_width(candidate.trim_end(), bold) <= room {
            line = candidate;
            continue;
        }
        if !line.trim().is_empty() {
            lines.push(line.trim_end().to_string());
        }
        line.clear();
        for ch in piece.trim_start().chars() {
            line.push(ch);
            if line.chars().count() > 1 && text_width(line.trim_end(), bold) > room {
                line.pop();
                lines.push(std::mem::take(&mut line));
                line.push(ch);
            }
        }
    }
    let last = line.trim_end();
    if !last.is_empty() || lines.is_empty() {
        lines.push(last.to_string());
    }
    lines
}

fn layout(report: &Report) -> Vec<Page> {
    let mut layout = Layout::new();
    layout.text(MARGIN, 30.0, 20.0, true, BLACK, TITLE);
    layout.text(
        MARGIN,
        50.0,
        12.0,
        false,
        BLACK,
        &format!("Batch Name: {}", report.batch_name),
    );
    layout.text(
        MARGIN,
        60.0,
        12.0,
        false,
        BLACK,
        &format!("Period: {}", report.period()),
    );

    layout.y = 80.0;
    let balances: Vec<Vec<&str>> = report
        .balances()
        .iter()
        .map(|(label, value)| vec![*label, *value])
        .collect();
    layout.table(&["Summary", "Amount"], &SUMMARY_WIDTHS, &balances);

    if !report.rows.is_empty() {
        layout.y += TABLE_GAP;
        let rows: Vec<Vec<&str>> = report
            .rows
            .iter()
            .map(|tx| {
                let mut cells = tx.cells().to_vec();
                if tx.remarks.is_empty() {
                    cells[4] = "-";
                }
                cells
            })
            .collect();
        layout.table(&COLUMNS, &TRANSACTION_WIDTHS, &rows);
    }
    layout.pages
}

fn pdf_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(err.to_string())
}

pub fn render(report: &Report) -> Result<Vec<u8>> {
    let pages = layout(report);
    let (doc, first_page, first_layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for _ in 1..pages.len() {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        layers.push(doc.get_page(page).get_layer(layer));
    }

    for (page, layer) in pages.iter().zip(&layers) {
        for mark in &page.marks {
            match mark {
                Mark::Fill {
                    x,
                    y,
                    width,
                    height,
                    shade,
                } => {
                    layer.set_fill_color(shade.color());
                    layer.add_rect(Rect::new(
                        Mm(*x),
                        Mm(PAGE_HEIGHT - y - height),
                        Mm(x + width),
                        Mm(PAGE_HEIGHT - y),
                    ));
                }
                Mark::Text {
                    x,
                    y,
                    size,
                    bold: is_bold,
                    shade,
                    text,
                } => {
                    let font: &IndirectFontRef = if *is_bold { &bold } else { &regular };
                    layer.set_fill_color(shade.color());
                    layer.use_text(text.as_str(), *size, Mm(*x), Mm(PAGE_HEIGHT - y), font);
                }
            }
        }
    }

    drop(layers);
    tracing::debug!(pages = pages.len(), "pdf laid out");
    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_report;

    fn all_texts(pages: &[Page]) -> Vec<&str> {
        pages.iter().flat_map(Page::texts).collect()
    }

    #[test]
    fn rupee_sign_is_spelled_out() {
        assert_eq!(pdf_text("₹1,250.00"), "Rs.1,250.00");
        assert_eq!(pdf_text("Café"), "Café");
        assert_eq!(pdf_text("日本"), "??");
    }

    #[test]
    fn only_win_ansi_text_reaches_the_fonts() {
        assert_eq!(pdf_text("Crème brûlée – 5€"), "Crème brûlée – 5€");
        assert_eq!(pdf_text("a\u{a0}b\u{85}"), "a b?");
    }

    #[test]
    fn wrapped_cells_keep_every_character() {
        let room = TRANSACTION_WIDTHS[2] - CELL_PADDING * 2.0;
        let amount = wrap(&pdf_text("₹1,234,567.89"), room, false);
        assert_eq!(amount.concat(), "Rs.1,234,567.89");
        assert!(amount.iter().all(|line| text_width(line, false) <= room));

        let room = TRANSACTION_WIDTHS[1] - CELL_PADDING * 2.0;
        let text = "Dinner with the whole team at the airport";
        let lines = wrap(text, room, false);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);

        assert_eq!(wrap("Taxi", room, false), vec!["Taxi"]);
        assert_eq!(wrap("", room, false), vec![""]);
        let unbroken = "x".repeat(60);
        assert_eq!(wrap(&unbroken, room, false).concat(), unbroken);
    }

    #[test]
    fn large_amounts_are_printed_in_full() {
        let mut report = sample_report(1);
        report.rows[0].amount = "₹1,234,567.89".to_string();
        report.rows[0].particulars = "Dinner with the whole team at the airport".to_string();
        let pages = layout(&report);

        let texts = all_texts(&pages);
        assert!(texts.iter().all(|text| !text.ends_with("...")));
        let amount_index = texts.iter().position(|text| text.starts_with("Rs.1,234,")).unwrap();
        let rest: String = texts[amount_index..].concat();
        assert!(rest.starts_with("Rs.1,234,567.89"));
    }

    #[test]
    fn empty_batch_has_no_transaction_table() {
        let pages = layout(&sample_report(0));
        assert_eq!(pages.len(), 1);

        let texts = all_texts(&pages);
        assert!(texts.contains(&TITLE));
        assert!(texts.contains(&"Summary"));
        assert!(!texts.contains(&"Particulars"));
    }

    #[test]
    fn missing_remarks_render_as_dash() {
        let pages = layout(&sample_report(2));
        let texts = all_texts(&pages);

        assert!(texts.contains(&"-"));
        assert!(texts.contains(&"note 2"));
        assert!(texts.contains(&"Rs.100.00"));
    }

    #[test]
    fn long_ledgers_repeat_the_header() {
        let pages = layout(&sample_report(80));
        assert!(pages.len() > 2);

        for page in &pages[1..] {
            let texts: Vec<&str> = page.texts().collect();
            assert_eq!(texts[0], "Date");
            assert!(texts.contains(&"Particulars"));
        }
        let rows: usize = pages
            .iter()
            .flat_map(Page::texts)
            .filter(|text| text.starts_with("Taxi "))
            .count();
        assert_eq!(rows, 80);
    }

    #[test]
    fn rows_stay_above_the_bottom_margin() {
        let mut report = sample_report(120);
        for row in report.rows.iter_mut().step_by(3) {
            row.particulars = format!("{} with a long description of the trip", row.particulars);
        }
        for page in layout(&report) {
            for mark in page.marks {
                match mark {
                    Mark::Fill { y, height, .. } => assert!(y + height <= PAGE_HEIGHT - MARGIN),
                    Mark::Text { y, .. } => assert!(y <= PAGE_HEIGHT - MARGIN),
                }
            }
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render(&sample_report(40)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
