use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use super::outline::{deck_outline, Block, DeckSlide};
use super::ExportError;
use crate::reports::AuditDeck;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_RIGHT: f32 = 190.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 20.0;
const VALUE_COLUMN: f32 = 120.0;
const BODY_SIZE: f32 = 11.0;
const BODY_GAP: f32 = 5.6;
const WRAP_CHARS: usize = 92;

fn pdf_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(err.to_string())
}

/// Helvetica is WinAnsi-encoded; anything past Latin-1 is replaced.
fn pdf_text(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '-',
            c if (c as u32) < 0x100 && !c.is_control() => c,
            _ => '?',
        })
        .collect()
}

fn wrap_text_lines(input: &str, max_chars: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in input.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
        self.pages += 1;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(pdf_text(text), size, Mm(x), Mm(self.y), font);
    }

    fn rule(&self) {
        self.layer.set_outline_thickness(0.6);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.y)), false),
                (Point::new(Mm(MARGIN_RIGHT), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }

    fn accent(&self, on: bool) {
        let color = if on {
            Rgb::new(0.12, 0.31, 0.47, None)
        } else {
            Rgb::new(0.0, 0.0, 0.0, None)
        };
        self.layer.set_fill_color(Color::Rgb(color));
    }

    fn wrapped(&mut self, text: &str, x: f32, max_chars: usize) {
        for line in wrap_text_lines(text, max_chars) {
            self.ensure_space(BODY_GAP);
            self.text(&line, BODY_SIZE, x, false);
            self.y -= BODY_GAP;
        }
    }

    fn title_page(&mut self, slide: &DeckSlide) {
        self.y = 190.0;
        self.accent(true);
        for line in wrap_text_lines(&slide.title, 38) {
            self.text(&line, 26.0, MARGIN_LEFT, true);
            self.y -= 11.0;
        }
        self.accent(false);
        self.rule();
        self.y -= 10.0;
        if let Some(subtitle) = &slide.subtitle {
            self.text(subtitle, 14.0, MARGIN_LEFT, false);
            self.y -= 12.0;
        }
        self.blocks(slide);
    }

    fn section(&mut self, slide: &DeckSlide) {
        self.ensure_space(30.0);
        self.accent(true);
        self.text(&slide.title, 17.0, MARGIN_LEFT, true);
        self.accent(false);
        self.y -= 3.0;
        self.rule();
        self.y -= 7.0;
        if let Some(subtitle) = &slide.subtitle {
            self.text(subtitle, 9.5, MARGIN_LEFT, false);
            self.y -= 7.0;
        }
        self.blocks(slide);
        self.y -= 6.0;
    }

    fn blocks(&mut self, slide: &DeckSlide) {
        for block in &slide.blocks {
            match block {
                Block::Paragraph(text) => {
                    self.wrapped(text, MARGIN_LEFT, WRAP_CHARS);
                    self.y -= 2.5;
                }
                Block::Bullets(items) => {
                    for item in items {
                        let lines = wrap_text_lines(item, WRAP_CHARS - 4);
                        for (idx, line) in lines.iter().enumerate() {
                            self.ensure_space(BODY_GAP);
                            if idx == 0 {
                                self.text("-", BODY_SIZE, MARGIN_LEFT, false);
                            }
                            self.text(line, BODY_SIZE, MARGIN_LEFT + 5.0, false);
                            self.y -= BODY_GAP;
                        }
                        self.y -= 1.2;
                    }
                    self.y -= 2.0;
                }
                Block::Table(rows) => {
                    for (label, value) in rows {
                        self.ensure_space(BODY_GAP + 1.5);
                        self.text(label, BODY_SIZE, MARGIN_LEFT, false);
                        self.text(value, BODY_SIZE, VALUE_COLUMN, true);
                        self.y -= BODY_GAP + 1.5;
                    }
                    self.y -= 2.0;
                }
            }
        }
    }
}

fn document_id(deck: &AuditDeck) -> String {
    let seed = format!("{}:{}", deck.company_id, deck.generated_at.timestamp());
    let hex: String = seed.bytes().map(|b| format!("{b:02x}")).collect();
    format!("{hex:0<32}").chars().take(32).collect()
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

/// Byte ranges of the strings inside the trailer's `/ID [..]` array.
fn trailer_id_spans(bytes: &[u8]) -> Vec<(usize, usize)> {
    let Some(start) = bytes.windows(3).rposition(|w| w == b"/ID") else {
        return Vec::new();
    };
    let mut spans = Vec::new();
    let mut i = start + 3;
    while i < bytes.len() && spans.len() < 2 {
        let close = match bytes[i] {
            b'(' => b')',
            b'<' => b'>',
            b']' => break,
            _ => {
                i += 1;
                continue;
            }
        };
        let open = i + 1;
        let Some(len) = bytes[open..].iter().position(|b| *b == close) else {
            break;
        };
        spans.push((open, open + len));
        i = open + len + 1;
    }
    spans
}

/// printpdf fills the trailer `/ID` pair with random strings. Every copy of
/// them is overwritten with `id` at the same length, so xref offsets hold.
fn pin_trailer_ids(bytes: &mut [u8], id: &str) -> usize {
    let originals: Vec<Vec<u8>> = trailer_id_spans(bytes)
        .into_iter()
        .map(|(start, end)| bytes[start..end].to_vec())
        .filter(|original| !original.is_empty())
        .collect();

    let mut pinned = 0;
    for original in originals {
        let replacement: Vec<u8> = id.bytes().cycle().take(original.len()).collect();
        let mut pos = 0;
        while let Some(found) = find_from(bytes, &original, pos) {
            bytes[found..found + original.len()].copy_from_slice(&replacement);
            pos = found + original.len();
            pinned += 1;
        }
    }
    pinned
}

/// Renders the deck as an A4 report: a cover page followed by one section per slide.
pub fn render_pdf(deck: &AuditDeck) -> Result<Vec<u8>, ExportError> {
    let stamp = time::OffsetDateTime::from_unix_timestamp(deck.generated_at.timestamp())
        .map_err(pdf_error)?;

    let id = document_id(deck);

    let (doc, page1, layer1) =
        PdfDocument::new(&deck.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let doc = doc
        .with_document_id(id.clone())
        .with_creation_date(stamp)
        .with_mod_date(stamp)
        .with_metadata_date(stamp);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let slides = deck_outline(deck);
    {
        let mut writer = PageWriter {
            doc: &doc,
            layer: doc.get_page(page1).get_layer(layer1),
            regular,
            bold,
            y: TOP,
            pages: 1,
        };
        let mut iter = slides.iter();
        if let Some(cover) = iter.next() {
            writer.title_page(cover);
        }
        writer.new_page();
        for slide in iter {
            writer.section(slide);
        }
        log::debug!("Rendered audit deck PDF with {} pages", writer.pages);
    }

    let mut out = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut out).map_err(pdf_error)?;
    let mut bytes = out.into_inner().map_err(pdf_error)?;
    if pin_trailer_ids(&mut bytes, &id) == 0 {
        log::warn!("PDF for {} has no trailer /ID to pin", deck.company_id);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::sample_deck;

    #[test]
    fn test_wrap_text_lines() {
        let lines = wrap_text_lines("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        assert!(wrap_text_lines("   ", 10).is_empty());
    }

    #[test]
    fn test_pdf_text_replaces_unsupported_chars() {
        assert_eq!(pdf_text("Q1 \u{2014} \u{201C}ok\u{201D}"), "Q1 - \"ok\"");
        assert_eq!(pdf_text("caf\u{e9} \u{4e2d}"), "caf\u{e9} ?");
    }

    #[test]
    fn test_document_id_is_stable() {
        let deck = sample_deck();
        assert_eq!(document_id(&deck), document_id(&deck.clone()));
        assert_eq!(document_id(&deck).len(), 32);
    }

    #[test]
    fn test_render_pdf() {
        let deck = sample_deck();
        let bytes = render_pdf(&deck).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_pin_trailer_ids_rewrites_every_copy() {
        let mut bytes = b"<x:InstanceID>QWERTYUI</x:InstanceID>\ntrailer\n<</Root 1 0 R/ID[(ASDFGHJK)(QWERTYUI)]>>\n%%EOF".to_vec();
        let len = bytes.len();

        let pinned = pin_trailer_ids(&mut bytes, "0123abcd");

        assert_eq!(pinned, 3);
        assert_eq!(bytes.len(), len);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("/ID[(0123abcd)(0123abcd)]"));
        assert!(text.contains("<x:InstanceID>0123abcd</x:InstanceID>"));
    }

    #[test]
    fn test_pin_trailer_ids_without_trailer_id() {
        let mut bytes = b"trailer\n<</Root 1 0 R>>".to_vec();
        assert_eq!(pin_trailer_ids(&mut bytes, "0123abcd"), 0);
        assert_eq!(bytes, b"trailer\n<</Root 1 0 R>>".to_vec());
    }

    #[test]
    fn test_identical_decks_render_identical_bytes() {
        let deck = sample_deck();
        let first = render_pdf(&deck).unwrap();
        let second = render_pdf(&deck.clone()).unwrap();

        assert_eq!(first, second);
        assert!(find_from(&first, document_id(&deck).as_bytes(), 0).is_some());
    }

    #[test]
    fn test_long_content_overflows_to_more_pages() {
        let mut deck = sample_deck();
        deck.expected_outcomes = (0..200)
            .map(|i| format!("Outcome {i}: tighter month-end close and cleaner books"))
            .collect();
        let short = render_pdf(&sample_deck()).unwrap();
        let long = render_pdf(&deck).unwrap();
        assert!(long.len() > short.len());
    }
}
