//! Paragraph-level editing of `.docx` packages.
//!
//! Paragraphs are the outermost `<w:p>` elements of `word/document.xml` in
//! document order, which includes paragraphs inside table cells. Paragraphs
//! nested in a text box belong to the text box, not to the paragraph that
//! anchors it, and are left untouched. A paragraph's text is its `<w:t>`
//! runs, with `<w:tab/>` read as a tab and `<w:br/>`/`<w:cr/>` as a newline.

use crate::archive::Package;
use crate::xml::{decode_entities, escape_text};
use concierge_core::{AppError, AppResult};
use regex::Regex;
use std::ops::Range;
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
enum Piece {
    Markup(String),
    Paragraph(Paragraph),
}

#[derive(Debug, Clone)]
struct Paragraph {
    xml: String,

    /// Byte ranges of nested `<w:p>` elements (text box content)
    nested: Vec<Range<usize>>,
}

impl Paragraph {
    fn parse(xml: String) -> AppResult<Self> {
        let inner_start = xml.find('>').map_or(xml.len(), |i| i + 1);
        let inner_end = xml.rfind("</").unwrap_or(xml.len()).max(inner_start);
        let nested = paragraph_spans(&xml[inner_start..inner_end])?
            .into_iter()
            .map(|span| span.start + inner_start..span.end + inner_start)
            .collect();
        Ok(Self { xml, nested })
    }

    /// Byte ranges of the paragraph's own markup, outside nested paragraphs.
    fn own_segments(&self) -> Vec<Range<usize>> {
        let mut segments = Vec::with_capacity(self.nested.len() + 1);
        let mut from = 0;
        for span in &self.nested {
            segments.push(from..span.start);
            from = span.end;
        }
        segments.push(from..self.xml.len());
        segments
    }
}

/// Text-bearing element of a paragraph.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Tab,
    Break,
}

impl Token {
    fn as_str(&self) -> &str {
        match self {
            Token::Text(text) => text,
            Token::Tab => "\t",
            Token::Break => "\n",
        }
    }
}

enum Tag {
    Open,
    Close,
}

/// Classify a tag as opening or closing a `<w:p>` element.
///
/// Self-closing paragraphs carry no text and are not reported.
fn paragraph_tag(tag: &str) -> Option<Tag> {
    let (closing, body) = match tag.strip_prefix("</") {
        Some(body) => (true, body),
        None => (false, tag.strip_prefix('<')?),
    };
    let name_end = body
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(body.len());
    if &body[..name_end] != "w:p" {
        return None;
    }
    match (closing, tag.ends_with("/>")) {
        (true, _) => Some(Tag::Close),
        (false, false) => Some(Tag::Open),
        (false, true) => None,
    }
}

/// Byte ranges of the outermost `<w:p>` elements in `xml`.
fn paragraph_spans(xml: &str) -> AppResult<Vec<Range<usize>>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut pos = 0;

    while let Some(offset) = xml[pos..].find('<') {
        let tag_start = pos + offset;
        let rest = &xml[tag_start..];
        if rest.starts_with("<!--") {
            pos = rest.find("-->").map_or(xml.len(), |end| tag_start + end + 3);
            continue;
        }

        let tag_end = rest
            .find('>')
            .map(|end| tag_start + end + 1)
            .ok_or_else(|| AppError::Document("Unterminated tag in document body".to_string()))?;
        pos = tag_end;

        match paragraph_tag(&xml[tag_start..tag_end]) {
            Some(Tag::Open) => {
                if depth == 0 {
                    start = tag_start;
                }
                depth += 1;
            }
            Some(Tag::Close) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    AppError::Document("Unbalanced </w:p> in document body".to_string())
                })?;
                if depth == 0 {
                    spans.push(start..tag_end);
                }
            }
            None => {}
        }
    }

    if depth != 0 {
        return Err(AppError::Document(
            "Unclosed <w:p> in document body".to_string(),
        ));
    }
    Ok(spans)
}

/// `<w:t>` markup for `text`, with tabs and newlines as their own elements.
fn render_runs(text: &str) -> String {
    const OPEN: &str = "<w:t xml:space=\"preserve\">";

    let mut xml = String::from(OPEN);
    let mut rest = text;
    while let Some(at) = rest.find(['\t', '\n']) {
        xml.push_str(&escape_text(&rest[..at]));
        xml.push_str("</w:t>");
        xml.push_str(if rest[at..].starts_with('\t') {
            "<w:tab/>"
        } else {
            "<w:br/>"
        });
        xml.push_str(OPEN);
        rest = &rest[at + 1..];
    }
    xml.push_str(&escape_text(rest));
    xml.push_str("</w:t>");
    xml
}

/// An opened Word document.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    package: Package,
    pieces: Vec<Piece>,
    token: Regex,
}

impl DocxDocument {
    pub fn open(path: &Path) -> AppResult<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_package(package: Package) -> AppResult<Self> {
        let xml = package.read_text(DOCUMENT_PART)?.ok_or_else(|| {
            AppError::Document(format!("Package has no {}; not a .docx file", DOCUMENT_PART))
        })?;

        let token = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab\s*/>|<w:(?:br|cr)\s*/>")
            .map_err(|e| AppError::Document(format!("Invalid run pattern: {}", e)))?;

        let mut pieces = Vec::new();
        let mut last = 0;
        for span in paragraph_spans(&xml)? {
            if span.start > last {
                pieces.push(Piece::Markup(xml[last..span.start].to_string()));
            }
            pieces.push(Piece::Paragraph(Paragraph::parse(xml[span.clone()].to_string())?));
            last = span.end;
        }
        if last < xml.len() {
            pieces.push(Piece::Markup(xml[last..].to_string()));
        }

        Ok(Self {
            package,
            pieces,
            token,
        })
    }

    fn paragraph_list(&self) -> impl Iterator<Item = &Paragraph> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Paragraph(paragraph) => Some(paragraph),
            Piece::Markup(_) => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraph_list().count()
    }

    /// Text-bearing elements of a paragraph with their byte ranges.
    fn tokens(&self, paragraph: &Paragraph) -> Vec<(Range<usize>, Token)> {
        let mut tokens = Vec::new();
        for segment in paragraph.own_segments() {
            let offset = segment.start;
            for caps in self.token.captures_iter(&paragraph.xml[segment]) {
                let Some(whole) = caps.get(0) else { continue };
                let token = match caps.get(1) {
                    Some(text) => Token::Text(decode_entities(text.as_str())),
                    None if whole.as_str().starts_with("<w:tab") => Token::Tab,
                    None => Token::Break,
                };
                tokens.push((offset + whole.start()..offset + whole.end(), token));
            }
        }
        tokens
    }

    fn text_of(&self, paragraph: &Paragraph) -> String {
        self.tokens(paragraph)
            .iter()
            .map(|(_, token)| token.as_str())
            .collect()
    }

    /// Text of every paragraph, in document order.
    pub fn paragraphs(&self) -> Vec<String> {
        self.paragraph_list()
            .map(|paragraph| self.text_of(paragraph))
            .collect()
    }

    pub fn paragraph_text(&self, index: usize) -> Option<String> {
        self.paragraph_list()
            .nth(index)
            .map(|paragraph| self.text_of(paragraph))
    }

    /// Replace a paragraph's text, keeping its run structure where possible.
    ///
    /// Runs keep their formatting. When the new text lines up with the old
    /// (same run lengths, tabs and breaks in the same places) it is split
    /// across the runs at the old boundaries. Otherwise the first run
    /// receives all of it, the other runs are emptied and the old tabs and
    /// breaks are dropped. Nested text box paragraphs are not touched.
    pub fn set_paragraph_text(&mut self, index: usize, text: &str) -> AppResult<()> {
        let paragraph = self
            .paragraph_list()
            .nth(index)
            .ok_or_else(|| AppError::Document(format!("No paragraph at index {}", index)))?;

        let tokens = self.tokens(paragraph);
        let first_text = tokens
            .iter()
            .position(|(_, token)| matches!(token, Token::Text(_)))
            .ok_or_else(|| {
                AppError::Document(format!("Paragraph {} has no text runs", index))
            })?;

        let shape: Vec<Token> = tokens.iter().map(|(_, token)| token.clone()).collect();
        let replacements: Vec<String> = match distribute(&shape, text) {
            Some(parts) => tokens
                .iter()
                .zip(parts)
                .map(|((range, token), part)| match token {
                    Token::Text(_) => render_runs(&part),
                    Token::Tab | Token::Break => paragraph.xml[range.clone()].to_string(),
                })
                .collect(),
            None => tokens
                .iter()
                .enumerate()
                .map(|(i, (_, token))| match token {
                    Token::Text(_) if i == first_text => render_runs(text),
                    Token::Text(_) => render_runs(""),
                    Token::Tab | Token::Break => String::new(),
                })
                .collect(),
        };

        let mut updated = String::with_capacity(paragraph.xml.len() + text.len());
        let mut last = 0;
        for ((range, _), replacement) in tokens.iter().zip(&replacements) {
            updated.push_str(&paragraph.xml[last..range.start]);
            updated.push_str(replacement);
            last = range.end;
        }
        updated.push_str(&paragraph.xml[last..]);

        let updated = Paragraph::parse(updated)?;
        if let Some(slot) = self
            .pieces
            .iter_mut()
            .filter_map(|piece| match piece {
                Piece::Paragraph(paragraph) => Some(paragraph),
                Piece::Markup(_) => None,
            })
            .nth(index)
        {
            *slot = updated;
        }
        Ok(())
    }

    /// Serialized `word/document.xml`.
    pub fn document_xml(&self) -> String {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::Markup(xml) => xml.as_str(),
                Piece::Paragraph(paragraph) => paragraph.xml.as_str(),
            })
            .collect()
    }

    /// Write the document to a new package at `path`.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let mut package = self.package.clone();
        package.put(DOCUMENT_PART, self.document_xml().into_bytes());
        package.save(path)
    }
}

/// Split `text` across a paragraph's elements at the old boundaries.
///
/// `None` when the text does not line up: a different total length, or a
/// tab or break of the old text is not in the same place.
fn distribute(shape: &[Token], text: &str) -> Option<Vec<String>> {
    let mut chars = text.chars();
    let mut parts = Vec::with_capacity(shape.len());
    for token in shape {
        let part: String = match token {
            Token::Text(old) => {
                let wanted = old.chars().count();
                let part: String = chars.by_ref().take(wanted).collect();
                if part.chars().count() != wanted || part.contains(['\t', '\n']) {
                    return None;
                }
                part
            }
            Token::Tab | Token::Break => {
                let expected = token.as_str();
                let next = chars.next()?;
                if !expected.starts_with(next) {
                    return None;
                }
                expected.to_string()
            }
        };
        parts.push(part);
    }
    if chars.next().is_some() {
        return None;
    }
    Some(parts)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::archive::Entry;
    use tempfile::TempDir;

    pub(crate) fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        )
    }

    pub(crate) fn package(body: &str) -> Package {
        Package::from_entries(vec![
            Entry {
                name: "[Content_Types].xml".to_string(),
                is_dir: false,
                data: b"<Types/>".to_vec(),
            },
            Entry {
                name: DOCUMENT_PART.to_string(),
                is_dir: false,
                data: document(body).into_bytes(),
            },
        ])
    }

    const BODY: &str = concat!(
        r#"<w:p w:rsidR="001"><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>見積</w:t></w:r><w:r><w:t xml:space="preserve">書です</w:t></w:r></w:p>"#,
        r#"<w:p/>"#,
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>セル</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:p><w:r><w:t>A &amp; B</w:t></w:r><w:r><w:tab/></w:r></w:p>"#,
        r#"<w:p><w:pPr/></w:p>"#
    );

    #[test]
    fn test_paragraphs_in_document_order() {
        let doc = DocxDocument::from_package(package(BODY)).unwrap();
        assert_eq!(doc.paragraph_count(), 4);
        assert_eq!(
            doc.paragraphs(),
            vec!["見積書です", "セル", "A & B\t", ""]
        );
        assert_eq!(doc.paragraph_text(1).as_deref(), Some("セル"));
        assert!(doc.paragraph_text(9).is_none());
    }

    #[test]
    fn test_same_length_keeps_run_boundaries() {
        let mut doc = DocxDocument::from_package(package(BODY)).unwrap();
        doc.set_paragraph_text(0, "Quote").unwrap();

        let xml = doc.document_xml();
        assert!(xml.contains(r#"<w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Qu</w:t>"#));
        assert!(xml.contains(r#"<w:t xml:space="preserve">ote</w:t>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert_eq!(doc.paragraph_text(0).as_deref(), Some("Quote"));
    }

    #[test]
    fn test_length_change_moves_text_to_first_run() {
        let mut doc = DocxDocument::from_package(package(BODY)).unwrap();
        doc.set_paragraph_text(0, "This is a quotation").unwrap();

        let xml = doc.document_xml();
        assert!(xml.contains(r#"<w:t xml:space="preserve">This is a quotation</w:t>"#));
        assert!(xml.contains(r#"<w:t xml:space="preserve"></w:t>"#));
        assert_eq!(doc.paragraph_text(0).as_deref(), Some("This is a quotation"));
    }

    #[test]
    fn test_replacement_is_escaped() {
        let mut doc = DocxDocument::from_package(package(BODY)).unwrap();
        doc.set_paragraph_text(2, "R&D <beta>").unwrap();
        assert!(doc.document_xml().contains("R&amp;D &lt;beta&gt;"));
        assert_eq!(doc.paragraph_text(2).as_deref(), Some("R&D <beta>"));
    }

    #[test]
    fn test_paragraph_without_runs_is_rejected() {
        let mut doc = DocxDocument::from_package(package(BODY)).unwrap();
        assert!(doc.set_paragraph_text(3, "x").is_err());
        assert!(doc.set_paragraph_text(10, "x").is_err());
    }

    #[test]
    fn test_missing_document_part() {
        let package = Package::from_entries(Vec::new());
        assert!(matches!(
            DocxDocument::from_package(package),
            Err(AppError::Document(_))
        ));
    }

    #[test]
    fn test_save_preserves_other_parts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.docx");

        let mut doc = DocxDocument::from_package(package(BODY)).unwrap();
        doc.set_paragraph_text(1, "Cell").unwrap();
        doc.save(&path).unwrap();

        let reopened = DocxDocument::open(&path).unwrap();
        assert_eq!(reopened.paragraph_text(1).as_deref(), Some("Cell"));
        assert_eq!(reopened.paragraph_text(0).as_deref(), Some("見積書です"));
        let original = DocxDocument::from_package(package(BODY)).unwrap();
        assert_eq!(original.paragraph_count(), reopened.paragraph_count());
    }

    #[test]
    fn test_distribute() {
        let shape = vec![
            Token::Text("ab".to_string()),
            Token::Tab,
            Token::Text("c".to_string()),
        ];
        assert_eq!(
            distribute(&shape, "xy\tz"),
            Some(vec!["xy".to_string(), "\t".to_string(), "z".to_string()])
        );
        assert_eq!(distribute(&shape, "xyz\t"), None);
        assert_eq!(distribute(&shape, "long text"), None);
        assert_eq!(distribute(&[], ""), Some(Vec::new()));
    }

    const TEXT_BOX: &str = concat!(
        r#"<w:p><w:r><w:t>前の文</w:t></w:r>"#,
        r#"<w:r><w:pict><v:shape><v:textbox><w:txbxContent>"#,
        r#"<w:p><w:pPr/><w:r><w:t>箱</w:t></w:r></w:p>"#,
        r#"</w:txbxContent></v:textbox></v:shape></w:pict></w:r>"#,
        r#"<w:r><w:t>後の文</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>次</w:t></w:r></w:p>"#
    );

    #[test]
    fn test_text_box_paragraphs_stay_with_their_box() {
        let doc = DocxDocument::from_package(package(TEXT_BOX)).unwrap();
        assert_eq!(doc.paragraph_count(), 2);
        assert_eq!(doc.paragraphs(), vec!["前の文後の文", "次"]);
    }

    #[test]
    fn test_replacement_leaves_text_box_intact() {
        let mut doc = DocxDocument::from_package(package(TEXT_BOX)).unwrap();
        doc.set_paragraph_text(0, "Translated outer sentence").unwrap();

        let xml = doc.document_xml();
        assert!(xml.contains(r#"<w:t xml:space="preserve">Translated outer sentence</w:t>"#));
        assert!(xml.contains(
            r#"<w:txbxContent><w:p><w:pPr/><w:r><w:t>箱</w:t></w:r></w:p></w:txbxContent>"#
        ));
        assert!(!xml.contains("後の文"));
        assert_eq!(doc.paragraphs(), vec!["Translated outer sentence", "次"]);
    }

    #[test]
    fn test_unbalanced_paragraphs_are_rejected() {
        let result = DocxDocument::from_package(package(r#"<w:p><w:r><w:t>x</w:t></w:r>"#));
        assert!(matches!(result, Err(AppError::Document(_))));
    }

    #[test]
    fn test_tabs_and_breaks_are_text() {
        let body = concat!(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>"#,
            r#"<w:r><w:t>A</w:t><w:tab/><w:t>B</w:t></w:r>"#,
            r#"<w:r><w:br/><w:t>C</w:t></w:r></w:p>"#
        );
        let mut doc = DocxDocument::from_package(package(body)).unwrap();
        assert_eq!(doc.paragraph_text(0).as_deref(), Some("A\tB\nC"));

        // Same layout keeps the tab and break elements
        doc.set_paragraph_text(0, "X\tY\nZ").unwrap();
        let xml = doc.document_xml();
        assert!(xml.contains(r#"<w:tab/><w:t xml:space="preserve">Y</w:t>"#));
        assert!(xml.contains(r#"<w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs>"#));
        assert_eq!(doc.paragraph_text(0).as_deref(), Some("X\tY\nZ"));

        // A new layout is written out in the first run
        doc.set_paragraph_text(0, "Total:\t100").unwrap();
        let xml = doc.document_xml();
        assert!(xml.contains(
            r#"<w:t xml:space="preserve">Total:</w:t><w:tab/><w:t xml:space="preserve">100</w:t>"#
        ));
        assert!(!xml.contains("<w:br/>"));
        assert_eq!(doc.paragraph_text(0).as_deref(), Some("Total:\t100"));
    }
}
