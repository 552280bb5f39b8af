//! Production document backend: .docx report files.
//!
//! A .docx is a zip container of XML parts. The backend reads
//! `word/styles.xml` to resolve style ids to the style names the
//! engine dispatches on, then walks `word/document.xml` to build the
//! interleaved paragraph/table body. Horizontal merges (`gridSpan`)
//! are expanded by repeating the cell, matching what the table
//! heuristics expect; nested tables inside cells are skipped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use super::{
    BodyElement, DocumentError, DocumentSource, Paragraph, ReportDocument, Table, TableCell,
};

const DEFAULT_STYLE: &str = "Normal";

/// Loads reports from .docx files on disk.
pub struct DocxSource;

impl DocumentSource for DocxSource {
    fn load(&self, path: &Path) -> Result<ReportDocument, DocumentError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        // styles.xml is optional; without it, style ids pass through.
        let styles = match read_part(&mut archive, "word/styles.xml") {
            Ok(xml) => parse_style_names(&xml)?,
            Err(_) => HashMap::new(),
        };

        let body_xml = read_part(&mut archive, "word/document.xml")
            .map_err(|_| DocumentError::MissingPart("word/document.xml".to_string()))?;
        let body = parse_body(&body_xml, &styles)?;

        let part_names: Vec<String> = archive.file_names().map(str::to_owned).collect();
        let mut header_text = Vec::new();
        let mut footer_text = Vec::new();
        for name in part_names {
            if name.starts_with("word/header") && name.ends_with(".xml") {
                header_text.push(part_plain_text(&read_part(&mut archive, &name)?)?);
            } else if name.starts_with("word/footer") && name.ends_with(".xml") {
                footer_text.push(part_plain_text(&read_part(&mut archive, &name)?)?);
            }
        }

        debug!(
            path = %path.display(),
            body_elements = body.len(),
            headers = header_text.len(),
            footers = footer_text.len(),
            "loaded docx report"
        );

        Ok(ReportDocument {
            body,
            header_text,
            footer_text,
        })
    }
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, DocumentError> {
    let mut part = archive.by_name(name)?;
    let mut bytes = Vec::new();
    part.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| String::from_utf8(a.value.into_owned()).ok())
}

/// Map style id -> style name from `word/styles.xml`.
fn parse_style_names(xml: &[u8]) -> Result<HashMap<String, String>, DocumentError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut styles = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().local_name().as_ref() {
                b"style" => current_id = attr_value(&e, b"styleId"),
                b"name" => {
                    if let (Some(id), Some(name)) = (current_id.clone(), attr_value(&e, b"val")) {
                        styles.insert(id, name);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().local_name().as_ref() == b"style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(styles)
}

/// Walk `word/document.xml` into the interleaved body model.
fn parse_body(
    xml: &[u8],
    styles: &HashMap<String, String>,
) -> Result<Vec<BodyElement>, DocumentError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut body: Vec<BodyElement> = Vec::new();
    let mut rows: Vec<Vec<TableCell>> = Vec::new();
    let mut row: Vec<TableCell> = Vec::new();
    let mut cell: Vec<Paragraph> = Vec::new();
    let mut cell_span: usize = 1;
    let mut in_table = false;
    let mut in_cell = false;
    // Depth below the outermost table; content of nested tables is dropped.
    let mut nested_depth: usize = 0;
    let mut in_para = false;
    let mut in_text = false;
    let mut para_style: Option<String> = None;
    let mut para_text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().local_name().as_ref() {
                b"tbl" => {
                    if in_table {
                        nested_depth += 1;
                    } else {
                        in_table = true;
                        rows.clear();
                    }
                }
                b"tr" if in_table && nested_depth == 0 => row = Vec::new(),
                b"tc" if in_table && nested_depth == 0 => {
                    in_cell = true;
                    cell = Vec::new();
                    cell_span = 1;
                }
                b"p" if nested_depth == 0 => {
                    in_para = true;
                    in_text = false;
                    para_style = None;
                    para_text.clear();
                }
                b"pStyle" if in_para => para_style = attr_value(&e, b"val"),
                b"gridSpan" if in_cell => {
                    if let Some(span) = attr_value(&e, b"val").and_then(|v| v.parse().ok()) {
                        cell_span = std::cmp::max(span, 1);
                    }
                }
                b"t" if in_para => in_text = true,
                b"tab" if in_para => para_text.push('\t'),
                b"br" | b"cr" if in_para => para_text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_para && in_text => {
                para_text.push_str(&t.unescape()?);
            }
            Event::End(e) => match e.name().local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if in_para => {
                    in_para = false;
                    let style = para_style
                        .take()
                        .map(|id| styles.get(&id).cloned().unwrap_or(id))
                        .unwrap_or_else(|| DEFAULT_STYLE.to_string());
                    let paragraph = Paragraph::new(style, para_text.clone());
                    if in_cell {
                        cell.push(paragraph);
                    } else if !in_table {
                        body.push(BodyElement::Paragraph(paragraph));
                    }
                }
                b"tc" if in_cell && nested_depth == 0 => {
                    in_cell = false;
                    let built = TableCell {
                        paragraphs: std::mem::take(&mut cell),
                    };
                    for _ in 0..cell_span {
                        row.push(built.clone());
                    }
                }
                b"tr" if in_table && nested_depth == 0 => {
                    rows.push(std::mem::take(&mut row));
                }
                b"tbl" => {
                    if nested_depth > 0 {
                        nested_depth -= 1;
                    } else if in_table {
                        in_table = false;
                        body.push(BodyElement::Table(Table {
                            rows: std::mem::take(&mut rows),
                        }));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(body)
}

/// Flatten a header/footer part to whitespace-normalized text.
fn part_plain_text(xml: &[u8]) -> Result<String, DocumentError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().local_name().as_ref() == b"t" => in_text = true,
            Event::Text(t) if in_text => text.push_str(&t.unescape()?),
            Event::End(e) => match e.name().local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => text.push(' '),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STYLES_XML: &[u8] = br#"<?xml version="1.0"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="SmdTitle0"><w:name w:val="SmdTitle"/></w:style>
  <w:style w:type="paragraph" w:styleId="SmdDate0"><w:name w:val="SmdDate"/></w:style>
</w:styles>"#;

    fn doc_xml(body: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>{body}</w:body>
</w:document>"#
        )
        .into_bytes()
    }

    #[test]
    fn style_names_resolved_from_styles_part() {
        let styles = parse_style_names(STYLES_XML).unwrap();
        assert_eq!(styles.get("SmdTitle0").map(String::as_str), Some("SmdTitle"));
        assert_eq!(styles.get("SmdDate0").map(String::as_str), Some("SmdDate"));
    }

    #[test]
    fn paragraph_style_and_text_extracted() {
        let xml = doc_xml(
            r#"<w:p><w:pPr><w:pStyle w:val="SmdTitle0"/></w:pPr><w:r><w:t>P01A Test</w:t></w:r></w:p>"#,
        );
        let styles = parse_style_names(STYLES_XML).unwrap();
        let body = parse_body(&xml, &styles).unwrap();
        assert_eq!(body.len(), 1);
        match &body[0] {
            BodyElement::Paragraph(p) => {
                assert_eq!(p.style, "SmdTitle");
                assert_eq!(p.text, "P01A Test");
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn unknown_style_id_passes_through() {
        let xml = doc_xml(
            r#"<w:p><w:pPr><w:pStyle w:val="Mystery"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#,
        );
        let body = parse_body(&xml, &HashMap::new()).unwrap();
        match &body[0] {
            BodyElement::Paragraph(p) => assert_eq!(p.style, "Mystery"),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn unstyled_paragraph_defaults_to_normal() {
        let xml = doc_xml(r#"<w:p><w:r><w:t>plain</w:t></w:r></w:p>"#);
        let body = parse_body(&xml, &HashMap::new()).unwrap();
        match &body[0] {
            BodyElement::Paragraph(p) => assert_eq!(p.style, "Normal"),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn tabs_and_breaks_become_separators() {
        let xml = doc_xml(
            r#"<w:p><w:r><w:t>labCORE serial</w:t><w:tab/><w:t>77000079</w:t><w:br/><w:t>next</w:t></w:r></w:p>"#,
        );
        let body = parse_body(&xml, &HashMap::new()).unwrap();
        match &body[0] {
            BodyElement::Paragraph(p) => {
                assert_eq!(p.text, "labCORE serial\t77000079\nnext")
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn table_grid_span_repeats_cell_text() {
        let xml = doc_xml(
            r#"<w:tbl>
              <w:tr>
                <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>SMD</w:t></w:r></w:p></w:tc>
                <w:tc><w:p><w:r><w:t>Status</w:t></w:r></w:p></w:tc>
              </w:tr>
            </w:tbl>"#,
        );
        let body = parse_body(&xml, &HashMap::new()).unwrap();
        match &body[0] {
            BodyElement::Table(t) => {
                assert_eq!(t.row_texts(0), vec!["SMD", "SMD", "Status"]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn body_order_interleaves_paragraphs_and_tables() {
        let xml = doc_xml(
            r#"<w:p><w:pPr><w:pStyle w:val="SmdTitle0"/></w:pPr><w:r><w:t>P02A Echo</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Limits</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            <w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );
        let styles = parse_style_names(STYLES_XML).unwrap();
        let body = parse_body(&xml, &styles).unwrap();
        assert_eq!(body.len(), 3);
        assert!(matches!(&body[0], BodyElement::Paragraph(p) if p.style == "SmdTitle"));
        assert!(matches!(&body[1], BodyElement::Table(_)));
        assert!(matches!(&body[2], BodyElement::Paragraph(p) if p.text == "after"));
    }

    #[test]
    fn nested_table_content_is_skipped() {
        let xml = doc_xml(
            r#"<w:tbl><w:tr><w:tc>
                <w:p><w:r><w:t>outer</w:t></w:r></w:p>
                <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            </w:tc></w:tr></w:tbl>"#,
        );
        let body = parse_body(&xml, &HashMap::new()).unwrap();
        assert_eq!(body.len(), 1);
        match &body[0] {
            BodyElement::Table(t) => {
                assert_eq!(t.rows.len(), 1);
                assert_eq!(t.row_texts(0), vec!["outer"]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn header_part_flattens_to_plain_text() {
        let xml = br#"<?xml version="1.0"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:p><w:r><w:t>AST Lab</w:t></w:r></w:p>
  <w:p><w:r><w:t>Confidential</w:t></w:r></w:p>
</w:hdr>"#;
        assert_eq!(part_plain_text(xml).unwrap(), "AST Lab Confidential");
    }

    #[test]
    fn full_archive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");

        let file = File::create(&path).unwrap();
        let mut zw = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zw.start_file("word/styles.xml", options).unwrap();
        zw.write_all(STYLES_XML).unwrap();
        zw.start_file("word/document.xml", options).unwrap();
        zw.write_all(&doc_xml(
            r#"<w:p><w:pPr><w:pStyle w:val="SmdTitle0"/></w:pPr><w:r><w:t>P01A Test</w:t></w:r></w:p>"#,
        ))
        .unwrap();
        zw.start_file("word/header1.xml", options).unwrap();
        zw.write_all(br#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>PAL</w:t></w:r></w:p></w:hdr>"#).unwrap();
        zw.finish().unwrap();

        let doc = DocxSource.load(&path).unwrap();
        assert_eq!(doc.body.len(), 1);
        assert_eq!(doc.header_text, vec!["PAL"]);
        let para = doc.paragraphs().next().unwrap();
        assert_eq!(para.style, "SmdTitle");
        assert_eq!(para.text, "P01A Test");
    }

    #[test]
    fn missing_document_part_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        let file = File::create(&path).unwrap();
        let mut zw = zip::ZipWriter::new(file);
        zw.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zw.write_all(STYLES_XML).unwrap();
        zw.finish().unwrap();

        let err = DocxSource.load(&path).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPart(_)));
    }

    #[test]
    fn unreadable_file_is_an_io_or_container_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-zip.docx");
        std::fs::write(&path, b"garbage").unwrap();
        let err = DocxSource.load(&path).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Container(_) | DocumentError::Io(_)
        ));
    }
}
