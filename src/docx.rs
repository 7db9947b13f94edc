//! Minimal .docx codec.
//!
//! A .docx file is a zip package whose visible text lives in
//! `word/document.xml` as `<w:t>` runs grouped into `<w:p>` paragraphs.
//! Reading concatenates the runs of each paragraph and joins non-empty
//! paragraphs with a single space. Writing produces the smallest package
//! Word accepts: content types, the package relationship, and a document
//! part holding exactly one paragraph.

use crate::error::{Error, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Reads the plain text of a Word document.
///
/// Text runs within a paragraph are concatenated; paragraphs are joined
/// with a single space. Empty paragraphs are dropped.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened and
/// [`Error::Document`] if it is not a zip archive or has no document part.
pub fn read_docx(path: &Path) -> Result<String> {
    let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;

    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| Error::document(path, e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| Error::document(path, format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::document(path, e.to_string()))?;

    Ok(extract_text(&xml))
}

/// Writes `text` as a new Word document containing a single paragraph.
///
/// Any existing file at `path` is replaced. The package is written to a
/// temporary file first and renamed into place, so a failed write never
/// leaves a truncated document behind.
///
/// # Errors
///
/// Returns [`Error::Io`] on any filesystem or archive write failure.
pub fn write_docx(path: &Path, text: &str) -> Result<()> {
    let temp_path = path.with_extension("docx.tmp");
    let file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    let mut package = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", RELS_XML.to_string()),
        (DOCUMENT_PART, document_xml(text)),
    ] {
        package
            .start_file(name, options)
            .map_err(|e| Error::io(&temp_path, zip_io_error(e)))?;
        package
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;
    }

    let file = package
        .finish()
        .map_err(|e| Error::io(&temp_path, zip_io_error(e)))?;
    file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

fn zip_io_error(e: zip::result::ZipError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

fn document_xml(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p></w:body></w:document>"#,
        escape(text)
    )
}

/// Collects paragraph text from the document part.
///
/// The document grammar is regular enough that a substring scan is
/// sufficient; the crate deliberately does not pull in an XML parser for
/// three fixed tag names.
fn extract_text(xml: &str) -> String {
    let mut paragraphs = Vec::new();

    for fragment in xml.split("</w:p>") {
        let text = paragraph_runs(fragment);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    paragraphs.join(" ")
}

/// Concatenates the `<w:t>` runs of one paragraph fragment.
fn paragraph_runs(fragment: &str) -> String {
    let mut out = String::new();
    let mut rest = fragment;

    while let Some(start) = rest.find("<w:t") {
        let after = &rest[start + 4..];

        // "<w:t" is a prefix of <w:tab/>, <w:tbl> and others; a text run
        // continues with '>' or an attribute.
        if !(after.starts_with('>') || after.starts_with(' ')) {
            rest = after;
            continue;
        }

        let Some(open_end) = after.find('>') else {
            break;
        };

        // Self-closing empty run
        if after[..open_end].ends_with('/') {
            rest = &after[open_end + 1..];
            continue;
        }

        let body = &after[open_end + 1..];
        let Some(close) = body.find("</w:t>") else {
            break;
        };

        out.push_str(&unescape(&body[..close]));
        rest = &body[close + "</w:t>".len()..];
    }

    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
