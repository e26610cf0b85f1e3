// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw text extraction from Office Open XML word-processing packages.
//
// A .docx file is a zip archive; the body lives in `word/document.xml`. Only
// the character content of runs is kept. Styling, images, headers and
// footers are discarded.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument};
use wandelwerk_core::error::{Result, WandelwerkError};
use zip::ZipArchive;

/// Archive member holding the main document body.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the plain text of a .docx package.
///
/// Paragraphs are separated by a blank line, `w:tab` becomes a tab and
/// `w:br`/`w:cr` become a newline. Trailing whitespace is trimmed.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn extract_raw_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| WandelwerkError::Decode(format!("not a word-processing package: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| WandelwerkError::Decode(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| WandelwerkError::Decode(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    let text = text_from_document_xml(&xml)?;
    debug!(chars = text.chars().count(), "document text extracted");
    Ok(text)
}

/// Walk `word/document.xml` and collect run text.
pub fn text_from_document_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut in_text = false;
    // `w:tab` inside `w:tabs` is a tab stop definition, not content.
    let mut in_tab_stops = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tabs" => in_tab_stops = true,
                b"tab" if !in_tab_stops => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if !in_tab_stops => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"tabs" => in_tab_stops = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| WandelwerkError::Decode(format!("bad text run: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::CData(e)) if in_text => {
                out.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WandelwerkError::Decode(format!(
                    "XML parse error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    out.truncate(out.trim_end().len());
    Ok(out)
}
