// 🔤 Wire codepage - Windows-1253 (Greek), one byte per character
// Files are read and written through here; everything else works on `str`.

use crate::catalog::SchemaCatalog;
use crate::document::Document;
use crate::error::{ApdError, Result};
use encoding_rs::WINDOWS_1253;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Bytes from the wire to text. Undefined code points are an error.
pub fn decode_wire(bytes: &[u8]) -> Result<String> {
    let (text, had_errors) = WINDOWS_1253.decode_without_bom_handling(bytes);
    if had_errors {
        let position = text.chars().position(|c| c == '\u{FFFD}').unwrap_or(0);
        return Err(ApdError::malformed(
            format!("character #{}", position + 1),
            "byte is not defined in Windows-1253",
        ));
    }
    Ok(text.into_owned())
}

/// Text to wire bytes. Fails on the first character the codepage cannot hold.
pub fn encode_wire(text: &str) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = WINDOWS_1253.encode(text);
    if had_errors {
        let mut buf = [0u8; 4];
        let character = text
            .chars()
            .find(|c| WINDOWS_1253.encode(c.encode_utf8(&mut buf)).2)
            .unwrap_or('\u{FFFD}');
        return Err(ApdError::Unencodable { character });
    }
    Ok(bytes.into_owned())
}

/// Rendered document as wire bytes
pub fn render_bytes(doc: &Document) -> Result<Vec<u8>> {
    encode_wire(&doc.render()?)
}

/// SHA-256 of the rendered wire bytes, lowercase hex
pub fn fingerprint(doc: &Document) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(render_bytes(doc)?);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn read_document(catalog: Arc<SchemaCatalog>, path: &Path) -> Result<Document> {
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read declaration file");
    let text = decode_wire(&bytes)?;
    Document::parse(catalog, &text)
}

pub fn write_document(doc: &Document, path: &Path) -> Result<()> {
    let bytes = render_bytes(doc)?;
    fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote declaration file");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
