use unicode_normalization::UnicodeNormalization;

use crate::error::{ChatStreamError, CoreResult};

fn clean_text(s: &str) -> String {
    // Unicode NFC normalization + BOM strip + CRLF -> LF + trim
    let mut t = s.nfc().collect::<String>();
    if t.starts_with('\u{FEFF}') {
        t.remove(0);
    }
    if t.contains("\r\n") {
        t = t.replace("\r\n", "\n");
    }
    t.trim().to_string()
}

/// Prepare user text for sending. The server rejects blank messages, so they
/// are refused here before any request goes out.
pub fn normalize_content(content: &str) -> CoreResult<String> {
    let cleaned = clean_text(content);
    if cleaned.is_empty() {
        return Err(ChatStreamError::Validation(
            "message content required".into(),
        ));
    }
    Ok(cleaned)
}
