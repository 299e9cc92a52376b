/// Splits decoded text into complete lines.
///
/// Holds at most one partial trailing line between calls to [`LineBuffer::feed`].
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` and return every line completed by it.
    /// A trailing `\r` is stripped so CRLF input yields the same lines.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(rel) = self.pending[start..].find('\n') {
            let end = start + rel;
            lines.push(strip_cr(&self.pending[start..end]).to_string());
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// End-of-stream: emit the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(strip_cr(&rest).to_string())
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_and_residue() {
        let mut buf = LineBuffer::new();
        let lines = buf.feed("event: chunk\ndata: {\"con");
        assert_eq!(lines, vec!["event: chunk"]);
        assert_eq!(buf.pending(), "data: {\"con");

        let lines = buf.feed("tent\": \"x\"}\n\n");
        assert_eq!(lines, vec!["data: {\"content\": \"x\"}", ""]);
        assert!(buf.pending().is_empty());
    }

    #[test]
    fn lines_are_never_reemitted() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.feed("a\nb"), vec!["a"]);
        assert_eq!(buf.feed(""), Vec::<String>::new());
        assert_eq!(buf.feed("\n"), vec!["b"]);
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn crlf_split_between_chunks() {
        let mut buf = LineBuffer::new();
        assert!(buf.feed("event: done\r").is_empty());
        assert_eq!(buf.feed("\n"), vec!["event: done"]);
    }

    #[test]
    fn finish_emits_unterminated_line() {
        let mut buf = LineBuffer::new();
        assert!(buf.feed("data: {}").is_empty());
        assert_eq!(buf.finish().as_deref(), Some("data: {}"));
        assert!(buf.pending().is_empty());
    }
}
