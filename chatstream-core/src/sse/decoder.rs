/// Streaming UTF-8 decoder.
///
/// A code point split across two chunks is held back and completed by the next
/// call instead of being replaced. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    tail: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, retaining an incomplete trailing sequence.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let joined;
        let input: &[u8] = if self.tail.is_empty() {
            chunk
        } else {
            let mut v = std::mem::take(&mut self.tail);
            v.extend_from_slice(chunk);
            joined = v;
            &joined
        };

        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // incomplete sequence at the end; wait for more bytes
                            self.tail.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is still held back at end-of-stream.
    pub fn finish(&mut self) -> String {
        if self.tail.is_empty() {
            return String::new();
        }
        let tail = std::mem::take(&mut self.tail);
        String::from_utf8_lossy(&tail).into_owned()
    }

    pub fn has_pending(&self) -> bool {
        !self.tail.is_empty()
    }
}
