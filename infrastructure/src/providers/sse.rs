//! Server-sent events line splitting.
//!
//! Network chunks do not respect line or UTF-8 boundaries, so bytes are
//! buffered until a full line is available.

/// Accumulates raw bytes and yields the payload of every complete
/// `data:` line.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning the `data:` payloads it completed.
    ///
    /// Comment lines, `event:` lines and blank separators are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload.to_string());
            }
        }
        payloads
    }

    /// Payload of a trailing line that was never terminated.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest);
        data_payload(&line).map(str::to_string)
    }
}

fn data_payload(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_chunks() {
        let mut buffer = SseLineBuffer::new();
        assert!(buffer.push(b"data: {\"a\"").is_empty());
        let payloads = buffer.push(b":1}\n\ndata: [DONE]\n");
        assert_eq!(payloads, vec!["{\"a\":1}", "[DONE]"]);
    }

    #[test]
    fn test_skips_non_data_lines() {
        let mut buffer = SseLineBuffer::new();
        let payloads = buffer.push(b": keep-alive\nevent: message\r\ndata: hi\r\n\r\n");
        assert_eq!(payloads, vec!["hi"]);
    }

    #[test]
    fn test_multibyte_char_split() {
        let text = "data: caf\u{e9}\n".as_bytes();
        let (head, tail) = text.split_at(text.len() - 2);
        let mut buffer = SseLineBuffer::new();
        assert!(buffer.push(head).is_empty());
        assert_eq!(buffer.push(tail), vec!["caf\u{e9}"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut buffer = SseLineBuffer::new();
        assert!(buffer.push(b"data: tail").is_empty());
        assert_eq!(buffer.finish().as_deref(), Some("tail"));
        assert!(buffer.finish().is_none());
    }
}
