//! Incremental server-sent events decoder.

use super::{ReplicateError, Result};

/// Longest unterminated line held while waiting for its newline.
const MAX_SSE_BUFFER_SIZE: usize = 1024 * 1024;

/// One decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; `message` when the frame carries no `event:` field.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
}

/// Turns arbitrarily split byte chunks into complete events.
///
/// Lines are split on `\n` (a trailing `\r` is dropped), so a multi-byte
/// character cut across two chunks is reassembled before decoding.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a newline.
    scanned: usize,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the events it completed.
    ///
    /// Fails once a single line outgrows the buffer limit; the decoder is
    /// unusable afterwards.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut line_start = 0;
        let mut pos = self.scanned;
        while let Some(offset) = self.buffer[pos..].iter().position(|b| *b == b'\n') {
            let end = pos + offset;
            let line = decode_line(&self.buffer[line_start..end]);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
            line_start = end + 1;
            pos = line_start;
        }
        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_SSE_BUFFER_SIZE {
            self.buffer.clear();
            self.scanned = 0;
            return Err(ReplicateError::Stream(format!(
                "event stream line exceeds {} bytes",
                MAX_SSE_BUFFER_SIZE
            )));
        }
        Ok(events)
    }

    /// Flush whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.scanned = 0;
            let line = decode_line(&rest);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        if let Some(event) = self.dispatch() {
            events.push(event);
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id, retry and unknown fields carry nothing we relay
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event: &str, data: &str) -> SseEvent {
        SseEvent {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_single_frame() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: output\ndata: Hel\n\n").unwrap();
        assert_eq!(events, vec![event("output", "Hel")]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: out").unwrap().is_empty());
        assert!(decoder.feed(b"put\nda").unwrap().is_empty());
        let events = decoder.feed(b"ta: lo\n\n").unwrap();
        assert_eq!(events, vec![event("output", "lo")]);
    }

    #[test]
    fn test_multibyte_character_split() {
        let bytes = "event: output\ndata: héllo\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&bytes[..split]).unwrap().is_empty());
        let events = decoder.feed(&bytes[split..]).unwrap();
        assert_eq!(events, vec![event("output", "héllo")]);
    }

    #[test]
    fn test_multiline_data_joined_with_newline() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: output\ndata: line one\ndata: line two\n\n").unwrap();
        assert_eq!(events, vec![event("output", "line one\nline two")]);
    }

    #[test]
    fn test_empty_data_line_is_an_empty_token() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: output\ndata:\ndata:\n\n").unwrap();
        assert_eq!(events, vec![event("output", "\n")]);
    }

    #[test]
    fn test_crlf_comments_and_ids() {
        let mut decoder = SseDecoder::new();
        let events = decoder
            .feed(b": keepalive\r\nid: 7\r\nevent: done\r\ndata: {}\r\n\r\n")
            .unwrap();
        assert_eq!(events, vec![event("done", "{}")]);
    }

    #[test]
    fn test_default_event_type() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: plain\n\n").unwrap();
        assert_eq!(events, vec![event("message", "plain")]);
    }

    #[test]
    fn test_frame_without_data_is_dropped() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: output\n\n").unwrap().is_empty());
        let events = decoder.feed(b"data: next\n\n").unwrap();
        assert_eq!(events, vec![event("message", "next")]);
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: output\ndata: tail").unwrap().is_empty());
        assert_eq!(decoder.finish(), vec![event("output", "tail")]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_long_line_across_many_chunks() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"event: output\ndata: ").unwrap();
        for _ in 0..1000 {
            assert!(decoder.feed(b"abcd").unwrap().is_empty());
        }
        let events = decoder.feed(b"\n\n").unwrap();
        assert_eq!(events, vec![event("output", &"abcd".repeat(1000))]);
    }

    #[test]
    fn test_unterminated_line_over_limit_fails() {
        let mut decoder = SseDecoder::new();
        let chunk = vec![b'x'; 64 * 1024];
        let mut result = Ok(Vec::new());
        for _ in 0..=(MAX_SSE_BUFFER_SIZE / chunk.len()) {
            result = decoder.feed(&chunk);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(ReplicateError::Stream(_))));
    }
}
