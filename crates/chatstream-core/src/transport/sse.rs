/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, `None` for unnamed frames.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

impl SseFrame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }
}

/// Incremental decoder turning arbitrary body chunks into complete frames.
///
/// Lines may end in `\n`, `\r\n` or a lone `\r`, and a terminator may be
/// split across chunks. Each byte is scanned for a terminator once, so a
/// large frame delivered in many small chunks decodes in linear time.
#[derive(Default)]
pub struct SseDecoder {
    /// Bytes of the current, still unterminated line.
    buf: Vec<u8>,
    /// Prefix of `buf` already known to hold no terminator.
    scanned: usize,
    /// The previous line ended in `\r`, so a leading `\n` belongs to it.
    skip_lf: bool,
    pending: PendingFrame,
}

impl SseDecoder {
    /// Buffers `chunk` and returns every frame it completes.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;
        loop {
            if self.skip_lf && start < self.buf.len() {
                self.skip_lf = false;
                if self.buf[start] == b'\n' {
                    start += 1;
                    continue;
                }
            }
            let from = start.max(self.scanned);
            let Some(offset) = self.buf[from..]
                .iter()
                .position(|&b| b == b'\n' || b == b'\r')
            else {
                break;
            };
            let end = from + offset;
            self.skip_lf = self.buf[end] == b'\r';
            if let Some(frame) = self.pending.push_line(&self.buf[start..end]) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();
        frames
    }

    /// Flushes a trailing frame the server closed without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buf);
        self.scanned = 0;
        self.skip_lf = false;
        if !rest.is_empty() {
            self.pending.field(&rest);
        }
        self.pending.dispatch()
    }
}

/// Fields collected since the last blank line.
#[derive(Default)]
struct PendingFrame {
    event: Option<String>,
    data: Vec<String>,
}

impl PendingFrame {
    fn push_line(&mut self, line: &[u8]) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        self.field(line);
        None
    }

    fn field(&mut self, line: &[u8]) {
        if line.starts_with(b":") {
            return;
        }
        let line = String::from_utf8_lossy(line);
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };
        match name {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id and retry carry nothing the controller uses
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let Self { event, data } = std::mem::take(self);
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event,
            data: data.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_handles_partial_chunk_boundaries() {
        let mut decoder = SseDecoder::default();
        assert!(
            decoder
                .push_chunk(b"event: data\ndata: {\"messages\":[\"hel")
                .is_empty()
        );
        let frames = decoder.push_chunk(b"lo\"]}\n\nevent: metadata\n");
        assert_eq!(frames, vec![SseFrame::new("data", "{\"messages\":[\"hello\"]}")]);
        let frames = decoder.push_chunk(b"data: {\"run_id\":\"r1\"}\r\n\r\n");
        assert_eq!(frames, vec![SseFrame::new("metadata", "{\"run_id\":\"r1\"}")]);
    }

    #[test]
    fn comments_and_empty_frames_are_skipped() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b": ping\n\n\n\nevent: end\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("end".into()),
                data: String::new()
            }]
        );
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"data: a\ndata: b\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: None,
                data: "a\nb".into()
            }]
        );
    }

    #[test]
    fn finish_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(b"event: data\ndata: {}").is_empty());
        assert_eq!(decoder.finish(), Some(SseFrame::new("data", "{}")));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn bare_carriage_returns_end_lines() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"event: metadata\rdata: {\"run_id\":\"r1\"}\r\revent: data\r");
        assert_eq!(frames, vec![SseFrame::new("metadata", "{\"run_id\":\"r1\"}")]);
        let frames = decoder.push_chunk(b"data: {}\r");
        assert!(frames.is_empty());
        let frames = decoder.push_chunk(b"\n\r\n");
        assert_eq!(frames, vec![SseFrame::new("data", "{}")]);
    }

    #[test]
    fn crlf_split_between_chunks_is_one_terminator() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(b"data: a\r").is_empty());
        assert!(decoder.push_chunk(b"\ndata: b\r").is_empty());
        let frames = decoder.push_chunk(b"\n\r\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: None,
                data: "a\nb".into()
            }]
        );
    }

    #[test]
    fn large_frame_in_small_chunks_is_scanned_once() {
        let payload = format!("{{\"messages\":[\"{}\"]}}", "x".repeat(4 * 1024 * 1024));
        let body = format!("event: data\ndata: {payload}\n\n");
        let mut decoder = SseDecoder::default();
        let mut frames = Vec::new();
        for chunk in body.as_bytes().chunks(8 * 1024) {
            frames.extend(decoder.push_chunk(chunk));
            assert_eq!(decoder.scanned, decoder.buf.len());
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("data"));
        assert_eq!(frames[0].data.len(), payload.len());
        assert!(decoder.buf.is_empty());
    }
}
