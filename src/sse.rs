//! Incremental decoder for the progress event stream.
//!
//! The backend speaks server-sent events: `data:` lines carry JSON
//! payloads, lines starting with `:` are comments (the backend uses them as
//! keep-alives), and a blank line terminates an event. Chunk boundaries
//! from the HTTP layer land anywhere, so the decoder accepts arbitrary
//! byte slices and yields complete payloads as they appear.

/// Streaming SSE frame decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the line currently being assembled.
    line: Vec<u8>,
    /// `data:` lines of the event currently being assembled.
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every payload completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let mut line = std::mem::take(&mut self.line);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                self.finish_line(&line, &mut out);
            } else {
                self.line.push(byte);
            }
        }
        out
    }

    fn finish_line(&mut self, line: &[u8], out: &mut Vec<String>) {
        if line.is_empty() {
            // Blank line: dispatch the assembled event, if any.
            if !self.data.is_empty() {
                out.push(self.data.join("\n"));
                self.data.clear();
            }
            return;
        }
        let Ok(text) = std::str::from_utf8(line) else {
            log::warn!("non-UTF8 line on event stream, skipping");
            return;
        };
        if let Some(rest) = text.strip_prefix("data:") {
            self.data
                .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
        // Comment (":"-prefixed) and field lines we don't use fall through.
    }
}
