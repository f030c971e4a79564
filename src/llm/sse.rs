//! Incremental server-sent events decoder for streamed completions.

/// One decoded SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; `"message"` when the event carries no `event:` line.
    pub event: String,
    pub data: String,
}

/// Buffers raw bytes and yields complete events as they become available.
#[derive(Debug, Default)]
pub struct SseProcessor {
    buffer: Vec<u8>,
}

impl SseProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk of bytes to the buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Extract the next complete event, skipping comments and keepalives.
    /// Returns `None` until a full event has been buffered.
    pub fn next_event(&mut self) -> Option<Result<SseEvent, std::str::Utf8Error>> {
        loop {
            let boundary = self.find_event_boundary()?;
            let event_bytes: Vec<u8> = self.buffer.drain(..boundary.end).collect();

            let event_str = match std::str::from_utf8(&event_bytes[..boundary.start]) {
                Ok(s) => s,
                Err(e) => return Some(Err(e)),
            };

            if let Some(parsed) = Self::parse_event(event_str) {
                return Some(Ok(parsed));
            }
        }
    }

    /// Range to consume: start = end of event content, end = end of delimiter.
    /// Whichever delimiter occurs first in the buffer wins.
    fn find_event_boundary(&self) -> Option<std::ops::Range<usize>> {
        let crlf = self
            .buffer
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map(|i| i..i + 4);
        let lf = self
            .buffer
            .windows(2)
            .position(|w| w == b"\n\n")
            .map(|i| i..i + 2);

        match (crlf, lf) {
            (Some(a), Some(b)) => Some(if a.start <= b.start { a } else { b }),
            (a, b) => a.or(b),
        }
    }

    fn parse_event(event_str: &str) -> Option<SseEvent> {
        let mut event = None;
        let mut data_lines = Vec::new();

        for line in event_str.lines() {
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (line, ""),
            };
            match field {
                "event" => event = Some(value.to_string()),
                "data" => data_lines.push(value),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: data_lines.join("\n"),
        })
    }
}
