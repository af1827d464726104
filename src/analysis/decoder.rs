// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Line-oriented event decoding
//!
//! The stream endpoint emits `data: <json>` lines, interleaved with blank
//! separators and other SSE fields. Network chunks arrive at arbitrary
//! boundaries, so bytes are buffered until a full line is available. The
//! buffer holds raw bytes rather than text: a multi-byte character split
//! across two chunks is only decoded once the whole line is present.

use futures::{Stream, StreamExt};

use crate::analysis::event::ProtocolEvent;
use crate::error::{ApiError, Result, StrategistError};

const DATA_PREFIX: &str = "data: ";

/// Incremental decoder for the `data: <json>` line protocol.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ProtocolEvent> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(|b| *b == b'\n')
            .filter_map(parse_line)
            .collect()
    }

    /// Bytes of the unterminated trailing line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of input. An unterminated trailing line is discarded.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            tracing::debug!(
                target: "strategist.stream",
                bytes = self.buffer.len(),
                "discarding unterminated trailing line"
            );
            self.buffer.clear();
        }
    }
}

/// Parse one complete line; `None` for anything that is not an event.
pub fn parse_line(line: &[u8]) -> Option<ProtocolEvent> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    let Ok(text) = std::str::from_utf8(line) else {
        tracing::debug!(target: "strategist.stream", "dropping non-UTF-8 line");
        return None;
    };
    let payload = text.strip_prefix(DATA_PREFIX)?;

    match serde_json::from_str::<ProtocolEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(
                target: "strategist.stream",
                error = %e,
                "dropping malformed event line"
            );
            None
        }
    }
}

/// Decode every event in a complete body.
pub fn decode_all(body: &[u8]) -> Vec<ProtocolEvent> {
    let mut decoder = LineDecoder::new();
    let events = decoder.push(body);
    decoder.finish();
    events
}

/// Adapt a byte-chunk stream into a lazy stream of protocol events.
///
/// The returned stream ends when the source ends. A transport error on the
/// source is yielded once and ends the stream.
pub fn decode_stream<S, B, E>(chunks: S) -> impl Stream<Item = Result<ProtocolEvent>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    async_stream::try_stream! {
        let mut decoder = LineDecoder::new();
        let mut chunks = Box::pin(chunks);

        while let Some(chunk_result) = chunks.next().await {
            let chunk = chunk_result
                .map_err(|e| StrategistError::Api(ApiError::StreamError(e.to_string())))?;
            for event in decoder.push(chunk.as_ref()) {
                yield event;
            }
        }

        decoder.finish();
    }
}
