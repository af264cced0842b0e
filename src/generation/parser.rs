//! Incremental parser for the Ollama generate stream
//!
//! The stream is newline-delimited JSON: one object per line, each carrying
//! a `response` text piece and a `done` flag on the final line. Byte chunks
//! from the network do not align with line boundaries, so the parser buffers
//! until a full line is available.

use crate::errors::{RagError, Result};
use serde::Deserialize;

/// Maximum buffer size (1MB); a line longer than this is a protocol error
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// One parsed line of the generate stream
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    /// Piece of the completion text
    #[serde(default)]
    pub response: String,
    /// True on the final line
    #[serde(default)]
    pub done: bool,
}

/// Buffers raw bytes and yields parsed stream chunks
#[derive(Debug, Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    /// Create an empty parser
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed bytes and collect every chunk completed by them.
    ///
    /// Incomplete trailing data stays buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<StreamChunk>> {
        if self.buffer.len() + bytes.len() > MAX_BUFFER_SIZE {
            return Err(RagError::GenerationService {
                message: format!(
                    "stream buffer overflow: {} bytes exceeds maximum {}",
                    self.buffer.len() + bytes.len(),
                    MAX_BUFFER_SIZE
                ),
            });
        }

        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);

            if line.trim().is_empty() {
                continue;
            }

            let chunk: StreamChunk =
                serde_json::from_str(line.trim()).map_err(|e| RagError::GenerationService {
                    message: format!("malformed stream line: {}", e),
                })?;
            chunks.push(chunk);
        }

        Ok(chunks)
    }

    /// Parse whatever remains in the buffer as a final line, if anything.
    ///
    /// Ollama terminates every line with a newline, so a non-empty remainder
    /// normally means the stream was cut short.
    pub fn finish(&mut self) -> Result<Option<StreamChunk>> {
        if self.buffer.iter().all(|&b| b.is_ascii_whitespace()) {
            self.buffer.clear();
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.buffer).to_string();
        self.buffer.clear();

        let chunk: StreamChunk =
            serde_json::from_str(line.trim()).map_err(|e| RagError::GenerationService {
                message: format!("truncated stream: {}", e),
            })?;
        Ok(Some(chunk))
    }

    /// Bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut parser = StreamParser::new();

        let chunks = parser
            .feed(b"{\"response\": \"Hello\", \"done\": false}\n")
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].response, "Hello");
        assert!(!chunks[0].done);
    }

    #[test]
    fn test_split_across_feeds() {
        let mut parser = StreamParser::new();

        assert!(parser.feed(b"{\"response\": \"Hel").unwrap().is_empty());
        let chunks = parser.feed(b"lo\", \"done\": false}\n").unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].response, "Hello");
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_multiple_lines_in_one_feed() {
        let mut parser = StreamParser::new();

        let data = b"{\"response\": \"a\", \"done\": false}\n{\"response\": \"b\", \"done\": true}\n";
        let chunks = parser.feed(data).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].response, "a");
        assert!(chunks[1].done);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut parser = StreamParser::new();

        let chunks = parser
            .feed(b"\n{\"response\": \"x\", \"done\": true}\n\n")
            .unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_malformed_line_is_error() {
        let mut parser = StreamParser::new();

        let result = parser.feed(b"not json\n");
        assert!(matches!(result, Err(RagError::GenerationService { .. })));
    }

    #[test]
    fn test_finish_empty_buffer() {
        let mut parser = StreamParser::new();
        assert!(parser.finish().unwrap().is_none());
    }

    #[test]
    fn test_finish_with_unterminated_line() {
        let mut parser = StreamParser::new();

        parser.feed(b"{\"response\": \"tail\", \"done\": true}").unwrap();
        let chunk = parser.finish().unwrap().unwrap();
        assert_eq!(chunk.response, "tail");
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_buffer_overflow() {
        let mut parser = StreamParser::new();

        let big = vec![b'a'; MAX_BUFFER_SIZE + 1];
        let result = parser.feed(&big);
        assert!(matches!(result, Err(RagError::GenerationService { .. })));
    }
}
