//! Document ingestion: fetch a source text and split it into fragments
//!
//! Fragments are produced by a sliding window over characters. Each fragment
//! after the first repeats the final `overlap` characters of its predecessor,
//! and the windows cover the whole document with no gaps, so the original
//! text can be reconstructed exactly by dropping each later fragment's
//! leading overlap.

use crate::errors::{RagError, Result};
use crate::types::Fragment;
use std::path::PathBuf;
use std::time::Duration;

/// Timeout for fetching a document over HTTP
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the document text comes from
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Url(String),
    File(PathBuf),
    Text(String),
}

impl DocumentSource {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Url(url) => url.clone(),
            DocumentSource::File(path) => path.display().to_string(),
            DocumentSource::Text(_) => "inline text".to_string(),
        }
    }
}

/// Split text into overlapping fragments.
///
/// Sizes are in characters; the stride between fragment starts is
/// `max_chars - overlap_chars`. An empty input yields no fragments.
pub fn chunk(text: &str, max_chars: usize, overlap_chars: usize) -> Result<Vec<Fragment>> {
    if max_chars == 0 {
        return Err(RagError::ConfigError(
            "fragment size must be at least 1 character".to_string(),
        ));
    }
    if overlap_chars >= max_chars {
        return Err(RagError::ConfigError(format!(
            "overlap {} must be smaller than fragment size {}",
            overlap_chars, max_chars
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let step = max_chars - overlap_chars;
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut sequence_index = 0;

    loop {
        let end = (start + max_chars).min(chars.len());
        fragments.push(Fragment {
            text: chars[start..end].iter().collect(),
            source_offset: start,
            sequence_index,
        });

        if end == chars.len() {
            break;
        }
        start += step;
        sequence_index += 1;
    }

    Ok(fragments)
}

/// Loads a document and splits it into fragments
pub struct DocumentIngestor {
    client: reqwest::Client,
    max_fragment_chars: usize,
    overlap_chars: usize,
}

impl DocumentIngestor {
    /// Create an ingestor with the given fragment bounds.
    ///
    /// Fails with a configuration error if `overlap_chars >= max_fragment_chars`
    /// or `max_fragment_chars == 0`.
    pub fn new(max_fragment_chars: usize, overlap_chars: usize) -> Result<Self> {
        // Validate eagerly so a bad configuration fails before any fetch
        chunk("", max_fragment_chars, overlap_chars)?;

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            max_fragment_chars,
            overlap_chars,
        })
    }

    /// Load the source and split it into fragments.
    ///
    /// Fails with `SourceUnavailable` if the source cannot be fetched or
    /// holds no text.
    pub async fn ingest(&self, source: &DocumentSource) -> Result<Vec<Fragment>> {
        let text = self.load(source).await?;

        if text.trim().is_empty() {
            return Err(RagError::SourceUnavailable {
                source_desc: source.describe(),
                reason: "document is empty".to_string(),
            });
        }

        chunk(&text, self.max_fragment_chars, self.overlap_chars)
    }

    /// Fetch the raw document text
    async fn load(&self, source: &DocumentSource) -> Result<String> {
        match source {
            DocumentSource::Url(url) => {
                let response = self.client.get(url).send().await.map_err(|e| {
                    RagError::SourceUnavailable {
                        source_desc: url.clone(),
                        reason: e.to_string(),
                    }
                })?;

                if !response.status().is_success() {
                    return Err(RagError::SourceUnavailable {
                        source_desc: url.clone(),
                        reason: format!("HTTP {}", response.status()),
                    });
                }

                response.text().await.map_err(|e| RagError::SourceUnavailable {
                    source_desc: url.clone(),
                    reason: e.to_string(),
                })
            }
            DocumentSource::File(path) => {
                std::fs::read_to_string(path).map_err(|e| RagError::SourceUnavailable {
                    source_desc: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
            DocumentSource::Text(text) => Ok(text.clone()),
        }
    }

    /// Maximum fragment size in characters
    pub fn max_fragment_chars(&self) -> usize {
        self.max_fragment_chars
    }

    /// Overlap between neighboring fragments in characters
    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }
}
