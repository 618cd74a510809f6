//! Line splitting and event parsing shared by every spine reader.

use std::fs;
use std::io;
use std::path::Path;

use spine_types::Event;

use crate::LedgerError;

/// One physical line of a spine file.
pub(crate) struct RawLine<'a> {
    /// 1-based physical line number, for error messages.
    pub number: usize,
    pub text: &'a [u8],
    /// Whether the line ended with `\n`. Only the final line can be unterminated.
    pub terminated: bool,
}

impl RawLine<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.iter().all(u8::is_ascii_whitespace)
    }
}

pub(crate) fn split_lines(bytes: &[u8]) -> Vec<RawLine<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut number = 1;
    while start < bytes.len() {
        match bytes[start..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                lines.push(RawLine {
                    number,
                    text: &bytes[start..start + offset],
                    terminated: true,
                });
                start += offset + 1;
            }
            None => {
                lines.push(RawLine {
                    number,
                    text: &bytes[start..],
                    terminated: false,
                });
                start = bytes.len();
            }
        }
        number += 1;
    }
    lines
}

/// Parse one spine line. The payload must be a JSON object.
pub(crate) fn parse_line(text: &[u8]) -> Result<Event, String> {
    let event: Event = serde_json::from_slice(text).map_err(|e| e.to_string())?;
    if !event.data.is_object() {
        return Err("data is not a JSON object".into());
    }
    Ok(event)
}

/// Read the raw bytes of a spine; a missing file reads as empty.
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, LedgerError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Read every event in file order, failing on the first malformed line.
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Event>, LedgerError> {
    let bytes = read_bytes(path.as_ref())?;
    split_lines(&bytes)
        .into_iter()
        .filter(|line| !line.is_blank())
        .map(|line| {
            parse_line(line.text).map_err(|reason| LedgerError::MalformedLine {
                line: line.number,
                reason,
            })
        })
        .collect()
}

/// Result of a tolerant read.
#[derive(Debug, Default)]
pub struct TolerantRead {
    pub events: Vec<Event>,
    /// 1-based physical line numbers that failed to parse.
    pub skipped: Vec<usize>,
}

/// Read every parseable event, skipping malformed lines.
///
/// For display-only consumers. Never use this to decide integrity.
pub fn read_tolerant(path: impl AsRef<Path>) -> Result<TolerantRead, LedgerError> {
    let path = path.as_ref();
    let bytes = read_bytes(path)?;
    let mut out = TolerantRead::default();
    for line in split_lines(&bytes) {
        if line.is_blank() {
            continue;
        }
        match parse_line(line.text) {
            Ok(event) => out.events.push(event),
            Err(reason) => {
                tracing::warn!(path = %path.display(), line = line.number, %reason, "skipping malformed spine line");
                out.skipped.push(line.number);
            }
        }
    }
    Ok(out)
}
