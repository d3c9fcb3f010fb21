//! Minimal JSON-lines reader standing in for the ingestion side.

use std::path::Path;

use crate::error::AnalysisError;
use crate::post::RawRecord;

pub fn read_source(path: &Path) -> Result<Vec<u8>, AnalysisError> {
    std::fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.to_owned(),
        source,
    })
}

/// One JSON object per line. Blank lines are skipped; any other line that
/// does not parse fails the whole source.
pub fn parse_json_lines(bytes: &[u8]) -> Result<Vec<RawRecord>, AnalysisError> {
    let text = String::from_utf8_lossy(bytes);
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| AnalysisError::Record { line: i + 1, source })
        })
        .collect()
}

pub fn load(path: &Path) -> Result<Vec<RawRecord>, AnalysisError> {
    parse_json_lines(&read_source(path)?)
}
