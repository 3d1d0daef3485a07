//! Repository Pair Loading
//!
//! Reads the `source::destination` list that drives a run

use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Separator between the source and destination repository on a line
pub const PAIR_DELIMITER: &str = "::";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One source/destination repository mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPair {
    /// Repository labels are read from (`owner/name`)
    pub source: String,

    /// Repository labels are written to (`owner/name`)
    pub destination: String,

    /// 1-based line number in the input file
    pub line: usize,
}

impl fmt::Display for RepositoryPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' -> '{}'", self.source, self.destination)
    }
}

/// A line that could not be split into a pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the input file
    pub line: usize,

    /// Trimmed line content
    pub content: String,
}

/// Result of parsing a pair list
///
/// Malformed lines are collected instead of aborting the whole file, so one
/// typo never discards an otherwise valid list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairList {
    pub pairs: Vec<RepositoryPair>,
    pub malformed: Vec<MalformedLine>,
}

impl PairList {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Parse pair list content
///
/// Blank lines are ignored. A leading byte-order mark is stripped.
pub fn parse_repository_pairs(content: &str) -> PairList {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
    let mut list = PairList::default();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Some((source, destination)) => list.pairs.push(RepositoryPair {
                source,
                destination,
                line: index + 1,
            }),
            None => list.malformed.push(MalformedLine {
                line: index + 1,
                content: line.to_string(),
            }),
        }
    }

    list
}

/// Load and parse a pair list file
///
/// # Errors
/// If the file cannot be read or is not valid UTF-8
pub fn load_repository_pairs<P: AsRef<Path>>(path: P) -> Result<PairList> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_repository_pairs(&content))
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = line.split(PAIR_DELIMITER).map(str::trim).collect();
    match tokens.as_slice() {
        [source, destination] if !source.is_empty() && !destination.is_empty() => {
            Some((source.to_string(), destination.to_string()))
        }
        _ => None,
    }
}
