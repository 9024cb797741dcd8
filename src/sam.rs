//! Line-level SAM parsing.
//!
//! Only the columns the duplicate classifier needs are interpreted. The raw
//! line is kept so emitted records are written back byte-for-byte.

use crate::error::{DedupError, SAM_MANDATORY_COLUMNS};

/// First character of a SAM header line
pub const HEADER_PREFIX: char = '@';

/// One parsed SAM alignment line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord<'a> {
    pub raw: &'a str,
    pub qname: &'a str,
    pub flag: u16,
    pub rname: &'a str,
    pub pos: i64,
    pub cigar: &'a str,
}

/// A line of SAM text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamLine<'a> {
    /// Header line, passed through untouched
    Header(&'a str),
    /// Alignment line
    Alignment(AlignmentRecord<'a>),
}

/// Parse one SAM line.
///
/// # Arguments
/// * `line` - Line text, with or without its terminator
/// * `line_number` - 1-based line number, used in error messages
///
/// # Returns
/// A header passthrough or a parsed alignment record
///
/// # Errors
/// `DedupError::Parse` if fewer than 11 columns are present,
/// `DedupError::InvalidField` if FLAG or POS is not numeric
pub fn parse_line(line: &str, line_number: usize) -> Result<SamLine<'_>, DedupError> {
    if line.starts_with(HEADER_PREFIX) {
        return Ok(SamLine::Header(line));
    }

    let mut fields = [""; SAM_MANDATORY_COLUMNS];
    let mut found = 0;
    for field in line.split_whitespace() {
        if found < SAM_MANDATORY_COLUMNS {
            fields[found] = field;
        }
        found += 1;
    }

    if found < SAM_MANDATORY_COLUMNS {
        return Err(DedupError::Parse {
            line_number,
            found,
            expected: SAM_MANDATORY_COLUMNS,
        });
    }

    let flag = fields[1].parse::<u16>().map_err(|_| DedupError::InvalidField {
        line_number,
        field: "FLAG",
        value: fields[1].to_string(),
    })?;
    let pos = fields[3].parse::<i64>().map_err(|_| DedupError::InvalidField {
        line_number,
        field: "POS",
        value: fields[3].to_string(),
    })?;

    Ok(SamLine::Alignment(AlignmentRecord {
        raw: line,
        qname: fields[0],
        flag,
        rname: fields[2],
        pos,
        cigar: fields[5],
    }))
}
