use thiserror::Error;

/// Number of mandatory columns in a SAM alignment line.
pub const SAM_MANDATORY_COLUMNS: usize = 11;

/// Fatal conditions that abort a deduplication run.
///
/// Records with an unknown UMI are not errors; they are reported through
/// [`Decision::InvalidUmi`](crate::dedup::Decision::InvalidUmi).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DedupError {
    /// Unsupported or incomplete run configuration, detected before any I/O
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Alignment line with too few columns
    #[error("Malformed SAM record at line {line_number}: found {found} columns, expected at least {expected}")]
    Parse {
        line_number: usize,
        found: usize,
        expected: usize,
    },

    /// Alignment column that could not be interpreted
    #[error("Malformed SAM record at line {line_number}: invalid {field} '{value}'")]
    InvalidField {
        line_number: usize,
        field: &'static str,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let error = DedupError::Parse { line_number: 7, found: 4, expected: SAM_MANDATORY_COLUMNS };
        let msg = error.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("found 4 columns"));
        assert!(msg.contains("at least 11"));
    }

    #[test]
    fn test_configuration_error_message() {
        let error = DedupError::Configuration("paired-end input is not supported".to_string());
        assert_eq!(error.to_string(), "Configuration error: paired-end input is not supported");
    }

    #[test]
    fn test_invalid_field_message() {
        let error = DedupError::InvalidField { line_number: 3, field: "FLAG", value: "abc".to_string() };
        assert!(error.to_string().contains("invalid FLAG 'abc'"));
    }
}
