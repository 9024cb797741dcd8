//! Run configuration, validated before any stream I/O.

use std::path::{Path, PathBuf};

use crate::dedup::DedupOptions;
use crate::error::DedupError;

/// Extension the input file name must carry
pub const SAM_EXTENSION: &str = ".sam";

/// Suffix appended to the input file name to form the output name
pub const DEDUPED_SUFFIX: &str = "_deduped";

/// A checked deduplication run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupConfig {
    pub input: PathBuf,
    pub umi_list: PathBuf,
    pub output: PathBuf,
    pub options: DedupOptions,
}

impl DedupConfig {
    /// Check raw command-line values and derive the output path.
    ///
    /// # Errors
    /// `DedupError::Configuration` for paired-end requests, a missing UMI
    /// list, an input that is not a `.sam` file, or an output naming the input
    pub fn validate(
        input: PathBuf,
        umi_list: Option<PathBuf>,
        output: Option<PathBuf>,
        paired: bool,
        options: DedupOptions,
    ) -> Result<Self, DedupError> {
        if paired {
            return Err(DedupError::Configuration(
                "paired-end input is not supported; only single-end reads can be deduplicated".to_string(),
            ));
        }

        let umi_list = umi_list.ok_or_else(|| {
            DedupError::Configuration(
                "a UMI list is required; randomer UMIs are not supported".to_string(),
            )
        })?;

        let output = match output {
            Some(path) => path,
            None => deduped_output_path(&input)?,
        };
        ensure_distinct_output(&input, &output)?;

        Ok(DedupConfig {
            input,
            umi_list,
            output,
            options,
        })
    }
}

/// Refuse an output path that names the input file.
///
/// Existing paths are compared after canonicalization, so `./a.sam` and
/// symlinks to the input are caught too.
///
/// # Errors
/// `DedupError::Configuration` if both paths refer to the same file
pub fn ensure_distinct_output(input: &Path, output: &Path) -> Result<(), DedupError> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(input), Ok(output)) => input == output,
        _ => input == output,
    };

    if same {
        return Err(DedupError::Configuration(format!(
            "output '{}' would overwrite the input file",
            output.display()
        )));
    }
    Ok(())
}

/// Output path for an input SAM: its file name plus `_deduped`, in the working directory
///
/// The whole file name is kept. The earlier Python deduper matched only the
/// trailing `[A-Za-z0-9]+.sam`, so `C1_SE_uniqAlign.sam` became
/// `uniqAlign.sam_deduped` there.
///
/// # Example
/// ```
/// use deduper_rs::config::deduped_output_path;
/// use std::path::PathBuf;
///
/// let output = deduped_output_path("/data/run1/C1_SE_uniqAlign.sam").unwrap();
/// assert_eq!(output, PathBuf::from("C1_SE_uniqAlign.sam_deduped"));
/// ```
pub fn deduped_output_path<P: AsRef<Path>>(input: P) -> Result<PathBuf, DedupError> {
    let input = input.as_ref();
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| name.len() > SAM_EXTENSION.len() && name.ends_with(SAM_EXTENSION))
        .ok_or_else(|| {
            DedupError::Configuration(format!(
                "input file '{}' must be a {} file",
                input.display(),
                SAM_EXTENSION
            ))
        })?;

    Ok(PathBuf::from(format!("{file_name}{DEDUPED_SUFFIX}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_derives_output() {
        let config = DedupConfig::validate(
            PathBuf::from("/data/test.sam"),
            Some(PathBuf::from("STL96.txt")),
            None,
            false,
            DedupOptions::default(),
        )
        .unwrap();
        assert_eq!(config.output, PathBuf::from("test.sam_deduped"));
        assert_eq!(config.umi_list, PathBuf::from("STL96.txt"));
    }

    #[test]
    fn test_validate_output_override() {
        let config = DedupConfig::validate(
            PathBuf::from("reads.txt"),
            Some(PathBuf::from("STL96.txt")),
            Some(PathBuf::from("/tmp/out.sam")),
            false,
            DedupOptions::default(),
        )
        .unwrap();
        assert_eq!(config.output, PathBuf::from("/tmp/out.sam"));
    }

    #[test]
    fn test_validate_rejects_paired() {
        let err = DedupConfig::validate(
            PathBuf::from("test.sam"),
            Some(PathBuf::from("STL96.txt")),
            None,
            true,
            DedupOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("paired-end"));
    }

    #[test]
    fn test_validate_requires_umi_list() {
        let err = DedupConfig::validate(PathBuf::from("test.sam"), None, None, false, DedupOptions::default())
            .unwrap_err();
        assert!(matches!(err, DedupError::Configuration(_)));
        assert!(err.to_string().contains("UMI list"));
    }

    #[test]
    fn test_validate_rejects_output_over_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("reads.sam");
        std::fs::write(&input, "@HD\tVN:1.0\n").unwrap();

        let err = DedupConfig::validate(
            input.clone(),
            Some(PathBuf::from("STL96.txt")),
            Some(dir.path().join(".").join("reads.sam")),
            false,
            DedupOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DedupError::Configuration(_)));
        assert!(err.to_string().contains("overwrite the input"));
    }

    #[test]
    fn test_distinct_output_for_missing_paths() {
        assert!(ensure_distinct_output(Path::new("a.sam"), Path::new("a.sam_deduped")).is_ok());
        assert!(ensure_distinct_output(Path::new("a.sam"), Path::new("a.sam")).is_err());
    }

    #[test]
    fn test_output_path_keeps_whole_file_name() {
        assert_eq!(
            deduped_output_path("/data/C1_SE_uniqAlign.sam").unwrap(),
            PathBuf::from("C1_SE_uniqAlign.sam_deduped")
        );
    }

    #[test]
    fn test_output_path_requires_sam() {
        assert!(deduped_output_path("reads.bam").is_err());
        assert!(deduped_output_path(".sam").is_err());
        assert!(deduped_output_path("/data/").is_err());
    }
}
