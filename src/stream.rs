use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::ensure_distinct_output;
use crate::dedup::{DedupOptions, DuplicateClassifier, RunStatistics};
use crate::sam::{parse_line, SamLine};
use crate::umi::UmiWhitelist;

/// Outcome of one deduplication pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Header lines passed through to output
    pub header_lines: usize,
    pub stats: RunStatistics,
}

impl DedupReport {
    /// Duplicate percentage rounded to two decimals, `None` if no records were seen
    pub fn duplicate_rate(&self) -> Option<f64> {
        self.stats.duplicate_rate()
    }

    /// One-line human-readable duplicate summary
    pub fn summary(&self) -> String {
        match self.duplicate_rate() {
            Some(rate) => format!("PCR duplicates compose {:.2}% of your file", rate),
            None => "No alignment records processed; PCR duplicates compose 0.00% of your file".to_string(),
        }
    }
}

/// Deduplicate a SAM text stream
///
/// Header lines are copied through. Each alignment line is classified and
/// written verbatim when it is the first sighting of its molecule.
///
/// # Arguments
/// * `reader` - SAM text input
/// * `writer` - Destination for header and emitted lines
/// * `classifier` - Classifier holding the run state
///
/// # Returns
/// DedupReport with header and record statistics
///
/// # Errors
/// Fails on I/O errors and on the first malformed alignment line
pub fn deduplicate_sam<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    mut classifier: DuplicateClassifier<'_>,
) -> Result<DedupReport> {
    let mut header_lines = 0;
    let mut line = String::new();
    let mut line_number = 0;

    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .with_context(|| format!("Failed to read SAM line {}", line_number + 1))?;
        if bytes == 0 {
            break;
        }
        line_number += 1;

        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line, line_number)? {
            SamLine::Header(header) => {
                write_line(&mut writer, header)?;
                header_lines += 1;
            }
            SamLine::Alignment(record) => {
                let decision = classifier.classify(&record);
                for _ in 0..decision.copies() {
                    write_line(&mut writer, record.raw)?;
                }
            }
        }
    }

    writer.flush().context("Failed to flush output")?;

    Ok(DedupReport {
        header_lines,
        stats: classifier.into_stats(),
    })
}

/// Write one line, terminating it if the input's last line had no newline
fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes()).context("Failed to write output line")?;
    if !line.ends_with('\n') {
        writer.write_all(b"\n").context("Failed to write output line")?;
    }
    Ok(())
}

/// Deduplicate a SAM file into a new SAM file
///
/// On failure the partially written output file is removed, so a failed run
/// never leaves truncated output behind. An output path naming the input
/// file is rejected before anything is created.
///
/// # Arguments
/// * `input_path` - Path to the coordinate-sorted input SAM
/// * `output_path` - Path of the deduplicated SAM to create
/// * `whitelist` - Valid UMIs
/// * `options` - Classification options
///
/// # Returns
/// DedupReport with header and record statistics
pub fn deduplicate_sam_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    whitelist: &UmiWhitelist,
    options: DedupOptions,
) -> Result<DedupReport> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let input = File::open(input_path)
        .with_context(|| format!("Failed to open input SAM {}", input_path.display()))?;
    ensure_distinct_output(input_path, output_path)?;
    let output = File::create(output_path)
        .with_context(|| format!("Failed to create output SAM {}", output_path.display()))?;

    info!(
        "Deduplicating {} -> {} ({:?})",
        input_path.display(),
        output_path.display(),
        options
    );

    let classifier = DuplicateClassifier::new(whitelist, options);
    let result = deduplicate_sam(BufReader::new(input), BufWriter::new(output), classifier);

    match result {
        Ok(report) => {
            info!(
                "Processed {} records: {} emitted, {} duplicates, {} invalid UMIs",
                report.stats.total_records,
                report.stats.emitted_records,
                report.stats.duplicate_records,
                report.stats.invalid_umi_records
            );
            Ok(report)
        }
        Err(err) => {
            // Keep the original error even if removal fails
            let _ = std::fs::remove_file(output_path);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DedupError;

    const HEADER: &str = "@HD\tVN:1.0\tSO:coordinate\n@SQ\tSN:1\tLN:195471971\n@SQ\tSN:2\tLN:182113224\n";

    fn sam_line(qname: &str, flag: u16, rname: &str, pos: i64, cigar: &str) -> String {
        format!("{qname}\t{flag}\t{rname}\t{pos}\t36\t{cigar}\t*\t0\t0\tACGTACGT\tEEEEEEEE\tNH:i:1\n")
    }

    fn run(input: &str, options: DedupOptions) -> (String, DedupReport) {
        let umis: UmiWhitelist = ["AACGCCAT", "AAGGTACG"].into_iter().collect();
        let mut output = Vec::new();
        let classifier = DuplicateClassifier::new(&umis, options);
        let report = deduplicate_sam(input.as_bytes(), &mut output, classifier).unwrap();
        (String::from_utf8(output).unwrap(), report)
    }

    #[test]
    fn test_headers_pass_through() {
        let (output, report) = run(HEADER, DedupOptions::default());
        assert_eq!(output, HEADER);
        assert_eq!(report.header_lines, 3);
        assert_eq!(report.stats.total_records, 0);
    }

    #[test]
    fn test_header_only_summary() {
        let (_, report) = run(HEADER, DedupOptions::default());
        assert_eq!(report.duplicate_rate(), None);
        assert_eq!(
            report.summary(),
            "No alignment records processed; PCR duplicates compose 0.00% of your file"
        );
    }

    #[test]
    fn test_duplicates_removed() {
        let first = sam_line("r1:AACGCCAT", 0, "1", 100, "71M");
        let copy = sam_line("r2:AACGCCAT", 0, "1", 102, "2S69M");
        let other = sam_line("r3:AAGGTACG", 0, "1", 100, "71M");
        let invalid = sam_line("r4:NNNNNNNN", 0, "1", 100, "71M");
        let input = format!("{HEADER}{first}{copy}{other}{invalid}");

        let (output, report) = run(&input, DedupOptions::default());
        assert_eq!(output, format!("{HEADER}{first}{other}"));
        assert_eq!(report.stats.total_records, 4);
        assert_eq!(report.stats.duplicate_records, 1);
        assert_eq!(report.stats.invalid_umi_records, 1);
        assert_eq!(report.summary(), "PCR duplicates compose 25.00% of your file");
    }

    #[test]
    fn test_legacy_boundary_duplicates_line() {
        let first = sam_line("r1:AACGCCAT", 0, "1", 100, "71M");
        let second = sam_line("r2:AACGCCAT", 0, "2", 100, "71M");
        let input = format!("{first}{second}");

        let (output, _) = run(&input, DedupOptions::legacy());
        assert_eq!(output, format!("{first}{second}{second}"));

        let (output, _) = run(&input, DedupOptions::default());
        assert_eq!(output, format!("{first}{second}"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let first = sam_line("r1:AACGCCAT", 0, "1", 100, "71M");
        let input = format!("{HEADER}\n{first}\n");
        let (output, report) = run(&input, DedupOptions::default());
        assert_eq!(output, format!("{HEADER}{first}"));
        assert_eq!(report.stats.total_records, 1);
    }

    #[test]
    fn test_missing_final_newline() {
        let first = sam_line("r1:AACGCCAT", 0, "1", 100, "71M");
        let input = first.trim_end_matches('\n').to_string();
        let (output, _) = run(&input, DedupOptions::default());
        assert_eq!(output, first);
    }

    #[test]
    fn test_malformed_line_aborts() {
        let umis: UmiWhitelist = ["AACGCCAT"].into_iter().collect();
        let input = format!("{HEADER}r1:AACGCCAT\t0\t1\t100\n");
        let classifier = DuplicateClassifier::new(&umis, DedupOptions::default());
        let err = deduplicate_sam(input.as_bytes(), Vec::<u8>::new(), classifier).unwrap_err();

        let parse_error = err.downcast_ref::<DedupError>().unwrap();
        assert_eq!(parse_error, &DedupError::Parse { line_number: 4, found: 4, expected: 11 });
    }
}
