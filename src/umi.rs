//! UMI (Unique Molecular Identifier) extraction and validation
//!
//! Reads carry their UMI as the final [`UMI_LENGTH`] characters of the query
//! name (e.g. `NS500451:154:HWKTMBGXX:1:11101:24260:1121:CTGTTCAC`). Only
//! UMIs from a known, enumerated list are accepted.
//!
//! # Example
//! ```
//! use deduper_rs::umi::{extract_umi, UmiWhitelist};
//!
//! let whitelist: UmiWhitelist = ["CTGTTCAC", "AACGCCAT"].into_iter().collect();
//! let umi = extract_umi("NS500451:154:HWKTMBGXX:1:11101:24260:1121:CTGTTCAC");
//! assert!(whitelist.contains(umi));
//! ```

use ahash::AHashSet;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of trailing query-name characters holding the UMI
pub const UMI_LENGTH: usize = 8;

/// Return the UMI suffix of a query name.
///
/// Names shorter than [`UMI_LENGTH`] are returned whole.
#[inline]
pub fn extract_umi(qname: &str) -> &str {
    match qname.char_indices().rev().nth(UMI_LENGTH - 1) {
        Some((start, _)) => &qname[start..],
        None => qname,
    }
}

/// Set of valid UMIs, compared case-sensitively
#[derive(Debug, Clone, Default)]
pub struct UmiWhitelist {
    umis: AHashSet<String>,
}

impl UmiWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a UMI; surrounding whitespace is trimmed and blanks are ignored
    pub fn insert(&mut self, umi: &str) {
        let umi = umi.trim();
        if !umi.is_empty() {
            self.umis.insert(umi.to_string());
        }
    }

    #[inline]
    pub fn contains(&self, umi: &str) -> bool {
        self.umis.contains(umi)
    }

    pub fn len(&self) -> usize {
        self.umis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.umis.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for UmiWhitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut whitelist = UmiWhitelist::new();
        for umi in iter {
            whitelist.insert(umi.as_ref());
        }
        whitelist
    }
}

/// Load the UMI list from a text file
///
/// Reads a text file with one UMI per line. Lines are trimmed and blank
/// lines are skipped.
///
/// # Arguments
/// * `path` - Path to the UMI list
///
/// # Returns
/// The loaded whitelist
pub fn load_umi_list<P: AsRef<Path>>(path: P) -> Result<UmiWhitelist> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open UMI list {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut whitelist = UmiWhitelist::new();
    for line in reader.lines() {
        let umi = line.context("Failed to read UMI list line")?;
        whitelist.insert(&umi);
    }

    Ok(whitelist)
}
