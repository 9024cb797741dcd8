//! Reference-based PCR duplicate classification
//!
//! A read is a PCR duplicate of an earlier read when both share the same
//! [`DuplicateKey`]: UMI, strand, chromosome and strand-corrected 5′ start.
//!
//! # Algorithm
//! 1. Count the record and validate its UMI against the whitelist
//! 2. Correct the 5′ start for strand and soft clipping
//! 3. Look the key up in the uniqueness window; a hit is a duplicate
//! 4. On the first emitted record of a chromosome, reset the window
//!
//! Input is assumed to be coordinate-sorted, so every chromosome arrives as
//! one contiguous block and the window only needs to hold the keys of the
//! current chromosome. If that does not hold, [`WindowMode::Global`] keeps
//! every key for the whole run instead.

use ahash::AHashSet;
use log::{debug, warn};

use crate::cigar::parse_cigar;
use crate::position::{correct_position, ReverseArithmetic, Strand};
use crate::sam::AlignmentRecord;
use crate::umi::{extract_umi, UmiWhitelist};

/// Identity of a molecule. Two reads with equal keys are PCR copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    pub umi: String,
    pub strand: Strand,
    pub chromosome: String,
    pub position: i64,
}

/// Scope of the uniqueness window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum WindowMode {
    /// Reset whenever a new chromosome is first seen; requires sorted input
    #[default]
    PerChromosome,
    /// Never reset; safe for unsorted input but holds every key in memory
    Global,
}

/// What happens to the record that opens a new chromosome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BoundaryEmission {
    /// Written once, like every other unique record
    #[default]
    Single,
    /// Written twice, as the earlier Python deduper did
    Legacy,
}

/// Classification knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupOptions {
    pub window: WindowMode,
    pub reverse_arithmetic: ReverseArithmetic,
    pub boundary_emission: BoundaryEmission,
}

impl DedupOptions {
    /// Options matching the earlier Python deduper's classification: running-total
    /// reverse-strand arithmetic and a doubled first record on each new chromosome
    pub fn legacy() -> Self {
        DedupOptions {
            window: WindowMode::PerChromosome,
            reverse_arithmetic: ReverseArithmetic::Legacy,
            boundary_emission: BoundaryEmission::Legacy,
        }
    }
}

/// Per-record outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First sighting of the molecule; write the record
    Emit,
    /// First record of a new chromosome in legacy boundary mode; write it twice
    EmitTwice,
    /// PCR copy of an earlier record; drop it
    Duplicate,
    /// UMI not in the whitelist; drop it
    InvalidUmi,
}

impl Decision {
    /// Number of times the record is written to output
    pub fn copies(&self) -> usize {
        match self {
            Decision::Emit => 1,
            Decision::EmitTwice => 2,
            Decision::Duplicate | Decision::InvalidUmi => 0,
        }
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Alignment records seen, including those with invalid UMIs
    pub total_records: usize,
    pub duplicate_records: usize,
    pub invalid_umi_records: usize,
    /// Lines written, counting both copies of a legacy boundary record
    pub emitted_records: usize,
    /// Times a chromosome reappeared after another one had started
    pub chromosome_revisits: usize,
}

impl RunStatistics {
    /// Percentage of duplicates among all records, rounded to two decimals
    ///
    /// Returns `None` when no alignment records were processed.
    pub fn duplicate_rate(&self) -> Option<f64> {
        if self.total_records == 0 {
            return None;
        }
        let percent = self.duplicate_records as f64 / self.total_records as f64 * 100.0;
        Some((percent * 100.0).round() / 100.0)
    }
}

/// Mutable state of one pass over the input
#[derive(Debug, Default)]
struct RunState {
    window: AHashSet<DuplicateKey>,
    chromosomes_seen: AHashSet<String>,
    current_chromosome: Option<String>,
    stats: RunStatistics,
}

/// Stateful duplicate classifier for a single stream pass
pub struct DuplicateClassifier<'a> {
    whitelist: &'a UmiWhitelist,
    options: DedupOptions,
    state: RunState,
}

impl<'a> DuplicateClassifier<'a> {
    pub fn new(whitelist: &'a UmiWhitelist, options: DedupOptions) -> Self {
        DuplicateClassifier {
            whitelist,
            options,
            state: RunState::default(),
        }
    }

    pub fn options(&self) -> DedupOptions {
        self.options
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.state.stats
    }

    /// Number of keys currently held in the uniqueness window
    pub fn window_len(&self) -> usize {
        self.state.window.len()
    }

    pub fn into_stats(self) -> RunStatistics {
        self.state.stats
    }

    /// Classify one alignment record and update the run state
    pub fn classify(&mut self, record: &AlignmentRecord<'_>) -> Decision {
        let state = &mut self.state;
        state.stats.total_records += 1;

        // The first chromosome never triggers a reset
        if state.stats.total_records == 1 {
            state.chromosomes_seen.insert(record.rname.to_string());
        }
        track_contiguity(state, record.rname, self.options.window);

        let umi = extract_umi(record.qname);
        if !self.whitelist.contains(umi) {
            state.stats.invalid_umi_records += 1;
            return Decision::InvalidUmi;
        }

        let ops = parse_cigar(record.cigar);
        let key = DuplicateKey {
            umi: umi.to_string(),
            strand: Strand::from_flag(record.flag),
            chromosome: record.rname.to_string(),
            position: correct_position(record.flag, record.pos, &ops, self.options.reverse_arithmetic),
        };

        if state.window.contains(&key) {
            state.stats.duplicate_records += 1;
            return Decision::Duplicate;
        }

        let mut decision = Decision::Emit;
        if !state.chromosomes_seen.contains(record.rname) {
            state.chromosomes_seen.insert(record.rname.to_string());
            if self.options.window == WindowMode::PerChromosome {
                debug!(
                    "Chromosome {} started; releasing {} keys",
                    record.rname,
                    state.window.len()
                );
                state.window.clear();
            }
            if self.options.boundary_emission == BoundaryEmission::Legacy {
                decision = Decision::EmitTwice;
            }
        }

        state.window.insert(key);
        state.stats.emitted_records += decision.copies();
        decision
    }
}

/// Record chromosome switches and flag any that return to an earlier chromosome
fn track_contiguity(state: &mut RunState, chromosome: &str, window: WindowMode) {
    if state.current_chromosome.as_deref() == Some(chromosome) {
        return;
    }

    if state.chromosomes_seen.contains(chromosome) && state.current_chromosome.is_some() {
        state.stats.chromosome_revisits += 1;
        if state.stats.chromosome_revisits == 1 && window == WindowMode::PerChromosome {
            warn!(
                "Chromosome {} reappeared after {}; input is not sorted by chromosome and duplicates may be missed (use --window global)",
                chromosome,
                state.current_chromosome.as_deref().unwrap_or("*")
            );
        }
    }

    state.current_chromosome = Some(chromosome.to_string());
}
