pub mod cigar;
pub mod config;
pub mod dedup;
pub mod error;
pub mod position;
pub mod sam;
pub mod stream;
pub mod umi;

// Re-export main functions
pub use config::{deduped_output_path, DedupConfig};
pub use dedup::{Decision, DedupOptions, DuplicateClassifier, DuplicateKey, RunStatistics};
pub use error::DedupError;
pub use position::{correct_position, ReverseArithmetic, Strand};
pub use stream::{deduplicate_sam, deduplicate_sam_file, DedupReport};
pub use umi::{extract_umi, load_umi_list, UmiWhitelist};
