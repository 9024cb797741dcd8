//! CIGAR tokenizing.
//!
//! A CIGAR string is read once, left to right, into `(length, operator)`
//! pairs. Fragments that are not a well-formed `<digits><op>` token are
//! dropped, so tokenizing never fails.

/// CIGAR operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarKind {
    /// `M`, `=` or `X`
    Match,
    /// `I`
    Insertion,
    /// `D`
    Deletion,
    /// `N`
    Skip,
    /// `S`
    SoftClip,
    /// `H`
    HardClip,
    /// `P`
    Pad,
}

impl CigarKind {
    fn from_byte(op: u8) -> Option<Self> {
        match op {
            b'M' | b'=' | b'X' => Some(CigarKind::Match),
            b'I' => Some(CigarKind::Insertion),
            b'D' => Some(CigarKind::Deletion),
            b'N' => Some(CigarKind::Skip),
            b'S' => Some(CigarKind::SoftClip),
            b'H' => Some(CigarKind::HardClip),
            b'P' => Some(CigarKind::Pad),
            _ => None,
        }
    }
}

/// A single CIGAR operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    pub len: u32,
    pub kind: CigarKind,
}

impl CigarOp {
    pub fn new(len: u32, kind: CigarKind) -> Self {
        CigarOp { len, kind }
    }
}

/// Tokenize a CIGAR string.
///
/// `*` and the empty string yield no operations.
///
/// # Example
/// ```
/// use deduper_rs::cigar::{parse_cigar, CigarKind, CigarOp};
///
/// let ops = parse_cigar("10S90M");
/// assert_eq!(ops, vec![
///     CigarOp::new(10, CigarKind::SoftClip),
///     CigarOp::new(90, CigarKind::Match),
/// ]);
/// ```
pub fn parse_cigar(cigar: &str) -> Vec<CigarOp> {
    let mut ops = Vec::new();
    let mut len: Option<u32> = None;

    for &byte in cigar.as_bytes() {
        if byte.is_ascii_digit() {
            let digit = (byte - b'0') as u32;
            len = Some(len.unwrap_or(0).saturating_mul(10).saturating_add(digit));
            continue;
        }

        if let (Some(n), Some(kind)) = (len, CigarKind::from_byte(byte)) {
            ops.push(CigarOp::new(n, kind));
        }
        len = None;
    }

    ops
}
