//! Crate error type.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GfaError>;

/// Errors raised while building a graph, resolving targets or searching.
#[derive(Debug, Error)]
pub enum GfaError {
    /// I/O failure while reading GFA or FASTA input.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A segment was added without a name.
    #[error("segment name is empty")]
    EmptySegmentName,
    /// The declared segment length differs from its sequence.
    #[error("segment length ({declared}) differs from sequence length ({actual}) for {name}")]
    LengthMismatch {
        /// Segment name.
        name: String,
        /// Length declared by the caller or the GFA.
        declared: u64,
        /// Length of the supplied sequence.
        actual: u64,
    },
    /// Sequence data holds bytes outside ASCII.
    #[error("segment {0} has non-ASCII sequence data")]
    NonAsciiSequence(String),
    /// Offsets on a vertex are 32 bits wide.
    #[error("segment {0} is too long to index")]
    SegmentTooLong(String),
    /// A segment with this name already exists.
    #[error("duplicate segment name: {0}")]
    DuplicateSegment(String),
    /// Lookup of a segment name failed.
    #[error("unknown segment: {0}")]
    UnknownSegment(String),
    /// A segment reference lacks its trailing `+` or `-`.
    #[error("sequence reference without sign: {0}")]
    MissingStrand(String),
    /// One side of an edge has inconsistent or unsupported overlap geometry.
    #[error("invalid overlap on {reference}: {reason}")]
    InvalidOverlap {
        /// Oriented segment reference, e.g. `s1+`.
        reference: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// Both sides are end-anchored but cannot be joined head to tail.
    #[error("impossible edge: {src} to {dst}")]
    ImpossibleEdge {
        /// Source reference.
        src: String,
        /// Destination reference.
        dst: String,
    },
    /// Region reference did not match `NAME[:BEG[:END]]STRAND`.
    #[error("invalid target syntax: {0}")]
    InvalidTarget(String),
    /// Region reference lies outside its contig.
    #[error("target {reference} out of range: {reason}")]
    TargetOutOfRange {
        /// Region reference as given.
        reference: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Malformed GFA or FASTA content.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// One-based line number in the GFA input (0 for FASTA).
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// A GFA segment received no sequence from the GFA nor the FASTA.
    #[error("no sequence data for segment {0}")]
    MissingSequence(String),
    /// An arc end lies on an unknown vertex or past the end of one.
    #[error("arc outside the graph: {0}")]
    ArcOutOfRange(String),
    /// A search was started from an arc that is not in the graph.
    #[error("arc not found in graph: {0}")]
    UnknownArc(String),
    /// Internal consistency check failed; indicates a bug.
    #[error("invariant violated: {0}")]
    Invariant(&'static str),
}

impl GfaError {
    pub(crate) fn invalid_overlap(reference: &str, reason: &'static str) -> Self {
        GfaError::InvalidOverlap {
            reference: reference.to_string(),
            reason,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        GfaError::Parse {
            line,
            message: message.into(),
        }
    }

    /// True for errors that indicate a bug rather than bad input.
    pub fn is_invariant(&self) -> bool {
        matches!(self, GfaError::Invariant(_))
    }
}
