//! Search endpoints.
//!
//! A region such as `ctg:100:250+` is turned into arcs hanging off a
//! shared terminator segment `__T__`. Start regions are entered from
//! `__T__+:0`, end regions lead to `__T__+:1`, so a search always runs
//! from one terminator arc to another. A non-empty region gets its own
//! target segment holding the region's forward sequence; a point region
//! connects the terminator straight to the contig.

use std::fmt;

use smallvec::SmallVec;
use tracing::debug;

use crate::error::{GfaError, Result};
use crate::graph::{Arc, Graph, Loc, Segment, VertexId};

/// Name of the terminator segment.
pub const TERMINATOR: &str = "__T__";

/// Which end of the search a target is.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Role {
    /// Paths leave from this region.
    Start,
    /// Paths arrive at this region.
    End,
}

/// A position in a region reference: a number or `$` for the contig end.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Pos {
    /// Zero-based forward offset.
    At(u64),
    /// The contig length.
    End,
}

impl Pos {
    fn parse(text: &str) -> Option<Pos> {
        if text == "$" {
            return Some(Pos::End);
        }
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse().ok().map(Pos::At)
    }

    fn resolve(self, len: u64) -> u64 {
        match self {
            Pos::At(p) => p,
            Pos::End => len,
        }
    }
}

/// Parsed `NAME[:BEG[:END]]±` reference.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Region {
    /// Contig name.
    pub contig: String,
    /// Begin position, if given.
    pub beg: Option<Pos>,
    /// End position, if given.
    pub end: Option<Pos>,
    /// Reverse strand.
    pub neg: bool,
}

impl Region {
    /// Parses a region reference.
    pub fn parse(reference: &str) -> Result<Region> {
        let invalid = || GfaError::InvalidTarget(reference.to_string());
        let (body, neg) = match reference.as_bytes().last() {
            Some(b'+') => (&reference[..reference.len() - 1], false),
            Some(b'-') => (&reference[..reference.len() - 1], true),
            _ => return Err(invalid()),
        };
        let mut parts = body.split(':');
        let contig = parts.next().unwrap_or_default();
        if contig.is_empty() || contig.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let beg = parts.next().map(|p| Pos::parse(p).ok_or_else(invalid)).transpose()?;
        let end = parts.next().map(|p| Pos::parse(p).ok_or_else(invalid)).transpose()?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Region {
            contig: contig.to_string(),
            beg,
            end,
            neg,
        })
    }

    /// Forward `(beg, end)` on a contig of length `len`.
    ///
    /// No positions means the whole contig; a single position means the
    /// point at that position.
    pub fn bounds(&self, len: u64) -> (u64, u64) {
        match (self.beg, self.end) {
            (None, _) => (0, len),
            (Some(b), None) => (b.resolve(len), b.resolve(len)),
            (Some(b), Some(e)) => (b.resolve(len), e.resolve(len)),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contig)?;
        for pos in [self.beg, self.end].into_iter().flatten() {
            match pos {
                Pos::At(p) => write!(f, ":{p}")?,
                Pos::End => f.write_str(":$")?,
            }
        }
        f.write_str(if self.neg { "-" } else { "+" })
    }
}

/// One search endpoint, owning the arcs it put in the graph.
#[derive(Clone, Debug)]
pub struct Target {
    role: Role,
    added: SmallVec<[Arc; 2]>,
    arc: Option<Arc>,
}

impl Target {
    /// Creates an unset target.
    pub fn new(role: Role) -> Self {
        Target {
            role,
            added: SmallVec::new(),
            arc: None,
        }
    }

    /// The terminator arc of the last successful `set`.
    pub fn arc(&self) -> Option<Arc> {
        self.arc
    }

    /// Removes the arcs added by the last `set`. Segments stay.
    pub fn clear(&mut self, graph: &mut Graph) {
        for arc in self.added.drain(..) {
            graph.remove_arc(&arc);
        }
        self.arc = None;
    }

    /// Points this target at `reference` and returns its terminator arc.
    ///
    /// On error the graph and the previous setting are left untouched.
    pub fn set(&mut self, graph: &mut Graph, reference: &str) -> Result<Arc> {
        let region = Region::parse(reference)?;
        let ctg_ix = graph.segment_ix(&region.contig)?;
        let len = graph.segment(ctg_ix).map_or(0, |s| u64::from(s.len));
        let (beg, end) = region.bounds(len);
        if beg > len {
            return Err(out_of_range(reference, format!("begin {beg} beyond length {len}")));
        }
        if end > len {
            return Err(out_of_range(reference, format!("end {end} beyond length {len}")));
        }
        if beg > end {
            return Err(out_of_range(reference, format!("begin {beg} past end {end}")));
        }
        debug!(reference, contig = %region.contig, beg, end, neg = region.neg, "target.resolved");

        let ter_ix = match graph.find_segment_ix(TERMINATOR) {
            Some(ix) => ix,
            None => graph.add_segment(Segment::new(TERMINATOR, "X")?)?,
        };
        let ter = VertexId::new(ter_ix, false);
        let ctg = VertexId::new(ctg_ix, region.neg);

        // offsets along the oriented contig
        let (len, beg, end) = (len as u32, beg as u32, end as u32);
        let (entry, exit) = if region.neg {
            (len - end, len - beg)
        } else {
            (beg, end)
        };

        let mut arcs: SmallVec<[Arc; 2]> = SmallVec::new();
        if beg == end {
            let at = Loc::new(ctg, entry);
            arcs.push(match self.role {
                Role::Start => Arc::new(Loc::new(ter, 0), at),
                Role::End => Arc::new(at, Loc::new(ter, 1)),
            });
        } else {
            let name = format!("{}:{beg}:{end}", region.contig);
            let tgt_ix = match graph.find_segment_ix(&name) {
                Some(ix) => ix,
                None => {
                    let data = graph
                        .segment(ctg_ix)
                        .map(|s| s.data[beg as usize..end as usize].to_vec())
                        .unwrap_or_default();
                    debug!(segment = %name, "target.segment.added");
                    graph.add_segment(Segment::new(name, data)?)?
                }
            };
            let tgt = VertexId::new(tgt_ix, region.neg);
            let tlen = end - beg;
            match self.role {
                Role::Start => {
                    arcs.push(Arc::new(Loc::new(ter, 0), Loc::new(tgt, 0)));
                    arcs.push(Arc::new(Loc::new(tgt, tlen), Loc::new(ctg, exit)));
                }
                Role::End => {
                    arcs.push(Arc::new(Loc::new(tgt, tlen), Loc::new(ter, 1)));
                    arcs.push(Arc::new(Loc::new(ctg, entry), Loc::new(tgt, 0)));
                }
            }
        }

        self.clear(graph);
        for arc in &arcs {
            graph.insert_arc(*arc);
        }
        let arc = arcs[0];
        debug!(arc = %graph.arc_name(&arc), "target.set");
        self.added = arcs;
        self.arc = Some(arc);
        Ok(arc)
    }
}

fn out_of_range(reference: &str, reason: String) -> GfaError {
    GfaError::TargetOutOfRange {
        reference: reference.to_string(),
        reason,
    }
}
