//! Overlap graph over oriented segments.
//!
//! Every segment contributes two vertices, one per strand. A position on a
//! vertex is a [`Loc`], packed as `vertex << 32 | offset` so that sorting
//! by key groups positions by vertex and then by how far along the
//! oriented vertex they lie. Offsets on a negative vertex are measured
//! from the end of the forward segment.
//!
//! Arcs are kept in one array sorted by `(src, dst)`. All arcs leaving a
//! vertex at or after some offset therefore form a contiguous slice, which
//! is the only traversal primitive the search needs.

mod overlap;
pub mod seq;

use std::fmt;
use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{GfaError, Result};

use overlap::{Overlap, Side};

/// An oriented segment: `segment_index * 2 + is_negative`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Vertex for `seg` on the given strand.
    pub fn new(seg: usize, neg: bool) -> Self {
        VertexId((seg as u32) << 1 | u32::from(neg))
    }

    /// Index of the underlying segment.
    pub fn segment(self) -> usize {
        (self.0 >> 1) as usize
    }

    /// True on the reverse-complement strand.
    pub fn is_negative(self) -> bool {
        self.0 & 1 == 1
    }

    /// The same segment on the opposite strand.
    pub fn inverse(self) -> Self {
        VertexId(self.0 ^ 1)
    }

    /// Strand sign as written in segment references.
    pub fn sign(self) -> char {
        if self.is_negative() {
            '-'
        } else {
            '+'
        }
    }
}

/// A position on an oriented vertex, packed into a sortable key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Loc(pub u64);

impl Loc {
    /// Packs `vertex` and `offset`.
    pub fn new(vertex: VertexId, offset: u32) -> Self {
        Loc(u64::from(vertex.0) << 32 | u64::from(offset))
    }

    /// The vertex part of the key.
    pub fn vertex(self) -> VertexId {
        VertexId((self.0 >> 32) as u32)
    }

    /// Offset along the oriented vertex.
    pub fn offset(self) -> u32 {
        self.0 as u32
    }

    /// First key of the vertex following this one.
    fn next_vertex(self) -> Loc {
        Loc((self.0 >> 32).saturating_add(1) << 32)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.vertex();
        write!(f, "#{}{}:{}", v.segment(), v.sign(), self.offset())
    }
}

/// A jump from one vertex location to another.
///
/// Ordering is by source key, then destination key, which is the order
/// arcs are stored in.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Arc {
    /// Location the arc departs from.
    pub src: Loc,
    /// Location the arc lands on.
    pub dst: Loc,
}

impl Arc {
    /// Creates an arc.
    pub fn new(src: Loc, dst: Loc) -> Self {
        Arc { src, dst }
    }
}

impl fmt::Display for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// A named sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Unique segment name.
    pub name: String,
    /// Sequence length; always equals `data.len()` once added to a graph.
    pub len: u32,
    /// Forward-strand nucleotides.
    pub data: Vec<u8>,
}

impl Segment {
    /// Creates a segment whose length is that of `data`.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let declared = data.len() as u64;
        Self::with_length(name, declared, data)
    }

    /// Creates a segment with an explicitly declared length, which must
    /// match the sequence.
    pub fn with_length(
        name: impl Into<String>,
        declared: u64,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let name = name.into();
        let data = data.into();
        let actual = data.len() as u64;
        if declared != actual {
            return Err(GfaError::LengthMismatch {
                name,
                declared,
                actual,
            });
        }
        if !data.is_ascii() {
            return Err(GfaError::NonAsciiSequence(name));
        }
        let len = u32::try_from(declared).map_err(|_| GfaError::SegmentTooLong(name.clone()))?;
        Ok(Segment { name, len, data })
    }

    /// Appends `NAME±` for the given strand.
    pub fn write_vertex(&self, out: &mut String, neg: bool) {
        out.push_str(&self.name);
        out.push(if neg { '-' } else { '+' });
    }
}

/// Segments plus the sorted arc array linking their vertices.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    segments: Vec<Segment>,
    names: FxHashMap<String, usize>,
    arcs: Vec<Arc>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a segment and returns its index.
    pub fn add_segment(&mut self, segment: Segment) -> Result<usize> {
        if segment.name.is_empty() {
            return Err(GfaError::EmptySegmentName);
        }
        if segment.data.len() as u64 != u64::from(segment.len) {
            return Err(GfaError::LengthMismatch {
                name: segment.name,
                declared: u64::from(segment.len),
                actual: segment.data.len() as u64,
            });
        }
        if !segment.data.is_ascii() {
            return Err(GfaError::NonAsciiSequence(segment.name));
        }
        if self.names.contains_key(&segment.name) {
            return Err(GfaError::DuplicateSegment(segment.name));
        }
        let ix = self.segments.len();
        if ix >= (u32::MAX >> 1) as usize {
            return Err(GfaError::Invariant("segment index space exhausted"));
        }
        trace!(segment = %segment.name, ix, len = segment.len, "graph.segment.added");
        self.names.insert(segment.name.clone(), ix);
        self.segments.push(segment);
        Ok(ix)
    }

    /// All segments in insertion order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment at `ix`, if any.
    pub fn segment(&self, ix: usize) -> Option<&Segment> {
        self.segments.get(ix)
    }

    /// Index of the segment called `name`, if any.
    pub fn find_segment_ix(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Index of the segment called `name`.
    pub fn segment_ix(&self, name: &str) -> Result<usize> {
        self.find_segment_ix(name)
            .ok_or_else(|| GfaError::UnknownSegment(name.to_string()))
    }

    /// Length of the segment behind `vertex`, or 0 for an unknown vertex.
    pub fn vertex_len(&self, vertex: VertexId) -> u32 {
        self.segment(vertex.segment()).map_or(0, |s| s.len)
    }

    /// Resolves a reference such as `s1+` or `s1-` to a vertex.
    pub fn vertex(&self, reference: &str) -> Result<VertexId> {
        let neg = match reference.as_bytes().last() {
            Some(b'+') => false,
            Some(b'-') => true,
            _ => return Err(GfaError::MissingStrand(reference.to_string())),
        };
        let name = &reference[..reference.len() - 1];
        Ok(VertexId::new(self.segment_ix(name)?, neg))
    }

    /// Adds an edge between two oriented segments.
    ///
    /// Overlap bounds are forward coordinates on each segment. The edge is
    /// validated as a whole before any arc is inserted.
    pub fn add_edge(
        &mut self,
        src_ref: &str,
        src_beg: u64,
        src_end: u64,
        dst_ref: &str,
        dst_beg: u64,
        dst_end: u64,
    ) -> Result<()> {
        let src = self.side(src_ref, src_beg, src_end)?;
        let dst = self.side(dst_ref, dst_beg, dst_end)?;
        let arcs = Overlap::new(src, dst)?.arcs();
        debug!(src = src_ref, dst = dst_ref, arcs = arcs.len(), "graph.edge.added");
        for arc in arcs {
            self.insert_arc(arc);
        }
        Ok(())
    }

    fn side<'r>(&self, reference: &'r str, beg: u64, end: u64) -> Result<Side<'r>> {
        let vertex = self.vertex(reference)?;
        let len = self.vertex_len(vertex);
        let beyond = || GfaError::invalid_overlap(reference, "begin or end beyond segment length");
        Ok(Side {
            reference,
            seg: vertex.segment(),
            len,
            beg: u32::try_from(beg).map_err(|_| beyond())?,
            end: u32::try_from(end).map_err(|_| beyond())?,
            neg: vertex.is_negative(),
        })
    }

    /// Inserts an arc after any equal arcs, keeping the array sorted.
    ///
    /// Both ends must lie on existing vertices, at most at the vertex end.
    pub fn add_arc(&mut self, arc: Arc) -> Result<()> {
        if !self.contains_loc(arc.src) || !self.contains_loc(arc.dst) {
            return Err(GfaError::ArcOutOfRange(self.arc_name(&arc)));
        }
        self.insert_arc(arc);
        Ok(())
    }

    pub(crate) fn insert_arc(&mut self, arc: Arc) {
        let at = self.arcs.partition_point(|a| *a <= arc);
        self.arcs.insert(at, arc);
    }

    fn contains_loc(&self, loc: Loc) -> bool {
        self.segment(loc.vertex().segment())
            .is_some_and(|s| loc.offset() <= s.len)
    }

    /// Removes one copy of `arc`. Returns whether it was present.
    pub fn remove_arc(&mut self, arc: &Arc) -> bool {
        match self.arcs.binary_search(arc) {
            Ok(at) => {
                self.arcs.remove(at);
                true
            }
            Err(_) => false,
        }
    }

    /// True if `arc` is in the graph.
    pub fn contains_arc(&self, arc: &Arc) -> bool {
        self.arcs.binary_search(arc).is_ok()
    }

    /// Arcs leaving `loc`'s vertex at or after `loc`'s offset.
    pub fn arcs_from(&self, loc: Loc) -> &[Arc] {
        let lo = self.arcs.partition_point(|a| a.src < loc);
        let next = loc.next_vertex();
        let hi = lo + self.arcs[lo..].partition_point(|a| a.src < next);
        &self.arcs[lo..hi]
    }

    /// All arcs leaving `vertex`.
    pub fn arcs_from_vertex(&self, vertex: VertexId) -> &[Arc] {
        self.arcs_from(Loc::new(vertex, 0))
    }

    /// Every arc in key order.
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Appends `NAME±:OFFSET` for `loc`.
    pub fn write_loc(&self, out: &mut String, loc: Loc) {
        let v = loc.vertex();
        match self.segment(v.segment()) {
            Some(seg) => seg.write_vertex(out, v.is_negative()),
            None => {
                let _ = write!(out, "#{}{}", v.segment(), v.sign());
            }
        }
        let _ = write!(out, ":{}", loc.offset());
    }

    /// Human-readable form of an arc, e.g. `s1+:2 -> s2+:0`.
    pub fn arc_name(&self, arc: &Arc) -> String {
        let mut out = String::new();
        self.write_loc(&mut out, arc.src);
        out.push_str(" -> ");
        self.write_loc(&mut out, arc.dst);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Graph {
        let mut g = Graph::new();
        g.add_segment(Segment::new("s1", "CAT").unwrap()).unwrap();
        g.add_segment(Segment::new("s2", "TAGT").unwrap()).unwrap();
        g
    }

    #[test]
    fn loc_packing() {
        let v = VertexId::new(3, true);
        assert_eq!(v.0, 7);
        assert_eq!(v.inverse(), VertexId::new(3, false));
        let loc = Loc::new(v, 42);
        assert_eq!(loc.0, 7u64 << 32 | 42);
        assert_eq!(loc.vertex(), v);
        assert_eq!(loc.offset(), 42);
        assert_eq!(loc.next_vertex(), Loc::new(VertexId(8), 0));
    }

    #[test]
    fn add_segment_rejects_bad_input() {
        let mut g = fixture();
        assert!(matches!(
            g.add_segment(Segment::new("", "A").unwrap()),
            Err(GfaError::EmptySegmentName)
        ));
        assert!(matches!(
            g.add_segment(Segment::new("s1", "A").unwrap()),
            Err(GfaError::DuplicateSegment(_))
        ));
        assert!(matches!(
            Segment::with_length("s3", 5, "ACG"),
            Err(GfaError::LengthMismatch { declared: 5, actual: 3, .. })
        ));
        let forged = Segment {
            name: "s4".into(),
            len: 9,
            data: b"AC".to_vec(),
        };
        assert!(matches!(g.add_segment(forged), Err(GfaError::LengthMismatch { .. })));
        assert!(matches!(
            Segment::new("s5", "AC\u{e9}".as_bytes()),
            Err(GfaError::NonAsciiSequence(_))
        ));
        let forged = Segment {
            name: "s6".into(),
            len: 2,
            data: vec![b'A', 0xe9],
        };
        assert!(matches!(g.add_segment(forged), Err(GfaError::NonAsciiSequence(_))));
        assert_eq!(g.segments().len(), 2);
        assert_eq!(g.segment_ix("s2").unwrap(), 1);
    }

    #[test]
    fn references_need_a_strand() {
        let g = fixture();
        assert!(matches!(g.vertex("s1"), Err(GfaError::MissingStrand(_))));
        assert!(matches!(g.vertex("s9+"), Err(GfaError::UnknownSegment(_))));
        assert_eq!(g.vertex("s2-").unwrap(), VertexId::new(1, true));
    }

    #[test]
    fn dovetail_edge_arcs() {
        let mut g = fixture();
        g.add_edge("s1+", 2, 3, "s2+", 0, 1).unwrap();
        let names: Vec<String> = g.arcs().iter().map(|a| g.arc_name(a)).collect();
        assert_eq!(
            names,
            vec![
                "s1+:2 -> s2+:0",
                "s1+:3 -> s2+:1",
                "s2-:3 -> s1-:0",
                "s2-:4 -> s1-:1",
            ]
        );
    }

    #[test]
    fn flipped_edge_gives_same_arcs() {
        let mut a = fixture();
        a.add_edge("s1+", 2, 3, "s2+", 0, 1).unwrap();
        let mut b = fixture();
        b.add_edge("s2+", 0, 1, "s1+", 2, 3).unwrap();
        assert_eq!(a.arcs(), b.arcs());
    }

    #[test]
    fn failed_edge_adds_nothing() {
        let mut g = fixture();
        assert!(g.add_edge("s1+", 2, 3, "s2+", 1, 2).is_err());
        assert!(g.add_edge("s1+", 2, 3, "s2+", 3, 4).is_err());
        assert!(g.add_edge("s1+", 2, 3, "s2+", 0, 9).is_err());
        assert_eq!(g.arc_count(), 0);
    }

    #[test]
    fn arcs_from_is_bounded_by_vertex() {
        let mut g = fixture();
        g.add_edge("s1+", 2, 3, "s2+", 0, 1).unwrap();
        let s1p = g.vertex("s1+").unwrap();
        assert_eq!(g.arcs_from(Loc::new(s1p, 0)).len(), 2);
        assert_eq!(g.arcs_from(Loc::new(s1p, 3)).len(), 1);
        assert!(g.arcs_from(Loc::new(s1p, 4)).is_empty());
        let s1n = g.vertex("s1-").unwrap();
        assert!(g.arcs_from_vertex(s1n).is_empty());
        let s2n = g.vertex("s2-").unwrap();
        assert_eq!(g.arcs_from(Loc::new(s2n, 4)).len(), 1);
    }

    #[test]
    fn add_and_remove_keep_order() {
        let mut g = fixture();
        let v = g.vertex("s1+").unwrap();
        let w = g.vertex("s2+").unwrap();
        let late = Arc::new(Loc::new(v, 2), Loc::new(w, 0));
        let early = Arc::new(Loc::new(v, 1), Loc::new(w, 3));
        g.add_arc(late).unwrap();
        g.add_arc(early).unwrap();
        g.add_arc(late).unwrap();
        assert_eq!(g.arcs(), &[early, late, late]);
        assert!(g.remove_arc(&late));
        assert_eq!(g.arcs(), &[early, late]);
        assert!(g.remove_arc(&late));
        assert!(!g.remove_arc(&late));
        assert!(g.contains_arc(&early));
    }

    #[test]
    fn add_arc_rejects_locations_off_the_graph() {
        let mut g = fixture();
        let s1 = g.vertex("s1+").unwrap();
        let s2 = g.vertex("s2-").unwrap();
        let past_end = Arc::new(Loc::new(s1, 4), Loc::new(s2, 0));
        let err = g.add_arc(past_end).unwrap_err();
        assert!(matches!(err, GfaError::ArcOutOfRange(_)), "{err}");
        assert!(err.to_string().contains("s1+:4 -> s2-:0"), "{err}");

        let nowhere = Arc::new(Loc::new(s1, 3), Loc::new(VertexId::new(7, false), 0));
        assert!(matches!(g.add_arc(nowhere), Err(GfaError::ArcOutOfRange(_))));
        assert_eq!(g.arc_count(), 0);

        g.add_arc(Arc::new(Loc::new(s1, 3), Loc::new(s2, 4))).unwrap();
        assert_eq!(g.arc_count(), 1);
    }
}
