//! GFA1/GFA2 and FASTA input.
//!
//! Reading happens in two steps. [`parse_gfa`] collects segment and edge
//! records without needing sequence data, [`merge_fasta`] fills in or
//! replaces sequences, and [`GfaRecords::into_graph`] validates the lot
//! and builds a [`Graph`]. GFA1 links only state overlap lengths, so their
//! coordinates are worked out once segment lengths are final.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use bio::io::fasta;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::error::{GfaError, Result};
use crate::graph::{Graph, Segment};

/// Reader behaviour switches.
#[derive(Clone, Debug)]
pub struct GfaOptions {
    /// Let FASTA records replace sequences already present in the GFA.
    /// When unset, FASTA only fills segments whose sequence is `*`.
    pub fasta_overrides: bool,
    /// Fail on containment (`C`) lines instead of skipping them.
    pub reject_containments: bool,
}

impl Default for GfaOptions {
    fn default() -> Self {
        Self {
            fasta_overrides: true,
            reject_containments: false,
        }
    }
}

/// An `S` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentRecord {
    /// Segment name.
    pub name: String,
    /// Declared length: the GFA2 length field or a GFA1 `LN` tag.
    pub len: Option<u64>,
    /// Sequence, if the line had one.
    pub data: Option<Vec<u8>>,
    /// Line number in the GFA.
    pub line: usize,
}

/// Overlap placement of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Span {
    /// GFA2 forward coordinates on both segments.
    Positions {
        /// Begin on the source.
        src_beg: u64,
        /// End on the source.
        src_end: u64,
        /// Begin on the destination.
        dst_beg: u64,
        /// End on the destination.
        dst_end: u64,
    },
    /// GFA1 overlap lengths, anchored at the oriented source end and the
    /// oriented destination start.
    Link {
        /// Bases of the source in the overlap.
        src_len: u64,
        /// Bases of the destination in the overlap.
        dst_len: u64,
    },
}

/// An `E` or `L` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeRecord {
    /// Oriented source reference, e.g. `s1+`.
    pub src: String,
    /// Oriented destination reference.
    pub dst: String,
    /// Where the overlap sits.
    pub span: Span,
    /// Line number in the GFA.
    pub line: usize,
}

/// Everything read from a GFA, plus any FASTA merged into it.
#[derive(Clone, Debug, Default)]
pub struct GfaRecords {
    /// Segments in file order.
    pub segments: Vec<SegmentRecord>,
    /// Edges in file order.
    pub edges: Vec<EdgeRecord>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Dialect {
    Unknown,
    V1,
    V2,
}

/// Parses GFA text.
pub fn parse_gfa<R: BufRead>(reader: R, options: &GfaOptions) -> Result<GfaRecords> {
    let mut records = GfaRecords::default();
    let mut dialect = Dialect::Unknown;
    let mut skipped = 0usize;

    for (ix, line) in reader.lines().enumerate() {
        let line = line?;
        let lno = ix + 1;
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "H" => {
                if let Some(vn) = fields.iter().find_map(|f| f.strip_prefix("VN:Z:")) {
                    dialect = if vn.starts_with('2') { Dialect::V2 } else { Dialect::V1 };
                    debug!(version = vn, line = lno, "gfa.header");
                }
            }
            "S" => records.segments.push(parse_segment(&fields, dialect, lno)?),
            "E" => records.edges.push(parse_gfa2_edge(&fields, lno)?),
            "L" => records.edges.push(parse_link(&fields, lno)?),
            "C" => {
                if options.reject_containments {
                    return Err(GfaError::parse(lno, "containment lines are not supported"));
                }
                warn!(line = lno, "gfa.containment.skipped");
            }
            _ => skipped += 1,
        }
    }

    debug!(
        segments = records.segments.len(),
        edges = records.edges.len(),
        skipped,
        "gfa.parsed"
    );
    Ok(records)
}

fn field<'a>(fields: &[&'a str], ix: usize, lno: usize, what: &str) -> Result<&'a str> {
    fields
        .get(ix)
        .copied()
        .ok_or_else(|| GfaError::parse(lno, format!("missing {what}")))
}

fn number(text: &str, lno: usize, what: &str) -> Result<u64> {
    text.parse()
        .map_err(|_| GfaError::parse(lno, format!("invalid {what}: {text}")))
}

fn sequence(text: &str) -> Option<Vec<u8>> {
    (text != "*").then(|| text.as_bytes().to_vec())
}

fn parse_segment(fields: &[&str], dialect: Dialect, lno: usize) -> Result<SegmentRecord> {
    let name = field(fields, 1, lno, "segment name")?.to_string();
    if name.is_empty() {
        return Err(GfaError::EmptySegmentName);
    }
    let looks_v2 = fields.len() >= 4
        && !fields[2].is_empty()
        && fields[2].bytes().all(|b| b.is_ascii_digit());
    let v2 = match dialect {
        Dialect::V2 => true,
        Dialect::V1 => false,
        Dialect::Unknown => looks_v2,
    };

    if v2 {
        let len = number(field(fields, 2, lno, "segment length")?, lno, "segment length")?;
        let data = sequence(field(fields, 3, lno, "segment sequence")?);
        Ok(SegmentRecord { name, len: Some(len), data, line: lno })
    } else {
        let data = sequence(field(fields, 2, lno, "segment sequence")?);
        let len = fields[3.min(fields.len())..]
            .iter()
            .find_map(|t| t.strip_prefix("LN:i:"))
            .map(|t| number(t, lno, "LN tag"))
            .transpose()?;
        Ok(SegmentRecord { name, len, data, line: lno })
    }
}

fn position(text: &str, lno: usize) -> Result<u64> {
    number(text.strip_suffix('$').unwrap_or(text), lno, "position")
}

fn parse_gfa2_edge(fields: &[&str], lno: usize) -> Result<EdgeRecord> {
    let src = field(fields, 2, lno, "source reference")?;
    let dst = field(fields, 3, lno, "destination reference")?;
    let span = Span::Positions {
        src_beg: position(field(fields, 4, lno, "source begin")?, lno)?,
        src_end: position(field(fields, 5, lno, "source end")?, lno)?,
        dst_beg: position(field(fields, 6, lno, "destination begin")?, lno)?,
        dst_end: position(field(fields, 7, lno, "destination end")?, lno)?,
    };
    Ok(EdgeRecord {
        src: src.to_string(),
        dst: dst.to_string(),
        span,
        line: lno,
    })
}

fn orient(fields: &[&str], ix: usize, lno: usize) -> Result<char> {
    match field(fields, ix, lno, "orientation")? {
        "+" => Ok('+'),
        "-" => Ok('-'),
        other => Err(GfaError::parse(lno, format!("invalid orientation: {other}"))),
    }
}

fn parse_link(fields: &[&str], lno: usize) -> Result<EdgeRecord> {
    let src = format!("{}{}", field(fields, 1, lno, "source name")?, orient(fields, 2, lno)?);
    let dst = format!("{}{}", field(fields, 3, lno, "destination name")?, orient(fields, 4, lno)?);
    let (src_len, dst_len) = cigar_overlap(fields.get(5).copied().unwrap_or("*"), lno)?;
    Ok(EdgeRecord {
        src,
        dst,
        span: Span::Link { src_len, dst_len },
        line: lno,
    })
}

/// Bases consumed on the source and destination by a link's CIGAR.
pub fn cigar_overlap(cigar: &str, lno: usize) -> Result<(u64, u64)> {
    if cigar == "*" || cigar.is_empty() {
        return Ok((0, 0));
    }
    let (mut src, mut dst) = (0u64, 0u64);
    let mut count: Option<u64> = None;
    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            let n = count.unwrap_or(0);
            count = n.checked_mul(10).and_then(|n| n.checked_add(u64::from(d)));
            if count.is_none() {
                return Err(GfaError::parse(lno, format!("CIGAR count overflow: {cigar}")));
            }
            continue;
        }
        let n = count
            .take()
            .ok_or_else(|| GfaError::parse(lno, format!("invalid CIGAR: {cigar}")))?;
        match c {
            'M' | '=' | 'X' => {
                src += n;
                dst += n;
            }
            'D' | 'N' => src += n,
            'I' | 'S' => dst += n,
            'H' | 'P' => {}
            _ => return Err(GfaError::parse(lno, format!("invalid CIGAR operation {c}: {cigar}"))),
        }
    }
    if count.is_some() {
        return Err(GfaError::parse(lno, format!("invalid CIGAR: {cigar}")));
    }
    Ok((src, dst))
}

/// Fills segment sequences from FASTA records keyed by id. Returns the
/// number of segments updated.
pub fn merge_fasta<R: Read>(
    records: &mut GfaRecords,
    reader: R,
    options: &GfaOptions,
) -> Result<usize> {
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    for (ix, seg) in records.segments.iter().enumerate() {
        index.entry(seg.name.clone()).or_insert(ix);
    }

    let mut merged = 0;
    for record in fasta::Reader::new(reader).records() {
        let record = record.map_err(|e| GfaError::parse(0, format!("FASTA: {e}")))?;
        let Some(&ix) = index.get(record.id()) else {
            debug!(id = record.id(), "gfa.fasta.unused");
            continue;
        };
        let seg = &mut records.segments[ix];
        if seg.data.is_some() && !options.fasta_overrides {
            continue;
        }
        seg.data = Some(record.seq().to_vec());
        merged += 1;
    }
    debug!(merged, "gfa.fasta.merged");
    Ok(merged)
}

impl GfaRecords {
    /// Adds all segments, then all edges, to a new graph.
    pub fn into_graph(self) -> Result<Graph> {
        let mut graph = Graph::new();
        for seg in self.segments {
            let data = seg
                .data
                .ok_or_else(|| GfaError::MissingSequence(seg.name.clone()))?;
            let declared = seg.len.unwrap_or(data.len() as u64);
            graph.add_segment(Segment::with_length(seg.name, declared, data)?)?;
        }
        for edge in &self.edges {
            let (sb, se, db, de) = resolve_span(&graph, edge)?;
            graph.add_edge(&edge.src, sb, se, &edge.dst, db, de).map_err(|e| {
                debug!(line = edge.line, error = %e, "gfa.edge.rejected");
                e
            })?;
        }
        info!(
            segments = graph.segments().len(),
            edges = self.edges.len(),
            arcs = graph.arc_count(),
            "gfa.graph.loaded"
        );
        Ok(graph)
    }
}

fn resolve_span(graph: &Graph, edge: &EdgeRecord) -> Result<(u64, u64, u64, u64)> {
    match edge.span {
        Span::Positions {
            src_beg,
            src_end,
            dst_beg,
            dst_end,
        } => Ok((src_beg, src_end, dst_beg, dst_end)),
        Span::Link { src_len, dst_len } => {
            let v = graph.vertex(&edge.src)?;
            let w = graph.vertex(&edge.dst)?;
            let (vlen, wlen) = (u64::from(graph.vertex_len(v)), u64::from(graph.vertex_len(w)));
            let too_long =
                |r: &str| GfaError::invalid_overlap(r, "overlap longer than segment");
            let vb = vlen.checked_sub(src_len).ok_or_else(|| too_long(&edge.src))?;
            let wb = wlen.checked_sub(dst_len).ok_or_else(|| too_long(&edge.dst))?;
            let (sb, se) = if v.is_negative() { (0, src_len) } else { (vb, vlen) };
            let (db, de) = if w.is_negative() { (wb, wlen) } else { (0, dst_len) };
            Ok((sb, se, db, de))
        }
    }
}

/// Reads a GFA file, and optionally a FASTA file, into a graph.
pub fn read_graph(gfa: &Path, fasta: Option<&Path>, options: &GfaOptions) -> Result<Graph> {
    let file = File::open(gfa).map_err(|e| annotate(e, gfa))?;
    let mut records = parse_gfa(BufReader::new(file), options)?;
    if let Some(path) = fasta {
        let file = File::open(path).map_err(|e| annotate(e, path))?;
        merge_fasta(&mut records, BufReader::new(file), options)?;
    }
    records.into_graph()
}

fn annotate(err: io::Error, path: &Path) -> GfaError {
    GfaError::Io(io::Error::new(err.kind(), format!("{}: {err}", path.display())))
}
