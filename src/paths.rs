//! Shared-prefix tree of paths through the graph.
//!
//! A path is stored as its final arc plus a link to the path it extends,
//! so all paths found by one search share their common prefixes. Between
//! two consecutive arcs the path rides along a single vertex; the ride
//! starts where the predecessor's arc landed and ends where the node's
//! own arc departs.

use std::fmt::Write as _;

use crate::error::{GfaError, Result};
use crate::graph::{seq, Arc, Graph, Loc};

/// Index of a path in a [`PathTree`]. `PathId::EMPTY` is the path with no
/// arcs.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct PathId(pub u32);

impl PathId {
    /// The empty path, predecessor of every start arc.
    pub const EMPTY: PathId = PathId(0);

    /// True for [`PathId::EMPTY`].
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node: the path `pre` followed by `arc`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PathNode {
    /// Path this one extends.
    pub pre: PathId,
    /// Last arc of the path.
    pub arc: Arc,
}

/// Arena of [`PathNode`]s over a graph.
#[derive(Debug)]
pub struct PathTree<'g> {
    graph: &'g Graph,
    nodes: Vec<PathNode>,
}

impl<'g> PathTree<'g> {
    /// Creates a tree holding only the empty path.
    pub fn new(graph: &'g Graph) -> Self {
        let mut tree = PathTree {
            graph,
            nodes: Vec::new(),
        };
        tree.clear();
        tree
    }

    /// Drops every path except the empty one.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(PathNode {
            pre: PathId::EMPTY,
            arc: Arc::new(Loc(0), Loc(0)),
        });
    }

    /// Number of non-empty paths.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// True when only the empty path exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node behind `path`. `None` for the empty path or an unknown id.
    pub fn node(&self, path: PathId) -> Option<&PathNode> {
        if path.is_empty() {
            None
        } else {
            self.nodes.get(path.index())
        }
    }

    /// Appends `arc` to `pre` and returns the new path.
    pub fn extend(&mut self, pre: PathId, arc: Arc) -> Result<PathId> {
        self.check_adjacent(pre, arc)?;
        let id = u32::try_from(self.nodes.len())
            .map_err(|_| GfaError::Invariant("path index space exhausted"))?;
        self.nodes.push(PathNode { pre, arc });
        Ok(PathId(id))
    }

    /// Rewrites `path` in place to be `pre` followed by `arc`.
    ///
    /// Paths extending `path` follow the change.
    pub fn relink(&mut self, path: PathId, pre: PathId, arc: Arc) -> Result<()> {
        if path.is_empty() || path.index() >= self.nodes.len() || pre == path {
            return Err(GfaError::Invariant("relink of an invalid path"));
        }
        self.check_adjacent(pre, arc)?;
        self.nodes[path.index()] = PathNode { pre, arc };
        Ok(())
    }

    fn check_adjacent(&self, pre: PathId, arc: Arc) -> Result<()> {
        if pre.index() >= self.nodes.len() {
            return Err(GfaError::Invariant("path predecessor out of range"));
        }
        if pre.is_empty() {
            return Ok(());
        }
        let landed = self.nodes[pre.index()].arc.dst;
        if landed.vertex() != arc.src.vertex() || arc.src.offset() < landed.offset() {
            return Err(GfaError::Invariant("path extension is not adjacent"));
        }
        Ok(())
    }

    /// Length of the ride that precedes the last arc of `path`.
    pub fn ride_length(&self, path: PathId) -> u64 {
        match self.ride(path) {
            Some((from, to)) => u64::from(to.offset() - from.offset()),
            None => 0,
        }
    }

    /// Total length ridden along `path`.
    pub fn path_length(&self, path: PathId) -> u64 {
        let mut len = 0;
        let mut p = path;
        while let Some(node) = self.node(p) {
            len += self.ride_length(p);
            p = node.pre;
        }
        len
    }

    /// Start and end of the ride before `path`'s arc.
    fn ride(&self, path: PathId) -> Option<(Loc, Loc)> {
        let node = self.node(path)?;
        let pre = self.node(node.pre)?;
        Some((pre.arc.dst, node.arc.src))
    }

    /// Paths from the start arc to `path`, outermost first, skipping the
    /// start arc itself (it has no ride).
    fn chain(&self, path: PathId) -> Vec<PathId> {
        let mut stack = Vec::new();
        let mut p = path;
        while let Some(node) = self.node(p) {
            if !node.pre.is_empty() {
                stack.push(p);
            }
            p = node.pre;
        }
        stack.reverse();
        stack
    }

    /// Appends the route of `path` as space-separated `NAME[:BEG:END]±`
    /// tokens, one per ride, in forward segment coordinates.
    pub fn write_route(&self, out: &mut String, path: PathId) {
        for (i, p) in self.chain(path).into_iter().enumerate() {
            let Some((from, to)) = self.ride(p) else {
                continue;
            };
            let v = from.vertex();
            let Some(seg) = self.graph.segment(v.segment()) else {
                continue;
            };
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&seg.name);
            let (b, e) = (from.offset(), to.offset());
            if b != 0 || e != seg.len {
                let (fb, fe) = if v.is_negative() {
                    (seg.len - e, seg.len - b)
                } else {
                    (b, e)
                };
                let _ = write!(out, ":{fb}:{fe}");
            }
            out.push(v.sign());
        }
    }

    /// Route of `path`; empty for the empty path.
    pub fn route(&self, path: PathId) -> String {
        let mut out = String::new();
        self.write_route(&mut out, path);
        out
    }

    /// Appends the nucleotides ridden along `path`.
    pub fn write_sequence(&self, out: &mut String, path: PathId) {
        for p in self.chain(path) {
            let Some((from, to)) = self.ride(p) else {
                continue;
            };
            let v = from.vertex();
            let Some(seg) = self.graph.segment(v.segment()) else {
                continue;
            };
            let (b, e) = (from.offset() as usize, to.offset() as usize);
            let len = seg.len as usize;
            if v.is_negative() {
                seq::push_forward(out, &seg.data, len - e, len - b, true);
            } else {
                seq::push_forward(out, &seg.data, b, e, false);
            }
        }
    }

    /// Sequence of `path`; empty for the empty path.
    pub fn sequence(&self, path: PathId) -> String {
        let mut out = String::new();
        self.write_sequence(&mut out, path);
        out
    }
}
