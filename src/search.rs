//! Dijkstra search over arc destinations.
//!
//! Every distinct arc destination in the graph is a search node. A node
//! is reached by taking some arc onto it, and the distance to it is the
//! number of bases ridden along vertices on the way; the jumps themselves
//! are free. Visiting a node scans the arcs leaving its vertex at or after
//! the offset where it was reached.
//!
//! The visitable set is ordered by `(length, destination index)`.
//! Destination indices follow key order, so ties always resolve towards
//! the smaller location and searches are deterministic.

use std::collections::BTreeSet;

use tracing::{debug, info, trace};

use crate::error::{GfaError, Result};
use crate::graph::{Arc, Graph, Loc};
use crate::paths::{PathId, PathTree};

/// Per-destination search state.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum SearchNode {
    /// No path onto this destination has been seen.
    #[default]
    Unreached,
    /// Tentative shortest path, still in the visitable set.
    Open {
        /// Length of the tentative path.
        len: u64,
        /// The tentative path.
        path: PathId,
    },
    /// Final shortest path.
    Settled {
        /// Length of the shortest path.
        len: u64,
        /// The shortest path.
        path: PathId,
    },
}

impl SearchNode {
    /// Length and path, unless unreached.
    pub fn reached(self) -> Option<(u64, PathId)> {
        match self {
            SearchNode::Unreached => None,
            SearchNode::Open { len, path } | SearchNode::Settled { len, path } => Some((len, path)),
        }
    }

    /// True once the shortest path is final.
    pub fn is_settled(self) -> bool {
        matches!(self, SearchNode::Settled { .. })
    }
}

/// Counters for the last search.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct SearchStats {
    /// Nodes popped from the visitable set.
    pub visited: usize,
    /// Successful relaxations, first sightings included.
    pub relaxed: usize,
    /// Path nodes created.
    pub paths: usize,
}

/// Shortest and furthest path searches over a borrowed graph.
#[derive(Debug)]
pub struct SearchEngine<'g> {
    graph: &'g Graph,
    paths: PathTree<'g>,
    dests: Vec<Loc>,
    nodes: Vec<SearchNode>,
    visitable: BTreeSet<(u64, usize)>,
    last_popped: u64,
    found: Option<(PathId, u64)>,
    stats: SearchStats,
}

impl<'g> SearchEngine<'g> {
    /// Indexes the destinations of every arc in `graph`.
    ///
    /// The graph must not change while the engine exists; build a new
    /// engine after adding or removing arcs.
    pub fn new(graph: &'g Graph) -> Self {
        let mut dests: Vec<Loc> = graph.arcs().iter().map(|a| a.dst).collect();
        dests.sort_unstable();
        dests.dedup();
        let nodes = vec![SearchNode::Unreached; dests.len()];
        SearchEngine {
            graph,
            paths: PathTree::new(graph),
            dests,
            nodes,
            visitable: BTreeSet::new(),
            last_popped: 0,
            found: None,
            stats: SearchStats::default(),
        }
    }

    /// Clears all search state and, given a start arc, seeds it at length 0.
    pub fn restart(&mut self, start: Option<Arc>) -> Result<()> {
        self.paths.clear();
        self.nodes.iter_mut().for_each(|n| *n = SearchNode::Unreached);
        self.visitable.clear();
        self.last_popped = 0;
        self.found = None;
        self.stats = SearchStats::default();

        if let Some(arc) = start {
            if !self.graph.contains_arc(&arc) {
                return Err(GfaError::UnknownArc(self.graph.arc_name(&arc)));
            }
            let ix = self.dest_ix(arc.dst)?;
            let path = self.paths.extend(PathId::EMPTY, arc)?;
            self.nodes[ix] = SearchNode::Open { len: 0, path };
            self.visitable.insert((0, ix));
        }
        Ok(())
    }

    fn dest_ix(&self, loc: Loc) -> Result<usize> {
        self.dests
            .binary_search(&loc)
            .map_err(|_| GfaError::Invariant("arc destination missing from index"))
    }

    /// Settles and returns the nearest visitable node as
    /// `(destination index, length, path)`.
    pub fn pop_visit(&mut self) -> Result<Option<(usize, u64, PathId)>> {
        let Some((len, ix)) = self.visitable.pop_first() else {
            return Ok(None);
        };
        let path = match self.nodes[ix] {
            SearchNode::Open { len: l, path } if l == len => path,
            SearchNode::Open { .. } => {
                return Err(GfaError::Invariant("visitable node indexed at a stale length"))
            }
            SearchNode::Settled { .. } => {
                return Err(GfaError::Invariant("visitable node already settled"))
            }
            SearchNode::Unreached => {
                return Err(GfaError::Invariant("visitable node was never reached"))
            }
        };
        match self.paths.node(path) {
            Some(node) if node.arc.dst == self.dests[ix] => {}
            _ => return Err(GfaError::Invariant("visitable node indexed at the wrong location")),
        }
        if len < self.last_popped {
            return Err(GfaError::Invariant("visitable nodes popped out of order"));
        }
        self.last_popped = len;
        self.nodes[ix] = SearchNode::Settled { len, path };
        self.stats.visited += 1;
        Ok(Some((ix, len, path)))
    }

    /// Offers every arc leaving the visited node to its destination.
    fn relax_from(&mut self, ix: usize, len: u64, path: PathId) -> Result<()> {
        let graph = self.graph;
        let arrived = self.dests[ix];
        let origin = match self.paths.node(path) {
            Some(node) => node.arc.src,
            None => return Err(GfaError::Invariant("visited node without a path")),
        };
        trace!(at = %arrived, len, "search.visit");

        for cand in graph.arcs_from(arrived) {
            // straight back where we came from; compared by location, since
            // a whole-vertex skip would also cut same-contig targets and short cycles
            if cand.dst == origin {
                continue;
            }
            let tentative = len + u64::from(cand.src.offset() - arrived.offset());
            let dix = self.dest_ix(cand.dst)?;
            match self.nodes[dix] {
                SearchNode::Unreached => {
                    let p = self.paths.extend(path, *cand)?;
                    self.nodes[dix] = SearchNode::Open { len: tentative, path: p };
                }
                SearchNode::Open { len: old, path: p } if tentative < old => {
                    self.visitable.remove(&(old, dix));
                    self.paths.relink(p, path, *cand)?;
                    self.nodes[dix] = SearchNode::Open { len: tentative, path: p };
                }
                SearchNode::Settled { len: old, .. } if tentative < old => {
                    return Err(GfaError::Invariant("settled node offered a shorter path"));
                }
                _ => continue,
            }
            self.visitable.insert((tentative, dix));
            self.stats.relaxed += 1;
            trace!(to = %cand.dst, len = tentative, "search.relax");
        }
        Ok(())
    }

    fn run(&mut self, start: Arc, end: Option<Arc>) -> Result<bool> {
        self.restart(Some(start))?;
        while self.found.is_none() {
            let Some((ix, len, path)) = self.pop_visit()? else {
                break;
            };
            self.relax_from(ix, len, path)?;
            if let Some(end) = end {
                if self.paths.node(path).is_some_and(|n| n.arc == end) {
                    self.found = Some((path, len));
                }
            }
        }
        self.stats.paths = self.paths.len();
        debug!(
            visited = self.stats.visited,
            relaxed = self.stats.relaxed,
            paths = self.stats.paths,
            "search.completed"
        );
        Ok(end.is_none() || self.found.is_some())
    }

    /// Finds the shortest path from `start` that ends by taking `end`.
    /// Returns whether one exists.
    pub fn shortest_path(&mut self, start: Arc, end: Arc) -> Result<bool> {
        let found = self.run(start, Some(end))?;
        match self.found {
            Some((_, len)) => info!(len, "search.shortest.found"),
            None => info!(visited = self.stats.visited, "search.shortest.none"),
        }
        Ok(found)
    }

    /// Computes shortest paths from `start` to every reachable destination.
    pub fn shortest_paths(&mut self, start: Arc) -> Result<()> {
        self.run(start, None)?;
        info!(settled = self.stats.visited, "search.all.completed");
        Ok(())
    }

    /// Finds the longest of the shortest paths from `start`.
    ///
    /// Ties go to the smallest destination location. Cycles are not
    /// detected: the answer is the furthest settled node, whatever its
    /// shape.
    pub fn furthest_path(&mut self, start: Arc) -> Result<bool> {
        self.shortest_paths(start)?;
        let mut best: Option<(PathId, u64)> = None;
        for node in &self.nodes {
            if let SearchNode::Settled { len, path } = *node {
                if best.map_or(true, |(_, l)| len > l) {
                    best = Some((path, len));
                }
            }
        }
        self.found = best;
        if let Some((_, len)) = best {
            info!(len, "search.furthest.found");
        }
        Ok(best.is_some())
    }

    /// Path and length found by the last search, if any.
    pub fn found(&self) -> Option<(PathId, u64)> {
        self.found
    }

    /// Length of the found path, 0 if none.
    pub fn length(&self) -> u64 {
        self.found.map_or(0, |(_, len)| len)
    }

    /// Route of the found path, empty if none.
    pub fn route(&self) -> String {
        self.found.map(|(p, _)| self.paths.route(p)).unwrap_or_default()
    }

    /// Sequence of the found path, empty if none.
    pub fn sequence(&self) -> String {
        self.found.map(|(p, _)| self.paths.sequence(p)).unwrap_or_default()
    }

    /// Length of any path in the tree of the last search.
    pub fn length_of(&self, path: PathId) -> u64 {
        self.paths.path_length(path)
    }

    /// Route of any path in the tree of the last search.
    pub fn route_of(&self, path: PathId) -> String {
        self.paths.route(path)
    }

    /// Sequence of any path in the tree of the last search.
    pub fn sequence_of(&self, path: PathId) -> String {
        self.paths.sequence(path)
    }

    /// State of the destination at `loc`; `None` if no arc lands there.
    pub fn node(&self, loc: Loc) -> Option<SearchNode> {
        self.dests
            .binary_search(&loc)
            .ok()
            .map(|ix| self.nodes[ix])
    }

    /// Every destination with its state, in key order.
    pub fn nodes(&self) -> impl Iterator<Item = (Loc, SearchNode)> + '_ {
        self.dests.iter().copied().zip(self.nodes.iter().copied())
    }

    /// The path tree built by the last search.
    pub fn paths(&self) -> &PathTree<'g> {
        &self.paths
    }

    /// Counters for the last search.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }
}
