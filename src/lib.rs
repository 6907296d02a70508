//! Paths between regions of a genome assembly graph.
//!
//! A GFA graph is loaded into a [`Graph`] of oriented segments joined by
//! arcs, the two endpoints are attached through [`Target`]s, and a
//! [`SearchEngine`] finds the shortest path between them, the shortest
//! paths to everything reachable, or the furthest reachable point.
//!
//! ```
//! use gene_paths::{Graph, Role, SearchEngine, Segment, Target};
//!
//! # fn main() -> gene_paths::Result<()> {
//! let mut graph = Graph::new();
//! graph.add_segment(Segment::new("s1", "CAT")?)?;
//! graph.add_segment(Segment::new("s2", "TAGT")?)?;
//! graph.add_edge("s1+", 2, 3, "s2+", 0, 1)?;
//!
//! let start = Target::new(Role::Start).set(&mut graph, "s1:0:1+")?;
//! let end = Target::new(Role::End).set(&mut graph, "s2:2:3+")?;
//!
//! let mut engine = SearchEngine::new(&graph);
//! assert!(engine.shortest_path(start, end)?);
//! assert_eq!(engine.sequence(), "CATAG");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod gfa;
pub mod graph;
pub mod paths;
pub mod search;
pub mod target;

pub use error::{GfaError, Result};
pub use gfa::{read_graph, GfaOptions};
pub use graph::{Arc, Graph, Loc, Segment, VertexId};
pub use paths::{PathId, PathTree};
pub use search::{SearchEngine, SearchNode, SearchStats};
pub use target::{Region, Role, Target};
