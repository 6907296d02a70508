#![allow(missing_docs)]

use gene_paths::graph::seq::reverse_complement;
use gene_paths::{Arc, Graph, Loc, PathId, SearchEngine, SearchNode, Segment, VertexId};
use proptest::prelude::*;

type RawArc = (u32, u32, u32, u32);

/// Segment 0 is a one-base start segment; the others get random arcs
/// between arbitrary positions on either strand.
fn build(seqs: &[String], raw: &[RawArc]) -> (Graph, Arc) {
    let mut g = Graph::new();
    g.add_segment(Segment::new("S", "N").unwrap()).unwrap();
    for (i, s) in seqs.iter().enumerate() {
        g.add_segment(Segment::new(format!("g{i}"), s.as_bytes()).unwrap())
            .unwrap();
    }
    let vertices = seqs.len() as u32 * 2;
    let loc = |v: u32, off: u32| {
        let v = v % vertices;
        let vertex = VertexId::new(1 + (v / 2) as usize, v % 2 == 1);
        let len = g.vertex_len(vertex);
        Loc::new(vertex, off % (len + 1))
    };
    let arcs: Vec<Arc> = raw
        .iter()
        .map(|&(a, b, c, d)| Arc::new(loc(a, b), loc(c, d)))
        .collect();
    let start = Arc::new(
        Loc::new(VertexId::new(0, false), 0),
        Loc::new(VertexId::new(1, false), 0),
    );
    for arc in arcs {
        g.add_arc(arc).unwrap();
    }
    g.add_arc(start).unwrap();
    (g, start)
}

fn graph_input() -> impl Strategy<Value = (Vec<String>, Vec<RawArc>)> {
    (
        prop::collection::vec("[ACGT]{1,12}", 1..6),
        prop::collection::vec(any::<RawArc>(), 0..40),
    )
}

/// Rebuilds a sequence from route tokens alone.
fn spell(g: &Graph, route: &str) -> String {
    let mut out = String::new();
    for token in route.split(' ').filter(|t| !t.is_empty()) {
        let (body, sign) = token.split_at(token.len() - 1);
        let mut parts = body.split(':');
        let seg = g
            .segment(g.find_segment_ix(parts.next().unwrap()).unwrap())
            .unwrap();
        let (b, e) = match (parts.next(), parts.next()) {
            (Some(b), Some(e)) => (b.parse::<usize>().unwrap(), e.parse::<usize>().unwrap()),
            _ => (0, seg.len as usize),
        };
        let slice = &seg.data[b..e];
        let bytes = if sign == "-" {
            reverse_complement(slice)
        } else {
            slice.to_vec()
        };
        out.push_str(std::str::from_utf8(&bytes).unwrap());
    }
    out
}

proptest! {
    #[test]
    fn arcs_from_is_the_contiguous_tail_of_a_vertex(
        (seqs, raw) in graph_input(),
        query in any::<(u32, u32)>(),
    ) {
        let (g, _) = build(&seqs, &raw);
        let vertex = VertexId(query.0 % (g.segments().len() as u32 * 2));
        let at = Loc::new(vertex, query.1 % (g.vertex_len(vertex) + 2));
        let next = Loc::new(VertexId(vertex.0 + 1), 0);

        let slice = g.arcs_from(at);
        let expected: Vec<Arc> = g
            .arcs()
            .iter()
            .copied()
            .filter(|a| a.src >= at && a.src < next)
            .collect();
        prop_assert_eq!(slice, &expected[..]);
        prop_assert!(g.arcs().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn settled_paths_are_consistent((seqs, raw) in graph_input()) {
        let (g, start) = build(&seqs, &raw);
        let mut engine = SearchEngine::new(&g);
        engine.shortest_paths(start).unwrap();
        let paths = engine.paths();

        for (loc, node) in engine.nodes() {
            let open = matches!(node, SearchNode::Open { .. });
            prop_assert!(!open, "open node left at {:?}", loc);
            let SearchNode::Settled { len, path } = node else { continue };

            let tip = paths.node(path).unwrap();
            prop_assert_eq!(tip.arc.dst, loc);
            prop_assert_eq!(paths.path_length(path), len);

            let mut rides = 0;
            let mut p = path;
            while let Some(n) = paths.node(p) {
                rides += paths.ride_length(p);
                p = n.pre;
            }
            prop_assert_eq!(p, PathId::EMPTY);
            prop_assert_eq!(rides, len);

            prop_assert_eq!(spell(&g, &paths.route(path)), paths.sequence(path));
            prop_assert_eq!(paths.sequence(path).len() as u64, len);
        }
    }

    #[test]
    fn no_settled_node_can_be_improved((seqs, raw) in graph_input()) {
        let (g, start) = build(&seqs, &raw);
        let mut engine = SearchEngine::new(&g);
        engine.shortest_paths(start).unwrap();

        for (loc, node) in engine.nodes() {
            let SearchNode::Settled { len, path } = node else { continue };
            let origin = engine.paths().node(path).unwrap().arc.src;
            for arc in g.arcs_from(loc) {
                if arc.dst == origin {
                    continue;
                }
                let offered = len + u64::from(arc.src.offset() - loc.offset());
                match engine.node(arc.dst) {
                    Some(SearchNode::Settled { len: best, .. }) => prop_assert!(best <= offered),
                    other => prop_assert!(false, "neighbour left {:?}", other),
                }
            }
        }
    }

    #[test]
    fn searches_are_deterministic((seqs, raw) in graph_input()) {
        let (g, start) = build(&seqs, &raw);
        let mut a = SearchEngine::new(&g);
        let mut b = SearchEngine::new(&g);
        a.furthest_path(start).unwrap();
        b.furthest_path(start).unwrap();
        prop_assert_eq!(a.found(), b.found());
        prop_assert_eq!(a.route(), b.route());
        prop_assert!(a.nodes().eq(b.nodes()));

        a.furthest_path(start).unwrap();
        prop_assert_eq!(a.route(), b.route());
        prop_assert_eq!(a.sequence().len() as u64, a.length());
    }
}
