//! Planar neighbor graphs over sample locations.

use mosaic_core::types::Location;
use petgraph::graph::{NodeIndex, UnGraph};
use smallvec::SmallVec;

use super::distance::euclidean;
use super::triangulation::delaunay_edges;

/// Adjacency over locations: Delaunay edges pruned by a length threshold.
///
/// When the triangulation is degenerate (tiny or collinear samples) the
/// graph falls back to connecting every pair within the threshold, so small
/// inputs still get neighbors.
#[derive(Debug)]
pub struct NeighborGraph {
    graph: UnGraph<(), f64>,
}

impl NeighborGraph {
    pub fn build(locations: &[Location], threshold: f64) -> Self {
        let n = locations.len();
        let points: Vec<(f64, f64)> = locations.iter().map(|l| (l.x, l.y)).collect();

        let mut graph = UnGraph::with_capacity(n, n * 3);
        for _ in 0..n {
            graph.add_node(());
        }

        let mut edges = delaunay_edges(&points);
        if edges.is_empty() && n >= 2 {
            for a in 0..n {
                for b in (a + 1)..n {
                    edges.push((a, b));
                }
            }
        }

        for (a, b) in edges {
            let d = euclidean(&locations[a], &locations[b]);
            if d <= threshold {
                graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), d);
            }
        }

        Self { graph }
    }

    /// Direct neighbors of location `i`, ascending.
    pub fn neighbors(&self, i: usize) -> SmallVec<[usize; 8]> {
        let mut out: SmallVec<[usize; 8]> = self
            .graph
            .neighbors(NodeIndex::new(i))
            .map(|node| node.index())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn degree(&self, i: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(i)).count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
