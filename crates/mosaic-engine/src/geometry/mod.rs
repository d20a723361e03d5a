//! Spatial geometry: distances, kernels, triangulation, neighbor graphs.

pub mod distance;
pub mod neighbor_graph;
pub mod triangulation;

pub use distance::{euclidean, gaussian_cutoff, gaussian_weight, DistanceMatrix};
pub use neighbor_graph::NeighborGraph;
