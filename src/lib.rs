//! cotag: tag co-occurrence graphs and truncated nearest-neighbour lists.
//!
//! An offline batch pipeline that turns a tag-co-occurrence dataset (posts,
//! each labelled with a set of tags) into fixed-width per-vertex
//! nearest-neighbour lists, suitable as input to a downstream embedding
//! algorithm such as bh-tSNE.
//!
//! The pipeline has two stages, joined by a persisted text artifact:
//!
//! - `assoc/` + `matrix/`: load the post→tag association table (optionally
//!   filtered by post creation date) and build the upper-triangular
//!   co-occurrence matrix, where the count on a tag pair is the number of
//!   posts carrying both tags.
//! - `graph/` + `knn/`: reload the matrix as an undirected weighted graph
//!   (counts mapped to distances, tag ids remapped to dense indices) and
//!   run a truncated Dijkstra search from every vertex to emit its K
//!   nearest neighbours by shortest-path distance.
//!
//! # Critical Nuances
//!
//! ## Why truncated Dijkstra
//!
//! Exact all-pairs shortest paths is hopeless at the target scale. Because
//! every edge weight is positive, Dijkstra settles vertices in
//! nondecreasing distance order, so the first K vertices settled after the
//! source *are* its K nearest — the search can stop there. Per-source cost
//! is bounded by the K+1 settlement cutoff, not by graph size.
//!
//! ## Fixed-width output
//!
//! The downstream consumer addresses neighbour rows positionally, so every
//! source must emit exactly K entries even when its connected component is
//! smaller than K+1. Missing slots are padded with vertices the search
//! never touched, at a large finite sentinel distance (finite so the file
//! stays parseable). See [`knn`] for the padding rule.
//!
//! # Example
//!
//! ```no_run
//! use cotag::{CooccurrenceMatrix, MatrixParams, NearestNeighbours, TagGraph};
//!
//! # fn main() -> cotag::Result<()> {
//! let table = cotag::assoc::load_associations("post_tag.csv")?;
//! let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
//! matrix.write_to("matrix.txt")?;
//!
//! let graph = TagGraph::read("matrix.txt")?;
//! let rows = cotag::knn::nearest_all(&graph, 30);
//! cotag::knn::write_neighbour_lists("neighbours.txt", &rows)?;
//! # Ok(())
//! # }
//! ```

pub mod assoc;
pub mod error;
pub mod graph;
pub mod knn;
pub mod matrix;

pub use assoc::{AssociationTable, PostDate};
pub use error::{PipelineError, Result};
pub use graph::{TagGraph, VertexMap};
pub use knn::{NearestNeighbours, PAD_DISTANCE};
pub use matrix::{CooccurrenceMatrix, MatrixParams, PairCounting};
