//! Truncated K-nearest-neighbour computation over the weighted tag graph.
//!
//! For each vertex, runs an early-terminated Dijkstra search that stops
//! once K+1 vertices are settled (the source settles itself first), so the
//! cost per source is bounded by the cutoff rather than graph size. The
//! downstream embedding consumer addresses rows positionally, so every
//! source emits exactly K entries: when a source's connected component is
//! smaller than K+1, the row is padded with vertices the search never
//! touched, ascending by id, at the [`PAD_DISTANCE`] sentinel.
//!
//! Per-source searches share nothing but the read-only graph, which makes
//! the sweep embarrassingly parallel; with the `parallel` feature each
//! rayon worker owns its own private scratch state.

mod search;

use crate::error::Result;
use crate::graph::TagGraph;
use search::SearchScratch;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Distance reported for padding entries.
///
/// Large enough that no genuine shortest path reaches it, but finite so
/// the output file stays parseable (no `inf`/`NaN` tokens).
pub const PAD_DISTANCE: f64 = 1e15;

/// Truncated nearest-neighbour searcher with reusable scratch state.
///
/// Holds the read-only graph and the per-search scratch (distance array,
/// visited-epoch markers, priority queue), so sweeping many sources does
/// not reallocate per source.
pub struct NearestNeighbours<'a> {
    graph: &'a TagGraph,
    k: usize,
    scratch: SearchScratch,
}

impl<'a> NearestNeighbours<'a> {
    pub fn new(graph: &'a TagGraph, k: usize) -> Self {
        Self {
            graph,
            k,
            scratch: SearchScratch::new(graph.num_vertices()),
        }
    }

    /// The K nearest vertices to `source` (a dense index), ascending by
    /// (distance, id), padded to exactly K entries.
    pub fn nearest(&mut self, source: u32) -> Vec<(u32, f64)> {
        self.scratch.nearest(self.graph, source, self.k)
    }
}

/// Compute the K-nearest-neighbour row for every vertex, in dense order.
#[cfg(feature = "parallel")]
pub fn nearest_all(graph: &TagGraph, k: usize) -> Vec<Vec<(u32, f64)>> {
    use rayon::prelude::*;

    log::info!(
        "computing {} nearest neighbours for {} vertices",
        k,
        graph.num_vertices()
    );
    (0..graph.num_vertices() as u32)
        .into_par_iter()
        .map_init(
            || SearchScratch::new(graph.num_vertices()),
            |scratch, source| scratch.nearest(graph, source, k),
        )
        .collect()
}

/// Compute the K-nearest-neighbour row for every vertex, in dense order.
#[cfg(not(feature = "parallel"))]
pub fn nearest_all(graph: &TagGraph, k: usize) -> Vec<Vec<(u32, f64)>> {
    log::info!(
        "computing {} nearest neighbours for {} vertices",
        k,
        graph.num_vertices()
    );
    let mut searcher = NearestNeighbours::new(graph, k);
    (0..graph.num_vertices() as u32)
        .map(|source| searcher.nearest(source))
        .collect()
}

/// Write neighbour rows as `<source>: <vertex>,<distance> ...` lines,
/// one per source in dense order.
pub fn write_rows<W: Write>(mut out: W, rows: &[Vec<(u32, f64)>]) -> Result<()> {
    for (source, row) in rows.iter().enumerate() {
        write!(out, "{}: ", source)?;
        for &(vertex, distance) in row {
            write!(out, "{},{} ", vertex, distance)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write neighbour rows to a file.
pub fn write_neighbour_lists<P: AsRef<Path>>(path: P, rows: &[Vec<(u32, f64)>]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_rows(&mut out, rows)?;
    out.flush()?;
    Ok(())
}
