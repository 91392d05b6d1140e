//! Weighted graph construction from a persisted co-occurrence matrix.
//!
//! The matrix stores similarity (higher count = more related); the search
//! stage needs distance (lower = closer). Counts are mapped through the
//! monotonic decreasing transform `100 / ln(count + 1)` while parsing, so
//! a raw count never reaches the search engine. A count of zero would
//! divide by `ln(1) = 0`; well-formed matrix files never contain one, so
//! zero is rejected at the parse boundary.
//!
//! Tag ids in matrix files are sparse. Each id is remapped to a dense
//! index on first sight, in file-scan order (row id first, then its
//! neighbours left to right), and the bidirectional mapping is kept for
//! interpreting results. The graph is undirected: every parsed edge lands
//! in both endpoints' adjacency lists.

use crate::error::{PipelineError, Result};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One directed half of an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: u32,
    pub weight: f64,
}

/// Bidirectional table between original tag ids and dense vertex indices.
///
/// Indices are assigned 0..N in first-seen order and never change once
/// assigned.
#[derive(Debug, Clone, Default)]
pub struct VertexMap {
    dense: HashMap<u32, u32>,
    original: Vec<u32>,
}

impl VertexMap {
    /// Number of distinct tag ids seen.
    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Dense index for an original tag id, if it appeared in the matrix.
    pub fn dense_index(&self, tag: u32) -> Option<u32> {
        self.dense.get(&tag).copied()
    }

    /// Original tag id for a dense index.
    pub fn original_tag(&self, index: u32) -> Option<u32> {
        self.original.get(index as usize).copied()
    }

    fn intern(&mut self, tag: u32) -> u32 {
        if let Some(&index) = self.dense.get(&tag) {
            return index;
        }
        let index = self.original.len() as u32;
        self.dense.insert(tag, index);
        self.original.push(tag);
        index
    }

    /// Write `<original_tag_id> <dense_index>` lines in first-seen order.
    pub fn write<W: Write>(&self, mut out: W) -> Result<()> {
        for (index, &tag) in self.original.iter().enumerate() {
            writeln!(out, "{} {}", tag, index)?;
        }
        Ok(())
    }

    /// Write the mapping to a file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

/// Undirected weighted tag graph over a dense vertex-id space.
#[derive(Debug, Clone, Default)]
pub struct TagGraph {
    adjacency: Vec<SmallVec<[Edge; 4]>>,
    vertices: VertexMap,
}

impl TagGraph {
    /// Similarity-to-distance transform: `100 / ln(count + 1)`.
    ///
    /// Strictly decreasing for `count >= 1`, so more co-occurrences mean a
    /// shorter edge. Callers must not pass 0 (the parser rejects it).
    pub fn distance_from_count(count: u32) -> f64 {
        100.0 / (f64::from(count) + 1.0).ln()
    }

    /// Read a graph from a matrix file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(BufReader::new(File::open(path)?))
    }

    /// Parse the `<tag>: <n>,<count> <n>,<count> ...` matrix format.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut graph = Self::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let bad = |reason: &str| PipelineError::MatrixParse {
                line: idx + 1,
                reason: reason.to_string(),
            };

            let (tag_str, entries) = line
                .split_once(':')
                .ok_or_else(|| bad("missing ':' separator"))?;
            let tag: u32 = tag_str
                .trim()
                .parse()
                .map_err(|_| bad("row tag id is not an integer"))?;
            let source = graph.intern(tag);

            for entry in entries.split_whitespace() {
                let (neighbour_str, count_str) = entry
                    .split_once(',')
                    .ok_or_else(|| bad("neighbour entry is not 'id,count'"))?;
                let neighbour: u32 = neighbour_str
                    .parse()
                    .map_err(|_| bad("neighbour id is not an integer"))?;
                let count: u32 = count_str
                    .parse()
                    .map_err(|_| bad("count is not an integer"))?;
                if count == 0 {
                    return Err(bad("zero co-occurrence count"));
                }

                let dest = graph.intern(neighbour);
                graph.add_edge(source, dest, Self::distance_from_count(count));
            }
        }

        log::debug!(
            "parsed graph: {} vertices, {} half-edges",
            graph.num_vertices(),
            graph.adjacency.iter().map(|adj| adj.len()).sum::<usize>()
        );
        Ok(graph)
    }

    /// Build a graph directly from weighted edges over original tag ids.
    ///
    /// Ids are interned in order of appearance, exactly as in [`parse`].
    /// Useful for constructing graphs programmatically (and in tests)
    /// without routing weights through the count transform.
    ///
    /// [`parse`]: TagGraph::parse
    pub fn from_edges(edges: impl IntoIterator<Item = (u32, u32, f64)>) -> Self {
        let mut graph = Self::default();
        for (a, b, weight) in edges {
            let a = graph.intern(a);
            let b = graph.intern(b);
            graph.add_edge(a, b, weight);
        }
        graph
    }

    /// Number of vertices (distinct tag ids seen in the matrix).
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Adjacency list of a dense vertex index.
    pub fn neighbours(&self, vertex: u32) -> &[Edge] {
        &self.adjacency[vertex as usize]
    }

    /// The tag-id ↔ dense-index table.
    pub fn vertex_map(&self) -> &VertexMap {
        &self.vertices
    }

    fn intern(&mut self, tag: u32) -> u32 {
        let index = self.vertices.intern(tag);
        if index as usize >= self.adjacency.len() {
            self.adjacency.resize(index as usize + 1, SmallVec::new());
        }
        index
    }

    fn add_edge(&mut self, a: u32, b: u32, weight: f64) {
        self.adjacency[a as usize].push(Edge { to: b, weight });
        self.adjacency[b as usize].push(Edge { to: a, weight });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn transform_is_strictly_decreasing() {
        let mut prev = f64::INFINITY;
        for count in 1..200 {
            let d = TagGraph::distance_from_count(count);
            assert!(d > 0.0);
            assert!(d < prev, "distance must drop as count grows");
            prev = d;
        }
    }

    #[test]
    fn transform_value() {
        // 100 / ln(2)
        let d = TagGraph::distance_from_count(1);
        assert!((d - 144.269_504_088_896_34).abs() < 1e-9);
    }

    #[test]
    fn dense_indices_follow_scan_order() {
        let graph = TagGraph::parse(Cursor::new("50: 7,1 3,2 \n3: 9,4 \n")).unwrap();
        let map = graph.vertex_map();
        // Row id first, then neighbours left to right; 3 keeps the index
        // it got as a neighbour of 50.
        assert_eq!(map.dense_index(50), Some(0));
        assert_eq!(map.dense_index(7), Some(1));
        assert_eq!(map.dense_index(3), Some(2));
        assert_eq!(map.dense_index(9), Some(3));
        assert_eq!(map.original_tag(2), Some(3));
        assert_eq!(graph.num_vertices(), 4);
    }

    #[test]
    fn edges_are_undirected() {
        let graph = TagGraph::parse(Cursor::new("10: 20,3 \n")).unwrap();
        let w = TagGraph::distance_from_count(3);
        assert_eq!(graph.neighbours(0), &[Edge { to: 1, weight: w }]);
        assert_eq!(graph.neighbours(1), &[Edge { to: 0, weight: w }]);
    }

    #[test]
    fn zero_count_rejected() {
        let err = TagGraph::parse(Cursor::new("10: 20,0 \n")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MatrixParse { line: 1, .. }
        ));
    }

    #[test]
    fn malformed_line_aborts_with_position() {
        let err = TagGraph::parse(Cursor::new("10: 20,2 \nnot a row\n")).unwrap_err();
        match err {
            PipelineError::MatrixParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mapping_file_format() {
        let graph = TagGraph::parse(Cursor::new("50: 7,1 \n")).unwrap();
        let mut buf = Vec::new();
        graph.vertex_map().write(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "50 0\n7 1\n");
    }
}
