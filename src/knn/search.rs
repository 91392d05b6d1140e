//! Truncated single-source Dijkstra search.

use crate::graph::TagGraph;
use crate::knn::PAD_DISTANCE;
use std::collections::BinaryHeap;

/// Heap entry during search.
#[derive(Clone, PartialEq)]
struct Candidate {
    vertex: u32,
    distance: f64,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap on (distance, vertex id): total_cmp for IEEE 754 total
        // ordering, vertex id as the deterministic tie-break.
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.vertex.cmp(&other.vertex))
            .reverse()
    }
}

/// Reusable per-search state.
///
/// Sized once to the vertex count and reused across sources. Instead of
/// clearing the distance array between searches (O(V) per source), every
/// vertex carries the epoch in which its slot was last written; a slot is
/// live only when its epoch matches the current search's. The heap keeps
/// its allocation between searches too.
///
/// # Performance Note
///
/// Decrease-key is done lazily: relaxing a vertex pushes a fresh heap
/// entry and leaves the stale one in place. A popped entry whose recorded
/// distance no longer matches the vertex's current best is skipped. This
/// trades a slightly larger heap for never having to locate entries by
/// value, and can't miss or double-settle a vertex.
pub(crate) struct SearchScratch {
    distance: Vec<f64>,
    epoch: Vec<u32>,
    settled_epoch: Vec<u32>,
    current_epoch: u32,
    heap: BinaryHeap<Candidate>,
}

impl SearchScratch {
    pub(crate) fn new(num_vertices: usize) -> Self {
        Self {
            distance: vec![f64::INFINITY; num_vertices],
            epoch: vec![0; num_vertices],
            settled_epoch: vec![0; num_vertices],
            current_epoch: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// The K nearest vertices to `source` by shortest-path distance,
    /// ascending by (distance, id), the source itself excluded.
    ///
    /// Dijkstra settles vertices in nondecreasing distance order, so the
    /// search stops after K+1 settlements (the source settles first at
    /// distance 0). If the source's component is exhausted earlier, the
    /// remaining slots are padded with ascending vertex ids the search
    /// never touched, at [`PAD_DISTANCE`]; with fewer than K untouched
    /// vertices left, padding continues with ids past the vertex range so
    /// the row keeps its width and its ids stay distinct.
    pub(crate) fn nearest(&mut self, graph: &TagGraph, source: u32, k: usize) -> Vec<(u32, f64)> {
        self.current_epoch += 1;
        let epoch = self.current_epoch;
        self.heap.clear();

        self.touch(source);
        self.distance[source as usize] = 0.0;
        self.heap.push(Candidate {
            vertex: source,
            distance: 0.0,
        });

        let mut settled: Vec<(u32, f64)> = Vec::with_capacity(k + 1);
        while settled.len() < k + 1 {
            let Some(current) = self.heap.pop() else {
                break;
            };
            if self.settled_epoch[current.vertex as usize] == epoch {
                continue;
            }
            if current.distance != self.distance[current.vertex as usize] {
                // Stale entry superseded by a later relaxation.
                continue;
            }
            self.settled_epoch[current.vertex as usize] = epoch;
            settled.push((current.vertex, current.distance));

            for edge in graph.neighbours(current.vertex) {
                self.touch(edge.to);
                let proposed = current.distance + edge.weight;
                if proposed < self.distance[edge.to as usize] {
                    self.distance[edge.to as usize] = proposed;
                    self.heap.push(Candidate {
                        vertex: edge.to,
                        distance: proposed,
                    });
                }
            }
        }

        // The first settled vertex is the source itself.
        let mut result: Vec<(u32, f64)> = settled.into_iter().skip(1).collect();

        // Component exhausted: pad with untouched vertices, ascending.
        // When the heap runs dry every touched vertex has been settled, so
        // "untouched" and "not settled" coincide here.
        let num_vertices = self.epoch.len() as u32;
        let mut cursor = 0u32;
        while result.len() < k {
            while cursor < num_vertices && self.epoch[cursor as usize] == epoch {
                cursor += 1;
            }
            result.push((cursor, PAD_DISTANCE));
            cursor += 1;
        }
        result
    }

    /// Mark a vertex as belonging to the current search, resetting its
    /// tentative distance if the slot still holds a previous search's.
    fn touch(&mut self, vertex: u32) {
        if self.epoch[vertex as usize] != self.current_epoch {
            self.epoch[vertex as usize] = self.current_epoch;
            self.distance[vertex as usize] = f64::INFINITY;
        }
    }
}
