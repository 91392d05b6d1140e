//! Property-based tests: the sorted row-scan builder must agree with a
//! brute-force pairwise intersection, and neighbour rows must keep their
//! shape under arbitrary graphs.

use cotag::{knn, CooccurrenceMatrix, MatrixParams, TagGraph, PAD_DISTANCE};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;

/// Posts as tag sets (sets: duplicates impossible by dataset construction).
fn posts_strategy() -> impl Strategy<Value = Vec<BTreeSet<u32>>> {
    prop::collection::vec(prop::collection::btree_set(1u32..60, 1..6), 1..25)
}

fn table_from(posts: &[BTreeSet<u32>]) -> cotag::AssociationTable {
    let mut csv = String::from("post_id,tag_id\n");
    for (post, tags) in posts.iter().enumerate() {
        for tag in tags {
            csv.push_str(&format!("{},{}\n", post + 1, tag));
        }
    }
    cotag::assoc::parse_associations(Cursor::new(csv), None).unwrap()
}

/// Count co-occurrences the slow, obviously correct way.
fn brute_force_counts(posts: &[BTreeSet<u32>]) -> HashMap<(u32, u32), u32> {
    let mut counts = HashMap::new();
    for tags in posts {
        let tags: Vec<u32> = tags.iter().copied().collect();
        for i in 0..tags.len() {
            for j in i + 1..tags.len() {
                *counts.entry((tags[i], tags[j])).or_insert(0) += 1;
            }
        }
    }
    counts
}

proptest! {
    #[test]
    fn matrix_matches_brute_force(posts in posts_strategy()) {
        let table = table_from(&posts);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
        let expected = brute_force_counts(&posts);

        // Every brute-force pair appears with the same count.
        for (&(a, b), &count) in &expected {
            prop_assert_eq!(matrix.count(a, b), Some(count));
        }

        // And the matrix holds nothing else.
        let stored: usize = matrix.rows.iter().map(|r| r.neighbours.len()).sum();
        prop_assert_eq!(stored, expected.len());
    }

    #[test]
    fn matrix_is_upper_triangular(posts in posts_strategy()) {
        let table = table_from(&posts);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
        for row in &matrix.rows {
            for &(neighbour, count) in &row.neighbours {
                prop_assert!(neighbour > row.tag);
                prop_assert!(count >= 1);
            }
        }
    }

    #[test]
    fn matrix_survives_write_and_graph_reload(posts in posts_strategy()) {
        let table = table_from(&posts);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());

        let mut buf = Vec::new();
        matrix.write_matrix(&mut buf).unwrap();
        let graph = TagGraph::parse(Cursor::new(buf)).unwrap();

        // Every stored pair becomes an undirected edge at the transformed
        // distance.
        let map = graph.vertex_map();
        for row in &matrix.rows {
            let a = map.dense_index(row.tag).unwrap();
            for &(neighbour, count) in &row.neighbours {
                let b = map.dense_index(neighbour).unwrap();
                let w = TagGraph::distance_from_count(count);
                prop_assert!(graph
                    .neighbours(a)
                    .iter()
                    .any(|e| e.to == b && (e.weight - w).abs() < 1e-12));
                prop_assert!(graph
                    .neighbours(b)
                    .iter()
                    .any(|e| e.to == a && (e.weight - w).abs() < 1e-12));
            }
        }
    }

    #[test]
    fn neighbour_rows_keep_shape(
        posts in posts_strategy(),
        k in 1usize..8,
    ) {
        let table = table_from(&posts);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
        if matrix.rows.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        matrix.write_matrix(&mut buf).unwrap();
        let graph = TagGraph::parse(Cursor::new(buf)).unwrap();

        for row in knn::nearest_all(&graph, k) {
            prop_assert_eq!(row.len(), k);
            // Distances ascend; padding (if any) sits at the tail.
            prop_assert!(row.windows(2).all(|w| w[0].1 <= w[1].1));
            let ids: BTreeSet<u32> = row.iter().map(|&(v, _)| v).collect();
            prop_assert_eq!(ids.len(), k);
            prop_assert!(row
                .iter()
                .all(|&(_, d)| d <= PAD_DISTANCE && d.is_finite()));
        }
    }
}
