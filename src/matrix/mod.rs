//! Co-occurrence matrix construction.
//!
//! Builds, from the loaded association set, the upper-triangular tag
//! co-occurrence matrix: for each tag `t`, the set of `(n, count)` pairs
//! with `n > t`, where `count` is the number of posts carrying both tags.
//! Keying every pair by its smaller id stores the symmetric matrix once
//! with no duplicates and no self loops.
//!
//! # Algorithm
//!
//! The builder sorts the flat `(tag, post)` pair list by tag id and scans
//! it in one pass. Each contiguous run of pairs sharing a tag id is that
//! tag's row: for every post in the run, each of the post's *other* tags
//! with a strictly greater id bumps a counter. Counters live in a dense
//! array sized to `max_tag_id + 1` (computed from the data, never assumed)
//! and are zeroed between runs, so no tag×tag structure is ever allocated.
//! The last run has no "tag id changed" event behind it and is flushed
//! explicitly after the scan.
//!
//! # Per-tag post counts
//!
//! The optional side output sums the co-occurrence counts a tag
//! participates in. Whether a pair credits only its row tag or both
//! endpoints is a configuration choice ([`PairCounting`]); see
//! `MatrixParams`.

use crate::assoc::AssociationTable;
use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// How a co-occurring pair contributes to the per-tag post-count output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairCounting {
    /// A pair `(a, b)` with `a < b` is credited to `a` only (the sum of
    /// the tag's own upper-triangular row).
    RowOnly,
    /// A pair `(a, b)` is credited to both `a` and `b` (once per
    /// direction), so the count reflects every co-occurrence the tag
    /// participates in regardless of id order.
    Symmetric,
}

/// Configuration for matrix construction.
#[derive(Debug, Clone)]
pub struct MatrixParams {
    /// Also derive the per-tag post-count side table.
    pub post_counts: bool,
    /// Pair-crediting rule for the post-count table.
    pub counting: PairCounting,
}

impl Default for MatrixParams {
    fn default() -> Self {
        Self {
            post_counts: false,
            counting: PairCounting::Symmetric,
        }
    }
}

/// One upper-triangular matrix row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub tag: u32,
    /// `(neighbour_tag, count)` pairs, neighbour id strictly greater than
    /// `tag`, ascending by neighbour id, every count ≥ 1.
    pub neighbours: Vec<(u32, u32)>,
}

/// The upper-triangular co-occurrence matrix, plus the optional per-tag
/// post-count table.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceMatrix {
    /// Rows ascending by tag id. Tags with no greater-id neighbour have no
    /// row at all.
    pub rows: Vec<MatrixRow>,
    /// `(tag, count)` ascending by tag id; empty unless requested.
    pub post_counts: Vec<(u32, u64)>,
}

impl CooccurrenceMatrix {
    /// Build the matrix from a loaded association table.
    pub fn build(table: &AssociationTable, params: &MatrixParams) -> Self {
        let mut pairs = table.tag_post_pairs.clone();
        pairs.sort_unstable();

        let mut row_counts = vec![0u32; table.max_tag_id as usize + 1];
        let mut rows = Vec::new();

        for (i, &(tag, post)) in pairs.iter().enumerate() {
            if i > 0 && pairs[i - 1].0 != tag {
                flush_row(&mut rows, pairs[i - 1].0, &mut row_counts);
            }
            for &other in &table.post_to_tags[&post] {
                if other > tag {
                    row_counts[other as usize] += 1;
                }
            }
        }
        if let Some(&(last_tag, _)) = pairs.last() {
            flush_row(&mut rows, last_tag, &mut row_counts);
        }

        let post_counts = if params.post_counts {
            derive_post_counts(&rows, table.max_tag_id, params.counting)
        } else {
            Vec::new()
        };

        log::debug!(
            "built {} matrix rows from {} associations",
            rows.len(),
            table.len()
        );
        Self { rows, post_counts }
    }

    /// Write the matrix in its text format: one
    /// `<tag>: <n>,<count> <n>,<count> ...` line per row.
    pub fn write_matrix<W: Write>(&self, mut out: W) -> Result<()> {
        for row in &self.rows {
            write!(out, "{}: ", row.tag)?;
            for &(neighbour, count) in &row.neighbours {
                write!(out, "{},{} ", neighbour, count)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Write the matrix to a file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_matrix(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Write the per-tag post-count table: `Id,PostCount` header, then one
    /// `<tag>,<count>` line per tag with a nonzero count.
    pub fn write_post_counts<W: Write>(&self, mut out: W) -> Result<()> {
        writeln!(out, "Id,PostCount")?;
        for &(tag, count) in &self.post_counts {
            writeln!(out, "{},{}", tag, count)?;
        }
        Ok(())
    }

    /// Write the per-tag post-count table to a file.
    pub fn write_post_counts_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_post_counts(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Look up the stored count for a pair, in either id order.
    pub fn count(&self, a: u32, b: u32) -> Option<u32> {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let row = self.rows.iter().find(|r| r.tag == lo)?;
        row.neighbours
            .iter()
            .find(|&&(n, _)| n == hi)
            .map(|&(_, c)| c)
    }
}

/// Emit the finished row (if it has any neighbours) and zero the counters
/// for the next run.
fn flush_row(rows: &mut Vec<MatrixRow>, tag: u32, row_counts: &mut [u32]) {
    let neighbours: Vec<(u32, u32)> = row_counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(n, &c)| (n as u32, c))
        .collect();
    if !neighbours.is_empty() {
        rows.push(MatrixRow { tag, neighbours });
    }
    row_counts.fill(0);
}

fn derive_post_counts(
    rows: &[MatrixRow],
    max_tag_id: u32,
    counting: PairCounting,
) -> Vec<(u32, u64)> {
    let mut totals = vec![0u64; max_tag_id as usize + 1];
    for row in rows {
        for &(neighbour, count) in &row.neighbours {
            totals[row.tag as usize] += u64::from(count);
            if counting == PairCounting::Symmetric {
                totals[neighbour as usize] += u64::from(count);
            }
        }
    }
    totals
        .into_iter()
        .enumerate()
        .filter(|&(_, total)| total > 0)
        .map(|(tag, total)| (tag as u32, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assoc::parse_associations;
    use std::io::Cursor;

    fn table_from(posts: &[(u32, &[u32])]) -> AssociationTable {
        let mut csv = String::from("post_id,tag_id\n");
        for &(post, tags) in posts {
            for &tag in tags {
                csv.push_str(&format!("{},{}\n", post, tag));
            }
        }
        parse_associations(Cursor::new(csv), None).unwrap()
    }

    #[test]
    fn counts_posts_sharing_both_tags() {
        // Posts: 1:{10,20}, 2:{10,20,30}, 3:{20,30}
        let table = table_from(&[(1, &[10, 20]), (2, &[10, 20, 30]), (3, &[20, 30])]);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());

        assert_eq!(matrix.count(10, 20), Some(2));
        assert_eq!(matrix.count(10, 30), Some(1));
        assert_eq!(matrix.count(20, 30), Some(2));
        // Symmetric lookup resolves through the smaller id.
        assert_eq!(matrix.count(30, 20), Some(2));
    }

    #[test]
    fn upper_triangular_only() {
        let table = table_from(&[(1, &[10, 20]), (2, &[10, 20, 30])]);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());

        for row in &matrix.rows {
            for &(neighbour, count) in &row.neighbours {
                assert!(neighbour > row.tag);
                assert!(count >= 1);
            }
            // Neighbour ids ascend within a row (array-scan order).
            assert!(row.neighbours.windows(2).all(|w| w[0].0 < w[1].0));
        }
        // No row stores the mirror of an existing pair.
        assert!(matrix.rows.iter().all(|r| r.tag < 30));
    }

    #[test]
    fn final_row_is_flushed() {
        // The largest row tag has neighbours but nothing after it in the
        // sorted pair list; it must still be emitted.
        let table = table_from(&[(1, &[5, 7]), (2, &[7, 9])]);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
        assert_eq!(matrix.count(7, 9), Some(1));
    }

    #[test]
    fn tags_without_greater_neighbours_get_no_row() {
        let table = table_from(&[(1, &[10, 20])]);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.rows[0].tag, 10);
    }

    #[test]
    fn empty_table_builds_empty_matrix() {
        let table = AssociationTable::default();
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
        assert!(matrix.rows.is_empty());
    }

    #[test]
    fn post_counts_row_only() {
        let table = table_from(&[(1, &[10, 20]), (2, &[10, 20, 30]), (3, &[20, 30])]);
        let params = MatrixParams {
            post_counts: true,
            counting: PairCounting::RowOnly,
        };
        let matrix = CooccurrenceMatrix::build(&table, &params);
        // Row sums: 10 → (20,2)+(30,1); 20 → (30,2); 30 has no row.
        assert_eq!(matrix.post_counts, vec![(10, 3), (20, 2)]);
    }

    #[test]
    fn post_counts_symmetric() {
        let table = table_from(&[(1, &[10, 20]), (2, &[10, 20, 30]), (3, &[20, 30])]);
        let params = MatrixParams {
            post_counts: true,
            counting: PairCounting::Symmetric,
        };
        let matrix = CooccurrenceMatrix::build(&table, &params);
        // 10: (10,20)=2 + (10,30)=1; 20: 2+2; 30: 1+2.
        assert_eq!(matrix.post_counts, vec![(10, 3), (20, 4), (30, 3)]);
    }

    #[test]
    fn matrix_text_format() {
        let table = table_from(&[(1, &[10, 20]), (2, &[10, 20, 30]), (3, &[20, 30])]);
        let matrix = CooccurrenceMatrix::build(&table, &MatrixParams::default());
        let mut buf = Vec::new();
        matrix.write_matrix(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "10: 20,2 30,1 \n20: 30,2 \n");
    }

    #[test]
    fn post_count_text_format() {
        let table = table_from(&[(1, &[10, 20])]);
        let params = MatrixParams {
            post_counts: true,
            counting: PairCounting::Symmetric,
        };
        let matrix = CooccurrenceMatrix::build(&table, &params);
        let mut buf = Vec::new();
        matrix.write_post_counts(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Id,PostCount\n10,1\n20,1\n");
    }
}
