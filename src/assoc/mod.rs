//! Association table loading.
//!
//! Parses the delimited post→tag association table (and, optionally, the
//! post creation-date table) into the in-memory structures the matrix
//! builder consumes. Both files carry a header row.
//!
//! Date filtering is all-or-nothing: when a cutoff is supplied, every
//! association must resolve to a dated post, and posts not strictly later
//! than the cutoff are dropped from the association set entirely. A post
//! with associations but no date entry is a data-integrity failure, not
//! something to skip.

use crate::error::{PipelineError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A post creation date, ordered by (year, month, day).
///
/// No calendar validation is performed: a month of 13 still compares in a
/// well-defined way. The comparison only has to be a total order that
/// agrees with real chronology on well-formed dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl PostDate {
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Parse the leading `YYYY-MM-DD` of a timestamp string.
    ///
    /// Anything after the day field (e.g. `T21:26:37Z`) is ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, '-');
        let year = parts.next()?.trim().parse().ok()?;
        let month = parts.next()?.parse().ok()?;
        let rest = parts.next()?;
        // The day field ends at the first non-digit (start of the time part).
        let day_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if day_end == 0 {
            return None;
        }
        let day = rest[..day_end].parse().ok()?;
        Some(Self { year, month, day })
    }
}

/// The loaded (and possibly date-filtered) association set.
///
/// Keeps both orientations the downstream builder needs: the post→tags map
/// used to enumerate a post's co-occurring tags, and the flat `(tag, post)`
/// pair list the row scan sorts by tag id. `max_tag_id` sizes the builder's
/// counter row, so it is computed from the data rather than assumed.
#[derive(Debug, Clone, Default)]
pub struct AssociationTable {
    pub post_to_tags: HashMap<u32, Vec<u32>>,
    pub tag_post_pairs: Vec<(u32, u32)>,
    pub max_tag_id: u32,
}

impl AssociationTable {
    /// Number of (post, tag) associations retained.
    pub fn len(&self) -> usize {
        self.tag_post_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tag_post_pairs.is_empty()
    }

    fn insert(&mut self, post: u32, tag: u32) {
        self.post_to_tags.entry(post).or_default().push(tag);
        self.tag_post_pairs.push((tag, post));
        self.max_tag_id = self.max_tag_id.max(tag);
    }
}

/// Date filter applied while loading associations.
#[derive(Debug, Clone, Copy)]
pub struct DateFilter<'a> {
    /// Post id → creation date table.
    pub dates: &'a HashMap<u32, PostDate>,
    /// Only posts created strictly later than this survive.
    pub after: PostDate,
}

/// Load the association table from a `post_id,tag_id` CSV with a header.
pub fn load_associations<P: AsRef<Path>>(path: P) -> Result<AssociationTable> {
    parse_associations(BufReader::new(File::open(path)?), None)
}

/// Load the association table, keeping only posts created strictly after
/// the cutoff.
///
/// Fails with [`PipelineError::MissingPostDate`] if any association
/// references a post absent from the date table.
pub fn load_associations_after<P: AsRef<Path>>(
    path: P,
    dates: &HashMap<u32, PostDate>,
    after: PostDate,
) -> Result<AssociationTable> {
    parse_associations(
        BufReader::new(File::open(path)?),
        Some(DateFilter { dates, after }),
    )
}

/// Parse association records from any buffered reader.
pub fn parse_associations<R: BufRead>(
    reader: R,
    filter: Option<DateFilter<'_>>,
) -> Result<AssociationTable> {
    let mut table = AssociationTable::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 {
            // Header row.
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let bad = || PipelineError::AssociationParse {
            line: idx + 1,
            text: line.clone(),
        };
        let (post_str, tag_str) = line.split_once(',').ok_or_else(bad)?;
        let post: u32 = post_str.trim().parse().map_err(|_| bad())?;
        let tag: u32 = tag_str.trim().parse().map_err(|_| bad())?;

        if let Some(f) = filter {
            let created = f
                .dates
                .get(&post)
                .ok_or(PipelineError::MissingPostDate { post })?;
            if *created <= f.after {
                continue;
            }
        }

        table.insert(post, tag);
    }

    log::debug!("loaded {} associations", table.len());
    Ok(table)
}

/// Load the post creation-date table from a `post_id,timestamp` CSV with a
/// header. Only the leading `YYYY-MM-DD` of each timestamp is kept.
pub fn load_post_dates<P: AsRef<Path>>(path: P) -> Result<HashMap<u32, PostDate>> {
    parse_post_dates(BufReader::new(File::open(path)?))
}

/// Parse post-date records from any buffered reader.
pub fn parse_post_dates<R: BufRead>(reader: R) -> Result<HashMap<u32, PostDate>> {
    let mut dates = HashMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 || line.trim().is_empty() {
            continue;
        }

        let bad = || PipelineError::PostDateParse {
            line: idx + 1,
            text: line.clone(),
        };
        let (post_str, date_str) = line.split_once(',').ok_or_else(bad)?;
        let post: u32 = post_str.trim().parse().map_err(|_| bad())?;
        let date = PostDate::parse(date_str).ok_or_else(bad)?;
        dates.insert(post, date);
    }

    Ok(dates)
}
