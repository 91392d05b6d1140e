//! Stage 1: association table → co-occurrence matrix.
//!
//! Reads the `post_id,tag_id` association CSV (optionally filtered to
//! posts created strictly after a cutoff date) and writes the
//! upper-triangular co-occurrence matrix, plus the optional per-tag
//! post-count table.

use clap::Parser;
use cotag::{assoc, CooccurrenceMatrix, MatrixParams, PairCounting, PipelineError, PostDate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tag-matrix", about = "Build a tag co-occurrence matrix")]
struct Args {
    /// Path to the post_id,tag_id association table.
    #[arg(long)]
    assoc: PathBuf,

    /// Path for the co-occurrence matrix output.
    #[arg(long)]
    out: PathBuf,

    /// Path to the post_id,creation_timestamp table (required with --after).
    #[arg(long)]
    posts: Option<PathBuf>,

    /// Keep only posts created strictly after this YYYY-MM-DD date.
    #[arg(long)]
    after: Option<String>,

    /// Path for the per-tag post-count side output.
    #[arg(long)]
    post_counts: Option<PathBuf>,

    /// Credit each pair only to its row tag in the post-count output,
    /// instead of to both endpoints.
    #[arg(long)]
    row_only: bool,
}

fn run(args: Args) -> cotag::Result<()> {
    let table = match (&args.posts, &args.after) {
        (Some(posts), Some(after)) => {
            let cutoff = PostDate::parse(after).ok_or_else(|| {
                PipelineError::InvalidParameter(format!("--after is not a YYYY-MM-DD date: {after}"))
            })?;
            log::info!("building matrix from posts later than {after}");
            let dates = assoc::load_post_dates(posts)?;
            assoc::load_associations_after(&args.assoc, &dates, cutoff)?
        }
        (None, None) => assoc::load_associations(&args.assoc)?,
        _ => {
            return Err(PipelineError::InvalidParameter(
                "--posts and --after must be given together".into(),
            ))
        }
    };
    log::info!("{} associations loaded", table.len());

    let params = MatrixParams {
        post_counts: args.post_counts.is_some(),
        counting: if args.row_only {
            PairCounting::RowOnly
        } else {
            PairCounting::Symmetric
        },
    };
    let matrix = CooccurrenceMatrix::build(&table, &params);
    matrix.write_to(&args.out)?;
    if let Some(path) = &args.post_counts {
        matrix.write_post_counts_to(path)?;
    }
    log::info!(
        "wrote {} matrix rows to {}",
        matrix.rows.len(),
        args.out.display()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
