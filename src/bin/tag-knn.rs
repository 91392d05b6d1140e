//! Stage 2: co-occurrence matrix → K-nearest-neighbour lists.
//!
//! Reloads the matrix as an undirected weighted graph (counts mapped to
//! distances, tag ids remapped to dense indices) and writes, for every
//! vertex, its K nearest vertices by truncated-Dijkstra shortest-path
//! distance. Rows are fixed-width: small components are padded.

use clap::Parser;
use cotag::{knn, PipelineError, TagGraph};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tag-knn", about = "Compute truncated nearest-neighbour lists")]
struct Args {
    /// Path to the co-occurrence matrix file.
    #[arg(long)]
    matrix: PathBuf,

    /// Number of nearest neighbours per vertex.
    #[arg(short)]
    k: usize,

    /// Path for the neighbour-list output.
    #[arg(long)]
    out: PathBuf,

    /// Path for the tag-id to dense-index mapping output.
    #[arg(long)]
    mapping: Option<PathBuf>,
}

fn run(args: Args) -> cotag::Result<()> {
    if args.k == 0 {
        return Err(PipelineError::InvalidParameter(
            "-k must be at least 1".into(),
        ));
    }

    let graph = TagGraph::read(&args.matrix)?;
    log::info!("graph loaded: {} vertices", graph.num_vertices());

    if let Some(path) = &args.mapping {
        graph.vertex_map().write_to(path)?;
    }

    let rows = knn::nearest_all(&graph, args.k);
    knn::write_neighbour_lists(&args.out, &rows)?;
    log::info!("wrote {} neighbour rows to {}", rows.len(), args.out.display());
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
