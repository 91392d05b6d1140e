//! Error types for the pipeline.

use thiserror::Error;

/// Errors that can abort a pipeline run.
///
/// Every variant is fatal: dense-index assignment order and the matrix
/// builder's row grouping both depend on a complete, consistent parse,
/// so skipping a bad line would corrupt everything downstream.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// I/O error (file operations, disk I/O)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An association line did not parse as `post_id,tag_id`.
    #[error("bad association record at line {line}: {text:?}")]
    AssociationParse { line: usize, text: String },

    /// A post-date line did not parse as `post_id,YYYY-MM-DD...`.
    #[error("bad post-date record at line {line}: {text:?}")]
    PostDateParse { line: usize, text: String },

    /// Date filtering was requested but an association references a post
    /// with no entry in the date table.
    #[error("post {post} has associations but no creation date")]
    MissingPostDate { post: u32 },

    /// A co-occurrence matrix line did not parse.
    #[error("bad matrix row at line {line}: {reason}")]
    MatrixParse { line: usize, reason: String },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
