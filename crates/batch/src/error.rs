use thiserror::Error;

/// Rejections of a whole batch before any document is processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("No documents provided")]
    Empty,

    #[error("Too many documents: {count} submitted, maximum is {max} per batch")]
    TooManyDocuments { count: usize, max: usize },
}
