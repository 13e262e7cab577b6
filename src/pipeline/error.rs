//! Error taxonomy for the extraction pipeline.
//!
//! Per-task errors (`MaskError`, `ExtractError`, their `TaskError` union) are
//! caught at task granularity by the batch coordinator and downgraded to
//! failure entries — they never abort a running batch. `BatchError` covers
//! precondition violations detected before any worker starts.

use thiserror::Error;

/// Errors from masking an image prior to extraction.
#[derive(Error, Debug)]
pub enum MaskError {
    #[error("cannot decode image bytes: {0}")]
    ImageDecode(String),

    #[error("cannot encode masked image: {0}")]
    ImageEncode(String),
}

/// Errors from the vision-language extraction boundary.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("extraction service unreachable at {0}")]
    Connection(String),

    #[error("extraction request timed out after {0}s")]
    Timeout(u64),

    #[error("extraction service returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),
}

/// A single task's failure cause. Carried inside the batch outcome, keyed by
/// filename — one task's error never cancels its siblings.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Batch-level validation failures. Fatal: returned before any worker thread
/// is spawned.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("batch contains no tasks")]
    EmptyBatch,

    #[error("invalid batch configuration: {0}")]
    Config(String),
}
