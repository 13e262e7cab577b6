//! Data types flowing through the batch extraction pipeline.

use serde::{Deserialize, Serialize};

use super::masking::MaskRegion;

/// One photographed ledger page queued for extraction.
///
/// Owned by the batch call that created it and dropped when the batch
/// completes; nothing in the pipeline retains task state across batches.
#[derive(Debug, Clone)]
pub struct ImageTask {
    pub filename: String,
    pub image_bytes: Vec<u8>,
    /// Regions to redact before the image leaves the machine, in draw order.
    pub regions: Vec<MaskRegion>,
}

impl ImageTask {
    pub fn new(filename: impl Into<String>, image_bytes: Vec<u8>, regions: Vec<MaskRegion>) -> Self {
        Self {
            filename: filename.into(),
            image_bytes,
            regions,
        }
    }
}

/// Raw structured output from the vision-language service: a header row plus
/// variable-width data rows. Cells are opaque JSON values — the service is
/// instructed to emit floats and ints for length/count but is not trusted to.
///
/// Consumed immediately by row normalization; a missing `rows` field is a
/// malformed response (`headers` may be absent).
#[derive(Debug, Clone, Deserialize)]
pub struct TableExtraction {
    #[serde(default)]
    pub headers: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// The flat, fixed-shape unit consumed by CSV/tabular presentation.
///
/// Emitted whole or not at all — a record never carries a partially
/// populated length/count pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Source photo the record came from.
    pub filename: String,
    /// 반출내용 — "입고" (inbound) or "출고" (outbound), carried as extracted.
    pub category: String,
    /// 구매방법 — "매매" (sale) or "임대" (lease), carried as extracted.
    pub method: String,
    /// 구매 품명(규격), e.g. "300x150".
    pub spec: String,
    /// Cut length in meters. `None` when the row carried no complete pair.
    pub length: Option<f64>,
    /// Piece count for that length. `None` when the row carried no complete pair.
    pub count: Option<i64>,
}

/// Why one task failed. The error is stringified so the outcome stays
/// serializable for the boundary layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFailure {
    pub filename: String,
    pub error: String,
}

/// Aggregate result of one batch run, including partial failures.
///
/// Handed to the caller (and optionally a session recorder) once, then
/// discarded; the pipeline keeps no copy.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Records from all succeeded tasks, grouped in completion order.
    /// Consumers needing submission order re-key by filename.
    pub records: Vec<NormalizedRecord>,
    pub failures: Vec<TaskFailure>,
}

impl BatchOutcome {
    /// Filenames of the tasks that failed.
    pub fn failed_filenames(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.filename.as_str()).collect()
    }
}
