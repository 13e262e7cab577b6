//! Row normalization — expands one variable-width extracted row into flat
//! records.
//!
//! A ledger row always carries `[반출내용, 구매방법, 규격]` and then zero or
//! more `(길이, 갯수)` pairs, because one entry may list several cut lengths
//! of the same material. Downstream tabular consumers need one record per
//! length, so this is a one-to-many fan-out:
//!
//! - fewer than 3 cells → nothing (the row is unusable),
//! - 3–4 cells → one record with empty length/count,
//! - 5+ cells → one record per complete, non-null `(length, count)` pair
//!   starting at index 3; a trailing unpaired value is dropped.
//!
//! The orphan drop on odd-width rows mirrors the paper workflow's historic
//! behavior and is intentionally left as-is.

use serde_json::Value;

use super::types::NormalizedRecord;

/// Index of the first length/count pair within a row.
const FIRST_PAIR_INDEX: usize = 3;

/// Expand one extracted row into records for `filename`.
///
/// Returns a lazy, finite iterator; it is consumed once and is not
/// restartable. Records come out in the order their pairs appear in the row.
pub fn normalize_row<'a>(filename: &'a str, row: &'a [Value]) -> RowRecords<'a> {
    let state = if row.len() < FIRST_PAIR_INDEX {
        RowState::Empty
    } else if row.len() >= FIRST_PAIR_INDEX + 2 {
        RowState::Pairs { next: FIRST_PAIR_INDEX }
    } else {
        RowState::Bare
    };
    RowRecords { filename, row, state }
}

/// Flatten a whole extraction (every row) into records for `filename`.
pub fn normalize_extraction(
    filename: &str,
    rows: &[Vec<Value>],
) -> Vec<NormalizedRecord> {
    rows.iter()
        .flat_map(|row| normalize_row(filename, row))
        .collect()
}

/// Lazy record sequence produced by [`normalize_row`]. Single consumption.
pub struct RowRecords<'a> {
    filename: &'a str,
    row: &'a [Value],
    state: RowState,
}

#[derive(Clone, Copy)]
enum RowState {
    /// Row too short — yields nothing.
    Empty,
    /// No complete pair present — yields one record with empty length/count.
    Bare,
    /// Stepping through `(length, count)` pairs from `next`.
    Pairs { next: usize },
    Done,
}

impl Iterator for RowRecords<'_> {
    type Item = NormalizedRecord;

    fn next(&mut self) -> Option<NormalizedRecord> {
        loop {
            match self.state {
                RowState::Empty | RowState::Done => return None,
                RowState::Bare => {
                    self.state = RowState::Done;
                    return Some(self.record(None, None));
                }
                RowState::Pairs { next } => {
                    // A lone trailing value has no count partner; drop it.
                    if next + 1 >= self.row.len() {
                        self.state = RowState::Done;
                        return None;
                    }
                    self.state = RowState::Pairs { next: next + 2 };

                    let (raw_length, raw_count) = (&self.row[next], &self.row[next + 1]);
                    if raw_length.is_null() || raw_count.is_null() {
                        continue;
                    }
                    match (as_length(raw_length), as_count(raw_count)) {
                        (Some(length), Some(count)) => {
                            return Some(self.record(Some(length), Some(count)));
                        }
                        _ => {
                            tracing::warn!(
                                filename = %self.filename,
                                length = %raw_length,
                                count = %raw_count,
                                "skipping length/count pair with non-numeric values"
                            );
                            continue;
                        }
                    }
                }
            }
        }
    }
}

impl RowRecords<'_> {
    fn record(&self, length: Option<f64>, count: Option<i64>) -> NormalizedRecord {
        NormalizedRecord {
            filename: self.filename.to_string(),
            category: cell_text(&self.row[0]),
            method: cell_text(&self.row[1]),
            spec: cell_text(&self.row[2]),
            length,
            count,
        }
    }
}

/// Stringify a base-triple cell. Null becomes the empty string; non-string
/// scalars keep their JSON rendering.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a length cell: JSON number or numeric string, meters.
fn as_length(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a count cell: JSON integer, whole-valued float, or numeric string.
fn as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(values: serde_json::Value) -> Vec<Value> {
        values.as_array().unwrap().clone()
    }

    #[test]
    fn short_rows_yield_nothing() {
        for short in [json!([]), json!(["입고"]), json!(["입고", "매매"])] {
            let records: Vec<_> = normalize_row("f.png", &row(short)).collect();
            assert!(records.is_empty());
        }
    }

    #[test]
    fn single_pair_row_yields_one_record() {
        let records: Vec<_> =
            normalize_row("f.png", &row(json!(["입고", "매매", "200x200", "12.1", "1"]))).collect();
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.filename, "f.png");
        assert_eq!(rec.category, "입고");
        assert_eq!(rec.method, "매매");
        assert_eq!(rec.spec, "200x200");
        assert_eq!(rec.length, Some(12.1));
        assert_eq!(rec.count, Some(1));
    }

    #[test]
    fn two_pair_row_yields_two_records_in_order() {
        let records: Vec<_> = normalize_row(
            "f.png",
            &row(json!(["출고", "임대", "300x150", "12", "34", "10", "12"])),
        )
        .collect();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].length, records[0].count), (Some(12.0), Some(34)));
        assert_eq!((records[1].length, records[1].count), (Some(10.0), Some(12)));
        assert!(records.iter().all(|r| r.category == "출고" && r.method == "임대"));
    }

    #[test]
    fn bare_triple_yields_one_empty_pair_record() {
        let records: Vec<_> =
            normalize_row("f.png", &row(json!(["입고", "매매", "200x200"]))).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].length, None);
        assert_eq!(records[0].count, None);
    }

    #[test]
    fn four_cell_row_has_no_complete_pair() {
        // One length without a count: the original flow treats this like a
        // bare triple.
        let records: Vec<_> =
            normalize_row("f.png", &row(json!(["입고", "매매", "200x200", "12.1"]))).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].length, None);
        assert_eq!(records[0].count, None);
    }

    #[test]
    fn odd_tail_orphan_is_dropped() {
        // 2 complete pairs + 1 orphan length; the orphan vanishes.
        let records: Vec<_> = normalize_row(
            "f.png",
            &row(json!(["입고", "매매", "150x150", 6.0, 2, 9.5, 4, 11.0])),
        )
        .collect();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].length, records[0].count), (Some(6.0), Some(2)));
        assert_eq!((records[1].length, records[1].count), (Some(9.5), Some(4)));
    }

    #[test]
    fn null_pairs_are_skipped_but_later_pairs_emit() {
        let records: Vec<_> = normalize_row(
            "f.png",
            &row(json!(["출고", "매매", "400x200", null, null, 7.2, 3])),
        )
        .collect();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].length, records[0].count), (Some(7.2), Some(3)));
    }

    #[test]
    fn wide_row_with_only_null_pairs_yields_nothing() {
        let records: Vec<_> = normalize_row(
            "f.png",
            &row(json!(["출고", "매매", "400x200", null, null, null, null])),
        )
        .collect();
        assert!(records.is_empty());
    }

    #[test]
    fn numeric_cells_accept_numbers_and_strings() {
        let records: Vec<_> = normalize_row(
            "f.png",
            &row(json!(["입고", "매매", "250x250", 12.1, "1", "10", 12])),
        )
        .collect();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].length, records[0].count), (Some(12.1), Some(1)));
        assert_eq!((records[1].length, records[1].count), (Some(10.0), Some(12)));
    }

    #[test]
    fn non_numeric_pair_is_skipped() {
        let records: Vec<_> = normalize_row(
            "f.png",
            &row(json!(["입고", "매매", "250x250", "약 12m", "한 개", 10, 2])),
        )
        .collect();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].length, records[0].count), (Some(10.0), Some(2)));
    }

    #[test]
    fn non_string_base_cells_are_stringified() {
        let records: Vec<_> = normalize_row("f.png", &row(json!([1, null, "200x100"]))).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "1");
        assert_eq!(records[0].method, "");
        assert_eq!(records[0].spec, "200x100");
    }

    #[test]
    fn normalize_extraction_flattens_all_rows() {
        let rows = vec![
            row(json!(["입고", "매매", "200x200", 12.1, 1])),
            row(json!(["출고"])),
            row(json!(["출고", "임대", "300x150"])),
        ];
        let records = normalize_extraction("scan.jpg", &rows);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.filename == "scan.jpg"));
    }

    #[test]
    fn fractional_count_is_rejected() {
        let records: Vec<_> =
            normalize_row("f.png", &row(json!(["입고", "매매", "200x200", 12.0, 1.5]))).collect();
        assert!(records.is_empty());
    }
}
