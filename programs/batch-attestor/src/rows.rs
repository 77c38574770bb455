//! Lenient CSV parsing into rows of string cells.
//!
//! No semantic validation happens here; rows are checked against the schema by
//! [`crate::layout::RowLayout`].

use csv::{ReaderBuilder, Trim};

/// One CSV record as an ordered list of trimmed cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedRow {
    /// 1-based line the record starts on in the source text.
    pub line: u64,
    pub cells: Vec<String>,
}

impl ParsedRow {
    pub fn new(line: u64, cells: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            line,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(String::is_empty)
    }
}

/// Parse raw CSV bytes into rows.
///
/// Never fails: rows may have any number of columns, stray quote characters are
/// kept as literal text and invalid UTF-8 is replaced. Blank rows are dropped.
/// When `has_header` is set the first record is skipped.
#[must_use]
pub fn parse_rows(input: &[u8], has_header: bool) -> Vec<ParsedRow> {
    let mut reader = ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(record = idx, "skipping unreadable CSV record: {e}");
                continue;
            }
        };

        let line = record.position().map_or(idx as u64 + 1, csv::Position::line);
        let row = ParsedRow::new(
            line,
            record
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).into_owned()),
        );
        if !row.is_blank() {
            rows.push(row);
        }
    }

    tracing::debug!(rows = rows.len(), "parsed CSV input");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(rows: &[ParsedRow]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.cells.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn parses_plain_rows() {
        let rows = parse_rows(b"42,hello,0xabc\n7, world ,0xdef\n", false);
        assert_eq!(
            cells(&rows),
            vec![vec!["42", "hello", "0xabc"], vec!["7", "world", "0xdef"]]
        );
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn tolerates_ragged_rows() {
        let rows = parse_rows(b"1,2,3\n1,2\n1,2,3,4\n", false);
        assert_eq!(rows.iter().map(|r| r.cells.len()).collect::<Vec<_>>(), vec![3, 2, 4]);
    }

    #[test]
    fn quoted_cells_keep_commas() {
        let rows = parse_rows(b"1,\"hello, world\",0xabc\n", false);
        assert_eq!(cells(&rows), vec![vec!["1", "hello, world", "0xabc"]]);
    }

    #[test]
    fn stray_quotes_do_not_fail() {
        let rows = parse_rows(b"42,he\"llo,0xabc\n", false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells.len(), 3);

        let rows = parse_rows(b"\"unbalanced,1,2\n3,4,5\n", false);
        assert!(!rows.is_empty());
    }

    #[test]
    fn skips_header_and_blank_lines() {
        let rows = parse_rows(b"value,note,recipient\n\n1,a,0x1\n , , \n", true);
        assert_eq!(cells(&rows), vec![vec!["1", "a", "0x1"]]);
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(parse_rows(b"", false).is_empty());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let rows = parse_rows(b"42,caf\xe9,0xabc\n", false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells[1], "caf\u{FFFD}");
        assert_eq!(rows[0].cells[2], "0xabc");
    }
}
