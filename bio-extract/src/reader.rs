//! Lazy CSV reader producing one [`BioRecord`] per data row.
//!
//! The `csv` crate silently drops empty lines and does not count them in its
//! line numbers, so the reader keeps its own physical line count over the
//! buffered input and reports every empty line as a row with no columns.

use std::collections::VecDeque;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use csv::{Position, StringRecord};

use crate::errors::{FormatError, PipelineError};

/// One bio to extract, as read from the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioRecord {
    /// Identifier from column 0.
    pub id: String,
    /// Bio text from column 1 with surrounding asterisks removed.
    pub text: String,
    /// 1-based physical line of the row in the input.
    pub line: u64,
}

/// Reads `id,bio` rows, discarding the header row.
pub struct BioReader {
    data: Arc<[u8]>,
}

impl BioReader {
    /// Reads a CSV file into memory.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Input` if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| PipelineError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(data))
    }

    /// Wraps CSV content that is already in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Arc::from(data.into()),
        }
    }

    /// Yields the data rows in file order.
    ///
    /// The first row (blank or not) is the header and is dropped. A bad row,
    /// including an empty line, yields a [`FormatError`] and iteration
    /// continues with the next one.
    pub fn records(self) -> impl Iterator<Item = Result<BioRecord, FormatError>> {
        let csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(Cursor::new(Arc::clone(&self.data)));
        Rows {
            csv,
            data: self.data,
            record: StringRecord::new(),
            cursor: LineCursor { offset: 0, line: 1 },
            queue: VecDeque::new(),
            header_dropped: false,
            finished: false,
        }
    }
}

struct Rows {
    csv: csv::Reader<Cursor<Arc<[u8]>>>,
    data: Arc<[u8]>,
    record: StringRecord,
    cursor: LineCursor,
    queue: VecDeque<Result<BioRecord, FormatError>>,
    header_dropped: bool,
    finished: bool,
}

impl Iterator for Rows {
    type Item = Result<BioRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.queue.pop_front() {
                if self.header_dropped {
                    return Some(row);
                }
                self.header_dropped = true;
                continue;
            }
            if !self.fill() {
                return None;
            }
        }
    }
}

impl Rows {
    /// Reads the next CSV record and queues it behind any empty lines that
    /// preceded it. Returns `false` once the input is exhausted.
    fn fill(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let data = Arc::clone(&self.data);
        let read = self.csv.read_record(&mut self.record);
        let end = byte_offset(self.csv.position(), data.len());

        match read {
            Ok(true) => {
                let line = self.skip_empty_lines(&data, end);
                self.cursor.advance(&data, end);
                self.queue.push_back(to_bio_record(&self.record, line));
            }
            Ok(false) => {
                self.skip_empty_lines(&data, data.len());
                self.finished = true;
            }
            Err(e) => {
                let line = self.skip_empty_lines(&data, end);
                self.cursor.advance(&data, end);
                if e.is_io_error() {
                    self.finished = true;
                }
                self.queue.push_back(Err(FormatError::Csv {
                    line,
                    message: e.to_string(),
                }));
            }
        }
        true
    }

    /// Queues a `MissingColumns` row for each empty line ahead of the cursor
    /// and returns the line the next row starts on.
    fn skip_empty_lines(&mut self, data: &[u8], limit: usize) -> u64 {
        for line in self.cursor.skip_gap(data, limit) {
            self.queue
                .push_back(Err(FormatError::MissingColumns { line, found: 0 }));
        }
        self.cursor.line
    }
}

/// Physical position in the buffered input.
struct LineCursor {
    offset: usize,
    line: u64,
}

impl LineCursor {
    /// Consumes the run of line terminators at the cursor (never past
    /// `limit`) and returns the line numbers of the empty lines among them.
    ///
    /// A terminator that closes a line begun before the cursor (the `\n` of a
    /// split `\r\n`, or a record terminator the CSV reader has not consumed)
    /// is not an empty line.
    fn skip_gap(&mut self, data: &[u8], limit: usize) -> Vec<u64> {
        let limit = limit.min(data.len());
        let mut fresh = match self.offset.checked_sub(1).map(|i| data[i]) {
            None | Some(b'\n') => true,
            Some(b'\r') => data.get(self.offset) != Some(&b'\n'),
            Some(_) => false,
        };
        let mut empty = Vec::new();
        while self.offset < limit && matches!(data[self.offset], b'\r' | b'\n') {
            if is_terminator(data, self.offset) {
                if fresh {
                    empty.push(self.line);
                }
                self.line += 1;
                fresh = true;
            }
            self.offset += 1;
        }
        empty
    }

    /// Moves the cursor to `end`, counting the line breaks passed over.
    fn advance(&mut self, data: &[u8], end: usize) {
        let end = end.min(data.len());
        while self.offset < end {
            if is_terminator(data, self.offset) {
                self.line += 1;
            }
            self.offset += 1;
        }
    }
}

// `\r\n` counts once, at the `\n`.
fn is_terminator(data: &[u8], at: usize) -> bool {
    match data[at] {
        b'\n' => true,
        b'\r' => data.get(at + 1) != Some(&b'\n'),
        _ => false,
    }
}

fn byte_offset(position: &Position, len: usize) -> usize {
    usize::try_from(position.byte()).map_or(len, |byte| byte.min(len))
}

fn to_bio_record(record: &StringRecord, line: u64) -> Result<BioRecord, FormatError> {
    match (record.get(0), record.get(1)) {
        (Some(id), Some(text)) => Ok(BioRecord {
            id: id.to_string(),
            text: strip_asterisks(text).to_string(),
            line,
        }),
        _ => Err(FormatError::MissingColumns {
            line,
            found: record.len(),
        }),
    }
}

/// Removes leading and trailing `*` characters, leaving whitespace alone.
#[must_use]
pub fn strip_asterisks(text: &str) -> &str {
    text.trim_matches('*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> Vec<Result<BioRecord, FormatError>> {
        BioReader::from_bytes(input).records().collect()
    }

    #[test]
    fn test_strip_asterisks() {
        assert_eq!(strip_asterisks("*I love hiking*"), "I love hiking");
        assert_eq!(strip_asterisks("**bold** claims"), "bold** claims");
        assert_eq!(strip_asterisks(" *spaced* "), " *spaced* ");
        assert_eq!(strip_asterisks("***"), "");
    }

    #[test]
    fn test_header_skipped_and_columns_mapped() {
        let rows = read("uid,bio\n1,*I love hiking*\n2,\"Coffee, books, cats\"\n");

        assert_eq!(rows.len(), 2);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(first.text, "I love hiking");
        assert_eq!(first.line, 2);
        assert_eq!(rows[1].as_ref().unwrap().text, "Coffee, books, cats");
    }

    #[test]
    fn test_header_skipped_even_if_it_looks_like_data() {
        let rows = read("42,*first row*\n43,second\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().id, "43");
    }

    #[test]
    fn test_short_row_is_reported_not_fatal() {
        let rows = read("uid,bio\n1,hello\nlonely\n3,world,extra\n");

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            Err(FormatError::MissingColumns { line: 3, found: 1 })
        );
        let third = rows[2].as_ref().unwrap();
        assert_eq!(third.id, "3");
        assert_eq!(third.text, "world");
    }

    #[test]
    fn test_empty_line_is_a_row_without_columns() {
        let rows = read("uid,bio\n1,a\n\n3,c\n");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap().line, 2);
        assert_eq!(
            rows[1],
            Err(FormatError::MissingColumns { line: 3, found: 0 })
        );
        let third = rows[2].as_ref().unwrap();
        assert_eq!(third.id, "3");
        assert_eq!(third.line, 4);
    }

    #[test]
    fn test_empty_lines_with_crlf_endings() {
        let rows = read("uid,bio\r\n1,a\r\n\r\n\r\n4,d\r\n");

        assert_eq!(
            rows,
            vec![
                Ok(BioRecord {
                    id: "1".to_string(),
                    text: "a".to_string(),
                    line: 2,
                }),
                Err(FormatError::MissingColumns { line: 3, found: 0 }),
                Err(FormatError::MissingColumns { line: 4, found: 0 }),
                Ok(BioRecord {
                    id: "4".to_string(),
                    text: "d".to_string(),
                    line: 5,
                }),
            ]
        );
    }

    #[test]
    fn test_trailing_empty_line_is_reported() {
        let rows = read("uid,bio\n1,a\n\n");

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            Err(FormatError::MissingColumns { line: 3, found: 0 })
        );
    }

    #[test]
    fn test_multiline_bio_keeps_later_lines_physical() {
        let rows = read("uid,bio\n1,\"two\nlines\"\n\n4,after\n");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap().text, "two\nlines");
        assert_eq!(
            rows[1],
            Err(FormatError::MissingColumns { line: 4, found: 0 })
        );
        assert_eq!(rows[2].as_ref().unwrap().line, 5);
    }

    #[test]
    fn test_invalid_utf8_row_is_reported() {
        let mut input = b"uid,bio\n1,ok\n2,".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\n3,fine\n");

        let rows: Vec<_> = BioReader::from_bytes(input).records().collect();

        assert_eq!(rows.len(), 3);
        assert!(matches!(rows[1], Err(FormatError::Csv { line: 3, .. })));
        assert_eq!(rows[2].as_ref().unwrap().id, "3");
    }

    #[test]
    fn test_open_missing_file() {
        let result = BioReader::open("/definitely/not/here.csv");
        assert!(matches!(result, Err(PipelineError::Input { .. })));
    }
}
