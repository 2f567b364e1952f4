//! Streaming claim reader.
//!
//! Pulls one CSV row at a time from any `Read` source; the whole file is
//! never held in memory. The file handle is owned by the reader and
//! released when it is dropped, on success and error paths alike.
//!
//! RULE: a row whose column count differs from the header aborts the
//! stream. Silent partial ingestion of financial data is worse than a
//! failed run.

use crate::{
    error::{AggError, AggResult},
    record::{HeaderIndex, RawClaim},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub struct ClaimReader<R: Read> {
    inner: csv::Reader<R>,
    headers: Arc<HeaderIndex>,
    finished: bool,
}

impl ClaimReader<File> {
    /// Open `path` for streaming. A missing file is `AggError::InputNotFound`.
    pub fn open(path: impl AsRef<Path>) -> AggResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AggError::InputNotFound {
                path: path.display().to_string(),
            });
        }
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read> ClaimReader<R> {
    pub fn from_reader(source: R) -> AggResult<Self> {
        let mut inner = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            // Column counts are checked in next() to report a precise error.
            .flexible(true)
            .from_reader(source);
        let headers = Arc::new(HeaderIndex::new(inner.headers()?));
        log::debug!("Columns: {}", headers.names().join(", "));
        Ok(Self {
            inner,
            headers,
            finished: false,
        })
    }

    pub fn headers(&self) -> &HeaderIndex {
        &self.headers
    }

    /// Drain the stream into memory. Used by the in-memory run mode.
    pub fn read_all(self) -> AggResult<Vec<RawClaim>> {
        self.collect()
    }

    /// A whitespace-only line trims down to a single empty field. Rows of
    /// empty cells with the full column count are claims, not blank lines.
    fn is_blank_line(&self, record: &StringRecord) -> bool {
        self.headers.len() > 1 && record.len() == 1 && record[0].trim().is_empty()
    }
}

impl<R: Read> Iterator for ClaimReader<R> {
    type Item = AggResult<RawClaim>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let mut record = StringRecord::new();
            match self.inner.read_record(&mut record) {
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                Ok(true) => {
                    if self.is_blank_line(&record) {
                        continue;
                    }
                    let line = record.position().map(|p| p.line()).unwrap_or(0);
                    if record.len() != self.headers.len() {
                        self.finished = true;
                        return Some(Err(AggError::MalformedRow {
                            line,
                            expected: self.headers.len(),
                            found: record.len(),
                        }));
                    }
                    return Some(Ok(RawClaim::new(Arc::clone(&self.headers), record, line)));
                }
            }
        }
    }
}
