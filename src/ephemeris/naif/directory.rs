//! Directory footer of Chebyshev SPK segments (types 2 and 3).
//!
//! The last four words of the segment are `[init, intlen, rsize, n]`: the start
//! of the first record (ET seconds), the span covered by each record (seconds),
//! the record length in words and the record count. Records are contiguous,
//! so the record covering an epoch is found by division.

use crate::boundary_errors::BoundaryError;

/// Directory footer of a Chebyshev SPK segment.
#[derive(Debug, PartialEq, Clone)]
pub struct DirectoryData {
    pub init: f64,
    pub intlen: f64,
    pub rsize: usize,
    pub n_records: usize,
}

impl DirectoryData {
    /// Read the footer from the decoded words of a segment.
    ///
    /// Arguments
    /// -----------------
    /// * `words`: all double-precision words of the segment, in file order.
    ///
    /// Return
    /// ----------
    /// * The footer, or [`BoundaryError::InvalidDafFile`] if the segment is too short
    ///   to hold the records the footer announces.
    pub fn from_segment_words(words: &[f64]) -> Result<Self, BoundaryError> {
        let [init, intlen, rsize, n_records] = match words {
            [.., a, b, c, d] => [*a, *b, *c, *d],
            _ => {
                return Err(BoundaryError::InvalidDafFile(
                    "Chebyshev segment shorter than its directory".to_string(),
                ))
            }
        };

        if !(intlen > 0.0 && rsize >= 3.0 && n_records >= 1.0) {
            return Err(BoundaryError::InvalidDafFile(format!(
                "invalid Chebyshev directory (intlen = {intlen}, rsize = {rsize}, n = {n_records})"
            )));
        }

        let directory = DirectoryData {
            init,
            intlen,
            rsize: rsize as usize,
            n_records: n_records as usize,
        };

        if directory.rsize * directory.n_records + 4 > words.len() {
            return Err(BoundaryError::InvalidDafFile(format!(
                "segment holds {} words, directory announces {} records of {} words",
                words.len(),
                directory.n_records,
                directory.rsize
            )));
        }
        Ok(directory)
    }

    /// 0-based index of the record covering `et_seconds`, clamped to the segment.
    pub fn record_index(&self, et_seconds: f64) -> usize {
        let raw = ((et_seconds - self.init) / self.intlen).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.n_records - 1)
        }
    }
}
