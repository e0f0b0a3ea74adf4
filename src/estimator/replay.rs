//! Recorded landmark playback
//!
//! One frame per line: a JSON array of 33 landmarks, or `null` for a frame
//! where nobody was detected. Blank lines are skipped.

use crate::error::EstimatorError;
use crate::estimator::LandmarkEstimator;
use crate::pose::landmarks::LandmarkSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use tracing::debug;

pub struct ReplayEstimator<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl ReplayEstimator<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EstimatorError> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened landmark recording");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplayEstimator<R> {
    pub fn new(reader: R) -> Self {
        ReplayEstimator {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<LandmarkSet>, EstimatorError> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return Err(EstimatorError::Exhausted),
                Ok(_) => self.line += 1,
                // Invalid UTF-8: the line is consumed even though it is rejected.
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.line += 1;
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return serde_json::from_str::<Option<LandmarkSet>>(text).map_err(|source| {
                EstimatorError::Parse {
                    line: self.line,
                    source,
                }
            });
        }
    }
}

impl<R: BufRead> LandmarkEstimator for ReplayEstimator<R> {
    type Frame = ();

    fn estimate(&mut self, _frame: &()) -> Result<Option<LandmarkSet>, EstimatorError> {
        self.next_frame()
    }
}
