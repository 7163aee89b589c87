use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use super::reading::{Reading, RunTally};
use crate::core::error::Result;

/// One record-log line, without the trailing newline.
///
/// `Frame<id>: X <x> Y <y> Z <z> -> <displacement> mm`, axes with 4 decimals,
/// displacement with 6.
pub fn format_record(reading: &Reading) -> String {
    format!(
        "Frame{}: X {:.4} Y {:.4} Z {:.4} -> {:.6} mm",
        reading.frame_id, reading.x, reading.y, reading.z, reading.displacement
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteOutcome {
    Written,
    Excluded,
}

/// Append-only writer for the record log.
pub struct RecordWriter<W: Write> {
    out: W,
    tally: RunTally,
    excluded: u64,
}

impl RecordWriter<BufWriter<File>> {
    /// Creates (or truncates) the log file for a new run.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        info!("📝 Writing records to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tally: RunTally::default(),
            excluded: 0,
        }
    }

    /// Writes the reading if its displacement is plausible, otherwise reports it.
    pub fn write(&mut self, reading: &Reading) -> Result<WriteOutcome> {
        if !reading.is_valid() {
            self.excluded += 1;
            warn!(
                "⚠️ Excluded out-of-range reading: Frame{} displacement {:.6} mm",
                reading.frame_id, reading.displacement
            );
            return Ok(WriteOutcome::Excluded);
        }

        let line = format_record(reading);
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        info!("{}", line);

        self.tally = self.tally.observe(reading);
        Ok(WriteOutcome::Written)
    }

    pub fn tally(&self) -> RunTally {
        self.tally
    }

    pub fn excluded(&self) -> u64 {
        self.excluded
    }

    pub fn finish(mut self) -> Result<(RunTally, W)> {
        self.out.flush()?;
        Ok((self.tally, self.out))
    }
}
