use std::io::Write;

use log::{debug, info, warn};
use serde::Serialize;

use crate::core::config::ExtractionConfig;
use crate::core::error::{ExtractError, Result};
use crate::core::ocr::recognizer::TextRecognizer;
use crate::core::ocr::tokens::{read_axes, Rejection};
use crate::core::readings::reading::{Reading, RunTally};
use crate::core::readings::record::{RecordWriter, WriteOutcome};
use crate::core::video::frame::{Frame, Roi};
use crate::core::video::normalizer::normalize_region;
use crate::core::video::sampler::{FrameSampler, SampleAction};
use crate::core::video::source::VideoSource;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub roi: Roi,
    pub step: u32,
}

impl PipelineConfig {
    pub fn new(roi: Roi) -> Self {
        Self { roi, step: 5 }
    }

    pub fn from_extraction(config: &ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            roi: config.require_roi()?,
            step: config.step,
        })
    }
}

/// What became of one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Rejected(Rejection),
    /// Parsed, but the displacement is implausible.
    Excluded(Reading),
    Accepted(Reading),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RejectionCounts {
    pub too_few_tokens: u64,
    pub corrupted: u64,
    pub not_numeric: u64,
    pub recognition_failed: u64,
    /// Frames whose size no longer fits the ROI.
    pub bad_frame: u64,
}

impl RejectionCounts {
    fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::TooFewTokens { .. } => self.too_few_tokens += 1,
            Rejection::Corrupted { .. } => self.corrupted += 1,
            Rejection::NotNumeric { .. } => self.not_numeric += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.too_few_tokens
            + self.corrupted
            + self.not_numeric
            + self.recognition_failed
            + self.bad_frame
    }
}

/// Counters for one extraction run.
///
/// `tally.count` only counts readings written to the record log; implausible
/// readings land in `excluded` and OCR failures in `rejected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_sampled: u64,
    pub excluded: u64,
    pub rejected: RejectionCounts,
    pub tally: RunTally,
}

impl RunSummary {
    pub fn accepted(&self) -> u64 {
        self.tally.count
    }
}

pub struct MeasurementPipeline {
    config: PipelineConfig,
    sampler: FrameSampler,
}

impl MeasurementPipeline {
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            sampler: FrameSampler::new(config.step),
            config,
        }
    }

    /// Normalize → recognize → tokenize → validate → compute for one frame.
    ///
    /// A frame that no longer fits the ROI is an `Err`, as is a recognizer failure.
    pub fn process_frame(
        &self,
        frame_id: u64,
        frame: &Frame,
        recognizer: &dyn TextRecognizer,
    ) -> Result<FrameOutcome> {
        if !frame.is_complete() {
            return Err(ExtractError::TruncatedFrame {
                frame_number: frame.frame_number,
                expected: Frame::byte_len(frame.width, frame.height),
                actual: frame.data.len(),
            });
        }
        self.config.roi.check_bounds(frame.width, frame.height)?;

        let binary = normalize_region(frame, &self.config.roi);
        let text = recognizer.recognize(&binary)?;

        let axes = match read_axes(&text) {
            Ok(axes) => axes,
            Err(rejection) => return Ok(FrameOutcome::Rejected(rejection)),
        };

        let reading = Reading::from_axes(frame_id, axes);
        if reading.is_valid() {
            Ok(FrameOutcome::Accepted(reading))
        } else {
            Ok(FrameOutcome::Excluded(reading))
        }
    }

    /// Reads the first frame and checks the ROI against it.
    ///
    /// Nothing is written before this succeeds.
    pub fn prime(&self, source: &mut dyn VideoSource) -> Result<Frame> {
        let first = source.next_frame()?.ok_or(ExtractError::NoFirstFrame)?;
        self.config.roi.check_bounds(first.width, first.height)?;
        info!(
            "🚀 ROI = {}, step = {}, frame size {}x{}",
            self.config.roi,
            self.sampler.step(),
            first.width,
            first.height
        );
        Ok(first)
    }

    /// Drives `source` to its end, writing accepted readings through `writer`.
    pub fn run<W: Write>(
        &mut self,
        source: &mut dyn VideoSource,
        recognizer: &dyn TextRecognizer,
        writer: &mut RecordWriter<W>,
    ) -> Result<RunSummary> {
        let first = self.prime(source)?;
        self.run_from(first, source, recognizer, writer)
    }

    /// Processes `first` (as frame 0) and the rest of `source`.
    pub fn run_from<W: Write>(
        &mut self,
        first: Frame,
        source: &mut dyn VideoSource,
        recognizer: &dyn TextRecognizer,
        writer: &mut RecordWriter<W>,
    ) -> Result<RunSummary> {
        self.sampler.reset();
        let mut summary = RunSummary::default();

        let mut next = Some(first);
        while let Some(frame) = next {
            summary.frames_read += 1;

            if let SampleAction::Process { frame_id } = self.sampler.next_frame() {
                summary.frames_sampled += 1;
                self.handle_frame(frame_id, &frame, recognizer, writer, &mut summary)?;
            }

            next = source.next_frame()?;
        }

        summary.tally = writer.tally();
        info!(
            "✅ Done: {} valid readings, max displacement = {:.6} mm ({} frames read, {} sampled, {} rejected, {} excluded)",
            summary.accepted(),
            summary.tally.max_displacement(),
            summary.frames_read,
            summary.frames_sampled,
            summary.rejected.total(),
            summary.excluded
        );
        Ok(summary)
    }

    fn handle_frame<W: Write>(
        &self,
        frame_id: u64,
        frame: &Frame,
        recognizer: &dyn TextRecognizer,
        writer: &mut RecordWriter<W>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let outcome = match self.process_frame(frame_id, frame, recognizer) {
            Ok(outcome) => outcome,
            Err(e @ ExtractError::ToolNotFound(_)) => return Err(e),
            Err(e @ (ExtractError::InvalidRoi { .. } | ExtractError::TruncatedFrame { .. })) => {
                warn!("⚠️ Frame{}: skipped: {}", frame_id, e);
                summary.rejected.bad_frame += 1;
                return Ok(());
            }
            Err(e) => {
                warn!("⚠️ Frame{}: recognition failed: {}", frame_id, e);
                summary.rejected.recognition_failed += 1;
                return Ok(());
            }
        };

        match outcome {
            FrameOutcome::Rejected(rejection) => {
                debug!("Frame{} skipped: {}", frame_id, rejection);
                summary.rejected.record(&rejection);
            }
            FrameOutcome::Accepted(reading) | FrameOutcome::Excluded(reading) => {
                if writer.write(&reading)? == WriteOutcome::Excluded {
                    summary.excluded += 1;
                }
            }
        }
        Ok(())
    }
}
