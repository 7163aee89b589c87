pub mod frame;
pub mod normalizer;
pub mod pipeline;
pub mod sampler;
pub mod source;
pub mod transcoder;

pub use frame::{Frame, Roi};
pub use normalizer::normalize_region;
pub use pipeline::{
    FrameOutcome, MeasurementPipeline, PipelineConfig, RejectionCounts, RunSummary,
};
pub use sampler::{FrameSampler, SampleAction};
pub use source::{FfmpegVideoSource, MemoryVideoSource, VideoSource};
pub use transcoder::{CompressionSummary, FfmpegTranscoder, TranscodeParams, Transcoder};
