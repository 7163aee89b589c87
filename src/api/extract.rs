//! Live extraction driver: video → record log.

use log::info;

use crate::core::config::ExtractionConfig;
use crate::core::error::Result;
use crate::core::ocr::recognizer::{TesseractCli, TextRecognizer};
use crate::core::readings::record::RecordWriter;
use crate::core::video::pipeline::{MeasurementPipeline, PipelineConfig, RunSummary};
use crate::core::video::source::{FfmpegVideoSource, VideoSource};

/// Owns the run configuration and the injected recognizer.
///
/// ```no_run
/// use overlay_metrology::api::extract::MeasurementExtractor;
/// use overlay_metrology::core::ExtractionConfig;
///
/// let config = ExtractionConfig::from_json5_file("probe.json5")?;
/// let extractor = MeasurementExtractor::create(config)?;
/// let summary = extractor.extract()?;
/// println!("{} valid readings", summary.accepted());
/// # Ok::<(), overlay_metrology::core::ExtractError>(())
/// ```
pub struct MeasurementExtractor {
    config: ExtractionConfig,
    pipeline_config: PipelineConfig,
    recognizer: Box<dyn TextRecognizer>,
}

impl MeasurementExtractor {
    /// Uses the `tesseract` binary named in the config.
    pub fn create(config: ExtractionConfig) -> Result<Self> {
        let recognizer = TesseractCli::new(&config.tools.tesseract)?;
        Self::with_recognizer(config, Box::new(recognizer))
    }

    pub fn with_recognizer(
        config: ExtractionConfig,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Result<Self> {
        let pipeline_config = PipelineConfig::from_extraction(&config)?;
        info!("🎬 MeasurementExtractor: created for {}", config.video_path.display());
        Ok(Self {
            config,
            pipeline_config,
            recognizer,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Decodes the configured video with ffmpeg and runs the pipeline over it.
    pub fn extract(&self) -> Result<RunSummary> {
        let mut source = FfmpegVideoSource::open(
            &self.config.video_path,
            &self.config.tools.ffmpeg,
            &self.config.tools.ffprobe,
        )?;
        let (width, height) = source.dimensions();
        info!("🎞️ Decoding {}x{} frames", width, height);
        self.extract_from(&mut source)
    }

    /// Runs the pipeline over any frame source, writing the configured record log.
    ///
    /// The log is only created once the first frame has been read and the ROI
    /// checked against it.
    pub fn extract_from(&self, source: &mut dyn VideoSource) -> Result<RunSummary> {
        let mut pipeline = MeasurementPipeline::with_config(self.pipeline_config.clone());
        let first = pipeline.prime(source)?;

        let mut writer = RecordWriter::create(&self.config.output_path)?;
        let summary = pipeline.run_from(first, source, self.recognizer.as_ref(), &mut writer)?;
        writer.finish()?;
        Ok(summary)
    }
}
