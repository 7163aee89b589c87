use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::error;

use overlay_metrology::api::analyze::analyze_log;
use overlay_metrology::api::extract::MeasurementExtractor;
use overlay_metrology::api::transcode::compress_video;
use overlay_metrology::core::video::{FfmpegTranscoder, Roi};
use overlay_metrology::core::ExtractionConfig;

#[derive(Parser, Debug)]
#[command(
    name = "overlay-metrology",
    about = "Read XYZ probe readings burned into a video overlay and summarize the displacement"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the video, OCR the overlay and write the record log, then print the report
    Extract {
        #[command(flatten)]
        config: ConfigArgs,
        /// Transcode this raw recording into the video path before extracting
        #[arg(long, value_name = "PATH")]
        transcode_from: Option<PathBuf>,
        /// Skip the report after extraction
        #[arg(long)]
        no_report: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-read an existing record log and print the report
    Analyze {
        #[arg(value_name = "LOG", default_value = "valid_xyz.txt")]
        log: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Shrink a recording to the normalized resolution / frame rate
    Transcode {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long)]
        ffmpeg: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON5 config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    video: Option<PathBuf>,
    /// Overlay rectangle as x,y,width,height
    #[arg(long, value_name = "X,Y,W,H")]
    roi: Option<Roi>,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Process every N-th frame
    #[arg(long)]
    step: Option<u32>,
    #[arg(long)]
    tesseract: Option<PathBuf>,
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
    #[arg(long)]
    ffprobe: Option<PathBuf>,
}

impl ConfigArgs {
    fn resolve(self) -> Result<ExtractionConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(video) = self.video {
            config.video_path = video;
        }
        if let Some(roi) = self.roi {
            config.roi = Some(roi);
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(tesseract) = self.tesseract {
            config.tools.tesseract = tesseract;
        }
        if let Some(ffmpeg) = self.ffmpeg {
            config.tools.ffmpeg = ffmpeg;
        }
        if let Some(ffprobe) = self.ffprobe {
            config.tools.ffprobe = ffprobe;
        }
        Ok(config)
    }
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    match path {
        Some(path) => ExtractionConfig::from_json5_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ExtractionConfig::default()),
    }
}

fn print_report(log: &Path, json: bool) -> Result<()> {
    let outcome =
        analyze_log(log).with_context(|| format!("failed to read record log {}", log.display()))?;

    match outcome.report {
        Some(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
        Some(report) => println!("\n{}", report),
        None => println!("No valid data found in {}", log.display()),
    }

    if !outcome.parsed.excluded.is_empty() || !outcome.parsed.malformed.is_empty() {
        println!(
            "({} out-of-range lines excluded, {} malformed lines skipped)",
            outcome.parsed.excluded.len(),
            outcome.parsed.malformed.len()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract {
            config,
            transcode_from,
            no_report,
            json,
        } => {
            let config = config.resolve()?;

            if let Some(raw) = transcode_from {
                let transcoder = FfmpegTranscoder::new(&config.tools.ffmpeg);
                compress_video(&transcoder, &raw, &config.video_path, &config.transcode)
                    .context("transcoding failed")?;
            }

            let extractor = MeasurementExtractor::create(config)?;
            let output = extractor.config().output_path.clone();
            let summary = extractor.extract().context("extraction failed")?;
            println!(
                "\nDone: {} valid readings, max displacement = {:.6} mm",
                summary.accepted(),
                summary.tally.max_displacement()
            );

            if !no_report {
                print_report(&output, json)?;
            }
            Ok(())
        }
        Command::Analyze { log, json } => print_report(&log, json),
        Command::Transcode {
            input,
            output,
            config,
            ffmpeg,
        } => {
            let config = load_config(config.as_deref())?;
            let program = ffmpeg.unwrap_or(config.tools.ffmpeg);
            let summary = compress_video(
                &FfmpegTranscoder::new(program),
                &input,
                &output,
                &config.transcode,
            )?;
            println!("Original size: {:.2} MB", summary.original_mb);
            println!("Compressed size: {:.2} MB", summary.compressed_mb);
            println!("Reduction: {:.2}%", summary.reduction_pct);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    overlay_metrology::init_logging();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
