//! Sequential frame sources.

use std::collections::VecDeque;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use log::{debug, info, warn};

use super::frame::Frame;
use crate::core::error::{ExtractError, Result};

/// Yields frames in order; `Ok(None)` marks the end of the stream.
pub trait VideoSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Decodes a video by piping raw RGB24 frames out of `ffmpeg`.
pub struct FfmpegVideoSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    next_number: u64,
}

impl FfmpegVideoSource {
    pub fn open(path: &Path, ffmpeg: &Path, ffprobe: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ExtractError::VideoNotFound(path.to_path_buf()));
        }

        let (width, height) = probe_dimensions(path, ffprobe)?;
        info!("🎞️ Opened {} ({}x{})", path.display(), width, height);

        let mut child = Command::new(ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ExtractError::from_spawn("ffmpeg", e))?;

        let stdout = child.stdout.take().ok_or_else(|| ExtractError::VideoOpen {
            path: path.to_path_buf(),
            reason: "ffmpeg stdout unavailable".to_string(),
        })?;

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            width,
            height,
            next_number: 0,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl VideoSource for FfmpegVideoSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut data = vec![0u8; Frame::byte_len(self.width, self.height)];
        match self.stdout.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!("End of stream after {} frames", self.next_number);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let frame = Frame::new(self.width, self.height, data, self.next_number);
        self.next_number += 1;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegVideoSource {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("ffmpeg already exited: {}", e);
        }
        let _ = self.child.wait();
    }
}

/// Asks `ffprobe` for the first video stream's `WIDTHxHEIGHT`.
fn probe_dimensions(path: &Path, ffprobe: &Path) -> Result<(u32, u32)> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path)
        .output()
        .map_err(|e| ExtractError::from_spawn("ffprobe", e))?;

    let open_err = |reason: String| ExtractError::VideoOpen {
        path: path.to_path_buf(),
        reason,
    };

    if !output.status.success() {
        return Err(open_err(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    parse_dimensions(&text).ok_or_else(|| open_err(format!("unexpected ffprobe output {:?}", text)))
}

fn parse_dimensions(text: &str) -> Option<(u32, u32)> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (w, h) = line.split_once('x')?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().trim_end_matches('x').parse().ok()?;
    if w == 0 || h == 0 {
        warn!("ffprobe reported an empty frame size: {}", line);
        return None;
    }
    Some((w, h))
}

/// In-memory source, mainly for tests and pre-decoded clips.
#[derive(Default)]
pub struct MemoryVideoSource {
    frames: VecDeque<Frame>,
}

impl MemoryVideoSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl VideoSource for MemoryVideoSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}
