//! Headless front end for the facemosaic pipeline.
//!
//! Takes a single argument naming the frame source — an image file or a
//! directory of frames — runs the detect-and-redact loop over it, and
//! writes the composited frames as numbered PNGs. Live-device capture
//! and windowed display are collaborators this binary does not provide.
//!
//! Configuration comes from the environment:
//! - `FACEMOSAIC_MODEL`: path to the SeetaFace model
//!   (default `models/seeta_fd_frontal_v1.0.bin`)
//! - `FACEMOSAIC_MODE`: initial redaction mode, `outline` or `blur`
//!   (default `outline`)

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use facemosaic::{
    FaceMosaicError, FrameSource, KeyEvent, Presenter, RedactionMode, RustfaceDetector, Session,
};
use image::RgbImage;
use log::{info, warn};

const DEFAULT_MODEL_PATH: &str = "models/seeta_fd_frontal_v1.0.bin";
const OUTPUT_DIR: &str = "facemosaic-out";

/// Yields a single still image once, then ends the stream.
struct StillImageSource {
    frame: Option<RgbImage>,
}

impl StillImageSource {
    fn open(path: &Path) -> anyhow::Result<Self> {
        let frame = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        Ok(Self { frame: Some(frame) })
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        self.frame.take()
    }
}

/// Yields the image files of a directory in name order, one per pull.
/// A frame that fails to decode ends the stream, the same way a failed
/// capture read would.
struct FrameDirSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl FrameDirSource {
    fn open(dir: &Path) -> anyhow::Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("png" | "jpg" | "jpeg")
                )
            })
            .collect();
        paths.sort();
        anyhow::ensure!(!paths.is_empty(), "no frames found in {}", dir.display());
        Ok(Self { paths, next: 0 })
    }
}

impl FrameSource for FrameDirSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        let path = self.paths.get(self.next)?;
        self.next += 1;
        match image::open(path) {
            Ok(img) => Some(img.to_rgb8()),
            Err(e) => {
                warn!("failed to decode {}: {e}", path.display());
                None
            }
        }
    }
}

/// Presenter that writes each composited frame as a numbered PNG.
/// Headless, so the key poll never reports input.
struct PngSink {
    dir: PathBuf,
    frame_index: usize,
}

impl PngSink {
    fn create(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self { dir, frame_index: 0 })
    }
}

impl Presenter for PngSink {
    fn present(&mut self, frame: &RgbImage) -> Result<(), FaceMosaicError> {
        let path = self.dir.join(format!("frame_{:05}.png", self.frame_index));
        self.frame_index += 1;
        frame
            .save(&path)
            .map_err(|e| FaceMosaicError::Present(e.to_string()))
    }

    fn poll_key(&mut self, _timeout: Duration) -> KeyEvent {
        KeyEvent::None
    }
}

fn initial_mode() -> RedactionMode {
    match std::env::var("FACEMOSAIC_MODE").as_deref() {
        Ok("blur") => RedactionMode::Blur,
        _ => RedactionMode::Outline,
    }
}

fn run(source_arg: &str) -> anyhow::Result<usize> {
    let model_path =
        std::env::var("FACEMOSAIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());
    let detector = RustfaceDetector::from_model_path(&model_path)
        .with_context(|| format!("failed to load detector model from {model_path}"))?;

    let source_path = Path::new(source_arg);
    let mut source: Box<dyn FrameSource> = if source_path.is_dir() {
        Box::new(FrameDirSource::open(source_path)?)
    } else if source_path.is_file() {
        Box::new(StillImageSource::open(source_path)?)
    } else {
        anyhow::bail!("{source_arg}: not an image file or frame directory");
    };

    let mut sink = PngSink::create(OUTPUT_DIR)?;
    Session::new(Box::new(detector))
        .redaction_mode(initial_mode())
        .run(source.as_mut(), &mut sink)?;

    Ok(sink.frame_index)
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: facemosaic SOURCE");
        eprintln!("  SOURCE is an image file or a directory of frames");
        return ExitCode::FAILURE;
    }

    match run(&args[1]) {
        Ok(frames) => {
            info!("wrote {frames} frame(s) to {OUTPUT_DIR}/");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("facemosaic: {e:#}");
            ExitCode::FAILURE
        }
    }
}
