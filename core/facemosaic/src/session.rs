use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbImage;
use log::debug;

use crate::error::FaceMosaicError;
use crate::face_detector::FaceDetector;
use crate::mosaic::mosaic;
use crate::redact::redact_regions;
use crate::scale::{size_at_most, BudgetedSize};
use crate::RedactionMode;

/// Default height budget for the frame handed to the detector, chosen
/// to keep the classifier's per-frame cost bounded.
pub const DEFAULT_DETECT_BUDGET: u32 = 400;

/// Default height budget for the mosaic's intermediate tiny frame,
/// chosen to produce visibly blocky, identity-obscuring redaction.
pub const DEFAULT_MOSAIC_BUDGET: u32 = 40;

/// Default key-poll timeout, matching a few-millisecond interactive poll.
pub const DEFAULT_KEY_POLL_TIMEOUT: Duration = Duration::from_millis(5);

/// Supplies successive frames to the session loop.
///
/// `None` ends the session: end-of-stream and a transient read failure
/// are deliberately indistinguishable, and neither is reported as an
/// error distinct from normal completion.
pub trait FrameSource {
    /// Pull the next frame. May block indefinitely for live devices.
    fn next_frame(&mut self) -> Option<RgbImage>;
}

/// Result of a bounded key-input poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// No key was pressed within the timeout.
    None,
    /// End the session.
    Quit,
    /// Flip the redaction mode between outline and blur.
    ToggleRedaction,
}

/// Display/input collaborator: presents composited frames and polls for
/// key input without blocking past the given timeout.
pub trait Presenter {
    /// Present a composited frame.
    fn present(&mut self, frame: &RgbImage) -> Result<(), FaceMosaicError>;

    /// Poll for a key event, returning within `timeout`.
    fn poll_key(&mut self, timeout: Duration) -> KeyEvent;
}

/// Sizes and scales derived from the first frame of a session.
///
/// Computed exactly once, on the transition out of
/// [`SessionState::AwaitingFirstFrame`], and never recomputed — even if
/// a later frame arrives at a different resolution. That persistence
/// mirrors the behavior of the system this pipeline was built against
/// and is a known limitation for sources that renegotiate their format
/// mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCache {
    /// Width of the first frame, in pixels.
    pub original_width: u32,
    /// Height of the first frame, in pixels.
    pub original_height: u32,
    /// Detection-scale size and the factor back to original coordinates.
    pub detect: BudgetedSize,
    /// Tiny intermediate size for the mosaic passes (its scale is unused).
    pub tiny: BudgetedSize,
}

/// Lifecycle of a redaction session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No frame received yet; the cache is not populated.
    AwaitingFirstFrame,
    /// Frames are being processed with the cache fixed at first-frame values.
    Running(SessionCache),
    /// Absorbing terminal state; no further frames are processed.
    Terminated,
}

/// Owns the per-session cache, the interactive redaction mode, and the
/// frame loop's termination condition.
///
/// Built with the detector it cannot run without, then configured
/// builder-style:
///
/// ```no_run
/// use facemosaic::{RustfaceDetector, Session};
///
/// let detector = RustfaceDetector::from_model_path("seeta_fd_frontal_v1.0.bin").unwrap();
/// let session = Session::new(Box::new(detector))
///     .detect_budget(400)
///     .mosaic_budget(40);
/// ```
pub struct Session {
    detector: Box<dyn FaceDetector>,
    state: SessionState,
    mode: RedactionMode,
    detect_budget: u32,
    mosaic_budget: u32,
    key_poll_timeout: Duration,
}

impl Session {
    /// Create a session around a face detection backend, with default
    /// budgets and outline mode.
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            detector,
            state: SessionState::AwaitingFirstFrame,
            mode: RedactionMode::Outline,
            detect_budget: DEFAULT_DETECT_BUDGET,
            mosaic_budget: DEFAULT_MOSAIC_BUDGET,
            key_poll_timeout: DEFAULT_KEY_POLL_TIMEOUT,
        }
    }

    /// Set the detection height budget (default: 400).
    pub fn detect_budget(mut self, budget: u32) -> Self {
        self.detect_budget = budget;
        self
    }

    /// Set the mosaic tiny-frame height budget (default: 40).
    pub fn mosaic_budget(mut self, budget: u32) -> Self {
        self.mosaic_budget = budget;
        self
    }

    /// Set the initial redaction mode (default: outline).
    pub fn redaction_mode(mut self, mode: RedactionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the per-iteration key-poll timeout (default: 5 ms).
    pub fn key_poll_timeout(mut self, timeout: Duration) -> Self {
        self.key_poll_timeout = timeout;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Cached sizes, if the first frame has been seen.
    pub fn cache(&self) -> Option<&SessionCache> {
        match &self.state {
            SessionState::Running(cache) => Some(cache),
            _ => None,
        }
    }

    /// Current redaction mode.
    pub fn mode(&self) -> RedactionMode {
        self.mode
    }

    /// Flip between outline and blur. Changes only the mode, never the
    /// lifecycle state.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        debug!("redaction mode toggled to {:?}", self.mode);
    }

    fn validate_budgets(&self) -> Result<(), FaceMosaicError> {
        if self.detect_budget == 0 || self.mosaic_budget == 0 {
            return Err(FaceMosaicError::InvalidBudget);
        }
        Ok(())
    }

    /// Process one frame: populate the cache on the first call, then
    /// downsample, detect, build the mosaic, and composite according to
    /// the current mode.
    ///
    /// A terminated session passes the frame through untouched.
    pub fn process_frame(&mut self, mut frame: RgbImage) -> Result<RgbImage, FaceMosaicError> {
        let cache = match self.state {
            SessionState::AwaitingFirstFrame => {
                self.validate_budgets()?;
                let cache = SessionCache {
                    original_width: frame.width(),
                    original_height: frame.height(),
                    detect: size_at_most(frame.width(), frame.height(), self.detect_budget),
                    tiny: size_at_most(frame.width(), frame.height(), self.mosaic_budget),
                };
                debug!(
                    "first frame {}x{}: detect {}x{} (scale {}), tiny {}x{}",
                    cache.original_width,
                    cache.original_height,
                    cache.detect.width,
                    cache.detect.height,
                    cache.detect.scale,
                    cache.tiny.width,
                    cache.tiny.height,
                );
                self.state = SessionState::Running(cache);
                cache
            }
            SessionState::Running(cache) => cache,
            SessionState::Terminated => return Ok(frame),
        };

        let gray = imageops::grayscale(&frame);
        let small = imageops::resize(
            &gray,
            cache.detect.width,
            cache.detect.height,
            FilterType::Triangle,
        );

        let rects = self
            .detector
            .detect(small.as_raw(), small.width(), small.height());
        debug!("{} face(s) detected", rects.len());

        // Always built, so toggling to blur costs nothing extra on the
        // frame where it happens.
        let blurred = mosaic(&frame, cache.tiny.width, cache.tiny.height);

        redact_regions(&mut frame, &blurred, &rects, cache.detect.scale, self.mode);
        Ok(frame)
    }

    /// Drive the session loop until the source ends or a quit key is
    /// polled.
    ///
    /// Each iteration pulls a frame, processes it, presents the result,
    /// and polls for key input; a quit event takes effect at the top of
    /// the next loop check. Budgets are validated before the first pull.
    pub fn run(
        mut self,
        source: &mut dyn FrameSource,
        presenter: &mut dyn Presenter,
    ) -> Result<(), FaceMosaicError> {
        self.validate_budgets()?;

        loop {
            if self.state == SessionState::Terminated {
                break;
            }

            let Some(frame) = source.next_frame() else {
                debug!("frame source ended");
                self.state = SessionState::Terminated;
                break;
            };

            let composited = self.process_frame(frame)?;
            presenter.present(&composited)?;

            match presenter.poll_key(self.key_poll_timeout) {
                KeyEvent::Quit => self.state = SessionState::Terminated,
                KeyEvent::ToggleRedaction => self.toggle_mode(),
                KeyEvent::None => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face_detector::FaceRect;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn make_test_rgb(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    struct StubDetector {
        rects: Vec<FaceRect>,
        calls: Arc<AtomicUsize>,
    }

    impl StubDetector {
        fn empty() -> Self {
            Self { rects: Vec::new(), calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    impl FaceDetector for StubDetector {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRect> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rects.clone()
        }
    }

    #[test]
    fn builder_defaults() {
        let session = Session::new(Box::new(StubDetector::empty()));
        assert_eq!(session.mode(), RedactionMode::Outline);
        assert_eq!(*session.state(), SessionState::AwaitingFirstFrame);
        assert_eq!(session.detect_budget, 400);
        assert_eq!(session.mosaic_budget, 40);
        assert_eq!(session.key_poll_timeout, Duration::from_millis(5));
    }

    #[test]
    fn first_frame_populates_cache_and_transitions() {
        let mut session = Session::new(Box::new(StubDetector::empty()))
            .detect_budget(24)
            .mosaic_budget(6);
        assert!(session.cache().is_none());

        session.process_frame(make_test_rgb(64, 48)).unwrap();

        let cache = session.cache().expect("cache populated");
        assert_eq!(cache.original_width, 64);
        assert_eq!(cache.original_height, 48);
        // 48 → 24, one halving
        assert_eq!(cache.detect, BudgetedSize { width: 32, height: 24, scale: 2 });
        // 48 → 24 → 12 → 6, three halvings
        assert_eq!(cache.tiny, BudgetedSize { width: 8, height: 6, scale: 8 });
    }

    #[test]
    fn cache_survives_resolution_change() {
        // Documented source behavior: the cache is fixed at first-frame
        // values even if the stream renegotiates its resolution.
        let mut session = Session::new(Box::new(StubDetector::empty()))
            .detect_budget(24)
            .mosaic_budget(6);

        session.process_frame(make_test_rgb(64, 48)).unwrap();
        let before = *session.cache().unwrap();

        session.process_frame(make_test_rgb(128, 96)).unwrap();
        assert_eq!(session.cache().unwrap(), &before);
    }

    #[test]
    fn double_toggle_restores_mode() {
        let mut session = Session::new(Box::new(StubDetector::empty()));
        let initial = session.mode();
        session.toggle_mode();
        assert_ne!(session.mode(), initial);
        session.toggle_mode();
        assert_eq!(session.mode(), initial);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let mut session = Session::new(Box::new(StubDetector::empty())).mosaic_budget(0);
        let err = session.process_frame(make_test_rgb(8, 8)).unwrap_err();
        assert!(matches!(err, FaceMosaicError::InvalidBudget));
    }

    struct VecSource {
        frames: Vec<RgbImage>,
        pulls: usize,
    }

    impl VecSource {
        fn new(frames: Vec<RgbImage>) -> Self {
            Self { frames, pulls: 0 }
        }
    }

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Option<RgbImage> {
            self.pulls += 1;
            if self.frames.is_empty() {
                None
            } else {
                Some(self.frames.remove(0))
            }
        }
    }

    /// Presenter that records presented frames and replays a script of
    /// key events.
    struct ScriptedPresenter {
        presented: Vec<RgbImage>,
        script: Vec<KeyEvent>,
    }

    impl ScriptedPresenter {
        fn new(script: Vec<KeyEvent>) -> Self {
            Self { presented: Vec::new(), script }
        }
    }

    impl Presenter for ScriptedPresenter {
        fn present(&mut self, frame: &RgbImage) -> Result<(), FaceMosaicError> {
            self.presented.push(frame.clone());
            Ok(())
        }

        fn poll_key(&mut self, _timeout: Duration) -> KeyEvent {
            if self.script.is_empty() {
                KeyEvent::None
            } else {
                self.script.remove(0)
            }
        }
    }

    #[test]
    fn immediate_end_of_stream_never_invokes_detector() {
        let detector = StubDetector::empty();
        let calls = detector.calls.clone();
        let session = Session::new(Box::new(detector));

        let mut source = VecSource::new(vec![]);
        let mut presenter = ScriptedPresenter::new(vec![]);
        session.run(&mut source, &mut presenter).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(presenter.presented.is_empty());
    }

    #[test]
    fn quit_key_stops_pulling_frames() {
        let session = Session::new(Box::new(StubDetector::empty()))
            .detect_budget(24)
            .mosaic_budget(6);

        let mut source = VecSource::new(vec![make_test_rgb(32, 32); 5]);
        let mut presenter = ScriptedPresenter::new(vec![KeyEvent::Quit]);
        session.run(&mut source, &mut presenter).unwrap();

        assert_eq!(presenter.presented.len(), 1);
        assert_eq!(source.pulls, 1);
    }

    #[test]
    fn run_drains_source_and_presents_every_frame() {
        let detector = StubDetector::empty();
        let calls = detector.calls.clone();
        let session = Session::new(Box::new(detector))
            .detect_budget(24)
            .mosaic_budget(6);

        let mut source = VecSource::new(vec![make_test_rgb(32, 32); 3]);
        let mut presenter = ScriptedPresenter::new(vec![]);
        session.run(&mut source, &mut presenter).unwrap();

        assert_eq!(presenter.presented.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn frames_without_detections_pass_through_unchanged() {
        let mut session = Session::new(Box::new(StubDetector::empty()))
            .detect_budget(24)
            .mosaic_budget(6);
        let frame = make_test_rgb(32, 32);
        let out = session.process_frame(frame.clone()).unwrap();
        assert_eq!(out.as_raw(), frame.as_raw());
    }

    #[test]
    fn terminated_session_passes_frames_through() {
        let mut session = Session::new(Box::new(StubDetector::empty()));
        session.state = SessionState::Terminated;
        let frame = make_test_rgb(16, 16);
        let out = session.process_frame(frame.clone()).unwrap();
        assert_eq!(out.as_raw(), frame.as_raw());
        assert_eq!(*session.state(), SessionState::Terminated);
    }
}
