//! Real-time face-region redaction.
//!
//! A session loop pulls frames from a [`FrameSource`], detects candidate
//! face regions at reduced resolution for speed, and either outlines the
//! regions or replaces them with a mosaic-blurred copy of the frame,
//! toggled interactively through a [`Presenter`].
//!
//! # Example
//!
//! ```no_run
//! use facemosaic::{RustfaceDetector, Session};
//!
//! # struct MySource;
//! # impl facemosaic::FrameSource for MySource {
//! #     fn next_frame(&mut self) -> Option<image::RgbImage> { None }
//! # }
//! # struct MyPresenter;
//! # impl facemosaic::Presenter for MyPresenter {
//! #     fn present(&mut self, _: &image::RgbImage) -> Result<(), facemosaic::FaceMosaicError> { Ok(()) }
//! #     fn poll_key(&mut self, _: std::time::Duration) -> facemosaic::KeyEvent { facemosaic::KeyEvent::Quit }
//! # }
//! let detector = RustfaceDetector::from_model_path("seeta_fd_frontal_v1.0.bin").unwrap();
//! let mut source = MySource;
//! let mut presenter = MyPresenter;
//! Session::new(Box::new(detector))
//!     .run(&mut source, &mut presenter)
//!     .unwrap();
//! ```
#![warn(missing_docs)]

mod error;
/// Face detection traits and data types.
pub mod face_detector;
/// Mosaic (pixelation) blur generation.
pub mod mosaic;
/// Region compositing: outlines and mosaic blits.
pub mod redact;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;
/// Downscaling budgets and scale factors.
pub mod scale;
/// The interactive session loop and its collaborator boundaries.
pub mod session;

/// Error type returned by facemosaic operations.
pub use error::FaceMosaicError;
/// Face detection trait and face bounding-box type.
pub use face_detector::{FaceDetector, FaceRect};
pub use mosaic::mosaic;
pub use redact::redact_regions;
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model from a path.
pub use rustface_backend::RustfaceDetector;
pub use scale::{size_at_most, BudgetedSize};
pub use session::{
    FrameSource, KeyEvent, Presenter, Session, SessionCache, SessionState,
};

/// What to do with a detected face region.
///
/// Mutated only by the toggle key; persists across frames within a
/// session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedactionMode {
    /// Draw an unfilled rectangle around the region, leaving its pixels
    /// intact. Useful for checking what the detector sees.
    #[default]
    Outline,

    /// Overwrite the region with the corresponding block of the
    /// mosaic-blurred frame.
    Blur,
}

impl RedactionMode {
    /// The other mode.
    pub fn toggled(self) -> RedactionMode {
        match self {
            RedactionMode::Outline => RedactionMode::Blur,
            RedactionMode::Blur => RedactionMode::Outline,
        }
    }
}
