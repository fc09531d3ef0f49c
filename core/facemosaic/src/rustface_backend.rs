use std::io::Cursor;
use std::path::Path;

use crate::error::FaceMosaicError;
use crate::face_detector::{FaceDetector, FaceRect};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model file is external configuration: it is loaded once from a
/// caller-supplied path, and a load failure is fatal at startup — the
/// pipeline cannot run without a detector.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load a SeetaFace model from `path`.
    pub fn from_model_path(path: impl AsRef<Path>) -> Result<Self, FaceMosaicError> {
        let data = std::fs::read(path.as_ref())
            .map_err(|e| FaceMosaicError::DetectorInit(e.to_string()))?;
        let model = rustface::read_model(Cursor::new(data))
            .map_err(|e| FaceMosaicError::DetectorInit(e.to_string()))?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRect> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRect {
                    x: bbox.x().max(0) as u32,
                    y: bbox.y().max(0) as u32,
                    width: bbox.width(),
                    height: bbox.height(),
                    score: face.score(),
                }
            })
            .collect()
    }
}
