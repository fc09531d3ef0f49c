/// Bounding box of a detected face, in the coordinate space of the
/// reduced-resolution frame handed to the detector.
///
/// Coordinates stay in detection space until explicitly rescaled with
/// [`FaceRect::scaled_by`]; any function consuming original-frame
/// coordinates takes the scale as an explicit parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRect {
    /// X coordinate of the top-left corner (pixels).
    pub x: u32,
    /// Y coordinate of the top-left corner (pixels).
    pub y: u32,
    /// Width of the bounding box (pixels).
    pub width: u32,
    /// Height of the bounding box (pixels).
    pub height: u32,
    /// Detection confidence score.
    pub score: f64,
}

impl FaceRect {
    /// Convert this rectangle from detection-scale coordinates to
    /// original-frame coordinates by multiplying every component by
    /// `scale`.
    pub fn scaled_by(&self, scale: u32) -> FaceRect {
        FaceRect {
            x: self.x * scale,
            y: self.y * scale,
            width: self.width * scale,
            height: self.height * scale,
            score: self.score,
        }
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to provide a custom detector (ONNX, dlib, etc.)
/// and pass it to [`crate::Session::new`]. Returned rectangles must lie
/// within the given buffer's bounds; they may overlap and carry no
/// ordering guarantee.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRect>;
}
