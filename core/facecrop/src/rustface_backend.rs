use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::crop::ImageDimensions;
use crate::error::FaceCropError;
use crate::face_detector::{FaceBox, FaceDetector};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// Needs the SeetaFace frontal model (`seeta_fd_frontal_v1.0.bin`), loaded
/// once on construction and cloned into a fresh detector per image.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load the SeetaFace model from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FaceCropError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FaceCropError::io(path, e))?;
        let model = rustface::read_model(BufReader::new(file)).map_err(|e| {
            FaceCropError::DetectorError(format!(
                "failed to load model {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self { model })
    }

    /// Load the SeetaFace model from in-memory bytes.
    pub fn from_bytes(model_data: &[u8]) -> Result<Self, FaceCropError> {
        let model = rustface::read_model(std::io::Cursor::new(model_data))
            .map_err(|e| FaceCropError::DetectorError(format!("failed to load model: {e}")))?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceBox>, FaceCropError> {
        let expected = width as usize * height as usize;
        if gray.len() != expected {
            return Err(FaceCropError::DetectorError(format!(
                "grayscale buffer has {} bytes, expected {expected} for {width}x{height}",
                gray.len()
            )));
        }

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));
        let dimensions = ImageDimensions::new(width, height);

        // SeetaFace boxes can overhang the frame; clip them so the planner
        // only ever sees in-bounds boxes.
        Ok(faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                FaceBox::from_xywh_clamped(
                    bbox.x() as i64,
                    bbox.y() as i64,
                    bbox.width() as i64,
                    bbox.height() as i64,
                    dimensions,
                )
                .map(|b| b.with_confidence(face.score()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_io_error() {
        let err = RustfaceDetector::from_path("/nonexistent/seeta_fd_frontal_v1.0.bin")
            .err()
            .unwrap();
        assert!(matches!(err, FaceCropError::Io { .. }), "{err}");
    }
}
