use crate::crop::ImageDimensions;
use crate::error::FaceCropError;

/// Bounding box of a detected face, in pixels with a top-left origin.
///
/// `right` and `bottom` are exclusive, so a valid box has `left < right` and
/// `top < bottom`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBox {
    /// Top edge (inclusive).
    pub top: u32,
    /// Left edge (inclusive).
    pub left: u32,
    /// Bottom edge (exclusive).
    pub bottom: u32,
    /// Right edge (exclusive).
    pub right: u32,
    /// Detection confidence score. Only used when selecting among several faces.
    pub confidence: f64,
}

impl FaceBox {
    /// Create a face box with zero confidence.
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
            confidence: 0.0,
        }
    }

    /// Attach a detector confidence score.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Build a box from a detector's `x, y, width, height` rectangle, clipped to
    /// the image. Detectors may report boxes that hang off the frame; returns
    /// `None` when nothing of the box is left inside it.
    pub fn from_xywh_clamped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        dimensions: ImageDimensions,
    ) -> Option<Self> {
        let clamp = |v: i64, max: u32| v.clamp(0, max as i64) as u32;

        let left = clamp(x, dimensions.width);
        let top = clamp(y, dimensions.height);
        let right = clamp(x.saturating_add(width), dimensions.width);
        let bottom = clamp(y.saturating_add(height), dimensions.height);

        (left < right && top < bottom).then(|| Self::new(top, left, bottom, right))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Pixel count.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Center point as `(x, y)`, in fractional pixels.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.left as f64 + self.right as f64) / 2.0,
            (self.top as f64 + self.bottom as f64) / 2.0,
        )
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to provide a custom face detector (ONNX, dlib, etc.)
/// and pass it to [`crate::FaceCropper::face_detector`].
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    ///
    /// An empty vector means no face was found. `Err` is reserved for hard
    /// failures of the backend itself.
    fn detect(&self, gray: &[u8], width: u32, height: u32)
        -> Result<Vec<FaceBox>, FaceCropError>;
}

/// Which face to keep when the detector reports more than one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaceSelection {
    /// The first face in detector order.
    #[default]
    First,
    /// The face with the largest box area.
    Largest,
    /// The face whose center is closest to the image center.
    MostCentral,
    /// The face with the highest confidence score.
    MostConfident,
}

impl FaceSelection {
    /// Pick one face. Ties go to the face reported earliest.
    pub fn select<'a>(
        &self,
        faces: &'a [FaceBox],
        dimensions: ImageDimensions,
    ) -> Option<&'a FaceBox> {
        match self {
            FaceSelection::First => faces.first(),
            FaceSelection::Largest => first_max_by(faces, |face| face.area() as f64),
            FaceSelection::MostCentral => {
                let cx = dimensions.width as f64 / 2.0;
                let cy = dimensions.height as f64 / 2.0;
                first_max_by(faces, |face| {
                    let (fx, fy) = face.center();
                    -((fx - cx).powi(2) + (fy - cy).powi(2))
                })
            }
            FaceSelection::MostConfident => first_max_by(faces, |face| face.confidence),
        }
    }
}

/// `Iterator::max_by` keeps the last of equal elements; this keeps the first.
fn first_max_by<F>(faces: &[FaceBox], key: F) -> Option<&FaceBox>
where
    F: Fn(&FaceBox) -> f64,
{
    let mut best: Option<(&FaceBox, f64)> = None;
    for face in faces {
        let score = key(face);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((face, score)),
        }
    }
    best.map(|(face, _)| face)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> ImageDimensions {
        ImageDimensions::new(width, height)
    }

    fn faces() -> Vec<FaceBox> {
        vec![
            // small, off-center, confident
            FaceBox::new(0, 0, 50, 50).with_confidence(9.0),
            // large, off-center
            FaceBox::new(500, 500, 1000, 1000).with_confidence(3.0),
            // medium, centered
            FaceBox::new(450, 450, 550, 550).with_confidence(5.0),
        ]
    }

    #[test]
    fn first_keeps_detector_order() {
        let faces = faces();
        let picked = FaceSelection::First.select(&faces, dims(1000, 1000));
        assert_eq!(picked, Some(&faces[0]));
    }

    #[test]
    fn largest_picks_biggest_area() {
        let faces = faces();
        let picked = FaceSelection::Largest.select(&faces, dims(1000, 1000));
        assert_eq!(picked, Some(&faces[1]));
    }

    #[test]
    fn most_central_picks_closest_to_center() {
        let faces = faces();
        let picked = FaceSelection::MostCentral.select(&faces, dims(1000, 1000));
        assert_eq!(picked, Some(&faces[2]));
    }

    #[test]
    fn most_confident_picks_highest_score() {
        let faces = faces();
        let picked = FaceSelection::MostConfident.select(&faces, dims(1000, 1000));
        assert_eq!(picked, Some(&faces[0]));
    }

    #[test]
    fn ties_go_to_earliest_face() {
        let faces = vec![
            FaceBox::new(0, 0, 10, 10).with_confidence(1.0),
            FaceBox::new(20, 20, 30, 30).with_confidence(1.0),
        ];
        let picked = FaceSelection::Largest.select(&faces, dims(100, 100));
        assert_eq!(picked, Some(&faces[0]));
        let picked = FaceSelection::MostConfident.select(&faces, dims(100, 100));
        assert_eq!(picked, Some(&faces[0]));
    }

    #[test]
    fn empty_input_selects_nothing() {
        for selection in [
            FaceSelection::First,
            FaceSelection::Largest,
            FaceSelection::MostCentral,
            FaceSelection::MostConfident,
        ] {
            assert_eq!(selection.select(&[], dims(10, 10)), None);
        }
    }

    #[test]
    fn clamped_box_is_clipped_to_image() {
        let face = FaceBox::from_xywh_clamped(-20, -10, 100, 60, dims(64, 48)).unwrap();
        assert_eq!(face, FaceBox::new(0, 0, 48, 64));
    }

    #[test]
    fn clamped_box_fully_outside_is_dropped() {
        assert_eq!(FaceBox::from_xywh_clamped(200, 10, 30, 30, dims(100, 100)), None);
        assert_eq!(FaceBox::from_xywh_clamped(-50, 10, 30, 30, dims(100, 100)), None);
        assert_eq!(FaceBox::from_xywh_clamped(10, 10, 0, 30, dims(100, 100)), None);
    }
}
