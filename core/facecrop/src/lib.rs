//! Face-centered batch cropping: find a face, frame it, and scale the crop to
//! a fixed square.
//!
//! The crop planner ([`plan_crop`]) is a pure function over image dimensions
//! and an optional face box. [`FaceCropper`] wraps it with decoding, face
//! detection, resizing and encoding, and [`run_batch`] drives a whole folder.
//!
//! # Example
//!
//! ```no_run
//! use facecrop::{FaceCropper, OutputFormat, RustfaceDetector};
//!
//! let detector = RustfaceDetector::from_path("model/seeta_fd_frontal_v1.0.bin").unwrap();
//! let raw_bytes = std::fs::read("photo.jpg").unwrap();
//! let cropper = FaceCropper::new().face_detector(Box::new(detector));
//! let cropped = cropper.process_bytes(&raw_bytes).unwrap();
//! let jpeg = cropper.encode(&cropped, OutputFormat::Jpeg).unwrap();
//! println!("face found: {}, {} bytes", cropped.face.is_some(), jpeg.len());
//! ```
#![warn(missing_docs)]

/// Folder-level batch processing and the storage boundary it writes through.
pub mod batch;
mod crop;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
mod render;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;

pub use batch::{
    is_eligible, run_batch, BatchOptions, BatchReport, FileReport, FileStatus, FolderStore,
    ImageStore, Listed, Route,
};
pub use crop::{
    plan_crop, plan_crop_with, CropPolicy, CropRect, ImageDimensions, DEFAULT_MARGIN_RATIO,
    DEFAULT_MIN_AREA_RATIO, OUTPUT_SIZE,
};
/// Error type returned by facecrop operations.
pub use error::FaceCropError;
/// Face detection trait, face box type and multi-face tie-break.
pub use face_detector::{FaceBox, FaceDetector, FaceSelection};
/// Resampling filter used when scaling the crop to the output size.
pub use image::imageops::FilterType;
pub use render::OutputFormat;
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model file.
pub use rustface_backend::RustfaceDetector;

use image::{DynamicImage, RgbImage};

/// Default JPEG quality for written crops.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Result of cropping a single image.
#[derive(Debug, Clone)]
pub struct CroppedFace {
    /// The cropped and resized image, always `output_size` × `output_size`.
    pub image: RgbImage,

    /// Region of the source image that was kept.
    pub crop: CropRect,

    /// The face the crop was framed on, if one was detected.
    pub face: Option<FaceBox>,

    /// How many faces the detector reported in total.
    pub faces_detected: usize,
}

/// Builder for cropping images around a detected face.
///
/// Without a detector every image takes the no-face path (a centered square
/// of half the image area).
pub struct FaceCropper {
    output_size: u32,
    filter: FilterType,
    jpeg_quality: u8,
    selection: FaceSelection,
    policy: CropPolicy,
    detector: Option<Box<dyn FaceDetector>>,
}

impl Default for FaceCropper {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceCropper {
    /// Create a cropper with 512×512 bilinear output and no detector.
    pub fn new() -> Self {
        Self {
            output_size: OUTPUT_SIZE,
            filter: FilterType::Triangle,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            selection: FaceSelection::default(),
            policy: CropPolicy::default(),
            detector: None,
        }
    }

    /// Set the side of the square output in pixels (default: 512).
    pub fn output_size(mut self, size: u32) -> Self {
        self.output_size = size;
        self
    }

    /// Set the resampling filter (default: `FilterType::Triangle`, i.e. bilinear).
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Set the JPEG quality from 1 to 100 (default: 90). Ignored for PNG.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Choose which face to frame when several are found (default: first).
    pub fn face_selection(mut self, selection: FaceSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Override the margin and minimum-area ratios.
    pub fn crop_policy(mut self, policy: CropPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Provide the face detector.
    ///
    /// ```no_run
    /// use facecrop::{FaceBox, FaceCropError, FaceCropper, FaceDetector};
    ///
    /// struct MyDetector;
    /// impl FaceDetector for MyDetector {
    ///     fn detect(&self, gray: &[u8], width: u32, height: u32)
    ///         -> Result<Vec<FaceBox>, FaceCropError> {
    ///         // Your detection logic here
    ///         Ok(vec![])
    ///     }
    /// }
    ///
    /// let bytes = std::fs::read("photo.jpg").unwrap();
    /// let result = FaceCropper::new()
    ///     .face_detector(Box::new(MyDetector))
    ///     .process_bytes(&bytes)
    ///     .unwrap();
    /// ```
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Check the output size and JPEG quality.
    ///
    /// [`process`](Self::process), [`encode`](Self::encode) and
    /// [`run_batch`] call this before doing any work.
    pub fn validate(&self) -> Result<(), FaceCropError> {
        if self.output_size == 0 {
            return Err(FaceCropError::InvalidOutputSize);
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FaceCropError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }

    /// Detect, plan, crop and resize an already decoded image.
    pub fn process(&self, image: &DynamicImage) -> Result<CroppedFace, FaceCropError> {
        self.validate()?;

        let dimensions = render::dimensions_of(image);
        let faces = match self.detector.as_deref() {
            Some(detector) if dimensions.width > 0 && dimensions.height > 0 => {
                render::detect_faces(image, detector)?
            }
            _ => Vec::new(),
        };
        let face = self.selection.select(&faces, dimensions).cloned();

        let crop = plan_crop_with(&self.policy, dimensions, face.as_ref())?;
        let resized = render::crop_and_resize(image, &crop, self.output_size, self.filter);

        Ok(CroppedFace {
            image: render::flatten_alpha(&resized),
            crop,
            face,
            faces_detected: faces.len(),
        })
    }

    /// Decode raw bytes (PNG or JPEG) and [`process`](Self::process) them.
    pub fn process_bytes(&self, input: &[u8]) -> Result<CroppedFace, FaceCropError> {
        let decoded = render::decode_image(input)?;
        self.process(&decoded)
    }

    /// Encode a crop in the given format.
    pub fn encode(
        &self,
        cropped: &CroppedFace,
        format: OutputFormat,
    ) -> Result<Vec<u8>, FaceCropError> {
        self.validate()?;
        render::encode_image(&cropped.image, format, self.jpeg_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Vec<FaceBox>);

    impl FaceDetector for FixedDetector {
        fn detect(
            &self,
            _gray: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<FaceBox>, FaceCropError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDetector;

    impl FaceDetector for BrokenDetector {
        fn detect(
            &self,
            _gray: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<FaceBox>, FaceCropError> {
            Err(FaceCropError::DetectorError("backend offline".into()))
        }
    }

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;

        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new(&mut buffer);
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer
    }

    #[test]
    fn defaults_produce_512_square_without_face() {
        let png = make_test_png(200, 100);
        let result = FaceCropper::new().process_bytes(&png).unwrap();
        assert_eq!(result.image.dimensions(), (512, 512));
        assert!(result.face.is_none());
        assert_eq!(result.faces_detected, 0);
        assert_eq!(
            result.crop,
            CropRect {
                top: 0,
                left: 50,
                bottom: 100,
                right: 150
            }
        );
    }

    #[test]
    fn detected_face_drives_crop() {
        let png = make_test_png(1000, 1000);
        let result = FaceCropper::new()
            .output_size(64)
            .face_detector(Box::new(FixedDetector(vec![FaceBox::new(300, 300, 700, 700)])))
            .process_bytes(&png)
            .unwrap();
        assert_eq!(result.image.dimensions(), (64, 64));
        assert_eq!(result.face, Some(FaceBox::new(300, 300, 700, 700)));
        assert_eq!(
            result.crop,
            CropRect {
                top: 100,
                left: 100,
                bottom: 900,
                right: 900
            }
        );
    }

    #[test]
    fn selection_applies_to_multiple_faces() {
        let faces = vec![FaceBox::new(0, 0, 10, 10), FaceBox::new(100, 100, 400, 400)];
        let png = make_test_png(500, 500);
        let result = FaceCropper::new()
            .output_size(32)
            .face_selection(FaceSelection::Largest)
            .face_detector(Box::new(FixedDetector(faces)))
            .process_bytes(&png)
            .unwrap();
        assert_eq!(result.face, Some(FaceBox::new(100, 100, 400, 400)));
        assert_eq!(result.faces_detected, 2);
    }

    #[test]
    fn out_of_bounds_face_is_invalid_input() {
        let png = make_test_png(100, 100);
        let result = FaceCropper::new()
            .face_detector(Box::new(FixedDetector(vec![FaceBox::new(0, 0, 50, 500)])))
            .process_bytes(&png);
        assert!(matches!(result, Err(FaceCropError::InvalidInput(_))));
    }

    #[test]
    fn detector_failure_propagates() {
        let png = make_test_png(100, 100);
        let result = FaceCropper::new()
            .face_detector(Box::new(BrokenDetector))
            .process_bytes(&png);
        assert!(matches!(result, Err(FaceCropError::DetectorError(_))));
    }

    #[test]
    fn zero_output_size_is_rejected() {
        let png = make_test_png(10, 10);
        let result = FaceCropper::new().output_size(0).process_bytes(&png);
        assert!(matches!(result, Err(FaceCropError::InvalidOutputSize)));
    }

    #[test]
    fn invalid_quality_is_rejected() {
        let png = make_test_png(10, 10);
        for quality in [0, 101] {
            let cropper = FaceCropper::new().jpeg_quality(quality);
            assert!(matches!(
                cropper.process_bytes(&png),
                Err(FaceCropError::InvalidQuality(q)) if q == quality
            ));
        }
    }

    #[test]
    fn validate_accepts_defaults_and_rejects_bad_settings() {
        assert!(FaceCropper::new().validate().is_ok());
        assert!(matches!(
            FaceCropper::new().output_size(0).validate(),
            Err(FaceCropError::InvalidOutputSize)
        ));
        assert!(matches!(
            FaceCropper::new().jpeg_quality(0).validate(),
            Err(FaceCropError::InvalidQuality(0))
        ));
    }

    #[test]
    fn invalid_bytes_fail_to_decode() {
        let result = FaceCropper::new().process_bytes(b"not an image");
        assert!(matches!(result, Err(FaceCropError::DecodeError(_))));
    }

    #[test]
    fn encode_round_trips_through_decoder() {
        let png = make_test_png(120, 80);
        let cropper = FaceCropper::new().output_size(40);
        let cropped = cropper.process_bytes(&png).unwrap();

        let jpeg = cropper.encode(&cropped, OutputFormat::Jpeg).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&cropper.encode(&cropped, OutputFormat::Png).unwrap())
            .unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 40));
    }

    #[test]
    fn transparent_input_is_flattened_to_white() {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;

        let rgba = image::RgbaImage::from_pixel(20, 20, image::Rgba([0, 0, 0, 0]));
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(rgba.as_raw(), 20, 20, image::ExtendedColorType::Rgba8)
            .unwrap();

        let result = FaceCropper::new().output_size(8).process_bytes(&png).unwrap();
        assert!(result.image.pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
