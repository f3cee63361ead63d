use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, RgbImage, RgbaImage};

use crate::crop::{CropRect, ImageDimensions};
use crate::error::FaceCropError;
use crate::face_detector::{FaceBox, FaceDetector};

/// Encoding used when writing a cropped face to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// PNG (lossless).
    Png,
    /// JPEG at the cropper's configured quality.
    Jpeg,
}

impl OutputFormat {
    /// Pick the format from a file extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FaceCropError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Ok(OutputFormat::Png),
            Some("jpg") | Some("jpeg") => Ok(OutputFormat::Jpeg),
            _ => Err(FaceCropError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Decode input bytes into a `DynamicImage`.
pub(crate) fn decode_image(input: &[u8]) -> Result<DynamicImage, FaceCropError> {
    image::load_from_memory(input).map_err(|e| FaceCropError::DecodeError(e.to_string()))
}

pub(crate) fn dimensions_of(image: &DynamicImage) -> ImageDimensions {
    ImageDimensions::new(image.width(), image.height())
}

/// Run the detector over the grayscale version of `image`.
pub(crate) fn detect_faces(
    image: &DynamicImage,
    detector: &dyn FaceDetector,
) -> Result<Vec<FaceBox>, FaceCropError> {
    let gray = image::imageops::grayscale(image);
    detector.detect(gray.as_raw(), gray.width(), gray.height())
}

/// Cut `rect` out of `image` and scale it to exactly `size` × `size`.
pub(crate) fn crop_and_resize(
    image: &DynamicImage,
    rect: &CropRect,
    size: u32,
    filter: FilterType,
) -> DynamicImage {
    image
        .crop_imm(rect.left, rect.top, rect.width(), rect.height())
        .resize_exact(size, size, filter)
}

/// Flatten alpha channel by compositing onto a white background.
pub(crate) fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba: RgbaImage = image.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    let mut rgb = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let inv_alpha = 1.0 - alpha;
        let out_r = (r as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        let out_g = (g as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        let out_b = (b as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        rgb.put_pixel(x, y, image::Rgb([out_r, out_g, out_b]));
    }

    rgb
}

/// Encode an RGB image. `quality` (1–100) only affects JPEG.
pub(crate) fn encode_image(
    image: &RgbImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, FaceCropError> {
    let mut buffer = Vec::new();

    match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| FaceCropError::EncodeError(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buffer, quality)
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| FaceCropError::EncodeError(e.to_string()))?;
        }
    }

    Ok(buffer)
}
