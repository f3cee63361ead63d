use crate::error::FaceCropError;
use crate::face_detector::FaceBox;

/// Margin added on each side of a face, as a fraction of the face size.
pub const DEFAULT_MARGIN_RATIO: f64 = 0.5;

/// Minimum share of the source area the crop must cover.
pub const DEFAULT_MIN_AREA_RATIO: f64 = 0.5;

/// Side length of the square output image.
pub const OUTPUT_SIZE: u32 = 512;

/// Width and height of a decoded source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Dimensions of a `width` × `height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel count.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Crop region within the source image. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRect {
    /// Top edge (inclusive).
    pub top: u32,
    /// Left edge (inclusive).
    pub left: u32,
    /// Bottom edge (exclusive).
    pub bottom: u32,
    /// Right edge (exclusive).
    pub right: u32,
}

impl CropRect {
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
}

/// Tunable ratios for [`plan_crop_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPolicy {
    /// Margin per side as a fraction of the face width/height.
    pub margin_ratio: f64,
    /// Minimum crop area as a fraction of the image area, in `0.0..=1.0`.
    pub min_area_ratio: f64,
}

impl Default for CropPolicy {
    fn default() -> Self {
        Self {
            margin_ratio: DEFAULT_MARGIN_RATIO,
            min_area_ratio: DEFAULT_MIN_AREA_RATIO,
        }
    }
}

impl CropPolicy {
    fn validate(&self) -> Result<(), FaceCropError> {
        if !self.margin_ratio.is_finite() || self.margin_ratio < 0.0 {
            return Err(FaceCropError::InvalidInput(format!(
                "margin ratio must be finite and >= 0, got {}",
                self.margin_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.min_area_ratio) {
            return Err(FaceCropError::InvalidInput(format!(
                "minimum area ratio must be within 0.0..=1.0, got {}",
                self.min_area_ratio
            )));
        }
        Ok(())
    }

    fn min_area(&self, dimensions: ImageDimensions) -> f64 {
        dimensions.area() as f64 * self.min_area_ratio
    }
}

/// Converts a non-negative float measurement to whole pixels.
///
/// All planning goes through this one rounding rule (floor), so the
/// minimum-area guarantee is off by at most one pixel per edge.
fn floor_px(value: f64) -> u32 {
    value.floor() as u32
}

/// Side of the square whose area is `min_area`. Never 0.
fn target_side(min_area: f64) -> u32 {
    floor_px(min_area.sqrt()).max(1)
}

/// Plan the crop with the default margin and minimum-area ratios.
///
/// With a face, the face box is grown by half its size on every side; if that
/// still covers less than half the image, a square of half the image area is
/// centered on it instead. Without a face, that square is centered on the
/// image.
pub fn plan_crop(
    dimensions: ImageDimensions,
    face: Option<&FaceBox>,
) -> Result<CropRect, FaceCropError> {
    plan_crop_with(&CropPolicy::default(), dimensions, face)
}

/// Plan the crop for `dimensions` and an optional face using `policy`.
///
/// Fails with [`FaceCropError::InvalidInput`] on zero dimensions, a bad
/// policy, or a face box that is degenerate or leaves the image.
pub fn plan_crop_with(
    policy: &CropPolicy,
    dimensions: ImageDimensions,
    face: Option<&FaceBox>,
) -> Result<CropRect, FaceCropError> {
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(FaceCropError::InvalidInput(format!(
            "image dimensions must be positive, got {}x{}",
            dimensions.width, dimensions.height
        )));
    }
    policy.validate()?;

    match face {
        Some(face) => {
            validate_face(face, dimensions)?;
            Ok(face_crop(policy, dimensions, face))
        }
        None => Ok(center_crop(policy, dimensions)),
    }
}

fn validate_face(face: &FaceBox, dimensions: ImageDimensions) -> Result<(), FaceCropError> {
    if face.left >= face.right || face.top >= face.bottom {
        return Err(FaceCropError::InvalidInput(format!(
            "degenerate face box {face:?}"
        )));
    }
    if face.right > dimensions.width || face.bottom > dimensions.height {
        return Err(FaceCropError::InvalidInput(format!(
            "face box {face:?} lies outside {}x{} image",
            dimensions.width, dimensions.height
        )));
    }
    Ok(())
}

fn face_crop(policy: &CropPolicy, dimensions: ImageDimensions, face: &FaceBox) -> CropRect {
    let margin_x = floor_px(face.width() as f64 * policy.margin_ratio);
    let margin_y = floor_px(face.height() as f64 * policy.margin_ratio);

    let expanded = CropRect {
        top: face.top.saturating_sub(margin_y),
        left: face.left.saturating_sub(margin_x),
        bottom: face.bottom.saturating_add(margin_y).min(dimensions.height),
        right: face.right.saturating_add(margin_x).min(dimensions.width),
    };

    let min_area = policy.min_area(dimensions);
    if expanded.area() as f64 >= min_area {
        return expanded;
    }

    // Too tight: grow to a square of the minimum area around the same center.
    let side = target_side(min_area);
    let center_x = expanded.left + expanded.width() / 2;
    let center_y = expanded.top + expanded.height() / 2;
    let (left, right) = span_within(center_x, side, dimensions.width);
    let (top, bottom) = span_within(center_y, side, dimensions.height);

    CropRect {
        top,
        left,
        bottom,
        right,
    }
}

/// Lay a span of `side` pixels ending at `center + side / 2` on an axis of
/// length `len`, sliding it back inside the axis instead of shrinking it.
/// Spans longer than the axis cover the whole axis.
fn span_within(center: u32, side: u32, len: u32) -> (u32, u32) {
    let side = side.min(len);
    let end = center.saturating_add(side / 2).min(len);
    let start = end.saturating_sub(side);
    (start, start + side)
}

fn center_crop(policy: &CropPolicy, dimensions: ImageDimensions) -> CropRect {
    let side = target_side(policy.min_area(dimensions))
        .min(dimensions.width)
        .min(dimensions.height);

    let top = (dimensions.height / 2).saturating_sub(side / 2);
    let left = (dimensions.width / 2).saturating_sub(side / 2);

    CropRect {
        top,
        left,
        bottom: (top + side).min(dimensions.height),
        right: (left + side).min(dimensions.width),
    }
}
