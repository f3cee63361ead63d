use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use facecrop::{
    FaceCropper, FaceDetector, FaceSelection, FilterType, DEFAULT_JPEG_QUALITY, OUTPUT_SIZE,
};

/// Crop every image in a folder around its face and resize it to a square.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Folder of .png / .jpg / .jpeg images to process
    #[arg(short, long, env = "FACECROP_INPUT", default_value = "load")]
    pub input: PathBuf,

    /// Folder for images where a face was found
    #[arg(short, long, env = "FACECROP_OUTPUT", default_value = "output")]
    pub output: PathBuf,

    /// Folder for images where no face was found
    #[arg(long, env = "FACECROP_FAILED", default_value = "failed")]
    pub failed: PathBuf,

    /// SeetaFace frontal model (seeta_fd_frontal_v1.0.bin)
    #[arg(short, long, env = "FACECROP_MODEL")]
    pub model: PathBuf,

    /// Side of the square output in pixels
    #[arg(long, default_value_t = OUTPUT_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub size: u32,

    /// Which face to frame when several are detected
    #[arg(long, value_enum, default_value_t = Selection::First)]
    pub select: Selection,

    /// Resampling filter for the resize
    #[arg(long, value_enum, default_value_t = Filter::Bilinear)]
    pub filter: Filter,

    /// JPEG quality (1-100) for .jpg/.jpeg outputs
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Worker threads (1 = sequential, 0 = one per core)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Selection {
    First,
    Largest,
    MostCentral,
    MostConfident,
}

impl From<Selection> for FaceSelection {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::First => FaceSelection::First,
            Selection::Largest => FaceSelection::Largest,
            Selection::MostCentral => FaceSelection::MostCentral,
            Selection::MostConfident => FaceSelection::MostConfident,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    Nearest,
    Bilinear,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<Filter> for FilterType {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => FilterType::Nearest,
            Filter::Bilinear => FilterType::Triangle,
            Filter::CatmullRom => FilterType::CatmullRom,
            Filter::Gaussian => FilterType::Gaussian,
            Filter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Args {
    /// Cropper configured from the command line around `detector`.
    pub fn cropper(&self, detector: Box<dyn FaceDetector>) -> FaceCropper {
        FaceCropper::new()
            .output_size(self.size)
            .filter(self.filter.into())
            .jpeg_quality(self.quality)
            .face_selection(self.select.into())
            .face_detector(detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecrop::{FaceBox, FaceCropError};

    struct NoFaces;

    impl FaceDetector for NoFaces {
        fn detect(&self, _: &[u8], _: u32, _: u32) -> Result<Vec<FaceBox>, FaceCropError> {
            Ok(vec![])
        }
    }

    #[test]
    fn defaults_match_fixed_folders() {
        let args = Args::try_parse_from(["facecrop", "--model", "seeta.bin"]).unwrap();
        assert_eq!(args.model, PathBuf::from("seeta.bin"));
        assert_eq!(args.size, 512);
        assert_eq!(args.select, Selection::First);
        assert_eq!(args.filter, Filter::Bilinear);
        assert_eq!(args.quality, 90);
        assert_eq!(args.jobs, 1);
    }

    #[test]
    fn value_enums_parse_kebab_case() {
        let args = Args::try_parse_from([
            "facecrop",
            "--model",
            "m.bin",
            "--select",
            "most-central",
            "--filter",
            "catmull-rom",
            "--jobs",
            "8",
        ])
        .unwrap();
        assert_eq!(args.select, Selection::MostCentral);
        assert_eq!(FaceSelection::from(args.select), FaceSelection::MostCentral);
        assert_eq!(FilterType::from(args.filter), FilterType::CatmullRom);
        assert_eq!(args.jobs, 8);
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        for quality in ["0", "101"] {
            let result =
                Args::try_parse_from(["facecrop", "--model", "m.bin", "--quality", quality]);
            assert!(result.is_err(), "quality {quality} accepted");
        }
    }

    #[test]
    fn zero_size_is_rejected() {
        let result = Args::try_parse_from(["facecrop", "--model", "m.bin", "--size", "0"]);
        assert!(result.is_err(), "size 0 accepted");
    }

    #[test]
    fn unknown_selection_is_rejected() {
        let result = Args::try_parse_from(["facecrop", "--model", "m.bin", "--select", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn cropper_uses_configured_size() {
        let args =
            Args::try_parse_from(["facecrop", "--model", "m.bin", "--size", "64"]).unwrap();
        let img = image::DynamicImage::new_rgb8(100, 80);
        let cropped = args.cropper(Box::new(NoFaces)).process(&img).unwrap();
        assert_eq!(cropped.image.dimensions(), (64, 64));
        assert!(cropped.face.is_none());
    }
}
