//! Print the faces found in each image and the crop each one would produce.
//!
//! Usage:
//!   cargo run --example debug_face_detection -- <model.bin> <image>...

use facecrop::{plan_crop, FaceDetector, ImageDimensions, RustfaceDetector};

fn main() {
    let mut args = std::env::args().skip(1);
    let model = args
        .next()
        .expect("usage: debug_face_detection <model.bin> <image>...");
    let detector = RustfaceDetector::from_path(&model).expect("failed to load model");

    for path in args {
        let image = match image::open(&path) {
            Ok(image) => image,
            Err(e) => {
                println!("=== {path}: cannot decode ({e}) ===\n");
                continue;
            }
        };
        let gray = image::imageops::grayscale(&image);
        let (width, height) = (gray.width(), gray.height());
        let dimensions = ImageDimensions::new(width, height);

        println!("=== {path} ({width}x{height}) ===");

        let faces = detector
            .detect(gray.as_raw(), width, height)
            .expect("detector failed");

        if faces.is_empty() {
            println!("  NO FACES DETECTED, centered fallback crop");
        } else {
            println!("  Found {} face(s):", faces.len());
            for (i, face) in faces.iter().enumerate() {
                let crop = plan_crop(dimensions, Some(face)).expect("detector box out of bounds");
                println!(
                    "    face {i}: score={:.2}, box=({}, {})-({}, {}) → crop ({}, {})-({}, {}) {}x{}",
                    face.confidence,
                    face.left,
                    face.top,
                    face.right,
                    face.bottom,
                    crop.left,
                    crop.top,
                    crop.right,
                    crop.bottom,
                    crop.width(),
                    crop.height(),
                );
            }
        }

        let fallback = plan_crop(dimensions, None).expect("zero-sized image");
        println!(
            "  → no-face crop:      ({}, {})-({}, {}) {}x{}",
            fallback.left,
            fallback.top,
            fallback.right,
            fallback.bottom,
            fallback.width(),
            fallback.height()
        );
        println!();
    }
}
