use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::crop::CropRect;
use crate::error::FaceCropError;
use crate::render::OutputFormat;
use crate::FaceCropper;

/// File extensions picked up from the load folder (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Destination of a processed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A face was found.
    Output,
    /// No face was found; the centered fallback crop was written.
    Failed,
}

/// Storage boundary for a batch run.
///
/// [`FolderStore`] is the filesystem implementation; tests and embedders can
/// swap in their own to keep runs off the disk.
pub trait ImageStore: Send + Sync {
    /// Create whatever destinations `store` needs. Called once per batch.
    fn prepare(&self) -> Result<(), FaceCropError>;

    /// Images to process, in processing order.
    fn list(&self) -> Result<Vec<Listed>, FaceCropError>;

    /// Raw bytes of the named image.
    fn load(&self, name: &str) -> Result<Vec<u8>, FaceCropError>;

    /// Persist an encoded result under the same name at `route`.
    fn store(&self, route: Route, name: &str, data: &[u8]) -> Result<(), FaceCropError>;
}

/// One eligible entry found by [`ImageStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listed {
    /// Can be loaded and stored under this name.
    Image(String),
    /// Found but not addressable by name; reported as an error, never loaded.
    Unusable {
        /// Lossy display form of the name.
        name: String,
        /// Why it cannot be processed.
        reason: String,
    },
}

/// Whether `path` has one of the [`IMAGE_EXTENSIONS`].
pub fn is_eligible(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Reads images from one folder and writes results into two others.
#[derive(Debug, Clone)]
pub struct FolderStore {
    load_dir: PathBuf,
    output_dir: PathBuf,
    failed_dir: PathBuf,
}

impl FolderStore {
    /// `load_dir` is scanned (top level only); faces go to `output_dir`, the
    /// rest to `failed_dir`.
    pub fn new(
        load_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        failed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            load_dir: load_dir.into(),
            output_dir: output_dir.into(),
            failed_dir: failed_dir.into(),
        }
    }

    fn dir_for(&self, route: Route) -> &Path {
        match route {
            Route::Output => &self.output_dir,
            Route::Failed => &self.failed_dir,
        }
    }
}

impl ImageStore for FolderStore {
    fn prepare(&self) -> Result<(), FaceCropError> {
        for dir in [&self.output_dir, &self.failed_dir] {
            fs::create_dir_all(dir).map_err(|e| FaceCropError::io(dir, e))?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<Listed>, FaceCropError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.load_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| FaceCropError::io(&self.load_dir, e.into()))?;
            if !entry.file_type().is_file() || !is_eligible(entry.path()) {
                continue;
            }
            let listed = match entry.file_name().to_str() {
                Some(name) => Listed::Image(name.to_string()),
                None => Listed::Unusable {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    reason: "file name is not valid UTF-8".to_string(),
                },
            };
            entries.push(listed);
        }

        Ok(entries)
    }

    fn load(&self, name: &str) -> Result<Vec<u8>, FaceCropError> {
        let path = self.load_dir.join(name);
        fs::read(&path).map_err(|e| FaceCropError::io(path, e))
    }

    fn store(&self, route: Route, name: &str, data: &[u8]) -> Result<(), FaceCropError> {
        let path = self.dir_for(route).join(name);
        fs::write(&path, data).map_err(|e| FaceCropError::io(path, e))
    }
}

/// Settings for [`run_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads. `1` runs sequentially on the calling thread, `0` lets
    /// rayon pick.
    pub jobs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Written to the output route; `faces` is the detector's total count.
    FaceFound {
        /// Number of faces the detector reported.
        faces: usize,
    },
    /// Written to the failed route.
    NoFace,
    /// Skipped; nothing was written.
    Error(String),
}

/// One file's entry in a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// File name within the load folder.
    pub name: String,
    /// What happened to it.
    pub status: FileStatus,
    /// The crop that was written, if any.
    pub crop: Option<CropRect>,
}

/// Per-file results of a batch, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per eligible file.
    pub results: Vec<FileReport>,
}

impl BatchReport {
    /// Files attempted.
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    /// Files written to the output route.
    pub fn faces_found(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::FaceFound { .. }))
    }

    /// Files written to the failed route.
    pub fn no_face(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::NoFace))
    }

    /// Files skipped because of an error.
    pub fn errors(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Error(_)))
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }
}

/// Crop every image the store lists and route each result.
///
/// An invalid `cropper` and `prepare` or `list` failures abort the run before
/// any file is touched. Anything that goes wrong
/// with a single file is logged, recorded as [`FileStatus::Error`], and the
/// batch moves on.
pub fn run_batch(
    cropper: &FaceCropper,
    store: &dyn ImageStore,
    options: &BatchOptions,
) -> Result<BatchReport, FaceCropError> {
    cropper.validate()?;
    store.prepare()?;
    let entries = store.list()?;
    info!("found {} eligible image(s)", entries.len());

    let results: Vec<FileReport> = if options.jobs == 1 {
        entries
            .iter()
            .map(|entry| process_entry(cropper, store, entry))
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .map_err(|e| FaceCropError::WorkerPool(e.to_string()))?;
        pool.install(|| {
            entries
                .par_iter()
                .map(|entry| process_entry(cropper, store, entry))
                .collect()
        })
    };

    let report = BatchReport { results };
    info!(
        "done: {} processed, {} with face, {} without face, {} error(s)",
        report.processed(),
        report.faces_found(),
        report.no_face(),
        report.errors()
    );
    Ok(report)
}

fn process_entry(cropper: &FaceCropper, store: &dyn ImageStore, entry: &Listed) -> FileReport {
    match entry {
        Listed::Image(name) => process_file(cropper, store, name),
        Listed::Unusable { name, reason } => {
            error!("{name}: skipped: {reason}");
            FileReport {
                name: name.clone(),
                status: FileStatus::Error(reason.clone()),
                crop: None,
            }
        }
    }
}

fn process_file(cropper: &FaceCropper, store: &dyn ImageStore, name: &str) -> FileReport {
    debug!("processing {name}");

    let (status, crop) = match crop_and_store(cropper, store, name) {
        Ok((status, crop)) => (status, Some(crop)),
        Err(e) => (FileStatus::Error(e.to_string()), None),
    };

    match &status {
        FileStatus::FaceFound { faces } => info!("{name}: face found ({faces} detected)"),
        FileStatus::NoFace => warn!("{name}: no face found"),
        FileStatus::Error(reason) => error!("{name}: skipped: {reason}"),
    }

    FileReport {
        name: name.to_string(),
        status,
        crop,
    }
}

fn crop_and_store(
    cropper: &FaceCropper,
    store: &dyn ImageStore,
    name: &str,
) -> Result<(FileStatus, CropRect), FaceCropError> {
    let format = OutputFormat::from_path(name)?;
    let input = store.load(name)?;
    let cropped = cropper.process_bytes(&input)?;
    debug!("{name}: crop {:?} from face {:?}", cropped.crop, cropped.face);

    let data = cropper.encode(&cropped, format)?;
    let (route, status) = match cropped.face {
        Some(_) => (
            Route::Output,
            FileStatus::FaceFound {
                faces: cropped.faces_detected,
            },
        ),
        None => (Route::Failed, FileStatus::NoFace),
    };
    store.store(route, name, &data)?;

    Ok((status, cropped.crop))
}
