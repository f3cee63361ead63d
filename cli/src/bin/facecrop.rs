use anyhow::{Context, Result};
use clap::Parser;
use facecrop::{run_batch, BatchOptions, FolderStore, RustfaceDetector};
use facecrop_cli::Args;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("loading face model {}", args.model.display());
    let detector = RustfaceDetector::from_path(&args.model)
        .with_context(|| format!("failed to load face model {}", args.model.display()))?;

    let cropper = args.cropper(Box::new(detector));
    let store = FolderStore::new(&args.input, &args.output, &args.failed);

    run_batch(&cropper, &store, &BatchOptions { jobs: args.jobs }).with_context(|| {
        format!(
            "batch over {} failed before any image was processed",
            args.input.display()
        )
    })?;

    Ok(())
}
