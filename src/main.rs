use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dicom_series::{Capabilities, ExportRequest, VolumeLoader, export};
use tracing::warn;

/// Stack a DICOM series into a volume and save it as NumPy and/or NIfTI.
#[derive(Parser)]
#[command(name = "dicom-series", version)]
struct Cli {
    /// Folder containing the slices of one series, searched recursively
    #[arg(long)]
    dicom_dir: PathBuf,

    /// Write the volume as a .npy array
    #[arg(long)]
    out_np: Option<PathBuf>,

    /// Write the volume with its affine as .nii or .nii.gz
    #[arg(long)]
    out_nii: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let capabilities = Capabilities::detect();

    let volume = VolumeLoader::default()
        .load_from_directory(&cli.dicom_dir)
        .with_context(|| format!("Failed to load series from {}", cli.dicom_dir.display()))?;

    println!("Volume shape (HxWxZ): {:?} dtype: float32", volume.dim());
    if volume.calibrated_slices() < volume.dim().2 {
        warn!(
            "{} of {} slices had no rescale coefficients",
            volume.dim().2 - volume.calibrated_slices(),
            volume.dim().2
        );
    }

    let request = ExportRequest {
        npy: cli.out_np,
        volumetric: cli.out_nii,
    };
    let report = export(&volume, &request, &capabilities).context("Failed to save volume")?;
    for path in &report.written {
        println!("Saved {}", path.display());
    }
    for notice in &report.skipped {
        println!("Notice: {notice}");
    }

    Ok(())
}
