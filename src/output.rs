//! Writing assembled volumes to disk.

use crate::{geometry::Affine, volume::Volume};

use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("NumPy export failed: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    #[error("{format} export failed: {source}")]
    Serializer {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A volumetric image format that stores the voxel-to-patient transform
/// alongside the samples.
pub trait VolumeSerializer {
    /// Short format name used in notices.
    fn name(&self) -> &'static str;

    fn write(&self, path: &Path, volume: &Volume, affine: &Affine) -> Result<(), OutputError>;
}

/// NIfTI-1 writer; a `.gz` suffix selects gzip compression.
#[cfg(feature = "nifti")]
#[derive(Clone, Copy, Debug, Default)]
pub struct NiftiSerializer;

#[cfg(feature = "nifti")]
impl NiftiSerializer {
    const SFORM_SCANNER: i16 = 1;
    const UNITS_MM: u8 = 2;

    pub fn header(affine: &Affine) -> nifti::NiftiHeader {
        let rows = affine.rows();
        let srow = |r: usize| rows[r].map(|v| v as f32);
        let (dx, dy, dz) = affine.spacing();
        nifti::NiftiHeader {
            pixdim: [1.0, dx as f32, dy as f32, dz as f32, 1.0, 1.0, 1.0, 1.0],
            sform_code: Self::SFORM_SCANNER,
            qform_code: 0,
            srow_x: srow(0),
            srow_y: srow(1),
            srow_z: srow(2),
            xyzt_units: Self::UNITS_MM,
            ..Default::default()
        }
    }
}

#[cfg(feature = "nifti")]
impl VolumeSerializer for NiftiSerializer {
    fn name(&self) -> &'static str {
        "NIfTI"
    }

    fn write(&self, path: &Path, volume: &Volume, affine: &Affine) -> Result<(), OutputError> {
        let header = Self::header(affine);
        nifti::writer::WriterOptions::new(path)
            .reference_header(&header)
            .write_nifti(volume.data())
            .map_err(|e| OutputError::Serializer {
                format: "NIfTI",
                source: Box::new(e),
            })
    }
}

/// Output formats available to this run, resolved once at startup.
#[derive(Default)]
pub struct Capabilities {
    pub transform_serializer: Option<Box<dyn VolumeSerializer>>,
}

impl Capabilities {
    /// Whatever was compiled in.
    pub fn detect() -> Self {
        #[cfg(feature = "nifti")]
        let transform_serializer: Option<Box<dyn VolumeSerializer>> = Some(Box::new(NiftiSerializer));
        #[cfg(not(feature = "nifti"))]
        let transform_serializer: Option<Box<dyn VolumeSerializer>> = None;
        Self {
            transform_serializer,
        }
    }

    pub fn with_serializer(serializer: impl VolumeSerializer + 'static) -> Self {
        Self {
            transform_serializer: Some(Box::new(serializer)),
        }
    }
}

/// Which files to produce; each output is independent.
#[derive(Clone, Debug, Default)]
pub struct ExportRequest {
    pub npy: Option<PathBuf>,
    pub volumetric: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Skipped {
    NoSpatialFrame(PathBuf),
    NoSerializer(PathBuf),
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skipped::NoSpatialFrame(path) => write!(
                f,
                "volumetric output {} requested but the series has no spatial frame; skipping",
                path.display()
            ),
            Skipped::NoSerializer(path) => write!(
                f,
                "volumetric output {} requested but no writer is available; skipping",
                path.display()
            ),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

pub fn write_npy(path: impl AsRef<Path>, volume: &Volume) -> Result<(), OutputError> {
    ndarray_npy::write_npy(path, volume.data())?;
    Ok(())
}

/// Write the requested outputs. A volumetric output that cannot be produced is
/// reported in [`ExportReport::skipped`] rather than failing the export.
pub fn export(
    volume: &Volume,
    request: &ExportRequest,
    capabilities: &Capabilities,
) -> Result<ExportReport, OutputError> {
    let mut report = ExportReport::default();

    if let Some(path) = &request.npy {
        write_npy(path, volume)?;
        info!("Saved NumPy volume to {}", path.display());
        report.written.push(path.clone());
    }

    if let Some(path) = &request.volumetric {
        match (volume.affine(), &capabilities.transform_serializer) {
            (None, _) => report.skipped.push(Skipped::NoSpatialFrame(path.clone())),
            (Some(_), None) => report.skipped.push(Skipped::NoSerializer(path.clone())),
            (Some(affine), Some(serializer)) => {
                serializer.write(path, volume, affine)?;
                info!("Saved {} volume to {}", serializer.name(), path.display());
                report.written.push(path.clone());
            }
        }
    }

    Ok(report)
}
