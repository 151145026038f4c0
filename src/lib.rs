//! # DICOM-series library
//!
//! Assembles a folder of DICOM slices into a single calibrated volume and
//! reconstructs the transform from voxel indices to patient coordinates.
//!
//! Loading happens in three steps:
//!  - Discovery: every regular file below the directory is tried as a DICOM
//!    slice. Files that do not parse, lack a SOP Instance UID or whose pixel
//!    data does not decode are skipped.
//!  - Ordering: slices are sorted along the plane normal using
//!    ImagePositionPatient and ImageOrientationPatient, falling back to
//!    InstanceNumber when the series is not fully positioned.
//!  - Assembly: stored values are rescaled with RescaleSlope and
//!    RescaleIntercept (Hounsfield Units for CT), stacked into an array of
//!    shape (rows, columns, slices), and the 4×4 affine is built from the first
//!    and last slice.
//!
//! Missing metadata degrades rather than fails, and every degradation is
//! visible on the result: [`Calibration::Uncalibrated`] per slice,
//! [`SpatialFrame::Untransformed`] for the volume and [`SliceOrder::Unordered`]
//! when no ordering key exists.
//!
//! The loader is single threaded and keeps the whole volume in memory.
//!
//! # Examples
//!
//! ## Reading a series and saving it as NIfTI
//!
//! ```no_run
//! # use dicom_series::{VolumeLoader, Capabilities, ExportRequest, export};
//! # use std::path::PathBuf;
//! let volume = VolumeLoader::default()
//!     .load_from_directory("dicom")
//!     .expect("should have loaded slices from directory");
//! let request = ExportRequest {
//!     npy: None,
//!     volumetric: Some(PathBuf::from("ct_volume.nii.gz")),
//! };
//! let report = export(&volume, &request, &Capabilities::detect())
//!     .expect("should have written the volume");
//! for notice in &report.skipped {
//!     println!("{notice}");
//! }
//! ```
//!
//! [`Calibration::Uncalibrated`]: intensity::Calibration::Uncalibrated
//! [`SpatialFrame::Untransformed`]: geometry::SpatialFrame::Untransformed
//! [`SliceOrder::Unordered`]: enums::SliceOrder::Unordered

pub mod enums;
pub mod geometry;
pub mod intensity;
pub mod output;
pub mod slice;
pub mod volume;
pub mod volume_loader;

pub use enums::{Orientation, SliceOrder, SortKey, UnorderedPolicy};
pub use geometry::{Affine, SpatialFrame};
pub use intensity::{Calibration, Window};
pub use output::{
    Capabilities, ExportReport, ExportRequest, OutputError, Skipped, VolumeSerializer, export,
};
pub use slice::{SliceError, SliceRecord};
pub use volume::Volume;
pub use volume_loader::{LoaderOptions, VolumeLoader, VolumeLoaderError, order_slices};
