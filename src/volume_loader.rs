use crate::{
    enums::{SliceOrder, SortKey, UnorderedPolicy},
    geometry,
    intensity,
    slice::SliceRecord,
    volume::Volume,
};

use dicom::object::{FileDicomObject, InMemDicomObject};
use ndarray::{Array3, s};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No DICOM slices found")]
    NoSlicesFound,

    #[error("Inconsistent image dimensions: slice {index} is {found:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Slices carry neither position nor instance number, order is undefined")]
    Unordered,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LoaderOptions {
    pub unordered: UnorderedPolicy,
}

#[derive(Default)]
pub struct VolumeLoader {
    options: LoaderOptions,
}

impl VolumeLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Load a volume from already parsed DICOM objects
    ///
    /// Objects without a SOP Instance UID or decodable pixel data are left out.
    ///
    /// # Errors
    ///
    /// Returns error if no valid slices remain or their dimensions differ
    pub fn load_from_dicom_objects(
        &self,
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
    ) -> Result<Volume, VolumeLoaderError> {
        let slices: Vec<_> = dicom_objects
            .iter()
            .enumerate()
            .filter_map(|(i, dicom_object)| {
                SliceRecord::from_dicom_object(dicom_object)
                    .inspect_err(|e| debug!("Skipping object {i}: {e}"))
                    .ok()
            })
            .collect();

        if slices.is_empty() {
            return Err(VolumeLoaderError::NoSlicesFound);
        }
        self.load_from_slices(slices)
    }

    /// Load a volume from file paths, skipping files that are not DICOM slices
    pub fn load_from_file_paths(
        &self,
        paths: &[impl AsRef<Path>],
    ) -> Result<Volume, VolumeLoaderError> {
        let slices = Self::read_slices(paths.iter().map(|path| path.as_ref()));
        if slices.is_empty() {
            return Err(VolumeLoaderError::NoSlicesFound);
        }
        self.load_from_slices(slices)
    }

    /// Load a volume from every readable slice below `path`
    pub fn load_from_directory(&self, path: impl AsRef<Path>) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        let slices = Self::discover(path)?;
        self.load_from_slices(slices)
    }

    /// Recursively collect the slices below `dir`, in file name order.
    ///
    /// Symbolic links are followed. Entries that cannot be read are skipped
    /// like unparseable files.
    pub fn discover(dir: &Path) -> Result<Vec<SliceRecord>, VolumeLoaderError> {
        let paths: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| {
                entry
                    .inspect_err(|e| debug!("Skipping directory entry: {e}"))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        let slices = Self::read_slices(paths.iter().map(PathBuf::as_path));
        info!(
            "Found {} slices among {} files in {}",
            slices.len(),
            paths.len(),
            dir.display()
        );
        if slices.is_empty() {
            return Err(VolumeLoaderError::NoSlicesFound);
        }
        Ok(slices)
    }

    /// Order, calibrate and stack `slices`.
    pub fn load_from_slices(
        &self,
        mut slices: Vec<SliceRecord>,
    ) -> Result<Volume, VolumeLoaderError> {
        if slices.is_empty() {
            return Err(VolumeLoaderError::NoSlicesFound);
        }
        let order = order_slices(&mut slices, self.options.unordered)?;
        Self::validate_dimensions(&slices)?;

        let data = Self::build_volume_array(&slices);
        let frame = geometry::build_affine(&slices[0], &slices[slices.len() - 1], slices.len());
        if frame.affine().is_none() {
            warn!("Geometry attributes incomplete, volume has no spatial frame");
        }
        let calibrations = slices.iter().map(|slice| slice.calibration).collect();

        Ok(Volume::new(data, frame, order, calibrations))
    }

    fn read_slices<'a>(paths: impl Iterator<Item = &'a Path>) -> Vec<SliceRecord> {
        paths
            .filter_map(|path| {
                SliceRecord::read_file(path)
                    .inspect_err(|e| debug!("Skipping {}: {e}", path.display()))
                    .ok()
            })
            .collect()
    }

    fn validate_dimensions(slices: &[SliceRecord]) -> Result<(), VolumeLoaderError> {
        let expected = slices[0].dim();
        match slices.iter().position(|slice| slice.dim() != expected) {
            Some(index) => Err(VolumeLoaderError::ShapeMismatch {
                index,
                expected,
                found: slices[index].dim(),
            }),
            None => Ok(()),
        }
    }

    fn build_volume_array(slices: &[SliceRecord]) -> Array3<f32> {
        let (rows, cols) = slices[0].dim();
        let mut volume = Array3::<f32>::zeros((rows, cols, slices.len()));

        for (i, slice) in slices.iter().enumerate() {
            volume
                .slice_mut(s![.., .., i])
                .assign(&intensity::normalize(&slice.pixels, slice.calibration));
        }

        volume
    }
}

/// Sort `slices` in place and report the basis used.
///
/// The whole series is ordered by position only when every slice has one;
/// otherwise InstanceNumber is used if every slice has one. The sort is stable,
/// so ties keep discovery order.
pub fn order_slices(
    slices: &mut [SliceRecord],
    policy: UnorderedPolicy,
) -> Result<SliceOrder, VolumeLoaderError> {
    if let [only] = slices {
        return Ok(match only.sort_key() {
            SortKey::Geometric(_) => SliceOrder::Geometric,
            SortKey::Sequential(_) => SliceOrder::Sequential,
            SortKey::Unordered => SliceOrder::Unordered,
        });
    }

    let keys: Vec<SortKey> = slices.iter().map(SliceRecord::sort_key).collect();
    if keys.iter().all(SortKey::is_geometric) {
        slices.sort_by(|a, b| a.sort_key().compare(&b.sort_key()));
        return Ok(SliceOrder::Geometric);
    }

    if slices.iter().all(|slice| slice.instance_number.is_some()) {
        if keys.iter().any(SortKey::is_geometric) {
            warn!("Only some slices are positioned, ordering by instance number");
        }
        slices.sort_by_key(|slice| slice.instance_number);
        return Ok(SliceOrder::Sequential);
    }

    match policy {
        UnorderedPolicy::KeepDiscoveryOrder => {
            warn!(
                "No common ordering key across {} slices, keeping discovery order",
                slices.len()
            );
            Ok(SliceOrder::Unordered)
        }
        UnorderedPolicy::Reject => Err(VolumeLoaderError::Unordered),
    }
}
