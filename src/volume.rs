use crate::enums::{Orientation, SliceOrder};
use crate::geometry::{self, Affine, SpatialFrame};
use crate::intensity::{Calibration, Window};

use ndarray::{Array3, ArrayView2, Axis};

/// A calibrated stack of slices, shape (rows, columns, slices).
#[derive(Clone, Debug)]
pub struct Volume {
    pub data: Array3<f32>,
    pub frame: SpatialFrame,
    pub order: SliceOrder,
    /// Calibration applied to each slice, in stack order.
    pub calibrations: Vec<Calibration>,
}

impl Volume {
    pub fn new(
        data: Array3<f32>,
        frame: SpatialFrame,
        order: SliceOrder,
        calibrations: Vec<Calibration>,
    ) -> Self {
        Self {
            data,
            frame,
            order,
            calibrations,
        }
    }

    /// Get the dimensions of the volume (rows, columns, slices)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Get a mutable reference to the underlying data
    pub fn data_mut(&mut self) -> &mut Array3<f32> {
        &mut self.data
    }

    pub fn affine(&self) -> Option<&Affine> {
        self.frame.affine()
    }

    /// Voxel size in millimetres, when the frame is known.
    pub fn spacing(&self) -> Option<(f64, f64, f64)> {
        self.affine().map(Affine::spacing)
    }

    /// Number of slices that carried rescale coefficients.
    pub fn calibrated_slices(&self) -> usize {
        self.calibrations
            .iter()
            .filter(|c| c.is_calibrated())
            .count()
    }

    /// Grid size of this volume resampled to cubic voxels of `target` mm.
    pub fn isotropic_dim(&self, target: f64) -> Option<(usize, usize, usize)> {
        self.spacing()
            .map(|spacing| geometry::isotropic_dim(self.dim(), spacing, target))
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Option<ArrayView2<'_, f32>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        let axis = match orientation {
            Orientation::Axial => Axis(2),
            Orientation::Coronal => Axis(0),
            Orientation::Sagittal => Axis(1),
        };
        Some(self.data.index_axis(axis, index))
    }

    /// Display levels of the whole volume under `window`.
    pub fn windowed(&self, window: Window) -> Array3<u8> {
        window.apply(&self.data)
    }

    fn is_valid_index(&self, index: usize, orientation: Orientation) -> bool {
        let (rows, cols, slices) = self.dim();
        let max_index = match orientation {
            Orientation::Axial => slices,
            Orientation::Coronal => rows,
            Orientation::Sagittal => cols,
        };
        index < max_index
    }
}
