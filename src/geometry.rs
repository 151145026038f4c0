//! Voxel-to-patient transform of an assembled series.

use crate::slice::SliceRecord;

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// 4×4 homogeneous transform from `(row, column, slice)` indices to patient
/// coordinates in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine(Matrix4<f64>);

impl Affine {
    /// Build from the three index-axis columns and the origin.
    pub fn from_columns(
        first: Vector3<f64>,
        second: Vector3<f64>,
        third: Vector3<f64>,
        origin: Vector3<f64>,
    ) -> Self {
        let mut matrix = Matrix4::identity();
        matrix
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&Matrix3::from_columns(&[first, second, third]));
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&origin);
        Self(matrix)
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Row-major rows, the layout NIfTI `srow_*` fields use.
    pub fn rows(&self) -> [[f64; 4]; 4] {
        let m = &self.0;
        std::array::from_fn(|r| std::array::from_fn(|c| m[(r, c)]))
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Column `axis` of the linear part.
    pub fn axis(&self, axis: usize) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, axis).into_owned()
    }

    /// Voxel size along each index axis.
    pub fn spacing(&self) -> (f64, f64, f64) {
        (self.axis(0).norm(), self.axis(1).norm(), self.axis(2).norm())
    }

    pub fn apply(&self, index: [f64; 3]) -> Vector3<f64> {
        let p = self.0 * Vector4::new(index[0], index[1], index[2], 1.0);
        Vector3::new(p.x, p.y, p.z)
    }
}

/// Outcome of affine reconstruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpatialFrame {
    Transformed(Affine),
    /// Orientation or pixel spacing of the first slice was missing.
    Untransformed,
}

impl SpatialFrame {
    pub fn affine(&self) -> Option<&Affine> {
        match self {
            SpatialFrame::Transformed(affine) => Some(affine),
            SpatialFrame::Untransformed => None,
        }
    }
}

/// Distance between consecutive slices.
///
/// Measured along the normal between the two ends of the stack when both are
/// positioned, otherwise read from the first slice's spacing attributes.
pub fn slice_spacing(first: &SliceRecord, last: &SliceRecord, count: usize) -> f64 {
    let measured = match (first.position, last.position, first.normal()) {
        (Some(p0), Some(p1), Some(normal)) if count > 1 => {
            Some((p1 - p0).dot(&normal).abs() / (count - 1) as f64)
        }
        _ => None,
    };
    measured.or(first.slice_spacing).unwrap_or(1.0)
}

/// Reconstruct the transform of a stack of `count` ordered slices running
/// from `first` to `last`.
///
/// PixelSpacing is (row spacing, column spacing): the row axis moves along a
/// row, one column at a time, so it is scaled by the column spacing, and the
/// column axis by the row spacing. Without a position the origin is zero.
pub fn build_affine(first: &SliceRecord, last: &SliceRecord, count: usize) -> SpatialFrame {
    let (Some((row_axis, col_axis)), Some((row_spacing, col_spacing))) =
        (first.orientation, first.pixel_spacing)
    else {
        return SpatialFrame::Untransformed;
    };
    let origin = first.position.unwrap_or_else(Vector3::zeros);
    let normal = row_axis.cross(&col_axis);
    let spacing_z = slice_spacing(first, last, count);

    SpatialFrame::Transformed(Affine::from_columns(
        row_axis * col_spacing,
        col_axis * row_spacing,
        normal * spacing_z,
        origin,
    ))
}

/// Grid size after resampling `dim` voxels of size `spacing` to cubes of
/// `target` millimetres. Axes never shrink below one voxel.
pub fn isotropic_dim(
    dim: (usize, usize, usize),
    spacing: (f64, f64, f64),
    target: f64,
) -> (usize, usize, usize) {
    let resize = |n: usize, s: f64| ((n as f64 * s / target).round() as usize).max(1);
    (
        resize(dim.0, spacing.0),
        resize(dim.1, spacing.1),
        resize(dim.2, spacing.2),
    )
}
