use crate::{enums::SortKey, intensity::Calibration};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, ReadError, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use nalgebra::Vector3;
use ndarray::{Array2, s};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceError {
    #[error("DICOM error: {0}")]
    Read(#[from] ReadError),

    #[error("Missing SOP Instance UID")]
    MissingInstanceUid,

    #[error("Pixel data could not be decoded: {0}")]
    PixelData(String),
}

/// One 2-D image of a series together with the attributes needed to place it.
///
/// `pixels` holds the stored values, no modality LUT applied. Orientation
/// vectors are taken as written in the file; they are not checked for unit
/// length or orthogonality.
#[derive(Clone, Debug)]
pub struct SliceRecord {
    pub sop_instance_uid: String,
    pub source: Option<PathBuf>,
    pub pixels: Array2<f32>,
    /// ImagePositionPatient, the centre of the first transmitted pixel.
    pub position: Option<Vector3<f64>>,
    /// ImageOrientationPatient split into (row axis, column axis).
    pub orientation: Option<(Vector3<f64>, Vector3<f64>)>,
    /// PixelSpacing as (row spacing, column spacing).
    pub pixel_spacing: Option<(f64, f64)>,
    pub instance_number: Option<i64>,
    /// SpacingBetweenSlices, or SliceThickness when the former is absent.
    pub slice_spacing: Option<f64>,
    pub calibration: Calibration,
}

impl SliceRecord {
    pub fn new(sop_instance_uid: impl Into<String>, pixels: Array2<f32>) -> Self {
        Self {
            sop_instance_uid: sop_instance_uid.into(),
            source: None,
            pixels,
            position: None,
            orientation: None,
            pixel_spacing: None,
            instance_number: None,
            slice_spacing: None,
            calibration: Calibration::Uncalibrated,
        }
    }

    /// Open and parse a single file.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, SliceError> {
        let path = path.as_ref();
        let dicom_object = open_file(path)?;
        let mut record = Self::from_dicom_object(&dicom_object)?;
        record.source = Some(path.to_path_buf());
        Ok(record)
    }

    pub fn from_dicom_object(
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<Self, SliceError> {
        let sop_instance_uid = dicom_object
            .element(tags::SOP_INSTANCE_UID)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|uid| uid.trim_end_matches(['\0', ' ']).to_string())
            .filter(|uid| !uid.is_empty())
            .ok_or(SliceError::MissingInstanceUid)?;

        let pixels = Self::decode_image(dicom_object)?;

        let slice_spacing = get_f64(dicom_object, tags::SPACING_BETWEEN_SLICES)
            .or_else(|| get_f64(dicom_object, tags::SLICE_THICKNESS));

        Ok(Self {
            sop_instance_uid,
            source: None,
            pixels,
            position: get_position(dicom_object),
            orientation: get_orientation(dicom_object),
            pixel_spacing: get_pixel_spacing(dicom_object),
            instance_number: dicom_object
                .element(tags::INSTANCE_NUMBER)
                .ok()
                .and_then(|e| e.to_int::<i64>().ok()),
            slice_spacing,
            calibration: Calibration::from_parts(
                get_f64(dicom_object, tags::RESCALE_SLOPE),
                get_f64(dicom_object, tags::RESCALE_INTERCEPT),
            ),
        })
    }

    /// (rows, columns) of the sample grid.
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    /// Unnormalised plane normal, `row_axis × col_axis`.
    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.orientation.map(|(row, col)| row.cross(&col))
    }

    /// A non-finite distance along the normal (NaN positions, garbage
    /// orientation) is not a usable geometric key.
    pub fn sort_key(&self) -> SortKey {
        let distance = match (self.position, self.normal()) {
            (Some(position), Some(normal)) => Some(position.dot(&normal)),
            _ => None,
        };
        match distance.filter(|d| d.is_finite()) {
            Some(distance) => SortKey::Geometric(distance),
            None => self
                .instance_number
                .map_or(SortKey::Unordered, SortKey::Sequential),
        }
    }

    fn decode_image(
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<Array2<f32>, SliceError> {
        let pixel_data = dicom_object
            .decode_pixel_data()
            .map_err(|e| SliceError::PixelData(e.to_string()))?;
        // Rescale is applied later from the recorded calibration.
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
            .map_err(|e| SliceError::PixelData(e.to_string()))
    }
}

fn get_f64(dicom_object: &FileDicomObject<InMemDicomObject>, tag: dicom::core::Tag) -> Option<f64> {
    dicom_object.element(tag).ok()?.to_float64().ok()
}

fn get_f64_vec(
    dicom_object: &FileDicomObject<InMemDicomObject>,
    tag: dicom::core::Tag,
) -> Option<Vec<f64>> {
    dicom_object.element(tag).ok()?.to_multi_float64().ok()
}

fn get_position(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Vector3<f64>> {
    match get_f64_vec(dicom_object, tags::IMAGE_POSITION_PATIENT)?.as_slice() {
        [x, y, z, ..] => Some(Vector3::new(*x, *y, *z)),
        _ => None,
    }
}

fn get_orientation(
    dicom_object: &FileDicomObject<InMemDicomObject>,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    match get_f64_vec(dicom_object, tags::IMAGE_ORIENTATION_PATIENT)?.as_slice() {
        [rx, ry, rz, cx, cy, cz, ..] => {
            Some((Vector3::new(*rx, *ry, *rz), Vector3::new(*cx, *cy, *cz)))
        }
        _ => None,
    }
}

fn get_pixel_spacing(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<(f64, f64)> {
    match get_f64_vec(dicom_object, tags::PIXEL_SPACING)?.as_slice() {
        [row, col, ..] => Some((*row, *col)),
        _ => None,
    }
}
