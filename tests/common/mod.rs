//! Fabricates small uncompressed CT slices on disk.
#![allow(dead_code)]

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use std::path::Path;

#[derive(Clone, Debug)]
pub struct SliceSpec {
    pub uid: Option<String>,
    pub rows: u16,
    pub cols: u16,
    pub fill: u16,
    /// Samples become `fill + 10 * row + col` instead of a flat `fill`.
    pub gradient: bool,
    pub position: Option<[f64; 3]>,
    pub orientation: Option<[f64; 6]>,
    pub pixel_spacing: Option<[f64; 2]>,
    pub instance_number: Option<i32>,
    pub rescale: Option<(f64, f64)>,
    pub slice_thickness: Option<f64>,
}

impl SliceSpec {
    pub fn new(uid: &str, rows: u16, cols: u16) -> Self {
        Self {
            uid: Some(uid.to_string()),
            rows,
            cols,
            fill: 0,
            gradient: false,
            position: None,
            orientation: None,
            pixel_spacing: None,
            instance_number: None,
            rescale: None,
            slice_thickness: None,
        }
    }

    /// Axial slice at height `z` with 0.5 mm square pixels.
    pub fn axial(uid: &str, z: f64) -> Self {
        Self {
            position: Some([-50.0, -40.0, z]),
            orientation: Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
            pixel_spacing: Some([0.5, 0.5]),
            ..Self::new(uid, 8, 6)
        }
    }

    pub fn fill(mut self, value: u16) -> Self {
        self.fill = value;
        self
    }

    pub fn gradient(mut self) -> Self {
        self.gradient = true;
        self
    }

    pub fn instance(mut self, number: i32) -> Self {
        self.instance_number = Some(number);
        self
    }

    pub fn rescale(mut self, slope: f64, intercept: f64) -> Self {
        self.rescale = Some((slope, intercept));
        self
    }

    pub fn without_uid(mut self) -> Self {
        self.uid = None;
        self
    }

    pub fn build(&self) -> FileDicomObject<InMemDicomObject> {
        let mut obj = InMemDicomObject::new_empty();
        let uid = self.uid.clone().unwrap_or_else(|| "1.2.826.0.1.3680043.2.1125.9".into());

        obj.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::CT_IMAGE_STORAGE),
        ));
        if let Some(uid) = &self.uid {
            obj.put(DataElement::new(
                tags::SOP_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from(uid.as_str()),
            ));
        }
        obj.put(DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("CT")));
        obj.put(DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)));
        obj.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ));
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(self.rows)));
        obj.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(self.cols)));
        obj.put(DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)));
        obj.put(DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)));
        obj.put(DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)));
        obj.put(DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));

        if let Some(position) = self.position {
            obj.put(decimal_strings(tags::IMAGE_POSITION_PATIENT, &position));
        }
        if let Some(orientation) = self.orientation {
            obj.put(decimal_strings(tags::IMAGE_ORIENTATION_PATIENT, &orientation));
        }
        if let Some(spacing) = self.pixel_spacing {
            obj.put(decimal_strings(tags::PIXEL_SPACING, &spacing));
        }
        if let Some(thickness) = self.slice_thickness {
            obj.put(decimal_strings(tags::SLICE_THICKNESS, &[thickness]));
        }
        if let Some(number) = self.instance_number {
            obj.put(DataElement::new(
                tags::INSTANCE_NUMBER,
                VR::IS,
                PrimitiveValue::from(number.to_string()),
            ));
        }
        if let Some((slope, intercept)) = self.rescale {
            obj.put(decimal_strings(tags::RESCALE_SLOPE, &[slope]));
            obj.put(decimal_strings(tags::RESCALE_INTERCEPT, &[intercept]));
        }

        let samples: Vec<u16> = (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (r, c)))
            .map(|(r, c)| if self.gradient { self.fill + 10 * r + c } else { self.fill })
            .collect();
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16(samples.into()),
        ));

        obj.with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(uid),
        )
        .expect("file meta should be complete")
    }

    pub fn write(&self, path: impl AsRef<Path>) {
        self.build()
            .write_to_file(path.as_ref())
            .expect("should have written DICOM file");
    }
}

fn decimal_strings(tag: dicom::core::Tag, values: &[f64]) -> DataElement<InMemDicomObject> {
    DataElement::new(
        tag,
        VR::DS,
        PrimitiveValue::Strs(values.iter().map(|v| v.to_string()).collect()),
    )
}

/// Files in `dir`, recursively.
pub fn file_count(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}
