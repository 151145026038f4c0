//! Conversion of stored sample values into calibrated units.

use ndarray::{Array2, ArrayBase, Data, Dimension};

/// Linear rescale of one slice, taken from RescaleSlope / RescaleIntercept.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Calibration {
    Calibrated { scale: f64, offset: f64 },
    /// No usable coefficients, samples pass through unchanged.
    #[default]
    Uncalibrated,
}

impl Calibration {
    /// Resolve coefficients where either one may be absent.
    ///
    /// A lone coefficient is completed with its identity default. Non-finite
    /// values count as absent.
    pub fn from_parts(scale: Option<f64>, offset: Option<f64>) -> Self {
        let scale = scale.filter(|s| s.is_finite());
        let offset = offset.filter(|o| o.is_finite());
        match (scale, offset) {
            (None, None) => Calibration::Uncalibrated,
            (scale, offset) => Calibration::Calibrated {
                scale: scale.unwrap_or(1.0),
                offset: offset.unwrap_or(0.0),
            },
        }
    }

    pub fn coefficients(&self) -> (f64, f64) {
        match *self {
            Calibration::Calibrated { scale, offset } => (scale, offset),
            Calibration::Uncalibrated => (1.0, 0.0),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, Calibration::Calibrated { .. })
    }
}

/// `raw * scale + offset`, evaluated in f64.
pub fn normalize(raw: &Array2<f32>, calibration: Calibration) -> Array2<f32> {
    let (scale, offset) = calibration.coefficients();
    raw.mapv(|v| (f64::from(v) * scale + offset) as f32)
}

/// Display window over calibrated values, e.g. `Window::new(50.0, 350.0)` for
/// abdominal soft tissue in HU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    pub center: f32,
    pub width: f32,
}

impl Window {
    pub fn new(center: f32, width: f32) -> Self {
        Self { center, width }
    }

    pub fn bounds(&self) -> (f32, f32) {
        let half = self.width / 2.0;
        (self.center - half, self.center + half)
    }

    #[inline]
    pub fn level(&self, value: f32) -> u8 {
        let (low, high) = self.bounds();
        let clipped = value.max(low).min(high);
        ((clipped - low) / self.width.max(1e-6) * 255.0).clamp(0.0, 255.0) as u8
    }

    pub fn apply<S, D>(&self, values: &ArrayBase<S, D>) -> ndarray::Array<u8, D>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        values.map(|&v| self.level(v))
    }
}
