//! Scene-level inputs shared by every pixel of a scene, and per-row rasters

use crate::core::brdf::BrdfTable;
use crate::types::{
    AlbedoError, AlbedoResult, ClassRow, Instrument, Reflectance, ReflectanceRow, SnowState,
    SunViewGeometry, MAX_BANDS,
};
use ndarray::Array1;

/// Read-only description of a scene, built before any pixel is processed.
///
/// Class labels run from 0 to `class_count` inclusive, so the BRDF table and
/// purity counts carry `class_count + 1` rows.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub instrument: Instrument,
    /// Active reflective bands, at most six
    pub band_count: usize,
    /// Multiplier turning stored reflectance into reflectance
    pub scale_factor: f64,
    pub reflectance_fill: Reflectance,
    pub class_fill: i32,
    pub class_count: usize,
    /// Pure pixels behind each class's BRDF average
    pub purity_counts: Vec<u32>,
    pub brdf: BrdfTable,
    /// Scene-centre sun and view angles
    pub geometry: SunViewGeometry,
}

impl SceneContext {
    pub fn validate(&self) -> AlbedoResult<()> {
        if self.band_count == 0 || self.band_count > MAX_BANDS {
            return Err(AlbedoError::InvalidInput(format!(
                "band count {} outside 1..={}",
                self.band_count, MAX_BANDS
            )));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(AlbedoError::InvalidInput(format!(
                "reflectance scale factor {} must be positive",
                self.scale_factor
            )));
        }
        if self.brdf.class_count() != self.class_count + 1 {
            return Err(AlbedoError::InvalidInput(format!(
                "BRDF table holds {} classes, expected {}",
                self.brdf.class_count(),
                self.class_count + 1
            )));
        }
        if self.purity_counts.len() != self.class_count + 1 {
            return Err(AlbedoError::InvalidInput(format!(
                "{} purity counts for {} classes",
                self.purity_counts.len(),
                self.class_count + 1
            )));
        }
        Ok(())
    }

    /// Class index of a raw label, if the label is a valid class
    pub fn class_index(&self, label: i32) -> Option<usize> {
        if label == self.class_fill || label < 0 || label as usize > self.class_count {
            None
        } else {
            Some(label as usize)
        }
    }
}

/// Rasters of one scene row
#[derive(Debug, Clone)]
pub struct SceneRow {
    /// Stored reflectance, band x column; extra trailing bands are ignored
    pub reflectance: ReflectanceRow,
    pub classes: ClassRow,
    /// Per-column snow flag; no mask means snow-free
    pub snow: Option<Array1<bool>>,
}

impl SceneRow {
    pub fn new(reflectance: ReflectanceRow, classes: ClassRow) -> Self {
        Self {
            reflectance,
            classes,
            snow: None,
        }
    }

    pub fn with_snow(mut self, snow: Array1<bool>) -> Self {
        self.snow = Some(snow);
        self
    }

    pub fn width(&self) -> usize {
        self.classes.len()
    }

    pub fn snow_state(&self, col: usize) -> SnowState {
        SnowState::from_flag(self.snow.as_ref().map_or(false, |mask| mask[col]))
    }

    pub fn validate(&self, scene: &SceneContext) -> AlbedoResult<()> {
        let (bands, columns) = self.reflectance.dim();
        if bands < scene.band_count {
            return Err(AlbedoError::InvalidInput(format!(
                "row has {} reflectance bands, scene uses {}",
                bands, scene.band_count
            )));
        }
        if columns != self.width() {
            return Err(AlbedoError::InvalidInput(format!(
                "reflectance row has {} columns, class row has {}",
                columns,
                self.width()
            )));
        }
        if let Some(mask) = &self.snow {
            if mask.len() != self.width() {
                return Err(AlbedoError::InvalidInput(format!(
                    "snow mask has {} columns, class row has {}",
                    mask.len(),
                    self.width()
                )));
            }
        }
        Ok(())
    }
}
