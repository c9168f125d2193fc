use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Scaled surface reflectance as delivered by the atmospheric correction stage
pub type Reflectance = i16;

/// One scene row of reflectance (band x column)
pub type ReflectanceRow = Array2<Reflectance>;

/// One scene row of land-cover class labels
pub type ClassRow = Array1<i32>;

/// Maximum number of reflective bands used by the conversion
pub const MAX_BANDS: usize = 6;

/// Number of canonical (MODIS land) bands the BRDF parameters are stored for
pub const CANONICAL_BAND_COUNT: usize = 7;

/// Kernel weights per class per band (isotropic, volumetric, geometric)
pub const KERNEL_COUNT: usize = 3;

/// Native band order -> canonical MODIS band order.
///
/// TM/ETM+ bands 1-5,7, OLI bands 2-7 and MSI bands 2,3,4,8A,11,12 all land on
/// MODIS bands 3,4,1,2,6,7. MODIS band 5 has no counterpart.
pub const CANONICAL_BAND_INDEX: [usize; MAX_BANDS] = [2, 3, 0, 1, 5, 6];

/// Length of the flat per-pixel layout consumed by downstream writers
pub const PIXEL_SLOT_COUNT: usize = 18;

/// Imaging instrument of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    /// Landsat 4/5 Thematic Mapper
    #[serde(rename = "TM")]
    Tm,
    /// Landsat 7 Enhanced Thematic Mapper Plus
    #[serde(rename = "ETM")]
    Etm,
    /// Landsat 8/9 Operational Land Imager
    #[serde(rename = "OLI")]
    Oli,
    /// Sentinel-2 MultiSpectral Instrument
    #[serde(rename = "MSI")]
    Msi,
    /// Anything else; converted with the legacy TM coefficients
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instrument::Tm => write!(f, "TM"),
            Instrument::Etm => write!(f, "ETM+"),
            Instrument::Oli => write!(f, "OLI"),
            Instrument::Msi => write!(f, "MSI"),
            Instrument::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snow state of a pixel, selects the snow-specific shortwave regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnowState {
    Clear,
    Snow,
}

impl SnowState {
    pub fn from_flag(snow: bool) -> Self {
        if snow {
            SnowState::Snow
        } else {
            SnowState::Clear
        }
    }
}

/// Sun and view angles of a pixel, all in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunViewGeometry {
    pub solar_zenith: f64,
    pub solar_azimuth: f64,
    pub view_zenith: f64,
    pub view_azimuth: f64,
}

impl SunViewGeometry {
    pub fn new(solar_zenith: f64, solar_azimuth: f64, view_zenith: f64, view_azimuth: f64) -> Self {
        Self {
            solar_zenith,
            solar_azimuth,
            view_zenith,
            view_azimuth,
        }
    }

    /// Relative azimuth between sun and sensor (degrees)
    pub fn relative_azimuth(&self) -> f64 {
        self.solar_azimuth - self.view_azimuth
    }
}

/// Black-sky / white-sky albedo pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkyAlbedo {
    pub black_sky: f64,
    pub white_sky: f64,
}

impl SkyAlbedo {
    pub fn new(black_sky: f64, white_sky: f64) -> Self {
        Self {
            black_sky,
            white_sky,
        }
    }

    /// Same value under both illumination conditions
    pub fn lambertian(value: f64) -> Self {
        Self::new(value, value)
    }
}

/// Complete albedo output of one pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelAlbedo {
    /// Narrow-band albedo in native band order; bands past the active count stay zero
    pub narrow_band: [SkyAlbedo; MAX_BANDS],
    pub shortwave: SkyAlbedo,
    pub visible: SkyAlbedo,
    pub near_infrared: SkyAlbedo,
}

impl PixelAlbedo {
    /// Flatten into the positional layout used by the albedo product files:
    /// band-major BSA/WSA pairs, then SW, VIS and NIR BSA/WSA pairs.
    pub fn to_slots(&self) -> [f64; PIXEL_SLOT_COUNT] {
        let mut slots = [0.0; PIXEL_SLOT_COUNT];
        for (band, albedo) in self.narrow_band.iter().enumerate() {
            slots[band * 2] = albedo.black_sky;
            slots[band * 2 + 1] = albedo.white_sky;
        }
        let broadband = [self.shortwave, self.visible, self.near_infrared];
        for (i, albedo) in broadband.iter().enumerate() {
            slots[MAX_BANDS * 2 + i * 2] = albedo.black_sky;
            slots[MAX_BANDS * 2 + i * 2 + 1] = albedo.white_sky;
        }
        slots
    }
}

/// Per-pixel quality flag, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityCode {
    /// Concurrent BRDF from enough pure pixels on every band
    Full,
    /// Concurrent BRDF, some of it from a sparse pure-pixel sample
    Sparse,
    /// BRDF borrowed from the closest class on some bands
    Borrowed,
    /// Lambertian assumption on at least one band
    Lambertian,
    /// Broadband regression recomputed from plain reflectance
    RegressionRescue,
    /// No classification rule matched the fallback tallies
    Indeterminate,
    /// Fill reflectance, no albedo produced
    NoData,
}

impl QualityCode {
    pub fn as_i8(&self) -> i8 {
        match self {
            QualityCode::Full => 0,
            QualityCode::Sparse => 1,
            QualityCode::Borrowed => 2,
            QualityCode::Lambertian => 3,
            QualityCode::RegressionRescue => 4,
            QualityCode::Indeterminate => 5,
            QualityCode::NoData => -1,
        }
    }
}

impl std::fmt::Display for QualityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Error types for albedo processing
#[derive(Debug, thiserror::Error)]
pub enum AlbedoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid land-cover class {class} at pixel ({row}, {col})")]
    InvalidClass { row: usize, col: usize, class: i32 },

    #[error("No substitute BRDF class for class {class} at canonical band {canonical_band}")]
    ClassResolution { class: usize, canonical_band: usize },

    #[error("Anisotropy ratio computation failed: {0}")]
    AnisotropyComputation(String),

    #[error("No valid reflectance at pixel ({row}, {col}): {missing_bands} band(s) are fill")]
    NoValidReflectance {
        row: usize,
        col: usize,
        missing_bands: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AlbedoError {
    /// Quality code a failed pixel still reports, if any
    pub fn quality_code(&self) -> Option<QualityCode> {
        match self {
            AlbedoError::NoValidReflectance { .. } => Some(QualityCode::NoData),
            _ => None,
        }
    }
}

/// Result type for albedo operations
pub type AlbedoResult<T> = Result<T, AlbedoError>;
