//! lndalbedo: narrow-to-broadband land surface albedo
//!
//! Converts Landsat TM/ETM+/OLI and Sentinel-2 MSI surface reflectance into
//! black-sky and white-sky shortwave, visible and near-infrared albedo, using
//! class-level BRDF parameters for the anisotropy correction and empirical
//! narrow-to-broadband regressions. Every pixel carries a quality code telling
//! which fallbacks were needed.

pub mod types;
pub mod scene;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    AlbedoError, AlbedoResult, Instrument, PixelAlbedo, QualityCode, SkyAlbedo, SnowState,
    SunViewGeometry,
};

pub use scene::{SceneContext, SceneRow};
pub use io::ParamsReader;
pub use crate::core::{AlbedoParams, AlbedoProcessor, PixelResult, RowAlbedo};
