//! Albedo-to-reflectance (anisotropy) ratios from kernel-driven BRDF parameters
//!
//! The kernel model is the RossThick-LiSparse-Reciprocal model used by the
//! MODIS BRDF/albedo product:
//!
//! R(θs, θv, φ) = f_iso + f_vol·K_vol(θs, θv, φ) + f_geo·K_geo(θs, θv, φ)
//!
//! Black-sky albedo integrates the kernels over the viewing hemisphere with a
//! polynomial in the solar zenith; white-sky albedo integrates once more over
//! illumination, giving constants (Lucht et al., 2000).

use crate::types::{AlbedoError, AlbedoResult, SunViewGeometry, KERNEL_COUNT};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Black-sky and white-sky albedo divided by reflectance at the pixel geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnisotropyRatios {
    pub black_sky: f64,
    pub white_sky: f64,
}

/// Computes anisotropy ratios from kernel weights and sun/view geometry
pub trait AnisotropyModel: Send + Sync {
    fn ratios(
        &self,
        weights: &[f64; KERNEL_COUNT],
        geometry: &SunViewGeometry,
    ) -> AlbedoResult<AnisotropyRatios>;
}

/// Crown height to vertical crown radius (LiSparse)
const CROWN_HEIGHT_RATIO: f64 = 2.0;
/// Vertical to horizontal crown radius (LiSparse)
const CROWN_SHAPE_RATIO: f64 = 1.0;

// Black-sky polynomial terms g0 + g1·θ² + g2·θ³ (volumetric, geometric)
const BSA_VOL: [f64; 3] = [-0.007574, -0.070987, 0.307588];
const BSA_GEO: [f64; 3] = [-1.284909, -0.166314, 0.041840];

// White-sky hemispherical integrals (volumetric, geometric)
const WSA_VOL: f64 = 0.189184;
const WSA_GEO: f64 = -1.377622;

/// RossThick-LiSparse-Reciprocal kernel model
#[derive(Debug, Clone, Copy, Default)]
pub struct RossLiModel;

impl RossLiModel {
    pub fn new() -> Self {
        Self
    }

    /// Volumetric and geometric kernel values at a geometry (radians)
    pub fn kernels(solar_zenith: f64, view_zenith: f64, relative_azimuth: f64) -> (f64, f64) {
        (
            ross_thick(solar_zenith, view_zenith, relative_azimuth),
            li_sparse(solar_zenith, view_zenith, relative_azimuth),
        )
    }
}

impl AnisotropyModel for RossLiModel {
    fn ratios(
        &self,
        weights: &[f64; KERNEL_COUNT],
        geometry: &SunViewGeometry,
    ) -> AlbedoResult<AnisotropyRatios> {
        validate_zenith("solar", geometry.solar_zenith)?;
        validate_zenith("view", geometry.view_zenith)?;
        if !geometry.relative_azimuth().is_finite() {
            return Err(AlbedoError::AnisotropyComputation(format!(
                "non-finite azimuth in {:?}",
                geometry
            )));
        }

        let sza = geometry.solar_zenith.to_radians();
        let vza = geometry.view_zenith.to_radians();
        let raa = geometry.relative_azimuth().to_radians();

        let (k_vol, k_geo) = Self::kernels(sza, vza, raa);
        let [f_iso, f_vol, f_geo] = *weights;

        let reflectance = f_iso + f_vol * k_vol + f_geo * k_geo;
        if !reflectance.is_finite() || reflectance.abs() < f64::EPSILON {
            return Err(AlbedoError::AnisotropyComputation(format!(
                "modelled reflectance {} for weights {:?}",
                reflectance, weights
            )));
        }

        let sza2 = sza * sza;
        let sza3 = sza2 * sza;
        let black_sky = f_iso
            + f_vol * (BSA_VOL[0] + BSA_VOL[1] * sza2 + BSA_VOL[2] * sza3)
            + f_geo * (BSA_GEO[0] + BSA_GEO[1] * sza2 + BSA_GEO[2] * sza3);
        let white_sky = f_iso + f_vol * WSA_VOL + f_geo * WSA_GEO;

        Ok(AnisotropyRatios {
            black_sky: black_sky / reflectance,
            white_sky: white_sky / reflectance,
        })
    }
}

fn validate_zenith(name: &str, zenith: f64) -> AlbedoResult<()> {
    if !zenith.is_finite() || !(0.0..90.0).contains(&zenith) {
        return Err(AlbedoError::AnisotropyComputation(format!(
            "{} zenith {} outside [0, 90) degrees",
            name, zenith
        )));
    }
    Ok(())
}

fn ross_thick(sza: f64, vza: f64, raa: f64) -> f64 {
    let cos_xi = (sza.cos() * vza.cos() + sza.sin() * vza.sin() * raa.cos()).clamp(-1.0, 1.0);
    let xi = cos_xi.acos();
    ((FRAC_PI_2 - xi) * cos_xi + xi.sin()) / (sza.cos() + vza.cos()) - FRAC_PI_4
}

fn li_sparse(sza: f64, vza: f64, raa: f64) -> f64 {
    // Equivalent spherical-crown angles
    let sza = (CROWN_SHAPE_RATIO * sza.tan()).atan();
    let vza = (CROWN_SHAPE_RATIO * vza.tan()).atan();

    let tan_s = sza.tan();
    let tan_v = vza.tan();
    let sec_s = 1.0 / sza.cos();
    let sec_v = 1.0 / vza.cos();
    let cos_xi = sza.cos() * vza.cos() + sza.sin() * vza.sin() * raa.cos();

    let distance2 = (tan_s * tan_s + tan_v * tan_v - 2.0 * tan_s * tan_v * raa.cos()).max(0.0);
    let cross = tan_s * tan_v * raa.sin();
    let cos_t = (CROWN_HEIGHT_RATIO * (distance2 + cross * cross).sqrt() / (sec_s + sec_v))
        .clamp(-1.0, 1.0);
    let t = cos_t.acos();
    let overlap = (t - t.sin() * cos_t) * (sec_s + sec_v) / PI;

    overlap - sec_s - sec_v + 0.5 * (1.0 + cos_xi) * sec_s * sec_v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_isotropic_weights_give_unit_ratios() {
        let model = RossLiModel::new();
        let geometry = SunViewGeometry::new(35.0, 140.0, 5.0, 100.0);
        let ratios = model.ratios(&[1000.0, 0.0, 0.0], &geometry).unwrap();
        assert_eq!(ratios.black_sky, 1.0);
        assert_eq!(ratios.white_sky, 1.0);
    }

    #[test]
    fn test_kernels_vanish_at_nadir() {
        let (k_vol, k_geo) = RossLiModel::kernels(0.0, 0.0, 0.0);
        assert_abs_diff_eq!(k_vol, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(k_geo, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nadir_ratios_follow_kernel_integrals() {
        let model = RossLiModel::new();
        let geometry = SunViewGeometry::new(0.0, 0.0, 0.0, 0.0);
        let ratios = model.ratios(&[1.0, 1.0, 1.0], &geometry).unwrap();
        assert_abs_diff_eq!(ratios.black_sky, 1.0 + BSA_VOL[0] + BSA_GEO[0], epsilon = 1e-9);
        assert_abs_diff_eq!(ratios.white_sky, 1.0 + WSA_VOL + WSA_GEO, epsilon = 1e-9);
        assert!(ratios.black_sky < 0.0);
    }

    #[test]
    fn test_kernels_are_reciprocal() {
        let a = 30f64.to_radians();
        let b = 10f64.to_radians();
        let phi = 75f64.to_radians();
        let (vol_ab, geo_ab) = RossLiModel::kernels(a, b, phi);
        let (vol_ba, geo_ba) = RossLiModel::kernels(b, a, phi);
        assert_abs_diff_eq!(vol_ab, vol_ba, epsilon = 1e-12);
        assert_abs_diff_eq!(geo_ab, geo_ba, epsilon = 1e-12);
    }

    #[test]
    fn test_vegetation_like_weights() {
        let model = RossLiModel::new();
        let geometry = SunViewGeometry::new(40.0, 150.0, 7.0, 290.0);
        let ratios = model.ratios(&[250.0, 120.0, 30.0], &geometry).unwrap();
        assert!(ratios.black_sky.is_finite() && ratios.black_sky > 0.0);
        assert!(ratios.white_sky.is_finite() && ratios.white_sky > 0.0);
    }

    #[test]
    fn test_invalid_geometry() {
        let model = RossLiModel::new();
        let horizon = SunViewGeometry::new(90.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            model.ratios(&[1.0, 0.0, 0.0], &horizon),
            Err(AlbedoError::AnisotropyComputation(_))
        ));
        let nan = SunViewGeometry::new(30.0, f64::NAN, 0.0, 0.0);
        assert!(model.ratios(&[1.0, 0.0, 0.0], &nan).is_err());
    }

    #[test]
    fn test_zero_reflectance_is_an_error() {
        let model = RossLiModel::new();
        let geometry = SunViewGeometry::new(0.0, 0.0, 0.0, 0.0);
        // Kernels vanish at nadir, so only the isotropic weight contributes
        assert!(model.ratios(&[0.0, 5.0, 3.0], &geometry).is_err());
    }
}
