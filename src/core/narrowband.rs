use crate::core::anisotropy::AnisotropyModel;
use crate::core::brdf::BrdfResolution;
use crate::core::quality::FallbackTally;
use crate::types::{AlbedoResult, Reflectance, SkyAlbedo, SunViewGeometry};

/// Narrow-band albedo calculator
///
/// Converts the scaled reflectance of one band into black-sky and white-sky
/// albedo, applying the anisotropy ratio of the resolved BRDF when there is one.
#[derive(Debug, Clone, Copy)]
pub struct NarrowBandCalculator {
    scale_factor: f64,
    fill_value: Reflectance,
    /// Upper bound of unscaled reflectance
    saturation: f64,
}

impl NarrowBandCalculator {
    pub fn new(scale_factor: f64, fill_value: Reflectance, saturation_reflectance: f64) -> Self {
        Self {
            scale_factor,
            fill_value,
            saturation: saturation_reflectance / scale_factor,
        }
    }

    pub fn is_fill(&self, reflectance: Reflectance) -> bool {
        reflectance == self.fill_value
    }

    /// Raw reflectance limited to [0, saturation]. Negative values come from
    /// over-correction of the atmosphere.
    pub fn clamp(&self, reflectance: Reflectance) -> f64 {
        f64::from(reflectance).max(0.0).min(self.saturation)
    }

    /// Albedo of one band, or `None` when the reflectance is fill.
    pub fn compute(
        &self,
        reflectance: Reflectance,
        resolution: &BrdfResolution,
        model: &dyn AnisotropyModel,
        geometry: &SunViewGeometry,
        tally: &mut FallbackTally,
    ) -> AlbedoResult<Option<SkyAlbedo>> {
        if self.is_fill(reflectance) {
            tally.no_data += 1;
            return Ok(None);
        }

        let lambertian = self.scale_factor * self.clamp(reflectance);

        if !resolution.anisotropy_available() {
            tally.isotropic_fallback += 1;
            return Ok(Some(SkyAlbedo::lambertian(lambertian)));
        }

        let ratios = model.ratios(&resolution.weights, geometry)?;
        let albedo = SkyAlbedo::new(lambertian * ratios.black_sky, lambertian * ratios.white_sky);

        if albedo.black_sky < 0.0 || albedo.white_sky < 0.0 {
            log::trace!("Negative anisotropic albedo {:?}, using Lambertian", albedo);
            tally.negative_anisotropy += 1;
            return Ok(Some(SkyAlbedo::lambertian(lambertian)));
        }

        Ok(Some(albedo))
    }
}
