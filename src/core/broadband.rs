use crate::core::coefficients::{CoefficientSet, N2bCoefficients};
use crate::types::{Reflectance, SkyAlbedo};

/// Broadband albedo of one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadbandAlbedo {
    pub shortwave: SkyAlbedo,
    pub visible: SkyAlbedo,
    pub near_infrared: SkyAlbedo,
    /// At least one product was recomputed from plain reflectance
    pub rescued: bool,
}

/// Narrow-to-broadband conversion
#[derive(Debug, Clone, Copy)]
pub struct BroadbandAggregator {
    scale_factor: f64,
}

impl BroadbandAggregator {
    pub fn new(scale_factor: f64) -> Self {
        Self { scale_factor }
    }

    /// Convert the narrow-band albedo of the active bands.
    ///
    /// `narrow` and `reflectance` hold one entry per active band, in native order.
    /// A product whose black-sky or white-sky value is not positive is
    /// recomputed from the unclamped reflectance.
    pub fn aggregate(
        &self,
        coefficients: &CoefficientSet,
        narrow: &[SkyAlbedo],
        reflectance: &[Reflectance],
    ) -> BroadbandAlbedo {
        let mut rescued = false;
        let mut product = |coeff: &N2bCoefficients, name: &str| {
            let albedo = regress(coeff, narrow);
            if albedo.black_sky > 0.0 && albedo.white_sky > 0.0 {
                return albedo;
            }
            rescued = true;
            let lambertian = self.regress_reflectance(coeff, reflectance);
            log::trace!(
                "{} albedo {:?} not positive, recomputed from reflectance: {}",
                name, albedo, lambertian
            );
            SkyAlbedo::lambertian(lambertian)
        };

        let shortwave = product(&coefficients.shortwave, "shortwave");
        let visible = product(&coefficients.visible, "visible");
        let near_infrared = product(&coefficients.near_infrared, "near-infrared");

        BroadbandAlbedo {
            shortwave,
            visible,
            near_infrared,
            rescued,
        }
    }

    /// Regression on scaled reflectance, bypassing the anisotropy correction
    pub fn regress_reflectance(&self, coeff: &N2bCoefficients, reflectance: &[Reflectance]) -> f64 {
        let sum: f64 = reflectance
            .iter()
            .enumerate()
            .map(|(band, &r)| coeff.weight(band) * f64::from(r) * self.scale_factor)
            .sum();
        sum + coeff.intercept()
    }
}

fn regress(coeff: &N2bCoefficients, narrow: &[SkyAlbedo]) -> SkyAlbedo {
    let mut albedo = SkyAlbedo::default();
    for (band, value) in narrow.iter().enumerate() {
        albedo.black_sky += coeff.weight(band) * value.black_sky;
        albedo.white_sky += coeff.weight(band) * value.white_sky;
    }
    albedo.black_sky += coeff.intercept();
    albedo.white_sky += coeff.intercept();
    albedo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coefficients::{CoefficientTable, OLI_SHORTWAVE, OLI_SHORTWAVE_SNOW, TM_VISIBLE};
    use crate::types::{Instrument, SnowState};
    use approx::assert_relative_eq;

    const SCALE: f64 = 0.0001;

    #[test]
    fn test_regression_with_intercept() {
        let table = CoefficientTable::new();
        let set = table.select(Instrument::Oli, SnowState::Clear);
        let narrow = [SkyAlbedo::new(0.1, 0.12); 6];
        let reflectance = [1000; 6];

        let result = BroadbandAggregator::new(SCALE).aggregate(set, &narrow, &reflectance);

        let weights: f64 = OLI_SHORTWAVE.0[..6].iter().sum();
        assert_relative_eq!(result.shortwave.black_sky, 0.1 * weights + 0.0011052, epsilon = 1e-12);
        assert_relative_eq!(result.shortwave.white_sky, 0.12 * weights + 0.0011052, epsilon = 1e-12);
        let vis: f64 = TM_VISIBLE.0[..6].iter().sum();
        assert_relative_eq!(result.visible.black_sky, 0.1 * vis + TM_VISIBLE.intercept(), epsilon = 1e-12);
        assert!(!result.rescued);
    }

    #[test]
    fn test_non_positive_product_is_rescued() {
        let table = CoefficientTable::new();
        let set = table.select(Instrument::Oli, SnowState::Snow);
        // Strong green/red albedo against negative snow weights
        let narrow = [
            SkyAlbedo::lambertian(0.0),
            SkyAlbedo::lambertian(0.5),
            SkyAlbedo::lambertian(0.5),
            SkyAlbedo::lambertian(0.0),
            SkyAlbedo::lambertian(0.0),
            SkyAlbedo::lambertian(0.0),
        ];
        let reflectance = [-50, 5000, 5000, 0, 0, 0];
        let aggregator = BroadbandAggregator::new(SCALE);

        let result = aggregator.aggregate(set, &narrow, &reflectance);

        let expected = aggregator.regress_reflectance(&OLI_SHORTWAVE_SNOW, &reflectance);
        assert!(result.rescued);
        assert_eq!(result.shortwave.black_sky, expected);
        assert_eq!(result.shortwave.white_sky, expected);
        // Visible stays on the narrow-band regression
        assert_relative_eq!(result.visible.black_sky, 0.5 * (0.2204 + 0.1828) - 0.0033, epsilon = 1e-12);
    }

    #[test]
    fn test_visible_product_is_rescued_on_its_own() {
        let table = CoefficientTable::new();
        let set = table.select(Instrument::Oli, SnowState::Clear);
        let narrow = [
            SkyAlbedo::lambertian(-0.1),
            SkyAlbedo::lambertian(-0.1),
            SkyAlbedo::lambertian(-0.1),
            SkyAlbedo::lambertian(0.3),
            SkyAlbedo::lambertian(0.3),
            SkyAlbedo::lambertian(0.3),
        ];
        let reflectance = [-1000, -1000, -1000, 3000, 3000, 3000];
        let aggregator = BroadbandAggregator::new(SCALE);

        let result = aggregator.aggregate(set, &narrow, &reflectance);

        assert!(result.rescued);
        let expected = aggregator.regress_reflectance(&TM_VISIBLE, &reflectance);
        assert!(expected < 0.0);
        assert_eq!(result.visible, SkyAlbedo::lambertian(expected));
        // Shortwave and NIR stay positive and keep the narrow-band regression
        let sw: f64 = -0.1 * OLI_SHORTWAVE.0[..3].iter().sum::<f64>()
            + 0.3 * OLI_SHORTWAVE.0[3..6].iter().sum::<f64>()
            + OLI_SHORTWAVE.intercept();
        assert_relative_eq!(result.shortwave.black_sky, sw, epsilon = 1e-12);
        assert_relative_eq!(result.near_infrared.white_sky, 0.3 * (0.6646 + 0.2859 + 0.0566) - 0.0037, epsilon = 1e-12);
    }

    #[test]
    fn test_reflectance_regression_uses_raw_values() {
        let aggregator = BroadbandAggregator::new(SCALE);
        let reflectance = [-50, 5000, 5000, 0, 0, 0];
        let value = aggregator.regress_reflectance(&OLI_SHORTWAVE_SNOW, &reflectance);
        let expected = 1.22416 * -0.005 + -0.431845 * 0.5 + -0.3446429 * 0.5 - 0.0052154;
        assert_relative_eq!(value, expected, epsilon = 1e-12);
    }
}
