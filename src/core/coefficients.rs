//! Narrow-to-broadband regression coefficients
//!
//! Shortwave coefficients for TM and ETM+ are Tao He's 2012 fits over the USGS and
//! ASTER spectral libraries; OLI and MSI have their own no-snow (inherent) and
//! snow (apparent) fits. Visible and near-infrared conversions use the TM
//! regressions for every instrument.

use crate::types::{Instrument, SnowState, MAX_BANDS};
use std::collections::HashMap;

/// Regression coefficients for one broadband product: six band weights in
/// native band order followed by the intercept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct N2bCoefficients(pub [f64; MAX_BANDS + 1]);

impl N2bCoefficients {
    pub fn weight(&self, band: usize) -> f64 {
        self.0[band]
    }

    pub fn intercept(&self) -> f64 {
        self.0[MAX_BANDS]
    }
}

pub const TM_SHORTWAVE: N2bCoefficients =
    N2bCoefficients([0.3206, 0.000, 0.1572, 0.3666, 0.1162, 0.0457, -0.0063]);
pub const TM_VISIBLE: N2bCoefficients =
    N2bCoefficients([0.6000, 0.2204, 0.1828, 0.000, 0.000, 0.000, -0.0033]);
pub const TM_NEAR_INFRARED: N2bCoefficients =
    N2bCoefficients([0.000, 0.000, 0.000, 0.6646, 0.2859, 0.0566, -0.0037]);

/// OLI shortwave, snow-free library (`LC8_n2b_lib`)
pub const OLI_SHORTWAVE: N2bCoefficients = N2bCoefficients([
    0.2453421, 0.050843, 0.1803945, 0.3080635, 0.1331847, 0.0521349, 0.0011052,
]);
/// OLI shortwave, snow library (`LC8_n2b_lib_snow`)
pub const OLI_SHORTWAVE_SNOW: N2bCoefficients = N2bCoefficients([
    1.22416, -0.431845, -0.3446429, 0.3367926, 0.1834496, 0.2554519, -0.0052154,
]);

/// MSI bands 2, 3, 4, 8A, 11, 12 (inherent)
pub const MSI_SHORTWAVE: N2bCoefficients = N2bCoefficients([
    0.2687617, 0.0361839, 0.1501418, 0.3044542, 0.164433, 0.0356021, -0.0048673,
]);
/// MSI bands 2, 3, 4, 8A, 11, 12 over snow (apparent)
pub const MSI_SHORTWAVE_SNOW: N2bCoefficients = N2bCoefficients([
    -0.1992158, 2.300191, -1.912122, 0.6714989, -2.272847, 1.934139, -0.0001144,
]);

/// Coefficients for the three broadband products of one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSet {
    pub shortwave: N2bCoefficients,
    pub visible: N2bCoefficients,
    pub near_infrared: N2bCoefficients,
}

impl CoefficientSet {
    fn with_shortwave(shortwave: N2bCoefficients) -> Self {
        Self {
            shortwave,
            visible: TM_VISIBLE,
            near_infrared: TM_NEAR_INFRARED,
        }
    }
}

/// Read-only lookup from (instrument, snow state) to coefficient set
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    sets: HashMap<(Instrument, SnowState), CoefficientSet>,
    fallback: CoefficientSet,
}

impl CoefficientTable {
    /// Build the standard table
    pub fn new() -> Self {
        let legacy = CoefficientSet::with_shortwave(TM_SHORTWAVE);
        let mut sets = HashMap::new();

        for snow in [SnowState::Clear, SnowState::Snow] {
            sets.insert((Instrument::Tm, snow), legacy);
            sets.insert((Instrument::Etm, snow), legacy);
        }
        sets.insert(
            (Instrument::Oli, SnowState::Clear),
            CoefficientSet::with_shortwave(OLI_SHORTWAVE),
        );
        sets.insert(
            (Instrument::Oli, SnowState::Snow),
            CoefficientSet::with_shortwave(OLI_SHORTWAVE_SNOW),
        );
        sets.insert(
            (Instrument::Msi, SnowState::Clear),
            CoefficientSet::with_shortwave(MSI_SHORTWAVE),
        );
        sets.insert(
            (Instrument::Msi, SnowState::Snow),
            CoefficientSet::with_shortwave(MSI_SHORTWAVE_SNOW),
        );

        log::debug!("Built narrow-to-broadband table with {} entries", sets.len());

        Self {
            sets,
            fallback: legacy,
        }
    }

    /// Coefficients for a pixel. Instruments without an entry use the legacy set.
    pub fn select(&self, instrument: Instrument, snow: SnowState) -> &CoefficientSet {
        self.sets.get(&(instrument, snow)).unwrap_or(&self.fallback)
    }
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self::new()
    }
}
