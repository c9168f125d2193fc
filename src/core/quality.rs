//! Per-pixel quality classification from band-level fallback counts

use crate::types::QualityCode;

/// Fallback paths taken by the bands of one pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackTally {
    /// Own-class BRDF backed by more pure pixels than the threshold
    pub high_confidence: usize,
    /// Own-class BRDF backed by exactly the threshold count
    pub marginal_confidence: usize,
    /// BRDF borrowed from the closest class
    pub borrowed_class: usize,
    /// Anisotropy-corrected albedo was negative, replaced by Lambertian
    pub negative_anisotropy: usize,
    /// No anisotropy available, reflectance used as albedo
    pub isotropic_fallback: usize,
    /// Fill reflectance
    pub no_data: usize,
}

/// Classify a pixel from its tallies, `band_count` being the number of active bands.
///
/// Rules are tried in order; the first match wins.
pub fn classify(tally: &FallbackTally, band_count: usize) -> QualityCode {
    let concurrent = tally.high_confidence + tally.marginal_confidence;

    if tally.high_confidence == band_count {
        QualityCode::Full
    } else if concurrent == band_count {
        QualityCode::Sparse
    } else if tally.borrowed_class + concurrent == band_count {
        QualityCode::Borrowed
    } else if tally.negative_anisotropy > 0 {
        QualityCode::Lambertian
    } else {
        log::debug!("No quality rule matched tally {:?}", tally);
        QualityCode::Indeterminate
    }
}
