use crate::core::quality::FallbackTally;
use crate::types::{AlbedoError, AlbedoResult, CANONICAL_BAND_COUNT, CANONICAL_BAND_INDEX, KERNEL_COUNT};
use ndarray::Array3;

/// Class-level BRDF kernel weights, indexed `[class][canonical band][kernel]`
#[derive(Debug, Clone)]
pub struct BrdfTable {
    params: Array3<f64>,
}

impl BrdfTable {
    pub fn new(params: Array3<f64>) -> AlbedoResult<Self> {
        let (classes, bands, kernels) = params.dim();
        if bands != CANONICAL_BAND_COUNT || kernels != KERNEL_COUNT {
            return Err(AlbedoError::InvalidInput(format!(
                "BRDF table must be [class][{}][{}], got [{}][{}][{}]",
                CANONICAL_BAND_COUNT, KERNEL_COUNT, classes, bands, kernels
            )));
        }
        if classes == 0 {
            return Err(AlbedoError::InvalidInput("BRDF table has no classes".to_string()));
        }
        Ok(Self { params })
    }

    /// Number of class rows in the table
    pub fn class_count(&self) -> usize {
        self.params.dim().0
    }

    pub fn weights(&self, class: usize, canonical_band: usize) -> [f64; KERNEL_COUNT] {
        [
            self.params[[class, canonical_band, 0]],
            self.params[[class, canonical_band, 1]],
            self.params[[class, canonical_band, 2]],
        ]
    }

    /// Parameters are usable unless all three kernel weights are exactly zero
    pub fn is_usable(&self, class: usize, canonical_band: usize) -> bool {
        self.weights(class, canonical_band).iter().any(|&w| w != 0.0)
    }

    /// Euclidean distance between two classes over the bands both can use
    fn class_distance(&self, a: usize, b: usize) -> Option<f64> {
        let mut sum = 0.0;
        let mut shared = 0;
        for band in 0..CANONICAL_BAND_COUNT {
            if !self.is_usable(a, band) || !self.is_usable(b, band) {
                continue;
            }
            let wa = self.weights(a, band);
            let wb = self.weights(b, band);
            sum += wa.iter().zip(wb.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f64>();
            shared += 1;
        }
        if shared == 0 {
            None
        } else {
            Some(sum.sqrt())
        }
    }
}

/// Finds a substitute class when a class has no usable BRDF at a band
pub trait ClassMatcher: Send + Sync {
    fn closest_class(&self, brdf: &BrdfTable, class: usize, canonical_band: usize) -> Option<usize>;
}

/// Picks the class whose kernel weights are nearest to the failing class.
///
/// Candidates must be usable at the requested band. Candidates sharing no
/// usable band with the failing class rank after all comparable ones; ties go
/// to the lowest class index.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrdfDistanceMatcher;

impl ClassMatcher for BrdfDistanceMatcher {
    fn closest_class(&self, brdf: &BrdfTable, class: usize, canonical_band: usize) -> Option<usize> {
        let mut best: Option<(bool, f64, usize)> = None;

        for candidate in 0..brdf.class_count() {
            if candidate == class || !brdf.is_usable(candidate, canonical_band) {
                continue;
            }
            let (unrelated, distance) = match brdf.class_distance(class, candidate) {
                Some(d) => (false, d),
                None => (true, f64::INFINITY),
            };
            let better = match best {
                None => true,
                Some((best_unrelated, best_distance, _)) => {
                    (unrelated, distance) < (best_unrelated, best_distance)
                }
            };
            if better {
                best = Some((unrelated, distance, candidate));
            }
        }

        best.map(|(_, _, candidate)| candidate)
    }
}

/// Where the kernel weights of a band came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrdfSource {
    /// The pixel's own class
    Concurrent,
    /// Borrowed from the closest class
    Borrowed { class: usize },
}

/// Kernel weights resolved for one band of one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrdfResolution {
    pub source: BrdfSource,
    /// Weights rounded half-up to integers
    pub weights: [f64; KERNEL_COUNT],
}

impl BrdfResolution {
    pub fn anisotropy_available(&self) -> bool {
        self.weights.iter().any(|&w| w != 0.0)
    }
}

/// Resolves per-band kernel weights for a pixel's class
#[derive(Debug, Clone, Copy)]
pub struct BrdfResolver {
    purity_threshold: u32,
}

impl BrdfResolver {
    pub fn new(purity_threshold: u32) -> Self {
        Self { purity_threshold }
    }

    /// Resolve the weights used for native band `band` of a pixel in `class`.
    ///
    /// `purity` is the pure-pixel count of `class`.
    pub fn resolve(
        &self,
        brdf: &BrdfTable,
        matcher: &dyn ClassMatcher,
        class: usize,
        purity: u32,
        band: usize,
        tally: &mut FallbackTally,
    ) -> AlbedoResult<BrdfResolution> {
        let canonical_band = CANONICAL_BAND_INDEX[band];

        let (source, resolved_class) = if brdf.is_usable(class, canonical_band) {
            if purity > self.purity_threshold {
                tally.high_confidence += 1;
            } else if purity == self.purity_threshold {
                tally.marginal_confidence += 1;
            }
            (BrdfSource::Concurrent, class)
        } else {
            let substitute = matcher
                .closest_class(brdf, class, canonical_band)
                .ok_or(AlbedoError::ClassResolution { class, canonical_band })?;
            if substitute >= brdf.class_count() {
                return Err(AlbedoError::InvalidInput(format!(
                    "substitute class {} for class {} outside BRDF table of {} classes",
                    substitute,
                    class,
                    brdf.class_count()
                )));
            }
            tally.borrowed_class += 1;
            log::trace!(
                "Band {}: class {} has no BRDF, borrowing class {}",
                band, class, substitute
            );
            (BrdfSource::Borrowed { class: substitute }, substitute)
        };

        let raw = brdf.weights(resolved_class, canonical_band);
        let weights = [round_half_up(raw[0]), round_half_up(raw[1]), round_half_up(raw[2])];

        Ok(BrdfResolution { source, weights })
    }
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(entries: &[(usize, usize, [f64; 3])], classes: usize) -> BrdfTable {
        let mut params = Array3::<f64>::zeros((classes, CANONICAL_BAND_COUNT, KERNEL_COUNT));
        for &(class, band, w) in entries {
            for k in 0..KERNEL_COUNT {
                params[[class, band, k]] = w[k];
            }
        }
        BrdfTable::new(params).unwrap()
    }

    fn uniform_table(classes: usize, weights: [f64; 3]) -> BrdfTable {
        let mut entries = Vec::new();
        for class in 0..classes {
            for band in 0..CANONICAL_BAND_COUNT {
                entries.push((class, band, weights));
            }
        }
        table_with(&entries, classes)
    }

    #[test]
    fn test_table_shape_validation() {
        let bad = Array3::<f64>::zeros((3, 6, 3));
        assert!(BrdfTable::new(bad).is_err());
        let empty = Array3::<f64>::zeros((0, CANONICAL_BAND_COUNT, KERNEL_COUNT));
        assert!(BrdfTable::new(empty).is_err());
    }

    #[test]
    fn test_usable_requires_a_nonzero_weight() {
        let table = table_with(&[(0, 2, [0.0, 0.0, 5.0])], 2);
        assert!(table.is_usable(0, 2));
        assert!(!table.is_usable(0, 3));
        assert!(!table.is_usable(1, 2));
    }

    #[test]
    fn test_purity_tallies() {
        let table = uniform_table(2, [300.0, 50.0, 20.0]);
        let resolver = BrdfResolver::new(150);
        let matcher = BrdfDistanceMatcher;

        let mut tally = FallbackTally::default();
        resolver.resolve(&table, &matcher, 1, 151, 0, &mut tally).unwrap();
        resolver.resolve(&table, &matcher, 1, 150, 1, &mut tally).unwrap();
        resolver.resolve(&table, &matcher, 1, 149, 2, &mut tally).unwrap();

        assert_eq!(tally.high_confidence, 1);
        assert_eq!(tally.marginal_confidence, 1);
        assert_eq!(tally.borrowed_class, 0);
    }

    #[test]
    fn test_weights_round_half_up() {
        let table = uniform_table(1, [2.5, 1.49, -0.5]);
        let resolver = BrdfResolver::new(0);
        let mut tally = FallbackTally::default();
        let resolution = resolver
            .resolve(&table, &BrdfDistanceMatcher, 0, 10, 0, &mut tally)
            .unwrap();
        assert_eq!(resolution.weights, [3.0, 1.0, 0.0]);
        assert_eq!(resolution.source, BrdfSource::Concurrent);
    }

    #[test]
    fn test_small_weights_round_to_unavailable() {
        let table = uniform_table(1, [0.3, 0.2, 0.1]);
        let resolver = BrdfResolver::new(0);
        let mut tally = FallbackTally::default();
        let resolution = resolver
            .resolve(&table, &BrdfDistanceMatcher, 0, 10, 0, &mut tally)
            .unwrap();
        assert!(!resolution.anisotropy_available());
        assert_eq!(tally.high_confidence, 1);
    }

    #[test]
    fn test_borrow_from_closest_class() {
        // Class 0 lacks canonical band 2; class 1 is far away, class 2 is close.
        let mut entries = Vec::new();
        for band in 0..CANONICAL_BAND_COUNT {
            if band != 2 {
                entries.push((0, band, [100.0, 10.0, 5.0]));
            }
            entries.push((1, band, [900.0, 400.0, 80.0]));
            entries.push((2, band, [110.0, 12.0, 5.0]));
        }
        let table = table_with(&entries, 3);
        let resolver = BrdfResolver::new(150);
        let mut tally = FallbackTally::default();

        // Native band 0 maps to canonical band 2
        let resolution = resolver
            .resolve(&table, &BrdfDistanceMatcher, 0, 500, 0, &mut tally)
            .unwrap();
        assert_eq!(resolution.source, BrdfSource::Borrowed { class: 2 });
        assert_eq!(resolution.weights, [110.0, 12.0, 5.0]);
        assert_eq!(tally.borrowed_class, 1);
        assert_eq!(tally.high_confidence, 0);
    }

    #[test]
    fn test_matcher_prefers_comparable_classes() {
        // Class 0 only has band 0; class 1 only has band 3 (no overlap);
        // class 2 has bands 0 and 3.
        let table = table_with(
            &[
                (0, 0, [100.0, 0.0, 0.0]),
                (1, 3, [100.0, 0.0, 0.0]),
                (2, 0, [400.0, 0.0, 0.0]),
                (2, 3, [400.0, 0.0, 0.0]),
            ],
            3,
        );
        assert_eq!(BrdfDistanceMatcher.closest_class(&table, 0, 3), Some(2));
    }

    #[test]
    fn test_matcher_ties_go_to_lowest_index() {
        let table = uniform_table(4, [100.0, 10.0, 1.0]);
        assert_eq!(BrdfDistanceMatcher.closest_class(&table, 2, 0), Some(0));
    }

    struct FixedMatcher(usize);

    impl ClassMatcher for FixedMatcher {
        fn closest_class(&self, _: &BrdfTable, _: usize, _: usize) -> Option<usize> {
            Some(self.0)
        }
    }

    #[test]
    fn test_substitute_outside_table_is_rejected() {
        let table = table_with(&[(0, 2, [100.0, 10.0, 5.0])], 2);
        let resolver = BrdfResolver::new(150);
        let mut tally = FallbackTally::default();

        let result = resolver.resolve(&table, &FixedMatcher(7), 1, 500, 0, &mut tally);
        assert!(matches!(result, Err(AlbedoError::InvalidInput(_))));
        assert_eq!(tally.borrowed_class, 0);

        let resolution = resolver.resolve(&table, &FixedMatcher(0), 1, 500, 0, &mut tally).unwrap();
        assert_eq!(resolution.source, BrdfSource::Borrowed { class: 0 });
    }

    #[test]
    fn test_isotropic_weight_alone_does_not_decide_availability() {
        // Only the kernel weights survive rounding; anisotropy stays on
        let table = uniform_table(1, [0.4, 35.0, 8.2]);
        let resolver = BrdfResolver::new(150);
        let mut tally = FallbackTally::default();
        let resolution = resolver
            .resolve(&table, &BrdfDistanceMatcher, 0, 500, 0, &mut tally)
            .unwrap();
        assert_eq!(resolution.weights, [0.0, 35.0, 8.0]);
        assert!(resolution.anisotropy_available());
    }

    #[test]
    fn test_unresolvable_class() {
        let table = uniform_table(2, [0.0, 0.0, 0.0]);
        let resolver = BrdfResolver::new(150);
        let mut tally = FallbackTally::default();
        let result = resolver.resolve(&table, &BrdfDistanceMatcher, 0, 500, 0, &mut tally);
        assert!(matches!(
            result,
            Err(AlbedoError::ClassResolution { class: 0, canonical_band: 2 })
        ));
    }
}
