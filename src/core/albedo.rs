use crate::core::anisotropy::{AnisotropyModel, RossLiModel};
use crate::core::brdf::{BrdfDistanceMatcher, BrdfResolver, ClassMatcher};
use crate::core::broadband::BroadbandAggregator;
use crate::core::coefficients::CoefficientTable;
use crate::core::narrowband::NarrowBandCalculator;
use crate::core::quality::{classify, FallbackTally};
use crate::scene::{SceneContext, SceneRow};
use crate::types::{
    AlbedoError, AlbedoResult, Instrument, PixelAlbedo, QualityCode, Reflectance, SkyAlbedo,
    SnowState, SunViewGeometry, MAX_BANDS, PIXEL_SLOT_COUNT,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Parameters for albedo processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlbedoParams {
    /// Pure-pixel count per histogram bin a class needs for a confident BRDF
    pub pure_pixel_threshold: u32,
    /// Histogram bin width of the pure-pixel statistics
    pub histogram_bin: u32,
    /// Reflectance ceiling applied before the anisotropy correction
    pub saturation_reflectance: f64,
    /// Albedo written for pixels that could not be processed
    pub albedo_fill_value: f64,
    /// Quality code written for pixels that could not be processed
    pub quality_fill_value: i8,
}

impl Default for AlbedoParams {
    fn default() -> Self {
        Self {
            pure_pixel_threshold: 15,
            histogram_bin: 10,
            saturation_reflectance: 0.99,
            albedo_fill_value: -32768.0,
            quality_fill_value: -128,
        }
    }
}

impl AlbedoParams {
    /// Pure-pixel count separating confident from marginal class BRDFs
    pub fn purity_threshold(&self) -> AlbedoResult<u32> {
        self.pure_pixel_threshold
            .checked_mul(self.histogram_bin)
            .ok_or_else(|| {
                AlbedoError::Config(format!(
                    "purity threshold {} x {} overflows",
                    self.pure_pixel_threshold, self.histogram_bin
                ))
            })
    }

    pub fn validate(&self) -> AlbedoResult<()> {
        self.purity_threshold()?;
        if !(self.saturation_reflectance > 0.0 && self.saturation_reflectance <= 1.0) {
            return Err(AlbedoError::Config(format!(
                "saturation reflectance {} outside (0, 1]",
                self.saturation_reflectance
            )));
        }
        if self.quality_fill_value >= QualityCode::NoData.as_i8()
            && self.quality_fill_value <= QualityCode::Indeterminate.as_i8()
        {
            return Err(AlbedoError::Config(format!(
                "quality fill value {} collides with a quality code",
                self.quality_fill_value
            )));
        }
        Ok(())
    }
}

/// Albedo of one successfully processed pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelResult {
    pub albedo: PixelAlbedo,
    pub quality: QualityCode,
    pub tally: FallbackTally,
}

/// Outcome counts of a processed row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStatistics {
    /// Pixels per quality code 0..=5
    pub quality_counts: [usize; 6],
    pub no_data: usize,
    pub invalid_class: usize,
    pub unresolved_class: usize,
    pub anisotropy_failures: usize,
}

impl RowStatistics {
    fn record(&mut self, quality: QualityCode) {
        if let Ok(code) = usize::try_from(quality.as_i8()) {
            self.quality_counts[code] += 1;
        }
    }

    /// Pixels with albedo output
    pub fn processed(&self) -> usize {
        self.quality_counts.iter().sum()
    }

    /// Pixels without albedo output
    pub fn skipped(&self) -> usize {
        self.no_data + self.invalid_class + self.unresolved_class + self.anisotropy_failures
    }
}

/// Albedo rasters of one scene row
#[derive(Debug, Clone)]
pub struct RowAlbedo {
    /// Column x slot, in the `PixelAlbedo::to_slots` layout
    pub albedo: Array2<f64>,
    pub quality: Array1<i8>,
    pub statistics: RowStatistics,
}

/// Narrow-to-broadband albedo processor
pub struct AlbedoProcessor {
    params: AlbedoParams,
    coefficients: CoefficientTable,
    resolver: BrdfResolver,
    model: Box<dyn AnisotropyModel>,
    matcher: Box<dyn ClassMatcher>,
}

impl AlbedoProcessor {
    /// Create a processor with custom collaborators
    pub fn new(
        params: AlbedoParams,
        model: Box<dyn AnisotropyModel>,
        matcher: Box<dyn ClassMatcher>,
    ) -> AlbedoResult<Self> {
        params.validate()?;
        log::debug!("Albedo parameters: {:?}", params);

        let resolver = BrdfResolver::new(params.purity_threshold()?);
        Ok(Self {
            params,
            coefficients: CoefficientTable::new(),
            resolver,
            model,
            matcher,
        })
    }

    /// Create a processor with the RossThick-LiSparse model and nearest-BRDF class matching
    pub fn with_params(params: AlbedoParams) -> AlbedoResult<Self> {
        Self::new(params, Box::new(RossLiModel::new()), Box::new(BrdfDistanceMatcher))
    }

    /// Create a standard processor with default parameters
    pub fn standard() -> AlbedoResult<Self> {
        Self::with_params(AlbedoParams::default())
    }

    pub fn params(&self) -> &AlbedoParams {
        &self.params
    }

    /// Compute the albedo of one pixel.
    ///
    /// `row_index` only labels errors and log messages; `col` indexes `row`.
    /// Scene and row are checked for consistency first.
    pub fn compute_pixel(
        &self,
        scene: &SceneContext,
        row: &SceneRow,
        row_index: usize,
        col: usize,
        geometry: &SunViewGeometry,
        snow: SnowState,
    ) -> AlbedoResult<PixelResult> {
        scene.validate()?;
        row.validate(scene)?;
        if col >= row.width() {
            return Err(AlbedoError::InvalidInput(format!(
                "column {} outside row of width {}",
                col,
                row.width()
            )));
        }
        self.pixel_albedo(scene, row, row_index, col, geometry, snow)
    }

    /// Pixel computation on a scene and row already validated
    fn pixel_albedo(
        &self,
        scene: &SceneContext,
        row: &SceneRow,
        row_index: usize,
        col: usize,
        geometry: &SunViewGeometry,
        snow: SnowState,
    ) -> AlbedoResult<PixelResult> {
        let label = row.classes[col];
        let class = scene
            .class_index(label)
            .ok_or(AlbedoError::InvalidClass { row: row_index, col, class: label })?;
        let purity = scene.purity_counts[class];

        let coefficients = self.coefficients.select(scene.instrument, snow);
        let calculator = NarrowBandCalculator::new(
            scene.scale_factor,
            scene.reflectance_fill,
            self.params.saturation_reflectance,
        );

        let band_count = scene.band_count;
        let mut tally = FallbackTally::default();
        let mut narrow = [SkyAlbedo::default(); MAX_BANDS];
        let mut reflectance: [Reflectance; MAX_BANDS] = [0; MAX_BANDS];

        for band in 0..band_count {
            let value = row.reflectance[[band, col]];
            reflectance[band] = value;

            let resolution = self.resolver.resolve(
                &scene.brdf,
                self.matcher.as_ref(),
                class,
                purity,
                band,
                &mut tally,
            )?;
            if let Some(albedo) =
                calculator.compute(value, &resolution, self.model.as_ref(), geometry, &mut tally)?
            {
                narrow[band] = albedo;
            }
        }

        if tally.no_data > 0 {
            return Err(AlbedoError::NoValidReflectance {
                row: row_index,
                col,
                missing_bands: tally.no_data,
            });
        }

        let mut quality = classify(&tally, band_count);

        let broadband = BroadbandAggregator::new(scene.scale_factor).aggregate(
            coefficients,
            &narrow[..band_count],
            &reflectance[..band_count],
        );
        if broadband.rescued {
            quality = QualityCode::RegressionRescue;
        }

        log::trace!("Pixel ({}, {}): class {}, quality {}, {:?}", row_index, col, class, quality, tally);

        Ok(PixelResult {
            albedo: PixelAlbedo {
                narrow_band: narrow,
                shortwave: broadband.shortwave,
                visible: broadband.visible,
                near_infrared: broadband.near_infrared,
            },
            quality,
            tally,
        })
    }

    /// Compute every pixel of a row with the scene geometry
    pub fn process_row(
        &self,
        scene: &SceneContext,
        row: &SceneRow,
        row_index: usize,
    ) -> AlbedoResult<RowAlbedo> {
        self.prepare_row(scene, row, row_index)?;

        let results: Vec<AlbedoResult<PixelResult>> = (0..row.width())
            .map(|col| self.process_column(scene, row, row_index, col))
            .collect();

        self.assemble_row(row_index, results)
    }

    /// Parallel row processing using Rayon
    #[cfg(feature = "parallel")]
    pub fn process_row_parallel(
        &self,
        scene: &SceneContext,
        row: &SceneRow,
        row_index: usize,
    ) -> AlbedoResult<RowAlbedo> {
        use rayon::prelude::*;

        self.prepare_row(scene, row, row_index)?;

        let results: Vec<AlbedoResult<PixelResult>> = (0..row.width())
            .into_par_iter()
            .map(|col| self.process_column(scene, row, row_index, col))
            .collect();

        self.assemble_row(row_index, results)
    }

    fn prepare_row(&self, scene: &SceneContext, row: &SceneRow, row_index: usize) -> AlbedoResult<()> {
        scene.validate()?;
        row.validate(scene)?;
        if scene.instrument == Instrument::Unknown {
            log::debug!("Unrecognised instrument, converting row {} with TM coefficients", row_index);
        }
        log::debug!(
            "Processing albedo for row {} ({} columns, {} bands, {})",
            row_index,
            row.width(),
            scene.band_count,
            scene.instrument
        );
        Ok(())
    }

    fn process_column(
        &self,
        scene: &SceneContext,
        row: &SceneRow,
        row_index: usize,
        col: usize,
    ) -> AlbedoResult<PixelResult> {
        self.pixel_albedo(scene, row, row_index, col, &scene.geometry, row.snow_state(col))
    }

    fn assemble_row(
        &self,
        row_index: usize,
        results: Vec<AlbedoResult<PixelResult>>,
    ) -> AlbedoResult<RowAlbedo> {
        let width = results.len();
        let mut albedo = Array2::from_elem((width, PIXEL_SLOT_COUNT), self.params.albedo_fill_value);
        let mut quality = Array1::from_elem(width, self.params.quality_fill_value);
        let mut statistics = RowStatistics::default();

        for (col, result) in results.into_iter().enumerate() {
            match result {
                Ok(pixel) => {
                    for (slot, value) in pixel.albedo.to_slots().iter().enumerate() {
                        albedo[[col, slot]] = *value;
                    }
                    quality[col] = pixel.quality.as_i8();
                    statistics.record(pixel.quality);
                }
                Err(err) => {
                    match err {
                        AlbedoError::NoValidReflectance { .. } => statistics.no_data += 1,
                        AlbedoError::InvalidClass { .. } => statistics.invalid_class += 1,
                        AlbedoError::ClassResolution { .. } => statistics.unresolved_class += 1,
                        AlbedoError::AnisotropyComputation(_) => {
                            log::warn!("Skipping pixel ({}, {}): {}", row_index, col, err);
                            statistics.anisotropy_failures += 1;
                        }
                        _ => return Err(err),
                    }
                    if let Some(code) = err.quality_code() {
                        quality[col] = code.as_i8();
                    }
                }
            }
        }

        log::debug!(
            "Row {} done: {} pixels with albedo, {} skipped, quality counts {:?}",
            row_index,
            statistics.processed(),
            statistics.skipped(),
            statistics.quality_counts
        );

        Ok(RowAlbedo {
            albedo,
            quality,
            statistics,
        })
    }
}
