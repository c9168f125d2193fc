//! Core albedo processing modules

pub mod albedo;
pub mod anisotropy;
pub mod brdf;
pub mod broadband;
pub mod coefficients;
pub mod narrowband;
pub mod quality;

// Re-export main types
pub use albedo::{AlbedoParams, AlbedoProcessor, PixelResult, RowAlbedo, RowStatistics};
pub use anisotropy::{AnisotropyModel, AnisotropyRatios, RossLiModel};
pub use brdf::{BrdfDistanceMatcher, BrdfResolution, BrdfResolver, BrdfSource, BrdfTable, ClassMatcher};
pub use broadband::{BroadbandAggregator, BroadbandAlbedo};
pub use coefficients::{CoefficientSet, CoefficientTable, N2bCoefficients};
pub use narrowband::NarrowBandCalculator;
pub use quality::{classify, FallbackTally};
