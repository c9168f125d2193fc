use crate::core::albedo::AlbedoParams;
use crate::types::{AlbedoError, AlbedoResult};
use quick_xml::de::from_str;
use std::path::Path;

/// Reader for albedo parameter files
///
/// ```xml
/// <albedoParams>
///   <purePixelThreshold>15</purePixelThreshold>
///   <histogramBin>10</histogramBin>
///   <saturationReflectance>0.99</saturationReflectance>
/// </albedoParams>
/// ```
///
/// Elements that are left out keep their default value.
pub struct ParamsReader;

impl ParamsReader {
    /// Read and validate a parameter file
    pub fn read_params_file<P: AsRef<Path>>(path: P) -> AlbedoResult<AlbedoParams> {
        log::info!("Reading albedo parameters: {}", path.as_ref().display());
        let content = std::fs::read_to_string(path)?;
        Self::parse_params(&content)
    }

    /// Parse and validate parameters from an XML document
    pub fn parse_params(xml: &str) -> AlbedoResult<AlbedoParams> {
        let params: AlbedoParams = from_str(xml.trim())
            .map_err(|e| AlbedoError::Config(format!("Failed to parse parameters: {}", e)))?;
        params.validate()?;
        log::debug!("Parsed albedo parameters: {:?}", params);
        Ok(params)
    }
}
