//! I/O modules for processing parameters

pub mod params;

pub use params::ParamsReader;
