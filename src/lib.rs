pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::{CalibrationFile, InlineCalibration, LocalCalibrationStore};
pub use config::toml_config::DetectorConfig;
pub use core::{
    calibration::CalibrationParser, layout::DetectorLayout, registry::DetectorRegistry,
    tags::tag_universe,
};
pub use domain::model::{
    CalibrationField, CalibrationRecord, ElementCounts, ElementKind, ElementTag, Region,
    WorldPoint, WorldRect,
};
pub use domain::ports::{CalibrationSource, ConfigProvider, ValidationMode};
pub use utils::error::{BedError, Result};
