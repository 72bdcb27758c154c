use crate::domain::model::{ElementCounts, WorldRect};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::PathBuf;

/// Where calibration text comes from. Each `open` hands out a fresh reader
/// that the caller owns and drops when the load finishes.
pub trait CalibrationSource {
    /// Name used in error messages and logs.
    fn name(&self) -> String;
    fn open(&self) -> Result<Box<dyn BufRead + '_>>;
}

/// Whether every load first checks the file's tag sequence against the element universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ValidationMode {
    #[default]
    Strict,
    LookupOnly,
}

pub trait ConfigProvider {
    fn element_counts(&self) -> Result<ElementCounts>;
    fn world_bounds(&self) -> WorldRect;
    fn calibration_path(&self) -> Option<PathBuf>;
    fn validation_mode(&self) -> ValidationMode;
}
