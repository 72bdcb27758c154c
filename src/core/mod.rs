pub mod calibration;
pub mod layout;
pub mod registry;
pub mod tags;

pub use crate::domain::model::{CalibrationRecord, ElementCounts, ElementTag, Region};
pub use crate::domain::ports::{CalibrationSource, ConfigProvider, ValidationMode};
pub use crate::utils::error::Result;
