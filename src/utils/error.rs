use thiserror::Error;

#[derive(Error, Debug)]
pub enum BedError {
    #[error("Invalid calibration file '{file}': {reason}")]
    InvalidCalibrationFile { file: String, reason: String },

    #[error("Malformed calibration record '{tag}': {reason}")]
    MalformedRecord {
        tag: String,
        field: Option<usize>,
        reason: String,
    },

    #[error("Element '{tag}' not found in calibration file '{file}'")]
    ElementNotFound { tag: String, file: String },

    #[error("Degenerate world bounds: width={width}, height={height}")]
    DegenerateBounds { width: f64, height: f64 },

    #[error("Invalid element counts: {reason}")]
    InvalidElementCounts { reason: String },

    #[error("Invalid element tag '{value}': {reason}")]
    InvalidTag { value: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Calibration,
    Geometry,
    Configuration,
    Io,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BedError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BedError::InvalidCalibrationFile { .. }
            | BedError::MalformedRecord { .. }
            | BedError::ElementNotFound { .. } => ErrorCategory::Calibration,
            BedError::DegenerateBounds { .. }
            | BedError::InvalidElementCounts { .. }
            | BedError::InvalidTag { .. } => ErrorCategory::Geometry,
            BedError::ConfigValidationError { .. }
            | BedError::InvalidConfigValueError { .. }
            | BedError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BedError::IoError(_) => ErrorCategory::Io,
            BedError::SerializationError(_) | BedError::CsvError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Calibration => match self {
                BedError::ElementNotFound { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Geometry | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io | ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BedError::InvalidCalibrationFile { .. } => {
                "Check that the file exists and lists b1..b9 then v1..vN in order, one tag per record line"
            }
            BedError::MalformedRecord { .. } => {
                "Each record needs a tag followed by exactly 9 numbers separated by single spaces"
            }
            BedError::ElementNotFound { .. } => {
                "Use a tag from the element universe (b1..b9, v1..vN for the configured crystal count)"
            }
            BedError::DegenerateBounds { .. } => "Use a world rectangle with positive width and height",
            BedError::InvalidElementCounts { .. } => {
                "Only the crystal veto count is configurable; the bar and ring counts are fixed"
            }
            BedError::InvalidTag { .. } => "Tags are 'b' or 'v' followed by a 1-based number, e.g. b3 or v17",
            BedError::ConfigValidationError { .. }
            | BedError::InvalidConfigValueError { .. }
            | BedError::MissingConfigError { .. } => "Review the TOML configuration and command-line overrides",
            BedError::IoError(_) => "Check file permissions and available disk space",
            BedError::SerializationError(_) | BedError::CsvError(_) => {
                "Retry with a different output format"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Calibration => format!("Calibration problem: {}", self),
            ErrorCategory::Geometry => format!("Detector geometry problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Output => format!("Could not render output: {}", self),
        }
    }

    /// Process exit code for the CLI binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BedError>;
