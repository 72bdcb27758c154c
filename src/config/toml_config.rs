use crate::domain::model::{ElementCounts, WorldRect, MAX_CRYSTAL_VETOES};
use crate::domain::ports::{ConfigProvider, ValidationMode};
use crate::utils::error::{BedError, Result};
use crate::utils::validation::{
    validate_finite, validate_non_empty_string, validate_path, validate_positive_finite,
    validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub detector: DetectorSection,
    pub world: Option<WorldRect>,
    pub calibration: Option<CalibrationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorSection {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_crystal_vetoes")]
    pub crystal_vetoes: usize,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            crystal_vetoes: default_crystal_vetoes(),
        }
    }
}

fn default_name() -> String {
    "BED side view".to_string()
}

fn default_crystal_vetoes() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub directory: Option<String>,
    pub file: String,
    pub mode: Option<ValidationMode>,
}

impl DetectorConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| BedError::ConfigValidationError {
            field: "config_file".to_string(),
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BedError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BedError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("detector.name", &self.detector.name)?;
        validate_range(
            "detector.crystal_vetoes",
            self.detector.crystal_vetoes,
            1,
            MAX_CRYSTAL_VETOES,
        )?;

        if let Some(world) = &self.world {
            validate_finite("world.x", world.x)?;
            validate_finite("world.y", world.y)?;
            validate_positive_finite("world.width", world.width)?;
            validate_positive_finite("world.height", world.height)?;
        }

        if let Some(calibration) = &self.calibration {
            validate_path("calibration.file", &calibration.file)?;
            if let Some(directory) = &calibration.directory {
                validate_path("calibration.directory", directory)?;
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.detector.name
    }

    /// Replaces the calibration file, keeping the configured mode.
    pub fn set_calibration_file(&mut self, file: impl Into<String>) {
        let mode = self.calibration.as_ref().and_then(|c| c.mode);
        self.calibration = Some(CalibrationConfig {
            directory: None,
            file: file.into(),
            mode,
        });
    }

    pub fn set_validation_mode(&mut self, mode: ValidationMode) {
        if let Some(calibration) = &mut self.calibration {
            calibration.mode = Some(mode);
        }
    }
}

impl ConfigProvider for DetectorConfig {
    fn element_counts(&self) -> Result<ElementCounts> {
        ElementCounts::with_crystals(self.detector.crystal_vetoes)
    }

    fn world_bounds(&self) -> WorldRect {
        self.world.unwrap_or_default()
    }

    fn calibration_path(&self) -> Option<PathBuf> {
        self.calibration.as_ref().map(|c| match &c.directory {
            Some(directory) => Path::new(directory).join(&c.file),
            None => PathBuf::from(&c.file),
        })
    }

    fn validation_mode(&self) -> ValidationMode {
        self.calibration
            .as_ref()
            .and_then(|c| c.mode)
            .unwrap_or_default()
    }
}

impl Validate for DetectorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[detector]
name = "four crystal prototype"
crystal_vetoes = 4

[world]
x = 0.0
y = 0.0
width = 6.0
height = 6.0

[calibration]
directory = "/data/calib"
file = "bed.calib"
mode = "lookup_only"
"#;

        let config = DetectorConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.name(), "four crystal prototype");
        assert_eq!(config.element_counts().unwrap().total_vetoes(), 34);
        assert_eq!(config.world_bounds().width, 6.0);
        assert_eq!(
            config.calibration_path().unwrap(),
            Path::new("/data/calib").join("bed.calib")
        );
        assert_eq!(config.validation_mode(), ValidationMode::LookupOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = DetectorConfig::from_toml_str("").unwrap();
        assert_eq!(config.name(), "BED side view");
        assert_eq!(config.element_counts().unwrap(), ElementCounts::SINGLE_CRYSTAL);
        assert_eq!(config.world_bounds(), WorldRect::default());
        assert!(config.calibration_path().is_none());
        assert_eq!(config.validation_mode(), ValidationMode::Strict);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BED_TEST_CALIB_DIR", "/tmp/bed-calib");

        let toml_content = r#"
[calibration]
directory = "${BED_TEST_CALIB_DIR}"
file = "run42.calib"
"#;

        let config = DetectorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.calibration_path().unwrap(),
            Path::new("/tmp/bed-calib").join("run42.calib")
        );

        std::env::remove_var("BED_TEST_CALIB_DIR");
    }

    #[test]
    fn test_unset_env_var_is_left_verbatim() {
        let toml_content = r#"
[calibration]
file = "${BED_TEST_SURELY_UNSET_VARIABLE}"
"#;
        let config = DetectorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.calibration.unwrap().file,
            "${BED_TEST_SURELY_UNSET_VARIABLE}"
        );
    }

    #[test]
    fn test_config_validation() {
        let zero_width = r#"
[world]
x = 0.0
y = 0.0
width = 0.0
height = 3.0
"#;
        let config = DetectorConfig::from_toml_str(zero_width).unwrap();
        assert!(config.validate().is_err());

        let no_crystals = r#"
[detector]
crystal_vetoes = 0
"#;
        let config = DetectorConfig::from_toml_str(no_crystals).unwrap();
        assert!(config.validate().is_err());
        assert!(config.element_counts().is_err());

        let empty_file = r#"
[calibration]
file = ""
"#;
        let config = DetectorConfig::from_toml_str(empty_file).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DetectorConfig::from_toml_str("[detector\nname = 1").unwrap_err();
        assert!(matches!(err, BedError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_overrides_keep_mode() {
        let mut config = DetectorConfig::from_toml_str(
            r#"
[calibration]
directory = "/data"
file = "a.calib"
mode = "lookup_only"
"#,
        )
        .unwrap();

        config.set_calibration_file("/elsewhere/b.calib");
        assert_eq!(
            config.calibration_path().unwrap(),
            PathBuf::from("/elsewhere/b.calib")
        );
        assert_eq!(config.validation_mode(), ValidationMode::LookupOnly);

        config.set_validation_mode(ValidationMode::Strict);
        assert_eq!(config.validation_mode(), ValidationMode::Strict);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[detector]
name = "file-test"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = DetectorConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name(), "file-test");
    }
}
