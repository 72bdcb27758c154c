pub mod toml_config;

#[cfg(feature = "cli")]
use crate::app::report::OutputFormat;
#[cfg(feature = "cli")]
use crate::domain::ports::ValidationMode;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, validate_range, Validate};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use toml_config::DetectorConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bed-sideview")]
#[command(about = "Side-view geometry and calibration lookup for the BED detector")]
pub struct CliConfig {
    /// Path to a TOML detector configuration
    #[arg(short, long)]
    pub config: Option<String>,

    /// Calibration file, overriding the configured one
    #[arg(long)]
    pub calibration: Option<String>,

    /// Number of crystal vetoes, overriding the configured count
    #[arg(long)]
    pub crystals: Option<usize>,

    /// Skip full-file validation and only look up the requested record
    #[arg(long)]
    pub lookup_only: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print every element region
    Layout {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Report the element under a world point
    Locate { x: f64, y: f64 },
    /// Validate the calibration file against the element universe
    Validate,
    /// Print one element and its calibration record
    Show { tag: String },
    /// Print every calibration record
    Dump {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Print the effective configuration
    Summary,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML configuration (or defaults) and applies command-line overrides.
    pub fn detector_config(&self) -> Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::from_file(path)?,
            None => DetectorConfig::default(),
        };

        if let Some(crystals) = self.crystals {
            config.detector.crystal_vetoes = crystals;
            tracing::info!("🔧 Crystal vetoes overridden to: {}", crystals);
        }
        if let Some(file) = &self.calibration {
            config.set_calibration_file(file.as_str());
            tracing::info!("🔧 Calibration file overridden to: {}", file);
        }
        if self.lookup_only {
            config.set_validation_mode(ValidationMode::LookupOnly);
            tracing::info!("🔧 Validation mode overridden to: lookup_only");
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validate_path("config", path)?;
        }
        if let Some(path) = &self.calibration {
            validate_path("calibration", path)?;
        }
        if let Some(crystals) = self.crystals {
            validate_range(
                "crystals",
                crystals,
                1,
                crate::domain::model::MAX_CRYSTAL_VETOES,
            )?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_locate_command() {
        let cli = CliConfig::try_parse_from(["bed-sideview", "--crystals", "4", "locate", "1.5", "1.5"])
            .unwrap();
        assert_eq!(cli.crystals, Some(4));
        assert!(matches!(cli.command, Command::Locate { x, y } if x == 1.5 && y == 1.5));
    }

    #[test]
    fn test_layout_format_defaults_to_table() {
        let cli = CliConfig::try_parse_from(["bed-sideview", "layout"]).unwrap();
        assert!(matches!(cli.command, Command::Layout { format: OutputFormat::Table }));

        let cli = CliConfig::try_parse_from(["bed-sideview", "dump", "--format", "csv"]).unwrap();
        assert!(matches!(cli.command, Command::Dump { format: OutputFormat::Csv }));
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[detector]
crystal_vetoes = 1

[calibration]
file = "from-config.calib"
"#,
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = CliConfig::try_parse_from([
            "bed-sideview",
            "--config",
            path.as_str(),
            "--crystals",
            "4",
            "--calibration",
            "override.calib",
            "--lookup-only",
            "validate",
        ])
        .unwrap();

        let config = cli.detector_config().unwrap();
        assert_eq!(config.element_counts().unwrap().crystal_vetoes(), 4);
        assert_eq!(
            config.calibration_path().unwrap(),
            std::path::PathBuf::from("override.calib")
        );
        assert_eq!(config.validation_mode(), ValidationMode::LookupOnly);
    }

    #[test]
    fn test_out_of_range_crystals_rejected() {
        let cli = CliConfig::try_parse_from(["bed-sideview", "--crystals", "12", "summary"]).unwrap();
        assert!(cli.validate().is_err());
        assert!(cli.detector_config().is_err());
    }
}
