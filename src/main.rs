use bed_sideview::app::report::{render_calibrations, render_layout};
use bed_sideview::config::Command;
use bed_sideview::utils::logger::{self, LogFormat};
use bed_sideview::utils::validation::Validate;
use bed_sideview::{
    BedError, CalibrationFile, CalibrationSource, CliConfig, ConfigProvider, DetectorConfig,
    DetectorRegistry, ElementTag, Result, WorldPoint,
};
use clap::Parser;

fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_logger(LogFormat::Json, cli.verbose);
    } else {
        logger::init_logger(LogFormat::Compact, cli.verbose);
    }

    tracing::info!("🚀 Starting bed-sideview");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    match run(&cli) {
        Ok(0) => tracing::info!("✅ Done"),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ bed-sideview failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

fn run(cli: &CliConfig) -> Result<i32> {
    let config = cli.detector_config()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    let registry = DetectorRegistry::from_config(&config)?;

    match &cli.command {
        Command::Layout { format } => {
            print!("{}", render_layout(registry.layout(), *format)?);
        }
        Command::Locate { x, y } => {
            let point = WorldPoint::new(*x, *y);
            for line in registry.feedback(point) {
                println!("{}", line);
            }
            if registry.locate(point).is_none() {
                tracing::warn!("no element contains ({}, {})", x, y);
                return Ok(1);
            }
        }
        Command::Validate => {
            let source = required_source(&registry)?;
            let records = registry.parser().validate(source)?;
            println!("✅ {}: {} records valid", source.name(), records);
        }
        Command::Show { tag } => {
            let tag: ElementTag = tag.parse()?;
            if let Some(element) = registry.element(&tag) {
                let rect = element.region().rect;
                println!(
                    "{} {} at ({:.4}, {:.4}) size {:.4} x {:.4}",
                    tag.kind(),
                    tag,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height
                );
            }
            for line in registry.calibration(&tag)?.describe() {
                println!("  {}", line);
            }
        }
        Command::Dump { format } => {
            let source = required_source(&registry)?;
            let records = registry.parser().load_all(source)?;
            print!("{}", render_calibrations(&records, *format)?);
        }
        Command::Summary => display_config_summary(&config, &registry)?,
    }

    Ok(0)
}

fn required_source(registry: &DetectorRegistry<CalibrationFile>) -> Result<&CalibrationFile> {
    registry.source().ok_or_else(|| BedError::MissingConfigError {
        field: "calibration.file".to_string(),
    })
}

fn display_config_summary(
    config: &DetectorConfig,
    registry: &DetectorRegistry<CalibrationFile>,
) -> Result<()> {
    let counts = config.element_counts()?;
    let bounds = config.world_bounds();

    println!("📋 Configuration Summary:");
    println!("  Detector: {}", config.name());
    println!(
        "  World: ({}, {}) {} x {}",
        bounds.x, bounds.y, bounds.width, bounds.height
    );
    println!(
        "  Elements: {} bars, {} vetoes ({} crystal, {} internal, {} external)",
        counts.bars(),
        counts.total_vetoes(),
        counts.crystal_vetoes(),
        counts.internal_vetoes(),
        counts.external_vetoes()
    );

    match registry.source() {
        Some(source) => {
            println!("  Calibration: {}", source.name());
            println!("  Mode: {:?}", config.validation_mode());
        }
        None => println!("  Calibration: none"),
    }

    println!();
    Ok(())
}
