use bed_sideview::utils::logger::{self, LogFormat};
use bed_sideview::{CalibrationFile, CalibrationParser, CalibrationSource, ElementCounts};
use clap::Parser;

#[derive(Parser)]
#[command(name = "calib-check")]
#[command(about = "Strict-validate BED calibration files")]
struct Args {
    /// Calibration files to check
    #[arg(required = true)]
    files: Vec<String>,

    /// Number of crystal vetoes in the element universe
    #[arg(long, default_value = "1")]
    crystals: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    logger::init_logger(LogFormat::Compact, args.verbose);

    let counts = match ElementCounts::with_crystals(args.crystals) {
        Ok(counts) => counts,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };
    let parser = CalibrationParser::strict(counts);

    tracing::info!(
        "🔍 Checking {} file(s) against {} elements",
        args.files.len(),
        counts.total_elements()
    );

    let mut failed = 0;
    for path in &args.files {
        let file = CalibrationFile::new(path);
        match parser.validate(&file) {
            Ok(records) => println!("✅ {}: {} records valid", file.name(), records),
            Err(e) => {
                failed += 1;
                tracing::debug!("{} failed: {:?}", file.name(), e);
                println!("❌ {}: {}", file.name(), e);
            }
        }
    }

    if failed > 0 {
        eprintln!("❌ {} of {} file(s) failed validation", failed, args.files.len());
        std::process::exit(1);
    }
}
