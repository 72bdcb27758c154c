use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    /// JSON lines for log collectors.
    Json,
}

fn default_directives(format: LogFormat, verbose: bool) -> &'static str {
    match (format, verbose) {
        (_, true) => "bed_sideview=debug,calib_check=debug,info",
        (LogFormat::Compact, false) => "bed_sideview=warn,calib_check=warn",
        (LogFormat::Json, false) => "bed_sideview=info,calib_check=info",
    }
}

/// Installs the global subscriber on stderr; stdout stays reserved for command results.
/// `RUST_LOG` takes precedence over the verbosity default.
pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(format, verbose)));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Compact => Box::new(layer.compact()),
        LogFormat::Json => Box::new(layer.json()),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();
}
