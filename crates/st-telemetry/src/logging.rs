use st_core::config::GeneralConfig;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Human,
    Json,
}

/// Install the global subscriber on stderr so stdout stays free for command
/// output. `RUST_LOG` wins over `default_level`; a second call is a no-op.
fn install(service_name: &str, default_level: &str, format: Format) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    let installed = match format {
        Format::Human => builder.try_init(),
        Format::Json => builder.json().try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(service = service_name, ?format, "logging initialised");
    }
}

/// Human-readable output, e.g. `init_logging("shadertime", "st_monitor=debug,warn")`.
pub fn init_logging(service_name: &str, default_level: &str) {
    install(service_name, default_level, Format::Human);
}

/// One JSON object per event.
pub fn init_logging_json(service_name: &str, default_level: &str) {
    install(service_name, default_level, Format::Json);
}

/// Pick the format and level from the `[general]` config section.
/// `verbose` forces the `debug` level when `RUST_LOG` is unset.
pub fn init_from_config(service_name: &str, general: &GeneralConfig, verbose: bool) {
    let level = if verbose { "debug" } else { general.log_level.as_str() };
    if general.log_format == "json" {
        init_logging_json(service_name, level);
    } else {
        init_logging(service_name, level);
    }
}
