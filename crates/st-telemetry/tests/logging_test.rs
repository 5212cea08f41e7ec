use st_core::config::GeneralConfig;
use st_telemetry::logging;

#[test]
fn test_init_logging_human() {
    // Should not panic; second call is a safe no-op.
    logging::init_logging("test-service", "debug");
    logging::init_logging("test-service", "info");

    tracing::info!(key = "value", "human-readable log line");
}

#[test]
fn test_init_logging_json() {
    // The global subscriber is already set by whichever test ran first, so
    // this silently no-ops.
    logging::init_logging_json("test-service-json", "info");

    tracing::info!(key = "value", "json log line");
}

#[test]
fn test_init_from_config_both_formats() {
    let mut general = GeneralConfig::default();
    logging::init_from_config("cfg-test", &general, false);
    general.log_format = "json".into();
    logging::init_from_config("cfg-test", &general, true);
}
