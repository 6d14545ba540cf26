//! Logging bootstrap
//!
//! Everything logs through the `log` facade; binaries install `env_logger`
//! once at startup. `sqlx` statement logs flow through the same facade.

/// Installs the global logger with `filter` (an `env_logger` filter string).
/// A second call is a no-op.
pub fn init(filter: &str) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log::LevelFilter::Info)
        .parse_filters(filter)
        .format_timestamp_millis();
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
