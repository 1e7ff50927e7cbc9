use log::LevelFilter;

/// Install an `env_logger` at info level for training binaries. `RUST_LOG` overrides the level.
///
/// Calling it again is harmless; only the first logger wins.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

/// Debug-level logger captured by the test harness.
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .parse_default_env()
        .try_init();
}
