// Tracing subscriber initialization.
//
// Logs go to stderr so stdout only ever carries command output.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter when debug is off.
pub const LOG_ENV: &str = "FLIGHT_CU_LOG";

/// Filter used for a run: `debug` when the debug flag is set, otherwise
/// `FLIGHT_CU_LOG`, defaulting to `warn`.
pub fn filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(debug))
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
