//! Process-wide logging setup shared by every binary.

pub mod logging;

pub use logging::LogFormat;

/// Initialize structured logging from the environment.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}
