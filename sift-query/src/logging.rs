//! Logging setup.
//!
//! The crates log through `tracing`. Nothing is printed unless a subscriber
//! is installed, either by the application or by [`init`] when the
//! `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `SIFT_DEBUG=true` (or `1`, `yes`) - Enable debug logging
//! - `SIFT_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `SIFT_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use sift_query::logging;
//!
//! // Call once at startup
//! logging::init();
//! ```
//!
//! Inside the crates:
//!
//! - `debug!` for lowered SQL and statement submission
//! - `trace!` for per-row streaming and absent-value comparisons

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "SIFT_DEBUG";
const LEVEL_VAR: &str = "SIFT_LOG_LEVEL";
const FORMAT_VAR: &str = "SIFT_LOG_FORMAT";

/// Check if `SIFT_DEBUG` is set to `true`, `1` or `yes` (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The log level from `SIFT_LOG_LEVEL`.
///
/// Unknown or missing values fall back to `debug` when `SIFT_DEBUG` is on,
/// `warn` otherwise.
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var(LEVEL_VAR) {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The output format from `SIFT_LOG_FORMAT`. Defaults to `json`.
pub fn get_log_format() -> &'static str {
    env::var(FORMAT_VAR)
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Directive string for the crates of this workspace at `level`.
pub fn filter_directive(level: &str) -> String {
    format!("sift={level},sift_query={level},sift_sqlite={level}")
}

/// Install a global subscriber as configured by the environment.
///
/// Does nothing unless `SIFT_DEBUG` or `SIFT_LOG_LEVEL` is set, or when
/// built without the `tracing-subscriber` feature. Later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(filter_directive(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            // try_init: the application may already own the global subscriber.
            let installed = match get_log_format() {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level = level, format = get_log_format(), "Sift logging initialized");
            }
        }
    });
}

/// Set `SIFT_LOG_LEVEL` and call [`init`].
///
/// # Safety
///
/// Modifies the process environment. Call at startup, before spawning
/// threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only, before other threads exist.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Set `SIFT_DEBUG=true` and call [`init`].
///
/// # Safety
///
/// Modifies the process environment. Call at startup, before spawning
/// threads.
pub fn init_debug() {
    // SAFETY: documented as startup-only, before other threads exist.
    unsafe {
        env::set_var(DEBUG_VAR, "true");
    }
    init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        // SAFETY: no other test in this crate touches these variables.
        unsafe {
            env::remove_var(DEBUG_VAR);
            env::remove_var(LEVEL_VAR);
            env::remove_var(FORMAT_VAR);
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
        assert_eq!(get_log_format(), "json");
    }

    #[test]
    fn test_filter_directive() {
        assert_eq!(
            filter_directive("trace"),
            "sift=trace,sift_query=trace,sift_sqlite=trace"
        );
    }
}
