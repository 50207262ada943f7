// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log level selection and subscriber setup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "LOGLEVEL";

/// Level used when `LOGLEVEL` is unset or unrecognized.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

/// Parse `TRACE`, `DEBUG`, `INFO`, `WARN`, `ERROR` or `FATAL`
/// (case-insensitive). `FATAL` maps to `ERROR`.
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::TRACE),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "INFO" => Some(LevelFilter::INFO),
        "WARN" => Some(LevelFilter::WARN),
        "ERROR" | "FATAL" => Some(LevelFilter::ERROR),
        _ => None,
    }
}

/// Level from `LOGLEVEL`, falling back to [`DEFAULT_LEVEL`].
pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(DEFAULT_LEVEL)
}

/// Install the global fmt subscriber on stderr.
///
/// stdout is reserved for Line Protocol output.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::default().add_directive(level.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
