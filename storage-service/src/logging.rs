// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingLevel;

const CRATES: [&str; 3] = ["storage_linkd", "storage_links", "storage_udisks"];

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(level: LoggingLevel) -> String {
    let mut directives: Vec<String> = CRATES
        .iter()
        .map(|name| format!("{name}={}", level.as_directive()))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Log to stderr; stdout carries the event lines.
pub fn init(level: LoggingLevel) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives(level))),
        )
        .with_writer(std::io::stderr)
        .init();
}
