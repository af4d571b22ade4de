// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;

pub mod aggregate;
pub mod cli;
pub mod filter;
pub mod pipeline;
pub mod project;
pub mod render;


/// Init logging
///
/// Logs go to stderr, stdout is reserved for rendered output.
///
/// # Errors
///
/// Will return `Err` if failed to initialize logging
pub fn trace_init() -> anyhow::Result<()> {
    use tracing::Level;
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

    let env_filter =
        EnvFilter::try_from_env("CERT_PARSER_LOG").unwrap_or_else(|_| EnvFilter::from("warn"));
    let is_debug_log_level = env_filter
        .max_level_hint()
        .map_or_else(|| false, |level| level >= Level::DEBUG);

    let output = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(is_debug_log_level)
        .with_file(is_debug_log_level)
        .with_line_number(is_debug_log_level);

    let output = if is_debug_log_level {
        output.pretty().boxed()
    } else {
        output.boxed()
    };

    let subscriber = tracing_subscriber::registry().with(output.with_filter(env_filter));

    tracing::subscriber::set_global_default(subscriber)
        .context("tracing shouldn't already have been set up")?;
    Ok(())
}
