// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use cert_parser::cli::{Cli, run};
use clap::Parser;
use tracing::debug;

fn main() -> anyhow::Result<()> {
    cert_parser::trace_init()?;

    let cli = Cli::parse();
    debug!("CLI is {cli:#?}");

    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}
