// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser};
use tracing::warn;

use crate::aggregate::{distinct_product_names, distinct_tags};
use crate::filter::{FilterError, FilterKey, FilterSpec};
use crate::pipeline::Pipeline;
use crate::project::{DEFAULT_CDN, Projector};
use crate::render::{OutputFormat, RenderMode, write_records};

#[derive(Debug, Parser)]
#[command(
    name = "cert-parser",
    about = "Processes Red Hat entitlement certificates and manifests and produces output for creating remotes in pulp",
    version
)]
pub struct Cli {
    /// Entitlement certificate, or a manifest zip file whose certificates are
    /// extracted into the certificates directory. Can be given multiple times
    #[arg(required = true)]
    pub inputfile: Vec<PathBuf>,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Filters are additive (see `--any`), so all given filters must match
#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "Filtering options")]
pub struct FilterArgs {
    /// Show products with the given tag (glob)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Show products with the given architecture (glob)
    #[arg(short, long)]
    pub arch: Option<String>,

    /// Show products matching the given label (glob)
    #[arg(short, long)]
    pub label: Option<String>,

    /// Show products matching the given product name (glob)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Show debug RPM repositories
    #[arg(long)]
    pub debug: bool,

    /// Show source repositories
    #[arg(long)]
    pub source: bool,

    /// Show ISO repositories
    #[arg(long)]
    pub iso: bool,

    /// Match any of the filters, rather than all. This will probably lead to many more results
    #[arg(long)]
    pub any: bool,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Output options")]
pub struct OutputArgs {
    /// List all tags and exit
    #[arg(long)]
    pub list_tags: bool,

    /// Just list product names and exit
    #[arg(long)]
    pub list_products: bool,

    /// Produce output in YAML
    #[arg(short, long, overrides_with = "json")]
    pub yaml: bool,

    /// Produce output in JSON (default)
    #[arg(short, long, overrides_with = "yaml")]
    pub json: bool,

    /// Output file, relative to the destination directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target directory for output files, created if missing. Default is CWD
    #[arg(short, long, env = "CERT_PARSER_DESTDIR")]
    pub destdir: Option<PathBuf>,

    /// Output directory for certificates extracted from a manifest
    #[arg(short, long, env = "CERT_PARSER_CERTS_DIR", default_value = "files")]
    pub certs_dir: PathBuf,

    /// Create an output file for each product, --output is ignored in this case
    #[arg(short, long)]
    pub multi_file: bool,

    /// Print a formatted table of matching repositories
    #[arg(long)]
    pub table: bool,

    /// Release to substitute for `$releasever` in URLs (e.g. 8.4)
    #[arg(short, long, env = "CERT_PARSER_RELEASEVER")]
    pub releasever: Option<String>,

    /// CDN the content paths are relative to
    #[arg(long, env = "CERT_PARSER_CDN", default_value = DEFAULT_CDN)]
    pub cdn: String,
}

impl FilterArgs {
    /// Only the filters given on the command line constrain the result
    ///
    /// # Errors
    /// Fails on an invalid glob pattern
    pub fn to_spec(&self) -> Result<FilterSpec, FilterError> {
        let mut spec = FilterSpec::new();
        for (key, pattern) in [
            (FilterKey::Label, &self.label),
            (FilterKey::Name, &self.name),
            (FilterKey::Arches, &self.arch),
            (FilterKey::RequiredTags, &self.tag),
        ] {
            if let Some(pattern) = pattern {
                spec = spec.with_glob(key, pattern)?;
            }
        }
        for (key, enabled) in [
            (FilterKey::Isos, self.iso),
            (FilterKey::Debug, self.debug),
            (FilterKey::Source, self.source),
        ] {
            if enabled {
                spec = spec.with_flag(key, true);
            }
        }
        Ok(spec)
    }

    #[must_use]
    pub fn match_all(&self) -> bool {
        !self.any
    }
}

impl OutputArgs {
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        if self.yaml {
            OutputFormat::Yaml
        } else {
            OutputFormat::Json
        }
    }
}

/// Load, filter and render; console output goes to `out`
///
/// # Errors
/// Fails on invalid filters, unreadable inputs or failed output
pub fn run<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<()> {
    let spec = cli.filters.to_spec()?;
    let format = cli.output.format();
    let projector = Projector::new(cli.output.cdn).with_releasever(cli.output.releasever);
    let pipeline = Pipeline::new(spec, cli.filters.match_all(), projector, cli.output.certs_dir);
    let records = pipeline.run(&cli.inputfile)?;

    if cli.output.list_tags {
        return write_listing(out, "tags:", &distinct_tags(&records));
    }
    if cli.output.list_products {
        return write_listing(out, "Products:", &distinct_product_names(&records));
    }

    let dest_dir = prepare_destdir(cli.output.destdir.as_deref())?;
    let mode = RenderMode::select(
        cli.output.multi_file,
        cli.output.output.as_deref(),
        cli.output.table,
        &dest_dir,
    );
    write_records(&records, &mode, format, out)
}

fn write_listing<W: Write>(out: &mut W, header: &str, items: &BTreeSet<String>) -> anyhow::Result<()> {
    writeln!(out, "{header}")?;
    for item in items {
        writeln!(out, "{item}")?;
    }
    Ok(())
}

/// Destination directory, created on demand; falls back to CWD if that fails
///
/// # Errors
/// Fails only if the current directory cannot be determined
pub fn prepare_destdir(destdir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let Some(dir) = destdir else {
        return Ok(cwd);
    };
    if dir.is_dir() {
        return Ok(dir.to_path_buf());
    }
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(dir.to_path_buf()),
        Err(e) => {
            warn!("cannot create {} - {e}, falling back to CWD", dir.display());
            Ok(cwd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> anyhow::Result<Cli> {
        Ok(Cli::try_parse_from(
            std::iter::once("cert-parser").chain(args.iter().copied()),
        )?)
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let cli = parse(&["1.pem"])?;
        assert_eq!(cli.inputfile, [PathBuf::from("1.pem")]);
        assert!(cli.filters.match_all());
        assert!(cli.filters.to_spec()?.is_empty());
        assert_eq!(cli.output.format(), OutputFormat::Json);
        assert_eq!(cli.output.cdn, DEFAULT_CDN);
        assert_eq!(cli.output.certs_dir, PathBuf::from("files"));
        Ok(())
    }

    #[test]
    fn requires_input() {
        assert!(parse(&["--table"]).is_err());
    }

    #[test]
    fn filters_in_evaluation_order() -> anyhow::Result<()> {
        let cli = parse(&[
            "-t", "rhel-8", "--any", "--debug", "-n", "Red Hat*", "-a", "x86_64", "a.pem", "b.zip",
        ])?;
        assert!(!cli.filters.match_all());
        let keys: Vec<FilterKey> = cli.filters.to_spec()?.pairs().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                FilterKey::Name,
                FilterKey::Arches,
                FilterKey::RequiredTags,
                FilterKey::Debug
            ]
        );
        assert_eq!(cli.inputfile.len(), 2);
        Ok(())
    }

    #[test]
    fn last_format_wins() -> anyhow::Result<()> {
        assert_eq!(parse(&["-y", "a.pem"])?.output.format(), OutputFormat::Yaml);
        assert_eq!(parse(&["-y", "-j", "a.pem"])?.output.format(), OutputFormat::Json);
        assert_eq!(parse(&["-j", "-y", "a.pem"])?.output.format(), OutputFormat::Yaml);
        Ok(())
    }

    #[test]
    fn invalid_glob_is_reported() -> anyhow::Result<()> {
        let cli = parse(&["-l", "rhel-[9-8]", "a.pem"])?;
        assert!(cli.filters.to_spec().is_err());
        Ok(())
    }

    #[test]
    fn destdir_is_created() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("out/nested");
        assert_eq!(prepare_destdir(Some(target.as_path()))?, target);
        assert!(target.is_dir());
        Ok(())
    }

    #[test]
    fn destdir_falls_back_to_cwd() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("file");
        fs::write(&blocker, "")?;
        let resolved = prepare_destdir(Some(blocker.join("sub").as_path()))?;
        assert_eq!(resolved, std::env::current_dir()?);
        assert_eq!(prepare_destdir(None)?, std::env::current_dir()?);
        Ok(())
    }
}
