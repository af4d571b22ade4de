// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Display};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use strum::{EnumString, IntoStaticStr};
use thiserror::Error;
use tracing::info;

use crate::project::ContentRecord;

const COLUMN_SEPARATOR: &str = " | ";

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML encoding failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Serialization format, its name doubles as the file extension
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// # Errors
/// Fails if `value` cannot be represented in `format`
pub fn encode<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String, EncodeError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

/// Text table with left aligned columns sized to their widest cell
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        Self {
            headers: headers.into_iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        self.rows
            .push(cells.into_iter().map(|c| c.to_string()).collect());
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn write_line<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, widths: &[usize], cells: &[S]) -> fmt::Result {
        for (i, &width) in widths.iter().enumerate() {
            if i > 0 {
                f.write_str(COLUMN_SEPARATOR)?;
            }
            let cell = cells.get(i).map_or("", AsRef::as_ref);
            write!(f, "{cell:<width$}")?;
        }
        writeln!(f)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        Self::write_line(f, &widths, &self.headers)?;
        let separator: Vec<String> = widths.iter().map(|w| ".".repeat(*w)).collect();
        Self::write_line(f, &widths, &separator)?;
        for row in &self.rows {
            Self::write_line(f, &widths, row)?;
        }
        Ok(())
    }
}

/// Label, name and URL of every record, ordered by label
#[must_use]
pub fn render_table(records: &[ContentRecord]) -> String {
    let mut sorted: Vec<&ContentRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.label().cmp(b.label()));

    let mut table = Table::new(["label", "Name", "URL"]);
    for record in sorted {
        table.push_row([record.label(), record.name(), record.url()]);
    }
    table.to_string()
}

/// Where the records end up; exactly one is chosen per run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// `{label}.{format}` per record in the directory
    MultiFile(PathBuf),
    /// All records in one file
    File(PathBuf),
    Table,
    Stdout,
}

impl RenderMode {
    /// Precedence: per-record files, single file, table, stdout
    #[must_use]
    pub fn select(multi_file: bool, output: Option<&Path>, table: bool, dest_dir: &Path) -> Self {
        if multi_file {
            Self::MultiFile(dest_dir.to_path_buf())
        } else if let Some(output) = output {
            Self::File(dest_dir.join(output))
        } else if table {
            Self::Table
        } else {
            Self::Stdout
        }
    }
}

/// Render `records` according to `mode`; console output goes to `out`
///
/// # Errors
/// Fails if encoding fails or an output file cannot be written
pub fn write_records<W: Write>(
    records: &[ContentRecord],
    mode: &RenderMode,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    match mode {
        RenderMode::MultiFile(dir) => {
            for record in records {
                let path = dir.join(format!("{}.{format}", record.label()));
                write_file(&path, &encode(record, format)?)?;
            }
            info!("wrote {} files to {}", records.len(), dir.display());
        }
        RenderMode::File(path) => {
            write_file(path, &encode(records, format)?)?;
            info!("wrote {} records to {}", records.len(), path.display());
        }
        RenderMode::Table => write!(out, "{}", render_table(records))?,
        RenderMode::Stdout => writeln!(out, "{}", encode(records, format)?)?,
    }
    Ok(())
}

fn write_file(path: &Path, data: &str) -> anyhow::Result<()> {
    fs::write(path, data).with_context(|| format!("cannot write {}", path.display()))
}
