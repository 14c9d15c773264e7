//! Report persistence and printing.
//!
//! Supports pretty JSON (optionally gzip-compressed) and CSV export of
//! curve points.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::AlignedPoint;

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty JSON to `path`, creating parent directories.
///
/// With `gzip`, the output is compressed and `.gz` is appended to the path
/// unless already present. Returns the path written.
pub fn write_json(path: &str, value: &impl Serialize, gzip: bool) -> Result<PathBuf> {
    let path = if gzip && !path.ends_with(".gz") {
        PathBuf::from(format!("{path}.gz"))
    } else {
        PathBuf::from(path)
    };
    create_parent(&path)?;

    let body = serde_json::to_vec_pretty(value)?;
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    if gzip {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&body)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        writer.write_all(&body)?;
        writer.flush()?;
    }

    debug!(path = %path.display(), bytes = body.len(), gzip, "JSON written");
    Ok(path)
}

/// Writes curve points as CSV with a header row, replacing any existing file.
pub fn write_points_csv(path: &str, points: &[AlignedPoint]) -> Result<()> {
    create_parent(Path::new(path))?;

    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;

    debug!(path, rows = points.len(), "Points CSV written");
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
