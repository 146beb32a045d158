// src/io/reader.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::processing::unmixing::EndmemberTable;
use crate::stack::{Frame, ReflectanceStack};

#[derive(Deserialize)]
struct StackFile {
    frames: Vec<FrameFile>,
    #[serde(default)]
    mask: Option<Vec<bool>>,
}

#[derive(Deserialize)]
struct FrameFile {
    bands: Vec<Vec<i16>>,
    #[serde(default)]
    valid: Option<Vec<bool>>,
}

/// Parse a whitespace-separated numeric table, one row per line. Blank lines
/// and lines starting with `#` are skipped.
pub fn parse_table(content: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .with_context(|| format!("line {}: invalid number {:?}", line_no + 1, token))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(first) = rows.first().map(Vec::len) {
            if row.len() != first {
                bail!(
                    "line {}: expected {} columns, found {}",
                    line_no + 1,
                    first,
                    row.len()
                );
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read table {}", path.display()))?;
    parse_table(&content).with_context(|| format!("failed to parse table {}", path.display()))
}

/// Read an endmember table (one row per band, one column per material) and
/// divide it by `scale` to get reflectance in [0, 1].
pub fn read_endmember<P: AsRef<Path>>(path: P, scale: f64) -> Result<EndmemberTable> {
    let rows: Vec<Vec<f64>> = read_table(&path)?
        .into_iter()
        .map(|row| row.into_iter().map(|v| v / scale).collect())
        .collect();
    let table = EndmemberTable::from_rows(rows)
        .with_context(|| format!("invalid endmember table {}", path.as_ref().display()))?;

    log::debug!(
        "Read {} endmembers with {} bands from {}",
        table.n_materials(),
        table.n_bands(),
        path.as_ref().display()
    );
    Ok(table)
}

/// Read a JSON reflectance stack and its optional spatial mask.
///
/// Frames without a `valid` array are treated as valid everywhere.
pub fn read_stack<P: AsRef<Path>>(path: P) -> Result<(ReflectanceStack, Option<Vec<bool>>)> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read stack {}", path.display()))?;
    let file: StackFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse stack {}", path.display()))?;

    let frames = file
        .frames
        .into_iter()
        .map(|f| match f.valid {
            Some(valid) => Frame::new(f.bands, valid),
            None => Frame::all_valid(f.bands),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let stack = ReflectanceStack::new(frames)?;
    stack.check_mask(file.mask.as_deref())?;

    log::info!(
        "Read stack with {} dates, {} bands, {} cells from {}",
        stack.n_dates(),
        stack.n_bands(),
        stack.n_cells(),
        path.display()
    );
    Ok((stack, file.mask))
}
