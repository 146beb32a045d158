// src/io/writer.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::processing::{IndexOutput, OutputStatus};
use crate::utils::citation::Citation;

#[derive(Serialize)]
struct OutputFile<'a> {
    version: &'static str,
    outputs: Vec<OutputRecord<'a>>,
    citations: Vec<CitationRecord>,
}

#[derive(Serialize)]
struct OutputRecord<'a> {
    name: &'a str,
    #[serde(flatten)]
    status: &'a OutputStatus,
    nodata: i16,
    series: Vec<Vec<i16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rms: Option<Vec<Vec<i16>>>,
}

#[derive(Serialize)]
struct CitationRecord {
    algorithm: Citation,
    reference: &'static str,
}

/// Write computed series as JSON, `[date][cell]` per index, followed by the
/// references of every algorithm used.
pub fn write_outputs(
    outputs: &[IndexOutput],
    citations: &[Citation],
    output_path: &Path,
) -> Result<()> {
    let file = OutputFile {
        version: crate::VERSION,
        outputs: outputs
            .iter()
            .map(|o| OutputRecord {
                name: &o.name,
                status: &o.status,
                nodata: o.series.nodata(),
                series: o.series.to_rows(),
                rms: o.rms.as_ref().map(|r| r.to_rows()),
            })
            .collect(),
        citations: citations
            .iter()
            .map(|&c| CitationRecord {
                algorithm: c,
                reference: c.reference(),
            })
            .collect(),
    };

    let writer = BufWriter::new(
        File::create(output_path)
            .with_context(|| format!("failed to create {}", output_path.display()))?,
    );
    serde_json::to_writer_pretty(writer, &file)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    Ok(())
}
