// src/batch.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::{read_endmember, read_stack, write_outputs};
use crate::processing::{IndexDispatcher, IndexRequest, OutputStatus, ParallelProcessor, SmaParams};
use crate::stack::BandConfig;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub sensor: SensorConfig,
    pub stack: PathBuf,
    #[serde(default)]
    pub endmember: Option<EndmemberParams>,
    #[serde(default)]
    pub sma: SmaParams,
    pub indices: Vec<String>,
    pub output: PathBuf,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    #[serde(default = "default_nodata")]
    pub nodata: i16,
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            nodata: default_nodata(),
            threads: None,
        }
    }
}

/// Either a preset name ("sentinel2", "landsat") or an explicit mapping.
#[derive(Deserialize, Serialize, Debug)]
#[serde(untagged)]
pub enum SensorConfig {
    Preset(String),
    Bands(BandConfig),
}

#[derive(Deserialize, Serialize, Debug)]
pub struct EndmemberParams {
    pub path: PathBuf,
    /// Divisor that turns the file's values into reflectance
    #[serde(default = "default_endmember_scale")]
    pub scale: f64,
}

fn default_nodata() -> i16 {
    -9999
}

fn default_endmember_scale() -> f64 {
    10000.0
}

impl BatchConfig {
    pub fn from_path(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: BatchConfig = serde_json::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        // paths are relative to the configuration file
        if let Some(base) = config_path.parent() {
            config.stack = base.join(&config.stack);
            config.output = base.join(&config.output);
            if let Some(endmember) = config.endmember.as_mut() {
                endmember.path = base.join(&endmember.path);
            }
        }

        Ok(config)
    }

    pub fn band_config(&self) -> Result<BandConfig> {
        match &self.sensor {
            SensorConfig::Preset(name) => {
                BandConfig::preset(name).ok_or_else(|| anyhow!("Unknown sensor preset: {}", name))
            }
            SensorConfig::Bands(bands) => Ok(bands.clone()),
        }
    }

    pub fn request(&self) -> IndexRequest {
        IndexRequest {
            indices: self.indices.clone(),
            sma: self.sma,
            nodata: self.global.nodata,
        }
    }
}

/// Run the job described by a JSON configuration file.
/// `threads` overrides the configured worker count.
pub fn process_batch(config_path: &Path, threads: Option<usize>) -> Result<()> {
    let config = BatchConfig::from_path(config_path)?;
    let bands = config.band_config()?;

    let (stack, mask) = read_stack(&config.stack)?;
    let endmember = config
        .endmember
        .as_ref()
        .map(|e| read_endmember(&e.path, e.scale))
        .transpose()?;

    let processor = ParallelProcessor::new(threads.or(config.global.threads))?;
    log::info!(
        "Starting batch with {} indices on {} threads...",
        config.indices.len(),
        processor.threads()
    );

    let dispatcher = IndexDispatcher::new(processor, bands);
    let outputs = dispatcher
        .compute(&config.request(), &stack, mask.as_deref(), endmember.as_ref())
        .context("index computation failed")?;

    for (i, output) in outputs.iter().enumerate() {
        match &output.status {
            OutputStatus::Computed => {
                log::info!("[{}/{}] {} computed", i + 1, outputs.len(), output.name)
            }
            OutputStatus::Skipped { reason } => log::warn!(
                "[{}/{}] {} skipped: {}",
                i + 1,
                outputs.len(),
                output.name,
                reason
            ),
        }
    }

    write_outputs(&outputs, &dispatcher.citations().cited(), &config.output)?;

    log::info!("Batch processing complete: {}", config.output.display());
    Ok(())
}
