// src/processing/dispatch.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::processing::indices::{
    BandCopy, ContinuumRemoval, KernelizedNDI, NormalizedRatio, RatioMinusOne, Resistance,
    ResistanceIndex, TasseledCap, TasseledCapComponent, NDI,
};
use crate::processing::parallel::{IndexCalculator, ParallelProcessor};
use crate::processing::unmixing::{EndmemberTable, SmaParams, Unmixer};
use crate::stack::{Band, BandConfig, ReflectanceStack, TimeSeries};
use crate::utils::citation::{Citation, CitationLog};

/// Every index the dispatcher knows. The discriminant is the position of the
/// index in [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    Blue,
    Green,
    Red,
    Nir,
    Swir0,
    Swir1,
    Swir2,
    RedEdge1,
    RedEdge2,
    RedEdge3,
    BroadNir,
    Vv,
    Vh,
    Ndvi,
    Evi,
    Nbr,
    Arvi,
    Savi,
    Sarvi,
    TcBrightness,
    TcGreenness,
    TcWetness,
    TcDisturbance,
    Ndbi,
    Ndwi,
    Mndwi,
    Ndsi,
    Ndti,
    Ndmi,
    Kndvi,
    Ndre1,
    Ndre2,
    CiRedEdge,
    NdviRedEdge1,
    NdviRedEdge2,
    NdviRedEdge3,
    NdviRedEdge1Narrow,
    NdviRedEdge2Narrow,
    NdviRedEdge3Narrow,
    MsrRedEdge,
    MsrRedEdgeNarrow,
    Cci,
    Evi2,
    ContinuumRemovedSwir1,
    Sma,
}

impl IndexKind {
    pub fn entry(self) -> &'static IndexEntry {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn all() -> impl Iterator<Item = IndexKind> {
        CATALOG.iter().map(|e| e.kind)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        CATALOG
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(s))
            .map(|e| e.kind)
            .ok_or_else(|| IndexError::UnknownIndex(s.to_string()))
    }
}

/// A resolved index, ready to run.
pub enum Kernel {
    Elementwise(Box<dyn IndexCalculator>),
    Unmixing,
}

impl Kernel {
    fn elementwise<I: IndexCalculator + 'static>(calculator: I) -> Result<Self> {
        Ok(Kernel::Elementwise(Box::new(calculator)))
    }
}

type Builder = fn(&[usize], &BandConfig, &'static str) -> Result<Kernel>;

/// One row of the index catalog.
pub struct IndexEntry {
    pub kind: IndexKind,
    pub name: &'static str,
    pub family: &'static str,
    pub bands: &'static [Band],
    pub citation: Option<Citation>,
    build: Builder,
}

impl IndexEntry {
    /// Resolve the entry's bands against `config` and build its kernel.
    pub fn kernel(&self, config: &BandConfig) -> Result<Kernel> {
        let mut indices = Vec::with_capacity(self.bands.len());
        for &band in self.bands {
            let index = config.get(band).ok_or(IndexError::MissingBand {
                index: self.name,
                band,
            })?;
            indices.push(index);
        }
        (self.build)(&indices, config, self.name)
    }
}

fn band_copy(b: &[usize], _: &BandConfig, name: &'static str) -> Result<Kernel> {
    Kernel::elementwise(BandCopy::new(b[0], Some(name.to_string())))
}

fn normalized_difference(b: &[usize], _: &BandConfig, name: &'static str) -> Result<Kernel> {
    Kernel::elementwise(NDI::new(b[0], b[1], Some(name.to_string())))
}

fn kernelized(b: &[usize], _: &BandConfig, name: &'static str) -> Result<Kernel> {
    Kernel::elementwise(KernelizedNDI::new(b[0], b[1], Some(name.to_string())))
}

fn ratio_minus_one(b: &[usize], _: &BandConfig, name: &'static str) -> Result<Kernel> {
    Kernel::elementwise(RatioMinusOne::new(b[0], b[1], Some(name.to_string())))
}

fn normalized_ratio(b: &[usize], _: &BandConfig, name: &'static str) -> Result<Kernel> {
    Kernel::elementwise(NormalizedRatio::new(b[0], b[1], Some(name.to_string())))
}

fn resistance(b: &[usize], coefficients: Resistance, name: &'static str) -> Result<Kernel> {
    Kernel::elementwise(ResistanceIndex::new(
        b[0],
        b[1],
        b[2],
        coefficients,
        Some(name.to_string()),
    ))
}

fn tasseled(b: &[usize], component: TasseledCapComponent, name: &'static str) -> Result<Kernel> {
    let bands = [b[0], b[1], b[2], b[3], b[4], b[5]];
    Kernel::elementwise(TasseledCap::new(component, bands, Some(name.to_string())))
}

fn continuum_swir1(b: &[usize], config: &BandConfig, name: &'static str) -> Result<Kernel> {
    // the continuum is undefined unless both neighbours have distinct wavelengths
    let configured = [config.w_swir1, config.w_nir, config.w_swir2]
        .iter()
        .all(|w| w.is_finite() && *w > 0.0);
    if !configured || config.w_nir == config.w_swir2 {
        return Err(IndexError::MissingWavelength { index: name });
    }

    Kernel::elementwise(ContinuumRemoval::new(
        (b[0], config.w_swir1),
        (b[1], config.w_nir),
        (b[2], config.w_swir2),
        Some(name.to_string()),
    ))
}

fn unmixing(_: &[usize], _: &BandConfig, _: &'static str) -> Result<Kernel> {
    Ok(Kernel::Unmixing)
}

const TC_BANDS: &[Band] = &[
    Band::Blue,
    Band::Green,
    Band::Red,
    Band::Nir,
    Band::Swir1,
    Band::Swir2,
];
const RESISTANCE_BANDS: &[Band] = &[Band::Nir, Band::Red, Band::Blue];

macro_rules! entry {
    ($kind:ident, $name:literal, $family:literal, [$($band:ident),*], $citation:expr, $build:expr) => {
        IndexEntry {
            kind: IndexKind::$kind,
            name: $name,
            family: $family,
            bands: &[$(Band::$band),*],
            citation: $citation,
            build: $build,
        }
    };
}

/// Index catalog, in [`IndexKind`] order.
pub static CATALOG: &[IndexEntry] = &[
    entry!(Blue, "BLUE", "band", [Blue], None, band_copy),
    entry!(Green, "GREEN", "band", [Green], None, band_copy),
    entry!(Red, "RED", "band", [Red], None, band_copy),
    entry!(Nir, "NIR", "band", [Nir], None, band_copy),
    entry!(Swir0, "SWIR0", "band", [Swir0], None, band_copy),
    entry!(Swir1, "SWIR1", "band", [Swir1], None, band_copy),
    entry!(Swir2, "SWIR2", "band", [Swir2], None, band_copy),
    entry!(RedEdge1, "RE1", "band", [RedEdge1], None, band_copy),
    entry!(RedEdge2, "RE2", "band", [RedEdge2], None, band_copy),
    entry!(RedEdge3, "RE3", "band", [RedEdge3], None, band_copy),
    entry!(BroadNir, "BNIR", "band", [BroadNir], None, band_copy),
    entry!(Vv, "VV", "band", [Vv], None, band_copy),
    entry!(Vh, "VH", "band", [Vh], None, band_copy),
    entry!(Ndvi, "NDVI", "normalized difference", [Nir, Red], Some(Citation::Ndvi), normalized_difference),
    IndexEntry {
        kind: IndexKind::Evi,
        name: "EVI",
        family: "resistance",
        bands: RESISTANCE_BANDS,
        citation: Some(Citation::Evi),
        build: |b, _, name| resistance(b, Resistance::EVI, name),
    },
    entry!(Nbr, "NBR", "normalized difference", [Nir, Swir2], Some(Citation::Nbr), normalized_difference),
    IndexEntry {
        kind: IndexKind::Arvi,
        name: "ARVI",
        family: "resistance",
        bands: RESISTANCE_BANDS,
        citation: Some(Citation::Sarvi),
        build: |b, _, name| resistance(b, Resistance::ARVI, name),
    },
    IndexEntry {
        kind: IndexKind::Savi,
        name: "SAVI",
        family: "resistance",
        bands: RESISTANCE_BANDS,
        citation: Some(Citation::Sarvi),
        build: |b, _, name| resistance(b, Resistance::SAVI, name),
    },
    IndexEntry {
        kind: IndexKind::Sarvi,
        name: "SARVI",
        family: "resistance",
        bands: RESISTANCE_BANDS,
        citation: Some(Citation::Sarvi),
        build: |b, _, name| resistance(b, Resistance::SARVI, name),
    },
    IndexEntry {
        kind: IndexKind::TcBrightness,
        name: "TC-BRIGHT",
        family: "tasseled cap",
        bands: TC_BANDS,
        citation: Some(Citation::TasseledCap),
        build: |b, _, name| tasseled(b, TasseledCapComponent::Brightness, name),
    },
    IndexEntry {
        kind: IndexKind::TcGreenness,
        name: "TC-GREEN",
        family: "tasseled cap",
        bands: TC_BANDS,
        citation: Some(Citation::TasseledCap),
        build: |b, _, name| tasseled(b, TasseledCapComponent::Greenness, name),
    },
    IndexEntry {
        kind: IndexKind::TcWetness,
        name: "TC-WET",
        family: "tasseled cap",
        bands: TC_BANDS,
        citation: Some(Citation::TasseledCap),
        build: |b, _, name| tasseled(b, TasseledCapComponent::Wetness, name),
    },
    IndexEntry {
        kind: IndexKind::TcDisturbance,
        name: "TC-DI",
        family: "tasseled cap",
        bands: TC_BANDS,
        citation: Some(Citation::Disturbance),
        build: |b, _, name| tasseled(b, TasseledCapComponent::Disturbance, name),
    },
    entry!(Ndbi, "NDBI", "normalized difference", [Swir1, Nir], Some(Citation::Ndbi), normalized_difference),
    entry!(Ndwi, "NDWI", "normalized difference", [Green, Nir], Some(Citation::Ndwi), normalized_difference),
    entry!(Mndwi, "MNDWI", "normalized difference", [Green, Swir1], Some(Citation::Mndwi), normalized_difference),
    entry!(Ndsi, "NDSI", "normalized difference", [Green, Swir1], Some(Citation::Ndsi), normalized_difference),
    entry!(Ndti, "NDTI", "normalized difference", [Swir1, Swir2], Some(Citation::Ndti), normalized_difference),
    entry!(Ndmi, "NDMI", "normalized difference", [Nir, Swir1], Some(Citation::Ndmi), normalized_difference),
    entry!(Kndvi, "kNDVI", "kernelized normalized difference", [Nir, Red], Some(Citation::Kndvi), kernelized),
    entry!(Ndre1, "NDRE1", "normalized difference", [RedEdge2, RedEdge1], Some(Citation::Ndre1), normalized_difference),
    entry!(Ndre2, "NDRE2", "normalized difference", [RedEdge3, RedEdge1], Some(Citation::Ndre2), normalized_difference),
    entry!(CiRedEdge, "CIre", "ratio minus one", [RedEdge3, RedEdge1], Some(Citation::CiRedEdge), ratio_minus_one),
    entry!(NdviRedEdge1, "NDVIre1", "normalized difference", [BroadNir, RedEdge1], Some(Citation::NdviRedEdge), normalized_difference),
    entry!(NdviRedEdge2, "NDVIre2", "normalized difference", [BroadNir, RedEdge2], Some(Citation::NdviRedEdge), normalized_difference),
    entry!(NdviRedEdge3, "NDVIre3", "normalized difference", [BroadNir, RedEdge3], Some(Citation::NdviRedEdge), normalized_difference),
    entry!(NdviRedEdge1Narrow, "NDVIre1n", "normalized difference", [Nir, RedEdge1], Some(Citation::NdviRedEdgeNarrow), normalized_difference),
    entry!(NdviRedEdge2Narrow, "NDVIre2n", "normalized difference", [Nir, RedEdge2], Some(Citation::NdviRedEdgeNarrow), normalized_difference),
    entry!(NdviRedEdge3Narrow, "NDVIre3n", "normalized difference", [Nir, RedEdge3], Some(Citation::NdviRedEdgeNarrow), normalized_difference),
    entry!(MsrRedEdge, "MSRre", "normalized ratio", [BroadNir, RedEdge1], Some(Citation::MsrRedEdge), normalized_ratio),
    entry!(MsrRedEdgeNarrow, "MSRren", "normalized ratio", [Nir, RedEdge1], Some(Citation::MsrRedEdgeNarrow), normalized_ratio),
    entry!(Cci, "CCI", "normalized difference", [Green, Red], Some(Citation::Cci), normalized_difference),
    IndexEntry {
        kind: IndexKind::Evi2,
        name: "EVI2",
        family: "resistance",
        bands: &[Band::Nir, Band::Red, Band::Red],
        citation: Some(Citation::Evi2),
        build: |b, _, name| resistance(b, Resistance::EVI2, name),
    },
    entry!(ContinuumRemovedSwir1, "CRSWIR", "continuum removal", [Swir1, Nir, Swir2], None, continuum_swir1),
    entry!(Sma, "SMA", "spectral mixture analysis", [], Some(Citation::Sma), unmixing),
];

/// Which indices to compute and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRequest {
    pub indices: Vec<String>,
    pub sma: SmaParams,
    pub nodata: i16,
}

impl Default for IndexRequest {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            sma: SmaParams::default(),
            nodata: -9999,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutputStatus {
    Computed,
    Skipped { reason: String },
}

/// Result for one requested identifier.
#[derive(Debug, Clone)]
pub struct IndexOutput {
    /// Identifier as requested
    pub name: String,
    pub kind: Option<IndexKind>,
    pub series: TimeSeries,
    /// Reconstruction error, SMA with `emit_rms` only
    pub rms: Option<TimeSeries>,
    pub status: OutputStatus,
}

/// Resolves index identifiers to kernels and runs them.
pub struct IndexDispatcher {
    processor: ParallelProcessor,
    bands: BandConfig,
    citations: CitationLog,
}

impl IndexDispatcher {
    pub fn new(processor: ParallelProcessor, bands: BandConfig) -> Self {
        Self {
            processor,
            bands,
            citations: CitationLog::new(),
        }
    }

    /// Share an existing citation log.
    pub fn with_citations(mut self, citations: CitationLog) -> Self {
        self.citations = citations;
        self
    }

    pub fn processor(&self) -> &ParallelProcessor {
        &self.processor
    }

    pub fn bands(&self) -> &BandConfig {
        &self.bands
    }

    pub fn citations(&self) -> &CitationLog {
        &self.citations
    }

    /// Look up an identifier and bind it to the band configuration.
    pub fn resolve(&self, identifier: &str) -> Result<(&'static IndexEntry, Kernel)> {
        let entry = identifier.parse::<IndexKind>()?.entry();
        let kernel = entry.kernel(&self.bands)?;
        Ok((entry, kernel))
    }

    /// Compute a single index into a caller-owned series.
    ///
    /// `unmixer` is required for SMA and ignored otherwise. On error the
    /// series is left as nodata.
    pub fn spectral_index(
        &self,
        identifier: &str,
        stack: &ReflectanceStack,
        mask: Option<&[bool]>,
        unmixer: Option<&Unmixer>,
        output: &mut TimeSeries,
        rms: Option<&mut TimeSeries>,
    ) -> Result<()> {
        let (entry, kernel) = self.resolve(identifier)?;
        self.run(entry, &kernel, stack, mask, unmixer, output, rms)
    }

    /// Compute every requested index.
    ///
    /// Setup problems with the endmember table abort the call before any
    /// pixel is touched. Identifiers that cannot be resolved or bound to
    /// the stack are logged and come back as all-nodata, `Skipped` outputs.
    pub fn compute(
        &self,
        request: &IndexRequest,
        stack: &ReflectanceStack,
        mask: Option<&[bool]>,
        endmember: Option<&EndmemberTable>,
    ) -> Result<Vec<IndexOutput>> {
        stack.check_mask(mask)?;

        let resolved: Vec<_> = request
            .indices
            .iter()
            .map(|identifier| (identifier, self.resolve(identifier)))
            .collect();

        let needs_unmixing = resolved
            .iter()
            .any(|(_, r)| matches!(r, Ok((_, Kernel::Unmixing))));
        let unmixer = if needs_unmixing {
            let endmember = endmember.ok_or(IndexError::MissingEndmember)?;
            Some(Unmixer::new(endmember, request.sma, stack.n_bands())?)
        } else {
            None
        };

        log::info!(
            "Computing {} indices for {} cells x {} dates",
            resolved.len(),
            stack.n_cells(),
            stack.n_dates()
        );

        let mut outputs = Vec::with_capacity(resolved.len());
        for (identifier, resolution) in resolved {
            let mut series = TimeSeries::for_stack(stack, request.nodata);
            let mut rms = None;

            let (kind, outcome) = match resolution {
                Ok((entry, kernel)) => {
                    if matches!(kernel, Kernel::Unmixing) && request.sma.emit_rms {
                        rms = Some(TimeSeries::for_stack(stack, request.nodata));
                    }
                    let outcome = self.run(
                        entry,
                        &kernel,
                        stack,
                        mask,
                        unmixer.as_ref(),
                        &mut series,
                        rms.as_mut(),
                    );
                    (Some(entry.kind), outcome)
                }
                Err(e) => (None, Err(e)),
            };

            let status = match outcome {
                Ok(()) => OutputStatus::Computed,
                Err(e) if !e.is_fatal() => {
                    log::warn!("Skipping {}: {}", identifier, e);
                    series.fill_nodata();
                    if let Some(rms) = rms.as_mut() {
                        rms.fill_nodata();
                    }
                    OutputStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };

            outputs.push(IndexOutput {
                name: identifier.clone(),
                kind,
                series,
                rms,
                status,
            });
        }

        Ok(outputs)
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        entry: &IndexEntry,
        kernel: &Kernel,
        stack: &ReflectanceStack,
        mask: Option<&[bool]>,
        unmixer: Option<&Unmixer>,
        output: &mut TimeSeries,
        rms: Option<&mut TimeSeries>,
    ) -> Result<()> {
        match kernel {
            Kernel::Elementwise(calculator) => {
                ParallelProcessor::check_bands(calculator.as_ref(), stack)?;
                self.cite(entry);
                self.processor
                    .process(calculator.as_ref(), stack, mask, output)
            }
            Kernel::Unmixing => {
                let unmixer = unmixer.ok_or(IndexError::MissingEndmember)?;
                self.cite(entry);
                self.processor
                    .process_unmixing(unmixer, stack, mask, output, rms)
            }
        }
    }

    fn cite(&self, entry: &IndexEntry) {
        if let Some(citation) = entry.citation {
            self.citations.cite(citation);
        }
    }
}
