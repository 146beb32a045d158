// src/processing/parallel.rs
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{IndexError, Result};
use crate::processing::unmixing::{Unmixer, Workspace};
use crate::stack::{Frame, ReflectanceStack, TimeSeries};
use crate::utils::fixed_point::to_fixed_point;

/// Cells per scheduling unit for the unmixing solver. Small units let work
/// stealing even out the uneven per-pixel convergence cost.
const UNMIXING_CELLS_PER_TASK: usize = 16;

/// Spectrum of one cell at one date.
#[derive(Clone, Copy)]
pub struct Pixel<'a> {
    frame: &'a Frame,
    cell: usize,
}

impl<'a> Pixel<'a> {
    pub fn new(frame: &'a Frame, cell: usize) -> Self {
        Self { frame, cell }
    }

    /// Reflectance of `band` as stored (scaled by 10000).
    #[inline]
    pub fn band(&self, band: usize) -> f32 {
        self.frame.sample(band, self.cell) as f32
    }

    pub fn cell(&self) -> usize {
        self.cell
    }
}

/// Trait for elementwise spectral index calculators
pub trait IndexCalculator: Send + Sync {
    /// Evaluate the index for one spectrum, multiplied by the storage scale.
    /// `None` marks the value as undefined.
    fn evaluate(&self, pixel: &Pixel<'_>) -> Option<f32>;

    /// Stack bands read by `evaluate`
    fn required_bands(&self) -> Vec<usize>;

    /// Return the name of the index
    fn name(&self) -> &str;
}

/// Fork-join driver for kernels and the unmixing solver.
pub struct ParallelProcessor {
    pool: ThreadPool,
    threads: usize,
}

impl ParallelProcessor {
    /// Create a processor with `threads` workers, defaulting to the number
    /// of logical CPUs. Requests beyond that are clamped to it.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let available = num_cpus::get().max(1);
        let threads = threads.unwrap_or(available).clamp(1, available);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("raster-index-{i}"))
            .build()
            .map_err(|e| IndexError::ThreadPool(e.to_string()))?;

        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Check that a calculator only reads bands the stack has.
    pub fn check_bands<I: IndexCalculator + ?Sized>(
        calculator: &I,
        stack: &ReflectanceStack,
    ) -> Result<()> {
        match calculator
            .required_bands()
            .into_iter()
            .find(|&b| b >= stack.n_bands())
        {
            Some(band) => Err(IndexError::BandOutOfRange {
                index: calculator.name().to_string(),
                band,
                n_bands: stack.n_bands(),
            }),
            None => Ok(()),
        }
    }

    /// Run an elementwise calculator over every cell and date of `stack`.
    ///
    /// Masked-out cells and invalid observations get nodata, as do values the
    /// calculator leaves undefined or that do not fit the output type.
    pub fn process<I: IndexCalculator + ?Sized>(
        &self,
        calculator: &I,
        stack: &ReflectanceStack,
        mask: Option<&[bool]>,
        output: &mut TimeSeries,
    ) -> Result<()> {
        stack.check_mask(mask)?;
        output.check_shape(stack)?;
        Self::check_bands(calculator, stack)?;

        let (nt, nc) = (stack.n_dates(), stack.n_cells());
        if nt == 0 || nc == 0 {
            return Ok(());
        }
        let nodata = output.nodata();

        log::debug!(
            "Computing {} for {} cells x {} dates on {} threads",
            calculator.name(),
            nc,
            nt,
            self.threads
        );

        // Per-cell cost is uniform, so split cells evenly across workers
        let min_len = nc.div_ceil(self.threads).max(1);

        self.pool.install(|| {
            for (frame, row) in stack.frames().iter().zip(output.dates_mut()) {
                row.par_iter_mut()
                    .enumerate()
                    .with_min_len(min_len)
                    .for_each(|(p, value)| {
                        *value = if mask.is_some_and(|m| !m[p]) || !frame.is_valid(p) {
                            nodata
                        } else {
                            calculator
                                .evaluate(&Pixel::new(frame, p))
                                .and_then(to_fixed_point)
                                .unwrap_or(nodata)
                        };
                    });
            }
        });

        Ok(())
    }

    /// Run the unmixing solver over every cell and date of `stack`, writing
    /// the selected fraction to `output` and, when given, the reconstruction
    /// error to `rms`.
    pub fn process_unmixing(
        &self,
        unmixer: &Unmixer,
        stack: &ReflectanceStack,
        mask: Option<&[bool]>,
        output: &mut TimeSeries,
        mut rms: Option<&mut TimeSeries>,
    ) -> Result<()> {
        stack.check_mask(mask)?;
        unmixer.check_stack(stack)?;
        output.check_shape(stack)?;
        if let Some(rms) = rms.as_deref() {
            rms.check_shape(stack)?;
        }

        let (nt, nc) = (stack.n_dates(), stack.n_cells());
        if nt == 0 || nc == 0 {
            return Ok(());
        }
        let nodata = output.nodata();
        let rms_nodata = rms.as_deref().map_or(nodata, TimeSeries::nodata);

        log::debug!(
            "Unmixing {} cells x {} dates against {} endmembers on {} threads",
            nc,
            nt,
            unmixer.n_materials(),
            self.threads
        );

        // Convergence cost varies per pixel: hand out small units and let
        // idle workers steal. Scratch lives for one unit.
        let unmix = |ws: &mut Workspace, frame: &Frame, p: usize| -> (i16, i16) {
            if mask.is_some_and(|m| !m[p]) || !frame.is_valid(p) {
                return (nodata, rms_nodata);
            }
            match unmixer.unmix_pixel(ws, frame, p) {
                Some(unmixed) => (
                    unmixer.quantize_fraction(&unmixed, nodata),
                    unmixer.quantize_rms(&unmixed, rms_nodata),
                ),
                None => (nodata, rms_nodata),
            }
        };

        self.pool.install(|| {
            let mut rms_rows = rms.as_deref_mut().map(TimeSeries::dates_mut);

            for (frame, row) in stack.frames().iter().zip(output.dates_mut()) {
                match rms_rows.as_mut().and_then(|rows| rows.next()) {
                    Some(rms_row) => row
                        .par_iter_mut()
                        .zip(rms_row.par_iter_mut())
                        .enumerate()
                        .with_max_len(UNMIXING_CELLS_PER_TASK)
                        .for_each_init(
                            || unmixer.workspace(),
                            |ws, (p, (fraction, error))| {
                                (*fraction, *error) = unmix(ws, frame, p);
                            },
                        ),
                    None => row
                        .par_iter_mut()
                        .enumerate()
                        .with_max_len(UNMIXING_CELLS_PER_TASK)
                        .for_each_init(
                            || unmixer.workspace(),
                            |ws, (p, fraction)| {
                                *fraction = unmix(ws, frame, p).0;
                            },
                        ),
                }
            }
        });

        Ok(())
    }
}
