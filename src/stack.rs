// src/stack.rs
use crate::error::{IndexError, Result};

pub use crate::bands::{Band, BandConfig};

/// One acquisition date: per-band reflectance (scaled by 10000) and a
/// per-cell validity flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    bands: Vec<Vec<i16>>,
    valid: Vec<bool>,
}

impl Frame {
    pub fn new(bands: Vec<Vec<i16>>, valid: Vec<bool>) -> Result<Self> {
        if let Some((b, band)) = bands
            .iter()
            .enumerate()
            .find(|(_, band)| band.len() != valid.len())
        {
            return Err(IndexError::InvalidStack(format!(
                "band {} has {} cells, validity mask has {}",
                b,
                band.len(),
                valid.len()
            )));
        }
        Ok(Self { bands, valid })
    }

    /// Frame where every cell is valid.
    pub fn all_valid(bands: Vec<Vec<i16>>) -> Result<Self> {
        let n_cells = bands.first().map_or(0, Vec::len);
        Self::new(bands, vec![true; n_cells])
    }

    pub fn n_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn n_cells(&self) -> usize {
        self.valid.len()
    }

    pub fn band(&self, band: usize) -> &[i16] {
        &self.bands[band]
    }

    #[inline]
    pub fn sample(&self, band: usize, cell: usize) -> i16 {
        self.bands[band][cell]
    }

    #[inline]
    pub fn is_valid(&self, cell: usize) -> bool {
        self.valid[cell]
    }
}

/// Multi-date, multi-band reflectance stack. All frames share band and cell
/// counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectanceStack {
    frames: Vec<Frame>,
    n_bands: usize,
    n_cells: usize,
}

impl ReflectanceStack {
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        let (n_bands, n_cells) = frames
            .first()
            .map_or((0, 0), |f| (f.n_bands(), f.n_cells()));

        for (t, frame) in frames.iter().enumerate() {
            if frame.n_bands() != n_bands || frame.n_cells() != n_cells {
                return Err(IndexError::InvalidStack(format!(
                    "date {} has {} bands x {} cells, expected {} x {}",
                    t,
                    frame.n_bands(),
                    frame.n_cells(),
                    n_bands,
                    n_cells
                )));
            }
        }

        Ok(Self {
            frames,
            n_bands,
            n_cells,
        })
    }

    pub fn n_dates(&self) -> usize {
        self.frames.len()
    }

    pub fn n_bands(&self) -> usize {
        self.n_bands
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn frame(&self, date: usize) -> &Frame {
        &self.frames[date]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Check an optional spatial mask against the cell count.
    pub fn check_mask(&self, mask: Option<&[bool]>) -> Result<()> {
        match mask {
            Some(mask) if mask.len() != self.n_cells => Err(IndexError::InvalidStack(format!(
                "spatial mask has {} cells, stack has {}",
                mask.len(),
                self.n_cells
            ))),
            _ => Ok(()),
        }
    }
}

/// Quantized `[date][cell]` output of one index, stored date-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeries {
    n_dates: usize,
    n_cells: usize,
    nodata: i16,
    data: Vec<i16>,
}

impl TimeSeries {
    /// New series with every value set to `nodata`.
    pub fn new(n_dates: usize, n_cells: usize, nodata: i16) -> Self {
        Self {
            n_dates,
            n_cells,
            nodata,
            data: vec![nodata; n_dates * n_cells],
        }
    }

    /// Series shaped for `stack`.
    pub fn for_stack(stack: &ReflectanceStack, nodata: i16) -> Self {
        Self::new(stack.n_dates(), stack.n_cells(), nodata)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_dates, self.n_cells)
    }

    pub fn nodata(&self) -> i16 {
        self.nodata
    }

    #[inline]
    pub fn get(&self, date: usize, cell: usize) -> i16 {
        self.data[date * self.n_cells + cell]
    }

    pub fn date(&self, date: usize) -> &[i16] {
        &self.data[date * self.n_cells..(date + 1) * self.n_cells]
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.data
    }

    pub fn is_all_nodata(&self) -> bool {
        self.data.iter().all(|&v| v == self.nodata)
    }

    pub fn fill_nodata(&mut self) {
        let nodata = self.nodata;
        self.data.fill(nodata);
    }

    pub fn to_rows(&self) -> Vec<Vec<i16>> {
        (0..self.n_dates).map(|t| self.date(t).to_vec()).collect()
    }

    pub(crate) fn check_shape(&self, stack: &ReflectanceStack) -> Result<()> {
        let expected = (stack.n_dates(), stack.n_cells());
        if self.shape() != expected {
            return Err(IndexError::ShapeMismatch {
                expected,
                found: self.shape(),
            });
        }
        Ok(())
    }

    /// Mutable view of every date, in order. Each row holds one value per cell.
    pub(crate) fn dates_mut(&mut self) -> std::slice::ChunksMut<'_, i16> {
        // chunks_mut rejects a zero chunk size
        self.data.chunks_mut(self.n_cells.max(1))
    }
}
