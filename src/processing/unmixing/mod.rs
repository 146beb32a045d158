// src/processing/unmixing/mod.rs
//! Linear spectral mixture analysis.
//!
//! Each spectrum `x` is decomposed into material fractions `d` minimizing
//! `|Z d - x|^2` for the fixed endmember matrix `Z`. With sum-to-one, a row
//! of ones is appended to `Z` and a one to `x`, so the constraint is met by
//! regression rather than exactly. Non-negative fractions are found with an
//! active-set solver (see [`nnls`]).

pub mod endmember;
pub mod lu;
mod nnls;

pub use endmember::{EndmemberTable, SmaParams};

use crate::error::{IndexError, Result};
use crate::stack::{Frame, ReflectanceStack};
use crate::utils::fixed_point::quantize_or;

/// Reflectance and fraction scale of the quantized data.
pub const SCALE: f64 = 10000.0;

/// Solver iterations allowed per material.
const ITERATIONS_PER_MATERIAL: usize = 30;

/// Setup-time state shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct Unmixer {
    params: SmaParams,
    n_bands: usize,
    n_rows: usize,
    n_materials: usize,
    /// `n_rows x n_materials`, row-major
    z: Vec<f64>,
    /// `Z^t Z`
    gram: Vec<f64>,
    /// `(Z^t Z)^-1`, only needed without the positivity constraint
    gram_inverse: Option<Vec<f64>>,
    max_iter: usize,
}

/// Thread-private scratch, sized once to the material count.
#[derive(Debug, Clone)]
pub struct Workspace {
    x: Vec<f64>,
    ztx: Vec<f64>,
    d: Vec<f64>,
    s: Vec<f64>,
    w: Vec<f64>,
    passive: Vec<bool>,
    index: Vec<usize>,
    sub: Vec<f64>,
    rhs: Vec<f64>,
    sol: Vec<f64>,
    perm: Vec<usize>,
}

/// Result of unmixing one spectrum. Borrows the workspace it was solved in.
#[derive(Debug)]
pub struct Unmixed<'w> {
    /// Fractions of every material, after optional shade normalization
    pub fractions: &'w [f64],
    /// Root mean squared reconstruction error, before shade normalization
    pub rms: f64,
}

impl Unmixer {
    /// Prepare the endmember and Gram matrices for a stack with
    /// `stack_bands` bands.
    ///
    /// Fails if the table does not match the stack, the selected fraction
    /// does not exist, or (without positivity) the Gram matrix is singular.
    pub fn new(endmember: &EndmemberTable, params: SmaParams, stack_bands: usize) -> Result<Self> {
        if endmember.n_bands() != stack_bands {
            return Err(IndexError::EndmemberBandMismatch {
                endmember: endmember.n_bands(),
                stack: stack_bands,
            });
        }

        let n_bands = endmember.n_bands();
        let m = endmember.n_materials();
        if params.endmember == 0 || params.endmember > m {
            return Err(IndexError::EndmemberOutOfRange {
                selected: params.endmember,
                n_materials: m,
            });
        }

        let n_rows = if params.sum_to_one { n_bands + 1 } else { n_bands };
        let mut z = Vec::with_capacity(n_rows * m);
        for b in 0..n_bands {
            z.extend((0..m).map(|j| endmember.get(b, j)));
        }
        if params.sum_to_one {
            z.extend(std::iter::repeat(1.0).take(m));
        }

        let mut gram = vec![0.0; m * m];
        for i in 0..m {
            for j in i..m {
                let v: f64 = (0..n_rows).map(|r| z[r * m + i] * z[r * m + j]).sum();
                gram[i * m + j] = v;
                gram[j * m + i] = v;
            }
        }

        let gram_inverse = if params.positive {
            None
        } else {
            let mut lu_buf = gram.clone();
            let mut perm = vec![0; m];
            lu::decompose(&mut lu_buf, m, &mut perm).map_err(|_| IndexError::SingularEndmember)?;
            let mut inverse = vec![0.0; m * m];
            let (mut unit, mut column) = (vec![0.0; m], vec![0.0; m]);
            lu::invert(&lu_buf, m, &perm, &mut inverse, &mut unit, &mut column);
            Some(inverse)
        };

        log::debug!(
            "Endmember matrix {}x{} (sum-to-one: {}, non-negative: {}, shade normalization: {})",
            n_rows,
            m,
            params.sum_to_one,
            params.positive,
            params.shade_normalize
        );

        Ok(Self {
            params,
            n_bands,
            n_rows,
            n_materials: m,
            z,
            gram,
            gram_inverse,
            max_iter: ITERATIONS_PER_MATERIAL * m,
        })
    }

    pub fn params(&self) -> &SmaParams {
        &self.params
    }

    pub fn n_bands(&self) -> usize {
        self.n_bands
    }

    pub fn n_materials(&self) -> usize {
        self.n_materials
    }

    /// Fail if `stack` has a different band count than the endmembers.
    pub fn check_stack(&self, stack: &ReflectanceStack) -> Result<()> {
        if stack.n_bands() != self.n_bands {
            return Err(IndexError::EndmemberBandMismatch {
                endmember: self.n_bands,
                stack: stack.n_bands(),
            });
        }
        Ok(())
    }

    /// Fresh scratch for one worker.
    pub fn workspace(&self) -> Workspace {
        let m = self.n_materials;
        let mut x = vec![0.0; self.n_rows];
        if self.params.sum_to_one {
            x[self.n_rows - 1] = 1.0;
        }

        Workspace {
            x,
            ztx: vec![0.0; m],
            d: vec![0.0; m],
            s: vec![0.0; m],
            w: vec![0.0; m],
            passive: vec![false; m],
            index: Vec::with_capacity(m),
            sub: vec![0.0; m * m],
            rhs: vec![0.0; m],
            sol: vec![0.0; m],
            perm: vec![0; m],
        }
    }

    /// Unmix a spectrum given in reflectance units (0..1), one value per
    /// band. Returns `None` if a restricted system turned out singular.
    pub fn unmix<'w>(&self, ws: &'w mut Workspace, reflectance: &[f64]) -> Option<Unmixed<'w>> {
        debug_assert_eq!(reflectance.len(), self.n_bands);
        ws.x[..self.n_bands].copy_from_slice(reflectance);
        self.solve(ws)
    }

    /// Unmix the spectrum of `cell` in `frame`.
    pub(crate) fn unmix_pixel<'w>(
        &self,
        ws: &'w mut Workspace,
        frame: &Frame,
        cell: usize,
    ) -> Option<Unmixed<'w>> {
        for (b, x) in ws.x[..self.n_bands].iter_mut().enumerate() {
            *x = frame.sample(b, cell) as f64 / SCALE;
        }
        self.solve(ws)
    }

    pub fn quantize_fraction(&self, unmixed: &Unmixed<'_>, nodata: i16) -> i16 {
        quantize_or(unmixed.fractions[self.params.endmember - 1], SCALE, nodata)
    }

    pub fn quantize_rms(&self, unmixed: &Unmixed<'_>, nodata: i16) -> i16 {
        if self.params.emit_rms {
            quantize_or(unmixed.rms, SCALE, nodata)
        } else {
            nodata
        }
    }

    fn solve<'w>(&self, ws: &'w mut Workspace) -> Option<Unmixed<'w>> {
        let m = self.n_materials;

        // Z^t x
        for (j, v) in ws.ztx.iter_mut().enumerate() {
            *v = (0..self.n_rows).map(|r| self.z[r * m + j] * ws.x[r]).sum();
        }

        match &self.gram_inverse {
            Some(inverse) => {
                for (i, d) in ws.d.iter_mut().enumerate() {
                    *d = (0..m).map(|j| inverse[i * m + j] * ws.ztx[j]).sum();
                }
            }
            None => nnls::active_set(ws, &self.gram, self.max_iter)?,
        }

        let rss: f64 = (0..self.n_rows)
            .map(|r| {
                let fitted: f64 = (0..m).map(|j| self.z[r * m + j] * ws.d[j]).sum();
                let res = ws.x[r] - fitted;
                res * res
            })
            .sum();
        let rms = (rss / self.n_rows as f64).sqrt();

        if self.params.shade_normalize {
            let shade = m - 1;
            let f = 1.0 / (1.0 - ws.d[shade]);
            for d in &mut ws.d[..shade] {
                *d *= f;
            }
            ws.d[shade] = 0.0;
        }

        Some(Unmixed {
            fractions: &ws.d,
            rms,
        })
    }
}
