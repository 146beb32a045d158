// src/processing/unmixing/nnls.rs
//! Active-set non-negative least squares on the normal equations.
//!
//! Materials are split into a passive set (free, positive) and an active set
//! (held at zero). The active material with the steepest gradient is freed,
//! the unconstrained problem on the passive set is solved, and if that
//! candidate leaves the feasible region the iterate is moved back along the
//! segment until the first passive fraction hits zero, which is then bound
//! again.

use itertools::Itertools;

use super::lu;
use super::Workspace;

/// Values at or below this count as zero.
pub(super) const TOLERANCE: f64 = f32::MIN_POSITIVE as f64;

/// Solve for non-negative `ws.d` given `ws.ztx` and the Gram matrix.
///
/// The iteration budget is shared between freeing and binding steps. When it
/// runs out the last feasible iterate is kept. Returns `None` if a restricted
/// system is singular.
pub(super) fn active_set(ws: &mut Workspace, gram: &[f64], max_iter: usize) -> Option<()> {
    ws.passive.fill(false);
    ws.d.fill(0.0);
    ws.s.fill(0.0);
    ws.update_gradient(gram);

    let mut it = 0;
    while it < max_iter {
        let Some(m) = ws.steepest_active() else {
            break;
        };
        it += 1;

        ws.passive[m] = true;
        let mut s_min = ws.solve_passive(gram)?;

        while s_min <= TOLERANCE && it < max_iter {
            it += 1;
            ws.step_back();
            s_min = ws.solve_passive(gram)?;
        }

        if s_min <= TOLERANCE {
            // out of budget with an infeasible candidate
            break;
        }

        ws.d.copy_from_slice(&ws.s);
        ws.update_gradient(gram);
    }

    Some(())
}

impl Workspace {
    /// `w = Z^t x - Z^t Z d` on the active set; passive entries are -1 so
    /// they never win the steepest-gradient search.
    fn update_gradient(&mut self, gram: &[f64]) {
        let m = self.d.len();
        for i in 0..m {
            self.w[i] = if self.passive[i] {
                -1.0
            } else {
                let row = &gram[i * m..(i + 1) * m];
                self.ztx[i] - row.iter().zip(&self.d).map(|(g, d)| g * d).sum::<f64>()
            };
        }
    }

    /// Active material with the largest gradient above tolerance.
    fn steepest_active(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for i in (0..self.w.len()).filter(|&i| !self.passive[i]) {
            if self.w[i] > TOLERANCE && best.map_or(true, |b| self.w[i] > self.w[b]) {
                best = Some(i);
            }
        }
        best
    }

    /// Move `d` towards the infeasible candidate `s` as far as feasibility
    /// allows, then bind every passive fraction that reached zero.
    fn step_back(&mut self) {
        let mut alpha = f64::INFINITY;
        let mut blocking = None;
        for i in 0..self.d.len() {
            if self.passive[i] && self.s[i] <= TOLERANCE {
                let denom = self.d[i] - self.s[i];
                let a = if denom == 0.0 { 0.0 } else { self.d[i] / denom };
                if a < alpha {
                    alpha = a;
                    blocking = Some(i);
                }
            }
        }

        let Some(blocking) = blocking else {
            return;
        };

        for i in 0..self.d.len() {
            self.d[i] += alpha * (self.s[i] - self.d[i]);
        }
        // exact zero for the component that limited the step
        self.d[blocking] = 0.0;

        for i in 0..self.d.len() {
            if self.passive[i] && self.d[i].abs() < TOLERANCE {
                self.passive[i] = false;
            }
        }
    }

    /// Solve the normal equations restricted to the passive set into `s`
    /// (zero on the active set). Returns the smallest passive component,
    /// `+inf` for an empty passive set, or `None` if the system is singular.
    fn solve_passive(&mut self, gram: &[f64]) -> Option<f64> {
        let m = self.d.len();

        self.index.clear();
        self.index.extend(self.passive.iter().positions(|&p| p));
        self.s.fill(0.0);

        let k = self.index.len();
        if k == 0 {
            return Some(f64::INFINITY);
        }

        for (r, &i) in self.index.iter().enumerate() {
            self.rhs[r] = self.ztx[i];
            for (c, &j) in self.index.iter().enumerate() {
                self.sub[r * k + c] = gram[i * m + j];
            }
        }

        lu::decompose(&mut self.sub[..k * k], k, &mut self.perm[..k]).ok()?;
        lu::solve(
            &self.sub[..k * k],
            k,
            &self.perm[..k],
            &self.rhs[..k],
            &mut self.sol[..k],
        );

        let mut s_min = f64::INFINITY;
        for (r, &i) in self.index.iter().enumerate() {
            let v = self.sol[r];
            if !v.is_finite() {
                return None;
            }
            self.s[i] = v;
            s_min = s_min.min(v);
        }

        Some(s_min)
    }
}
