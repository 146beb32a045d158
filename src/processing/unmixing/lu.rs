// src/processing/unmixing/lu.rs
//! Dense LU decomposition with partial pivoting for the small (materials x
//! materials) systems of the unmixing solver.
//!
//! Matrices are row-major slices of length `n * n`. Nothing here allocates;
//! callers hand in scratch sized to the largest system they will solve.

/// The matrix has a zero (or non-finite) pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Singular;

/// Factor `a` in place into `L` (unit diagonal, below) and `U` (on and
/// above the diagonal) such that `P * A = L * U`. `perm[i]` holds the
/// original row now at position `i`.
pub fn decompose(a: &mut [f64], n: usize, perm: &mut [usize]) -> Result<(), Singular> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(perm.len(), n);

    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }

    for k in 0..n {
        let mut pivot_row = k;
        let mut pivot_abs = a[k * n + k].abs();
        for i in k + 1..n {
            let v = a[i * n + k].abs();
            if v > pivot_abs {
                pivot_row = i;
                pivot_abs = v;
            }
        }

        if pivot_abs == 0.0 || !pivot_abs.is_finite() {
            return Err(Singular);
        }

        if pivot_row != k {
            for j in 0..n {
                a.swap(k * n + j, pivot_row * n + j);
            }
            perm.swap(k, pivot_row);
        }

        let pivot = a[k * n + k];
        for i in k + 1..n {
            let factor = a[i * n + k] / pivot;
            a[i * n + k] = factor;
            if factor != 0.0 {
                for j in k + 1..n {
                    a[i * n + j] -= factor * a[k * n + j];
                }
            }
        }
    }

    Ok(())
}

/// Solve `A x = b` given the factors from [`decompose`].
pub fn solve(lu: &[f64], n: usize, perm: &[usize], b: &[f64], x: &mut [f64]) {
    debug_assert_eq!(lu.len(), n * n);

    for (xi, &p) in x.iter_mut().zip(perm) {
        *xi = b[p];
    }

    // forward substitution with unit lower triangle
    for i in 0..n {
        let mut sum = x[i];
        for j in 0..i {
            sum -= lu[i * n + j] * x[j];
        }
        x[i] = sum;
    }

    // back substitution
    for i in (0..n).rev() {
        let mut sum = x[i];
        for j in i + 1..n {
            sum -= lu[i * n + j] * x[j];
        }
        x[i] = sum / lu[i * n + i];
    }
}

/// Write `A^-1` into `inv` column by column. `unit` and `column` are scratch
/// of length `n`.
pub fn invert(
    lu: &[f64],
    n: usize,
    perm: &[usize],
    inv: &mut [f64],
    unit: &mut [f64],
    column: &mut [f64],
) {
    for c in 0..n {
        unit.fill(0.0);
        unit[c] = 1.0;
        solve(lu, n, perm, unit, column);
        for (r, &v) in column.iter().enumerate() {
            inv[r * n + c] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matmul(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
        let mut out = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = (0..n).map(|k| a[i * n + k] * b[k * n + j]).sum();
            }
        }
        out
    }

    #[test]
    fn solves_system_that_needs_pivoting() {
        // zero in the top-left corner forces a row swap
        let a = [0.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0];
        let expected = [1.0, -2.0, 3.0];
        let b: Vec<f64> = (0..3)
            .map(|i| (0..3).map(|j| a[i * 3 + j] * expected[j]).sum())
            .collect();

        let mut lu = a;
        let mut perm = [0usize; 3];
        decompose(&mut lu, 3, &mut perm).unwrap();

        let mut x = [0.0; 3];
        solve(&lu, 3, &perm, &b, &mut x);
        for (got, want) in x.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "expected {want}, got {got}");
        }
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let a = [4.0, 1.0, 0.5, 1.0, 3.0, 0.25, 0.5, 0.25, 2.0];
        let mut lu = a;
        let mut perm = [0usize; 3];
        decompose(&mut lu, 3, &mut perm).unwrap();

        let mut inv = [0.0; 9];
        let mut unit = [0.0; 3];
        let mut column = [0.0; 3];
        invert(&lu, 3, &perm, &mut inv, &mut unit, &mut column);

        let product = matmul(&a, &inv, 3);
        for i in 0..3 {
            for j in 0..3 {
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((product[i * 3 + j] - want).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn detects_singular_matrix() {
        // second row is twice the first
        let mut a = [1.0, 2.0, 2.0, 4.0];
        let mut perm = [0usize; 2];
        assert_eq!(decompose(&mut a, 2, &mut perm), Err(Singular));
    }

    #[test]
    fn one_by_one_system() {
        let mut a = [4.0];
        let mut perm = [0usize];
        decompose(&mut a, 1, &mut perm).unwrap();
        let mut x = [0.0];
        solve(&a, 1, &perm, &[2.0], &mut x);
        assert_eq!(x[0], 0.5);
    }
}
