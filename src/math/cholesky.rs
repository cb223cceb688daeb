use crate::utils::errors::{Result, SimError};

/// Ridge added to the diagonal before decomposition.
pub const RIDGE: f64 = 1e-4;

/// Largest system the solver accepts.
pub const MAX_DIM: usize = 16;

/// Solves `(A + λI) x = b` for a symmetric positive-semidefinite `A`
/// given in flat row-major form, via an in-place Cholesky decomposition
/// with forward and back substitution.
///
/// # Errors
///
/// Returns `NotPositiveDefinite` when a pivot is non-positive or not
/// finite; the caller keeps its previous solution in that case.
pub fn solve_ridge(matrix: &[f64], rhs: &[f64], n: usize) -> Result<Vec<f64>> {
    debug_assert!(n <= MAX_DIM);
    debug_assert_eq!(matrix.len(), n * n);
    debug_assert_eq!(rhs.len(), n);

    let mut lower = matrix.to_vec();
    for i in 0..n {
        lower[i * n + i] += RIDGE;
    }

    // in-place decomposition, lower triangle only
    for i in 0..n {
        for j in 0..=i {
            let mut sum = lower[i * n + j];
            for k in 0..j {
                sum -= lower[i * n + k] * lower[j * n + k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(SimError::NotPositiveDefinite(format!(
                        "pivot {} at row {} of {}",
                        sum, i, n
                    )));
                }
                lower[i * n + i] = sum.sqrt();
            } else {
                lower[i * n + j] = sum / lower[j * n + j];
            }
        }
    }

    // L y = b
    let mut x = rhs.to_vec();
    for i in 0..n {
        for k in 0..i {
            x[i] -= lower[i * n + k] * x[k];
        }
        x[i] /= lower[i * n + i];
    }

    // L^T x = y
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            x[i] -= lower[k * n + i] * x[k];
        }
        x[i] /= lower[i * n + i];
    }

    Ok(x)
}

/// `M += s · v vᵀ`, the incremental XᵀX accumulator.
pub fn add_outer_product(matrix: &mut [f64], v: &[f64], scale: f64) {
    let n = v.len();
    debug_assert_eq!(matrix.len(), n * n);
    for i in 0..n {
        for j in 0..n {
            matrix[i * n + j] += scale * v[i] * v[j];
        }
    }
}

/// `y += s · v`, the incremental Xᵀy accumulator.
pub fn add_scaled_vector(y: &mut [f64], v: &[f64], scale: f64) {
    debug_assert_eq!(y.len(), v.len());
    for (yi, vi) in y.iter_mut().zip(v) {
        *yi += scale * vi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiply(matrix: &[f64], x: &[f64], n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (0..n).map(|j| matrix[i * n + j] * x[j]).sum())
            .collect()
    }

    #[test]
    fn test_identity_system() {
        let matrix = vec![1.0, 0.0, 0.0, 1.0];
        let rhs = vec![3.0, -2.0];
        let x = solve_ridge(&matrix, &rhs, 2).unwrap();
        assert!((x[0] - 3.0).abs() < 1e-3);
        assert!((x[1] + 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_residual_bound() {
        // scaled like a normal-equations matrix, so the ridge is
        // negligible against the diagonal
        let matrix = vec![
            40_000.0, 10_000.0, 5_000.0, //
            10_000.0, 30_000.0, 2_000.0, //
            5_000.0, 2_000.0, 20_000.0,
        ];
        let rhs = vec![1.0, -7.0, 3.5];
        let x = solve_ridge(&matrix, &rhs, 3).unwrap();
        let ax = multiply(&matrix, &x, 3);
        let b_norm = rhs.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        for (ai, bi) in ax.iter().zip(&rhs) {
            assert!((ai - bi).abs() < 1e-6 * b_norm);
        }
    }

    #[test]
    fn test_indefinite_matrix_is_rejected() {
        let matrix = vec![1.0, 2.0, 2.0, 1.0];
        let rhs = vec![1.0, 1.0];
        assert!(matches!(
            solve_ridge(&matrix, &rhs, 2),
            Err(SimError::NotPositiveDefinite(_))
        ));
    }

    #[test]
    fn test_non_finite_matrix_is_rejected() {
        let matrix = vec![f64::NAN, 0.0, 0.0, 1.0];
        let rhs = vec![1.0, 1.0];
        assert!(solve_ridge(&matrix, &rhs, 2).is_err());
    }

    #[test]
    fn test_accumulators_build_normal_equations() {
        // two observations of y = 2 + 3 x
        let rows = [[1.0, 1.0], [1.0, 2.0]];
        let ys = [5.0, 8.0];
        let mut xtx = vec![0.0; 4];
        let mut xty = vec![0.0; 2];
        for (row, y) in rows.iter().zip(&ys) {
            add_outer_product(&mut xtx, row, 1.0);
            add_scaled_vector(&mut xty, row, *y);
        }
        assert_eq!(xtx, vec![2.0, 3.0, 3.0, 5.0]);
        assert_eq!(xty, vec![13.0, 21.0]);
        let beta = solve_ridge(&xtx, &xty, 2).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-2);
        assert!((beta[1] - 3.0).abs() < 1e-2);
    }
}
