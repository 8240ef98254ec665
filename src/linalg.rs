//! Small numeric helpers shared by the estimators.
//!
//! Nothing here allocates more than its output. The log-sum-exp pair is the
//! numerically stable way to normalize utilities:
//!
//! ```text
//! logsumexp(s) = m + ln Σⱼ exp(sⱼ - m),   m = maxⱼ sⱼ
//! log P(j)     = sⱼ - logsumexp(s)
//! ```

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Squared Euclidean distance between two equal-length vectors.
#[inline]
pub fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Matrix-vector product `X · β`.
pub fn mat_vec(x: ArrayView2<'_, f64>, beta: &[f64]) -> Result<Array1<f64>> {
    if x.ncols() != beta.len() {
        return Err(Error::DimensionMismatch {
            expected: x.ncols(),
            found: beta.len(),
        });
    }
    Ok(x.dot(&ArrayView1::from(beta)))
}

/// Log-sum-exp for numerical stability.
pub fn logsumexp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() {
        return max_val;
    }
    max_val
        + values
            .iter()
            .map(|&v| (v - max_val).exp())
            .sum::<f64>()
            .ln()
}

/// `sⱼ - logsumexp(s)` for every entry.
pub fn log_softmax(values: &[f64]) -> Vec<f64> {
    let lse = logsumexp(values);
    values.iter().map(|&v| v - lse).collect()
}

/// Pass `value` through, or report which computation produced a non-finite value.
#[inline]
pub fn ensure_finite(value: f64, context: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NumericInstability { context })
    }
}

/// Pack row vectors into an `(n, d)` array, validating shape and finiteness.
pub fn rows_to_array(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }
    let n = rows.len();
    let d = rows[0].len();

    let mut flat: Vec<f64> = Vec::with_capacity(n * d);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!("row {i} contains a non-finite value")));
        }
        flat.extend(row);
    }
    Array2::from_shape_vec((n, d), flat).map_err(|e| Error::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn logsumexp_matches_naive_for_small_values() {
        let v = [2.0, 1.0, 0.0];
        let naive = v.iter().map(|x: &f64| x.exp()).sum::<f64>().ln();
        assert!((logsumexp(&v) - naive).abs() < 1e-12);
    }

    #[test]
    fn logsumexp_survives_large_values() {
        let v = [1000.0, 1000.0];
        let got = logsumexp(&v);
        assert!((got - (1000.0 + 2f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn logsumexp_edge_cases() {
        assert_eq!(logsumexp(&[]), f64::NEG_INFINITY);
        assert_eq!(logsumexp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), f64::NEG_INFINITY);
        assert_eq!(logsumexp(&[f64::INFINITY, 0.0]), f64::INFINITY);
    }

    #[test]
    fn log_softmax_normalizes() {
        let lp = log_softmax(&[3.0, -1.0, 0.5, 0.5]);
        let total: f64 = lp.iter().map(|v| v.exp()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mat_vec_checks_width() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(mat_vec(x.view(), &[1.0, 1.0]).unwrap(), array![3.0, 7.0]);
        assert!(matches!(
            mat_vec(x.view(), &[1.0]),
            Err(Error::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn rows_to_array_rejects_ragged_and_nan() {
        assert!(matches!(rows_to_array(&[]), Err(Error::EmptyInput)));
        assert!(rows_to_array(&[vec![1.0, 2.0], vec![1.0]]).is_err());
        assert!(matches!(
            rows_to_array(&[vec![f64::NAN]]),
            Err(Error::InvalidInput(_))
        ));
        let arr = rows_to_array(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(arr.dim(), (2, 2));
    }

    #[test]
    fn squared_distance_and_dot() {
        let a = array![0.0, 3.0];
        let b = array![4.0, 0.0];
        assert_eq!(squared_distance(a.view(), b.view()), 25.0);
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }
}
