use crate::Float;
use ndarray::{ArrayView1, ArrayViewMut1};

/// Numerically stable `ln(Σ exp(x_i))`.
///
/// Returns negative infinity for an empty input.
pub fn log_sum_exp<F: Float>(values: ArrayView1<F>) -> F {
    let max = values
        .iter()
        .copied()
        .fold(F::neg_infinity(), |acc, v| if v > acc { v } else { acc });
    if !max.is_finite() {
        return max;
    }
    let sum: F = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Turns log-scores into a probability distribution, in place.
pub fn softmax_in_place<F: Float>(mut scores: ArrayViewMut1<F>) {
    let lse = log_sum_exp(scores.view());
    scores.mapv_inplace(|v| (v - lse).exp());
}

/// Index of the largest value; the first one wins ties.
///
/// Returns `None` when the input is empty or every value is NaN.
pub fn argmax<F: Float>(values: ArrayView1<F>) -> Option<usize> {
    let mut best: Option<(usize, F)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_log_sum_exp_matches_naive() {
        let v = array![0.1_f64, -2.0, 1.5];
        let naive = v.iter().map(|x| x.exp()).sum::<f64>().ln();
        assert_abs_diff_eq!(log_sum_exp(v.view()), naive, epsilon = 1e-12);
    }

    #[test]
    fn test_log_sum_exp_handles_large_values() {
        let v = array![1000.0_f64, 1000.0];
        assert_abs_diff_eq!(log_sum_exp(v.view()), 1000.0 + 2f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let mut v = array![-3.0_f64, 0.5, 2.0];
        softmax_in_place(v.view_mut());
        assert_abs_diff_eq!(v.sum(), 1.0, epsilon = 1e-12);
        assert!(v[2] > v[1] && v[1] > v[0]);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(array![0.2_f64, 0.8, 0.8].view()), Some(1));
        assert_eq!(argmax(array![f64::NAN, 0.1].view()), Some(1));
        assert_eq!(argmax(ndarray::Array1::<f64>::zeros(0).view()), None);
    }
}
