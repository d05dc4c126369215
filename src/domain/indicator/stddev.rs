//! Rolling sample standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((X[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! First valid index is n - 1; n < 2 is never valid.

pub fn rolling_sample_stddev(input: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; input.len()];
    if period < 2 {
        return out;
    }

    for i in (period - 1)..input.len() {
        let window = &input[i + 1 - period..=i];
        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window
            .iter()
            .map(|x| {
                let diff = x - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;
        out[i] = Some(variance.sqrt());
    }
    out
}
