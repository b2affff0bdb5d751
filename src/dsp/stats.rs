//! Small descriptive statistics shared by the estimators.
//!
//! All variances are population-style (divide by N), matching how the
//! AC term and SDNN are defined.

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let mean = mean(data)?;
    let variance = data
        .iter()
        .map(|v| {
            let delta = v - mean;
            delta * delta
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}

/// Median; the two middle values are averaged for even lengths.
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    #[test]
    fn std_dev_uses_population_divisor() {
        let samples = [0.0, 2.0, -2.0, 0.0];
        assert_relative_eq!(std_dev(&samples).unwrap(), 2.0_f64.sqrt(), epsilon = 1e-12);
    }
    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
    #[test]
    fn empty_has_no_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[]), None);
    }
}
