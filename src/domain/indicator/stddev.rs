//! Sample standard deviation (n−1 denominator).
//!
//! Used for normalizing the MACD histogram over a short lookback. Every caller uses the
//! sample estimator so scores stay comparable.

pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_needs_two_values() {
        assert_eq!(sample_stddev(&[]), None);
        assert_eq!(sample_stddev(&[1.0]), None);
    }

    #[test]
    fn stddev_constant_values() {
        let v = sample_stddev(&[100.0, 100.0, 100.0]).unwrap();
        assert!((v - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stddev_known_values() {
        // Population stddev of this set is 2.0; sample stddev is sqrt(32/7).
        let v = sample_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((v - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }
}
