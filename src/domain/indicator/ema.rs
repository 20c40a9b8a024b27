//! Exponential Moving Average, "adjust=false" convention.
//!
//! α = 2/(span+1), EMA[0] = x[0], EMA[t] = α·x[t] + (1−α)·EMA[t−1].
//! The recurrence starts at the first observation with no SMA seed; early values differ from
//! a bias-corrected EMA and must stay that way.
//! Columns built from it report the first (span-1) bars as undefined.

/// Raw one-pass recurrence over `xs`. Every index gets a value.
pub fn ema_values(xs: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(xs.len());
    let mut prev = 0.0;
    for (i, &x) in xs.iter().enumerate() {
        prev = if i == 0 {
            x
        } else {
            alpha * x + (1.0 - alpha) * prev
        };
        out.push(prev);
    }
    out
}
