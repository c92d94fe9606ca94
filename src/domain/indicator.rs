//! Rolling indicators used by the sample strategies.
//!
//! Each function returns one entry per input value; `None` marks warmup
//! entries that cannot be computed yet.

/// Simple moving average. Warmup: first (n-1) values.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        out.push((i + 1 >= period).then(|| sum / period as f64));
    }
    out
}

/// Exponential moving average.
///
/// k = 2/(n+1), seed with the first SMA, then EMA[i] = V[i]*k + EMA[i-1]*(1-k).
/// Warmup: first (n-1) values.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut ema = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if i + 1 < period {
            sum += v;
            out.push(None);
        } else if i + 1 == period {
            sum += v;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = v * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }
    out
}

/// Fractional rate of change: (V[i] - V[i-n]) / V[i-n].
/// If V[i-n] == 0 the result is 0. Warmup: first n values.
pub fn rate_of_change(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i < period {
                return None;
            }
            let prev = values[i - period];
            if prev == 0.0 {
                Some(0.0)
            } else {
                Some((values[i] - prev) / prev)
            }
        })
        .collect()
}

/// Population standard deviation over a trailing window of n values.
/// Warmup: first (n-1) values.
pub fn rolling_stddev(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            Some(variance.sqrt())
        })
        .collect()
}
