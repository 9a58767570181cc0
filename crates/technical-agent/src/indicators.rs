//! Latest-value technical indicators over a close/volume series.
//!
//! Each function returns `None` when the series is too short for the
//! requested window, so callers can treat a missing indicator as a
//! neutral signal instead of propagating an error.

/// Simple moving average over the trailing `period` values.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average series, seeded from the first value with
/// multiplier 2/(period+1).
pub fn ema_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }
    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);
    for &value in &data[1..] {
        let prev = result[result.len() - 1];
        result.push((value - prev) * multiplier + prev);
    }
    result
}

/// Relative Strength Index, rolling-mean variant: plain averages of
/// gains and losses over the trailing `period` deltas.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period + 1 {
        return None;
    }
    let deltas: Vec<f64> = data[data.len() - period - 1..]
        .windows(2)
        .map(|w| w[1] - w[0])
        .collect();

    let avg_gain: f64 = deltas.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss: f64 = deltas.iter().filter(|d| **d < 0.0).map(|d| -d).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        // a completely flat window has no strength reading at all
        if avg_gain == 0.0 {
            return None;
        }
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Latest MACD line, signal line, and histogram values.
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn macd(data: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || signal == 0 || slow <= fast || data.len() < slow {
        return None;
    }
    let ema_fast = ema_series(data, fast);
    let ema_slow = ema_series(data, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_series(&macd_line, signal);

    let macd_last = *macd_line.last()?;
    let signal_last = *signal_line.last()?;
    Some(Macd {
        macd: macd_last,
        signal: signal_last,
        histogram: macd_last - signal_last,
    })
}

/// Latest Bollinger band values: middle = SMA(period), upper/lower at
/// `width` population standard deviations.
#[derive(Debug, Clone, Copy)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn bollinger(data: &[f64], period: usize, width: f64) -> Option<Bollinger> {
    let middle = sma(data, period)?;
    let window = &data[data.len() - period..];
    let variance =
        window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std = variance.sqrt();
    Some(Bollinger {
        upper: middle + width * std,
        middle,
        lower: middle - width * std,
    })
}

#[cfg(test)]
#[path = "indicators_tests.rs"]
mod indicators_tests;
