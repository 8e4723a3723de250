//! Daily return arithmetic.

/// Trading days per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar days per year used to annualize total returns.
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.25;

/// Simple daily returns `p[t] / p[t-1] - 1`; one shorter than `prices`.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Simple daily returns with a leading zero, so the output lines up with
/// `prices` one-to-one.
pub fn padded_returns(prices: &[f64]) -> Vec<f64> {
    if prices.is_empty() {
        return Vec::new();
    }
    let mut returns = Vec::with_capacity(prices.len());
    returns.push(0.0);
    returns.extend(simple_returns(prices));
    returns
}

/// Running compounded return `prod(1 + r) - 1` at each step.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth - 1.0
        })
        .collect()
}

/// Total return from first to last price; NaN with fewer than 2 prices.
pub fn total_return(prices: &[f64]) -> f64 {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 => last / first - 1.0,
        _ => f64::NAN,
    }
}

/// Total return obtained by compounding daily returns.
pub fn compounded_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Annualize a total return earned over `days` calendar days.
pub fn annualize_return(total_return: f64, days: i64) -> f64 {
    if days <= 0 || !total_return.is_finite() {
        return f64::NAN;
    }
    (1.0 + total_return).powf(CALENDAR_DAYS_PER_YEAR / days as f64) - 1.0
}
