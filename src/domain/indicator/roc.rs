//! Rate of change between two closes.
//!
//! ROC = ((C[now] - C[then]) / C[then]) * 100, and 0 when C[then] == 0.

/// Percent change from `prev_close` to `curr_close`; 0 when `prev_close` is 0.
pub fn rate_of_change(prev_close: f64, curr_close: f64) -> f64 {
    if prev_close == 0.0 {
        0.0
    } else {
        ((curr_close - prev_close) / prev_close) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_change() {
        assert!((rate_of_change(100.0, 110.0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_change() {
        assert!((rate_of_change(100.0, 80.0) - (-20.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_base_is_zero() {
        assert_eq!(rate_of_change(0.0, 100.0), 0.0);
    }
}
