//! Visible-range volume profile.
//!
//! The price range of the lookback window is split into equal-width bins.
//! Each bar's volume is spread over the bins its [low, high] range overlaps,
//! in proportion to the overlap; a bar with no range deposits all of its
//! volume in the bin containing its close.
//!
//! - POC: midpoint of the highest-volume bin (lowest bin wins ties).
//! - Value area: contiguous bins holding at least 70% of volume, grown from
//!   the POC one bin at a time toward the larger neighbour (ties grow up).
//!   VAH/VAL are the outer edges of the value area.
//! - HVN/LVN: local volume peaks/troughs relative to the mean bin volume.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::require_bars;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PROFILE_LOOKBACK: usize = 120;
pub const DEFAULT_PROFILE_BINS: usize = 40;
pub const VALUE_AREA_SHARE: f64 = 0.70;
const HVN_MEAN_MULT: f64 = 1.5;
const LVN_MEAN_MULT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProfile {
    pub range_low: f64,
    pub range_high: f64,
    pub bin_width: f64,
    pub volumes: Vec<f64>,
    pub total_volume: f64,
    pub poc: f64,
    pub value_area_high: f64,
    pub value_area_low: f64,
    pub hvns: Vec<f64>,
    pub lvns: Vec<f64>,
}

impl VolumeProfile {
    pub fn bin_mid(&self, idx: usize) -> f64 {
        self.range_low + (idx as f64 + 0.5) * self.bin_width
    }

    pub fn in_value_area(&self, price: f64) -> bool {
        price >= self.value_area_low && price <= self.value_area_high
    }

    /// True when `price` is within `tolerance_pct` percent of the POC.
    pub fn is_near_poc(&self, price: f64, tolerance_pct: f64) -> bool {
        within_pct(price, self.poc, tolerance_pct)
    }

    /// True when `price` is within `tolerance_pct` percent of any HVN.
    pub fn is_near_hvn(&self, price: f64, tolerance_pct: f64) -> bool {
        self.hvns.iter().any(|&h| within_pct(price, h, tolerance_pct))
    }
}

fn within_pct(price: f64, reference: f64, tolerance_pct: f64) -> bool {
    if price <= 0.0 {
        return false;
    }
    ((price - reference) / price).abs() * 100.0 <= tolerance_pct
}

pub fn volume_profile(
    bars: &[OhlcvBar],
    lookback: usize,
    bins: usize,
) -> Result<VolumeProfile, IndicatorError> {
    require_bars(bars, lookback)?;
    if bins == 0 {
        return Err(IndicatorError::InvalidParameter {
            reason: "volume profile needs at least one bin".to_string(),
        });
    }

    let window = &bars[bars.len() - lookback..];
    let range_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let range_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);

    // A window with no price range collapses to one bin.
    let bins = if range_high > range_low { bins } else { 1 };
    let bin_width = if range_high > range_low {
        (range_high - range_low) / bins as f64
    } else {
        0.0
    };

    let bin_of = |price: f64| -> usize {
        if bin_width == 0.0 {
            return 0;
        }
        let idx = ((price - range_low) / bin_width).floor();
        (idx.max(0.0) as usize).min(bins - 1)
    };

    let mut volumes = vec![0.0; bins];
    for bar in window {
        let volume = bar.volume.max(0) as f64;
        let span = bar.high - bar.low;
        if span <= 0.0 || bin_width == 0.0 {
            volumes[bin_of(bar.close)] += volume;
            continue;
        }
        for (idx, slot) in volumes
            .iter_mut()
            .enumerate()
            .take(bin_of(bar.high) + 1)
            .skip(bin_of(bar.low))
        {
            let bin_lo = range_low + idx as f64 * bin_width;
            let bin_hi = bin_lo + bin_width;
            let overlap = bar.high.min(bin_hi) - bar.low.max(bin_lo);
            if overlap > 0.0 {
                *slot += volume * overlap / span;
            }
        }
    }

    let total_volume: f64 = volumes.iter().sum();
    if total_volume <= 0.0 {
        return Err(IndicatorError::NoVolume);
    }

    let mut poc_idx = 0;
    for (idx, &v) in volumes.iter().enumerate() {
        if v > volumes[poc_idx] {
            poc_idx = idx;
        }
    }

    let (va_lo, va_hi) = value_area(&volumes, poc_idx, total_volume);

    let mean = total_volume / bins as f64;
    let mut hvns = Vec::new();
    let mut lvns = Vec::new();
    for idx in 0..bins {
        let v = volumes[idx];
        let left = if idx > 0 { Some(volumes[idx - 1]) } else { None };
        let right = volumes.get(idx + 1).copied();

        let is_peak = left.is_none_or(|l| v >= l)
            && right.is_none_or(|r| v >= r)
            && (left.is_some_and(|l| v > l) || right.is_some_and(|r| v > r));
        if idx != poc_idx && is_peak && v >= HVN_MEAN_MULT * mean {
            hvns.push(range_low + (idx as f64 + 0.5) * bin_width);
        }

        if let (Some(l), Some(r)) = (left, right) {
            if v <= l && v <= r && (v < l || v < r) && v <= LVN_MEAN_MULT * mean {
                lvns.push(range_low + (idx as f64 + 0.5) * bin_width);
            }
        }
    }

    Ok(VolumeProfile {
        range_low,
        range_high,
        bin_width,
        poc: range_low + (poc_idx as f64 + 0.5) * bin_width,
        value_area_low: range_low + va_lo as f64 * bin_width,
        value_area_high: range_low + (va_hi + 1) as f64 * bin_width,
        volumes,
        total_volume,
        hvns,
        lvns,
    })
}

/// Grow the value area outward from the POC bin; returns inclusive bin bounds.
fn value_area(volumes: &[f64], poc_idx: usize, total: f64) -> (usize, usize) {
    let target = total * VALUE_AREA_SHARE;
    let last = volumes.len() - 1;
    let (mut lo, mut hi) = (poc_idx, poc_idx);
    let mut acc = volumes[poc_idx];

    while acc < target && (lo > 0 || hi < last) {
        let up = if hi < last { Some(volumes[hi + 1]) } else { None };
        let down = if lo > 0 { Some(volumes[lo - 1]) } else { None };
        match (up, down) {
            (Some(u), Some(d)) if u >= d => {
                hi += 1;
                acc += u;
            }
            (Some(u), None) => {
                hi += 1;
                acc += u;
            }
            (_, Some(d)) => {
                lo -= 1;
                acc += d;
            }
            (None, None) => break,
        }
    }

    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::hlcv;
    use approx::assert_relative_eq;

    #[test]
    fn proportional_allocation_across_bins() {
        // Range 100..110 in 10 bins of width 1. One bar spans 100..104 with 400 volume.
        let bars = hlcv(&[(104.0, 100.0, 102.0, 400), (110.0, 109.0, 109.5, 10)]);
        let profile = volume_profile(&bars, 2, 10).unwrap();

        assert_relative_eq!(profile.bin_width, 1.0);
        for idx in 0..4 {
            assert_relative_eq!(profile.volumes[idx], 100.0);
        }
        assert_relative_eq!(profile.volumes[9], 10.0);
        assert_relative_eq!(profile.total_volume, 410.0);
    }

    #[test]
    fn poc_is_heaviest_bin_lowest_on_tie() {
        let bars = hlcv(&[(104.0, 100.0, 102.0, 400), (110.0, 109.0, 109.5, 10)]);
        let profile = volume_profile(&bars, 2, 10).unwrap();
        // bins 0..=3 tie at 100; lowest wins
        assert_relative_eq!(profile.poc, 100.5);
    }

    #[test]
    fn value_area_holds_seventy_percent() {
        let bars = hlcv(&[
            (101.0, 100.0, 100.5, 50),
            (102.0, 101.0, 101.5, 100),
            (103.0, 102.0, 102.5, 500),
            (104.0, 103.0, 103.5, 250),
            (105.0, 104.0, 104.5, 100),
        ]);
        let profile = volume_profile(&bars, 5, 5).unwrap();
        assert_relative_eq!(profile.poc, 102.5);
        // 500 -> +250 (up beats 100) = 750 of 1000 reaches 70%
        assert_relative_eq!(profile.value_area_low, 102.0);
        assert_relative_eq!(profile.value_area_high, 104.0);

        let in_va: f64 = profile
            .volumes
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let mid = profile.bin_mid(*i);
                profile.in_value_area(mid)
            })
            .map(|(_, v)| v)
            .sum();
        assert!(in_va >= 0.7 * profile.total_volume);
    }

    #[test]
    fn high_and_low_volume_nodes() {
        let bars = hlcv(&[
            (101.0, 100.0, 100.5, 300),
            (102.0, 101.0, 101.5, 10),
            (103.0, 102.0, 102.5, 600),
            (104.0, 103.0, 103.5, 10),
            (105.0, 104.0, 104.5, 80),
        ]);
        let profile = volume_profile(&bars, 5, 5).unwrap();
        // mean = 200; POC at 102.5; bin 0 (300) is an HVN peak
        assert_relative_eq!(profile.poc, 102.5);
        assert_eq!(profile.hvns, vec![100.5]);
        assert_eq!(profile.lvns, vec![101.5, 103.5]);
    }

    #[test]
    fn flat_window_collapses_to_single_bin() {
        let bars = hlcv(&[(50.0, 50.0, 50.0, 10), (50.0, 50.0, 50.0, 20)]);
        let profile = volume_profile(&bars, 2, 20).unwrap();
        assert_eq!(profile.volumes.len(), 1);
        assert_relative_eq!(profile.poc, 50.0);
        assert!(profile.in_value_area(50.0));
    }

    #[test]
    fn zero_volume_is_an_error() {
        let bars = hlcv(&[(51.0, 50.0, 50.5, 0), (52.0, 50.0, 51.0, 0)]);
        assert_eq!(volume_profile(&bars, 2, 4).unwrap_err(), IndicatorError::NoVolume);
    }

    #[test]
    fn lookback_longer_than_series() {
        let bars = hlcv(&[(51.0, 50.0, 50.5, 10)]);
        assert!(matches!(
            volume_profile(&bars, 5, 4),
            Err(IndicatorError::InsufficientData { have: 1, need: 5 })
        ));
    }

    #[test]
    fn proximity_helpers() {
        let bars = hlcv(&[
            (101.0, 100.0, 100.5, 300),
            (102.0, 101.0, 101.5, 10),
            (103.0, 102.0, 102.5, 600),
            (104.0, 103.0, 103.5, 10),
            (105.0, 104.0, 104.5, 80),
        ]);
        let profile = volume_profile(&bars, 5, 5).unwrap();
        assert!(profile.is_near_poc(102.0, 1.0));
        assert!(!profile.is_near_poc(99.0, 1.0));
        assert!(profile.is_near_hvn(100.6, 0.5));
    }
}
