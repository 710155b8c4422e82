use serde::{Deserialize, Serialize};

/// Fewest values for which percentiles are trusted. Smaller samples fall
/// back to the plain extent.
pub const MIN_QUANTILE_SAMPLES: usize = 10;

pub const DEFAULT_LOW_QUANTILE: f64 = 0.1;
pub const DEFAULT_HIGH_QUANTILE: f64 = 0.9;

/// Quantile of an ascending slice using linear interpolation between the
/// closest ranks. `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use aidflow_engine::scale::domain::quantile;
///
/// let values: Vec<f64> = (1..=100).map(f64::from).collect();
/// assert!((quantile(&values, 0.1).unwrap() - 10.9).abs() < 1e-9);
/// assert_eq!(quantile(&values, 1.0), Some(100.0));
/// ```
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || p.is_nan() {
        return None;
    }
    if p <= 0.0 || n == 1 {
        return Some(sorted[0]);
    }
    if p >= 1.0 {
        return Some(sorted[n - 1]);
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let lo_value = sorted[lo];
    let hi_value = sorted[(lo + 1).min(n - 1)];
    Some(lo_value + (hi_value - lo_value) * (h - lo as f64))
}

/// A closed value interval `[lo, hi]` with `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    lo: f64,
    hi: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self::UNIT
    }
}

impl Domain {
    pub const UNIT: Domain = Domain { lo: 0.0, hi: 1.0 };

    /// Build a domain, or `None` when the bounds are not finite or do not
    /// span a positive width.
    pub fn new(lo: f64, hi: f64) -> Option<Self> {
        if lo.is_finite() && hi.is_finite() && lo < hi {
            Some(Self { lo, hi })
        } else {
            None
        }
    }

    /// `[min, max]` of `values`, falling back to `[0, 1]` when that is
    /// degenerate (empty input or all values equal).
    pub fn extent(values: &[f64]) -> Self {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        Self::new(min, max).unwrap_or(Self::UNIT)
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn midpoint(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    /// Pin `v` into the domain so outliers render at the extremes.
    pub fn clamp(&self, v: f64) -> f64 {
        if v.is_nan() {
            return self.lo;
        }
        v.clamp(self.lo, self.hi)
    }

    /// Position of the clamped `v` within the domain, in `[0, 1]`.
    pub fn normalize(&self, v: f64) -> f64 {
        (self.clamp(v) - self.lo) / (self.hi - self.lo)
    }
}

/// Percentile-based domain that keeps outliers from stretching the scale.
///
/// Uses the `lo_q` / `hi_q` percentiles when at least
/// [`MIN_QUANTILE_SAMPLES`] values exist and the two differ; otherwise the
/// `[min, max]` extent; otherwise `[0, 1]`.
pub fn quantile_domain(values: &[f64], lo_q: f64, hi_q: f64) -> Domain {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    if sorted.len() >= MIN_QUANTILE_SAMPLES {
        let lo = quantile(&sorted, lo_q);
        let hi = quantile(&sorted, hi_q);
        if let (Some(lo), Some(hi)) = (lo, hi) {
            if let Some(domain) = Domain::new(lo, hi) {
                return domain;
            }
        }
    }
    Domain::extent(&sorted)
}

/// [`quantile_domain`] with the 10th / 90th percentiles.
pub fn default_quantile_domain(values: &[f64]) -> Domain {
    quantile_domain(values, DEFAULT_LOW_QUANTILE, DEFAULT_HIGH_QUANTILE)
}
