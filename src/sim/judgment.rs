//! Timing judgment tiers and window classification
//!
//! All comparisons are strict: a difference exactly on a bound belongs
//! to the next, looser tier.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Outcome of an input relative to a note (best first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgment {
    Perfect,
    Great,
    Ok,
    Miss,
}

impl Judgment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Judgment::Perfect => "PERFECT",
            Judgment::Great => "GREAT",
            Judgment::Ok => "OK",
            Judgment::Miss => "MISS",
        }
    }

    /// True for every tier that keeps the combo alive
    #[inline]
    pub fn is_hit(&self) -> bool {
        !matches!(self, Judgment::Miss)
    }
}

/// Why a set of windows was rejected
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WindowError {
    #[error("judgment window bound must be positive, got {0}")]
    NonPositive(f64),
    #[error("judgment windows must strictly increase ({lower} >= {upper})")]
    NotIncreasing { lower: f64, upper: f64 },
}

/// Ordered absolute time-difference bounds in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgmentWindows {
    pub perfect_ms: f64,
    pub great_ms: f64,
    pub ok_ms: f64,
    pub miss_ms: f64,
}

impl Default for JudgmentWindows {
    fn default() -> Self {
        Self {
            perfect_ms: PERFECT_WINDOW_MS,
            great_ms: GREAT_WINDOW_MS,
            ok_ms: OK_WINDOW_MS,
            miss_ms: MISS_WINDOW_MS,
        }
    }
}

impl JudgmentWindows {
    /// Build a window set, rejecting bounds that are not strictly increasing
    pub fn new(perfect_ms: f64, great_ms: f64, ok_ms: f64, miss_ms: f64) -> Result<Self, WindowError> {
        let windows = Self {
            perfect_ms,
            great_ms,
            ok_ms,
            miss_ms,
        };
        windows.validate()?;
        Ok(windows)
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        let bounds = [self.perfect_ms, self.great_ms, self.ok_ms, self.miss_ms];
        // NaN fails this check too
        if !(bounds[0] > 0.0) {
            return Err(WindowError::NonPositive(bounds[0]));
        }
        for pair in bounds.windows(2) {
            if !(pair[0] < pair[1]) {
                return Err(WindowError::NotIncreasing {
                    lower: pair[0],
                    upper: pair[1],
                });
            }
        }
        Ok(())
    }

    /// Whether a difference is close enough to resolve a note at all
    #[inline]
    pub fn in_range(&self, diff_ms: f64) -> bool {
        diff_ms.abs() < self.miss_ms
    }

    /// Classify a signed or absolute timing difference
    pub fn classify(&self, diff_ms: f64) -> Judgment {
        let d = diff_ms.abs();
        if d < self.perfect_ms {
            Judgment::Perfect
        } else if d < self.great_ms {
            Judgment::Great
        } else if d < self.ok_ms {
            Judgment::Ok
        } else {
            Judgment::Miss
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tiers() {
        let w = JudgmentWindows::default();
        assert_eq!(w.classify(0.0), Judgment::Perfect);
        assert_eq!(w.classify(69.9), Judgment::Perfect);
        assert_eq!(w.classify(-100.0), Judgment::Great);
        assert_eq!(w.classify(150.0), Judgment::Ok);
        assert_eq!(w.classify(200.0), Judgment::Miss);
    }

    #[test]
    fn test_bounds_are_strict() {
        let w = JudgmentWindows::default();
        assert_eq!(w.classify(70.0), Judgment::Great);
        assert_eq!(w.classify(120.0), Judgment::Ok);
        assert_eq!(w.classify(170.0), Judgment::Miss);
        assert!(w.in_range(239.0));
        assert!(!w.in_range(240.0));
    }

    #[test]
    fn test_rejects_unordered_windows() {
        assert!(JudgmentWindows::new(70.0, 120.0, 170.0, 240.0).is_ok());
        assert_eq!(
            JudgmentWindows::new(70.0, 70.0, 170.0, 240.0),
            Err(WindowError::NotIncreasing {
                lower: 70.0,
                upper: 70.0
            })
        );
        assert!(JudgmentWindows::new(0.0, 10.0, 20.0, 30.0).is_err());
        assert!(JudgmentWindows::new(f64::NAN, 10.0, 20.0, 30.0).is_err());
    }
}
