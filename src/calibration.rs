//! Axis calibration and value classification.
//!
//! Every axis sample is reduced to a tri-state [`Direction`] before it reaches a
//! mapping. Digital axes (hat-like axes reporting `-1/0/1`) classify by sign;
//! analog axes compare the raw value against the per-direction thresholds held
//! in an [`AxisPair`] of [`Calibration`]s.
//!
//! ## Default thresholds
//! [`auto_calibrate`] splits the logical range 25/50/25: the negative threshold
//! sits halfway between `minimum` and the center, the positive threshold halfway
//! between the center and `maximum`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logical state of an axis after classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Negative,
    #[default]
    Centered,
    Positive,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Negative => "negative",
            Direction::Centered => "centered",
            Direction::Positive => "positive",
        }
    }
}

/// Per-direction calibration.
///
/// Only `threshold` takes part in classification. `deadzone`, `fuzz` and
/// `invert` are carried for consumers that post-process analog values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub threshold: i32,
    pub deadzone: i32,
    pub fuzz: i32,
    pub invert: bool,
}

/// A negative/positive pair, used for both calibration and mappings of an axis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisPair<T> {
    pub negative: T,
    pub positive: T,
}

impl<T> AxisPair<T> {
    /// Side for `direction`, `None` for [`Direction::Centered`].
    pub fn get(&self, direction: Direction) -> Option<&T> {
        match direction {
            Direction::Negative => Some(&self.negative),
            Direction::Positive => Some(&self.positive),
            Direction::Centered => None,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> Option<&mut T> {
        match direction {
            Direction::Negative => Some(&mut self.negative),
            Direction::Positive => Some(&mut self.positive),
            Direction::Centered => None,
        }
    }
}

/// Rejected calibration input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("invalid axis range: minimum {minimum} is not below maximum {maximum}")]
    InvalidRange { minimum: i32, maximum: i32 },

    #[error("threshold {threshold} outside axis range [{minimum}, {maximum}]")]
    ThresholdOutOfRange {
        threshold: i32,
        minimum: i32,
        maximum: i32,
    },

    #[error(
        "thresholds must bracket the center {center}: negative {negative}, positive {positive}"
    )]
    ThresholdsInverted {
        negative: i32,
        positive: i32,
        center: i32,
    },
}

/// How discovery decides whether an axis is digital.
///
/// The zero-metadata heuristic (no fuzz, flat or resolution) misreads analog
/// triggers on some pads, so it only runs when explicitly enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalPolicy {
    pub zero_metadata_heuristic: bool,
}

impl DigitalPolicy {
    pub fn is_digital(
        &self,
        minimum: i32,
        maximum: i32,
        fuzz: i32,
        flat: i32,
        resolution: i32,
    ) -> bool {
        if is_digital_range(minimum, maximum) {
            return true;
        }
        self.zero_metadata_heuristic && fuzz == 0 && flat == 0 && resolution == 0
    }
}

/// `true` when the logical range is exactly `{-1, 0, 1}`.
#[inline]
pub fn is_digital_range(minimum: i32, maximum: i32) -> bool {
    minimum == -1 && maximum == 1
}

#[inline]
fn midpoint(low: i64, high: i64) -> i64 {
    low + (high - low) / 2
}

/// Center point of a logical range.
pub fn center(minimum: i32, maximum: i32) -> i32 {
    midpoint(minimum as i64, maximum as i64) as i32
}

/// Default thresholds for a range (25/50/25 split).
pub fn auto_calibrate(minimum: i32, maximum: i32) -> AxisPair<Calibration> {
    let (min, max) = (minimum as i64, maximum as i64);
    let mid = midpoint(min, max);
    let mut negative = midpoint(min, mid);
    let mut positive = midpoint(mid, max);
    // Small ranges: keep the center itself classified as centered.
    if positive <= mid {
        positive = (mid + 1).min(max);
    }
    if negative == mid && mid > min {
        negative = mid - 1;
    }
    AxisPair {
        negative: Calibration {
            threshold: negative as i32,
            ..Calibration::default()
        },
        positive: Calibration {
            threshold: positive as i32,
            ..Calibration::default()
        },
    }
}

/// Check explicit thresholds against a range.
pub fn validate_thresholds(
    minimum: i32,
    maximum: i32,
    negative: i32,
    positive: i32,
) -> Result<(), CalibrationError> {
    if minimum >= maximum {
        return Err(CalibrationError::InvalidRange { minimum, maximum });
    }
    for threshold in [negative, positive] {
        if threshold < minimum || threshold > maximum {
            return Err(CalibrationError::ThresholdOutOfRange {
                threshold,
                minimum,
                maximum,
            });
        }
    }
    let center = center(minimum, maximum);
    if negative > center || positive < center {
        return Err(CalibrationError::ThresholdsInverted {
            negative,
            positive,
            center,
        });
    }
    Ok(())
}

/// Classify a raw sample.
pub fn classify(digital: bool, calibration: &AxisPair<Calibration>, raw: i32) -> Direction {
    if digital {
        return match raw.signum() {
            -1 => Direction::Negative,
            1 => Direction::Positive,
            _ => Direction::Centered,
        };
    }
    if raw <= calibration.negative.threshold {
        Direction::Negative
    } else if raw >= calibration.positive.threshold {
        Direction::Positive
    } else {
        Direction::Centered
    }
}
