//! Parameter metadata for pattern detectors
//!
//! This module provides metadata about detector thresholds, enabling:
//! - Per-deployment overrides without touching detector bodies
//! - Grid search optimization
//! - Parameter documentation
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use chartform::prelude::*;
//!
//! // Get parameter metadata for a detector
//! for param in DoubleBottomDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! // Tighten the trough tolerance, keep every other default
//! let mut overrides = HashMap::new();
//! overrides.insert("trough_tolerance", 0.02);
//! let detector = DoubleBottomDetector::with_params(&overrides).unwrap();
//! assert_eq!(detector.trough_tolerance.get(), 0.02);
//! ```

use std::collections::HashMap;

use crate::{PatternError, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Ratio value (0.0..=1.0)
    Ratio,
    /// Period value (positive integer)
    Period,
    /// Wall-clock duration in hours (non-negative)
    Hours,
    /// Level on the 0..=100 scale (RSI thresholds, confidence floors)
    Level,
    /// Unbounded real value (slopes)
    Scalar,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name (e.g., "shoulder_tolerance")
    pub name: &'static str,
    pub param_type: ParamType,
    pub default: f64,
    /// Range for optimization: (min, max, step)
    pub range: (f64, f64, f64),
    /// Human-readable description
    pub description: &'static str,
}

impl ParamMeta {
    /// Create a new ParamMeta for a Ratio parameter
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Ratio, default, range, description }
    }

    /// Create a new ParamMeta for a Period parameter
    pub const fn period(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Period, default, range, description }
    }

    /// Create a new ParamMeta for an Hours parameter
    pub const fn hours(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Hours, default, range, description }
    }

    /// Create a new ParamMeta for a Level parameter
    pub const fn level(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Level, default, range, description }
    }

    /// Create a new ParamMeta for a Scalar parameter
    pub const fn scalar(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Scalar, default, range, description }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        let mut values = Vec::new();
        let mut v = min;
        while v <= max + f64::EPSILON {
            values.push(v);
            v += step;
        }
        values
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max, _) = self.range;
        if value < min || value > max {
            return Err(PatternError::OutOfRange { field: self.name, value, min, max });
        }
        match self.param_type {
            ParamType::Ratio => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(PatternError::InvalidValue("Ratio must lie in [0, 1]"));
                }
                Ok(())
            },
            ParamType::Period => {
                if value < 1.0 || value.fract() != 0.0 {
                    return Err(PatternError::InvalidValue("Period must be a positive integer"));
                }
                Ok(())
            },
            ParamType::Hours => {
                if value < 0.0 {
                    return Err(PatternError::InvalidValue("Hours cannot be negative"));
                }
                Ok(())
            },
            ParamType::Level => {
                if !(0.0..=100.0).contains(&value) {
                    return Err(PatternError::InvalidValue("Level must lie in [0, 100]"));
                }
                Ok(())
            },
            ParamType::Scalar => Ok(()),
        }
    }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
///
/// Implementing this trait enables:
/// - Discovery of available parameters
/// - Creation of detectors with custom parameter values
/// - Grid search optimization
pub trait ParameterizedDetector: Sized {
    /// Returns metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Creates a detector with parameters from a HashMap
    ///
    /// Missing parameters use their default values.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

    /// Returns the pattern label
    fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
    let value = params.get(key).copied().unwrap_or(default);
    Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
    let value = params.get(key).copied().unwrap_or(default as f64);
    if value < 1.0 || value.fract() != 0.0 {
        return Err(PatternError::InvalidValue("Period must be a positive integer"));
    }
    Period::new(value as usize)
}

/// Helper to get an hours value from params with default fallback
pub fn get_hours(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
    let value = params.get(key).copied().unwrap_or(default);
    if !value.is_finite() || value < 0.0 {
        return Err(PatternError::InvalidValue("Hours must be finite and non-negative"));
    }
    Ok(value)
}

/// Helper to get a 0..=100 level from params with default fallback
pub fn get_level(params: &HashMap<&str, f64>, key: &'static str, default: f64) -> Result<f64> {
    let value = params.get(key).copied().unwrap_or(default);
    if !(0.0..=100.0).contains(&value) {
        return Err(PatternError::OutOfRange { field: key, value, min: 0.0, max: 100.0 });
    }
    Ok(value)
}

/// Helper to get an unbounded value from params with default fallback
pub fn get_scalar(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
    let value = params.get(key).copied().unwrap_or(default);
    if !value.is_finite() {
        return Err(PatternError::InvalidValue("Scalar cannot be NaN or infinite"));
    }
    Ok(value)
}

// ============================================================
// TESTS
// ============================================================
