//! Chart pattern detectors
//!
//! One detector per catalog pattern. Each is a plain struct of thresholds (defaults
//! come from the module-level constants) implementing [`ChartDetector`](crate::ChartDetector).
//!
//! # Pattern Families
//!
//! - **Reversal (3)**: Head & Shoulders, Double Bottom, Triple Top
//! - **Triangle (3)**: Ascending Triangle, Symmetrical Triangle, Rising Wedge
//! - **Continuation (2)**: Bullish Flag, Cup and Handle

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod continuation;
pub mod reversal;
pub mod triangle;

// Re-export all detectors for convenience
pub use continuation::*;
pub use helpers::*;
pub use reversal::*;
pub use triangle::*;
