//! Easing curves applied to transition progress.

use serde::{Deserialize, Serialize};

/// Easing function variants for connector transitions.
///
/// `Linear` matches plain SVG `<animate>` timing and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Easing {
    #[default]
    Linear,
    /// Slow start, fast end.
    QuadraticIn,
    /// Fast start, slow end.
    QuadraticOut,
    /// `c1·3t(1-t)² + c2·3(1-t)t² + t³`
    CubicHermite { c1: f32, c2: f32 },
}

impl Easing {
    /// Eased progress for raw progress `t`; `t` is clamped to `[0, 1]`.
    #[inline]
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Easing::CubicHermite { c1, c2 } => {
                let omt = 1.0 - t;
                c1 * 3.0 * t * omt * omt + c2 * 3.0 * omt * t * t + t * t * t
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity_inside_unit_range() {
        assert_eq!(Easing::Linear.evaluate(0.0), 0.0);
        assert_eq!(Easing::Linear.evaluate(0.25), 0.25);
        assert_eq!(Easing::Linear.evaluate(1.0), 1.0);
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::QuadraticIn.evaluate(-1.0), 0.0);
        assert_eq!(Easing::QuadraticOut.evaluate(2.0), 1.0);
    }

    #[test]
    fn hermite_reaches_both_endpoints() {
        let hermite = Easing::CubicHermite { c1: 0.33, c2: 1.0 };
        assert_eq!(hermite.evaluate(0.0), 0.0);
        assert!((hermite.evaluate(1.0) - 1.0).abs() < 1e-6);
        assert!(hermite.evaluate(0.25) > 0.25);
    }
}
