//! Piecewise-linear scalar ranges keyed at fixed fractional breakpoints.

use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arithmetic failures raised by range operators.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// A range was divided by zero.
    #[error("range divided by zero")]
    DivideByZero,
}

/// Interpolates between `a` and `b`, clamping `t` to `[0, 1]`.
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Fraction of `value` between `a` and `b`, unclamped; zero when `a == b`.
#[must_use]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Cubic Hermite interpolation between `from` and `to` with `t` clamped to `[0, 1]`.
#[must_use]
pub fn smooth_step(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let t = t * t * (3.0 - 2.0 * t);
    from + (to - from) * t
}

/// Two-point range spanning `min..=max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFloat2 {
    /// Lower control point.
    pub min: f32,
    /// Upper control point.
    pub max: f32,
}

impl RangeFloat2 {
    /// Range collapsed onto zero.
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// Symmetric unit range.
    pub const NORM: Self = Self::new(-1.0, 1.0);

    /// Creates a range from its control points.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Value at fraction `t` along the range.
    #[must_use]
    pub fn lerp(&self, t: f32) -> f32 {
        lerp(self.min, self.max, t)
    }

    /// Fraction at which the range reaches `value`.
    #[must_use]
    pub fn inverse_lerp(&self, value: f32) -> f32 {
        inverse_lerp(self.min, self.max, value)
    }

    /// Restricts `value` to `min..=max`.
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }

    /// Inclusive membership test.
    #[must_use]
    pub fn is_include(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    /// Reports whether the control points are ordered.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.min <= self.max
    }
}

/// Three-point range with breakpoints at 0, 0.5 and 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFloat3 {
    /// Control point at fraction 0.
    pub min: f32,
    /// Control point at fraction 0.5.
    pub mid: f32,
    /// Control point at fraction 1.
    pub max: f32,
}

impl RangeFloat3 {
    /// Range collapsed onto zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Symmetric unit range.
    pub const NORM: Self = Self::new(-1.0, 0.0, 1.0);

    /// Creates a range from its control points.
    #[must_use]
    pub const fn new(min: f32, mid: f32, max: f32) -> Self {
        Self { min, mid, max }
    }

    /// Value at fraction `t`, interpolating within the segment containing `t`.
    #[must_use]
    pub fn lerp(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t < 0.5 {
            lerp(self.min, self.mid, t * 2.0)
        } else {
            lerp(self.mid, self.max, (t - 0.5) * 2.0)
        }
    }

    /// Fraction at which the range reaches `value`.
    #[must_use]
    pub fn inverse_lerp(&self, value: f32) -> f32 {
        if value < self.mid {
            inverse_lerp(self.min, self.mid, value) / 2.0
        } else {
            inverse_lerp(self.mid, self.max, value) / 2.0 + 0.5
        }
    }

    /// Restricts `value` to `min..=max`.
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }

    /// Inclusive membership test.
    #[must_use]
    pub fn is_include(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    /// Reports whether the control points are ordered.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.min <= self.mid && self.mid <= self.max
    }
}

/// Four-point range with breakpoints at 0, 1/3, 2/3 and 1.
///
/// Attack reach uses the inner points as the edges of the full-strength band:
/// `midl..=midg` hits at base probability and falloff begins past `midg`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFloat4 {
    /// Control point at fraction 0.
    pub min: f32,
    /// Control point at fraction 1/3.
    pub midl: f32,
    /// Control point at fraction 2/3.
    pub midg: f32,
    /// Control point at fraction 1.
    pub max: f32,
}

impl RangeFloat4 {
    /// Range collapsed onto zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// Symmetric unit range.
    pub const NORM: Self = Self::new(-1.0, -1.0 / 3.0, 1.0 / 3.0, 1.0);

    /// Creates a range from its control points.
    #[must_use]
    pub const fn new(min: f32, midl: f32, midg: f32, max: f32) -> Self {
        Self {
            min,
            midl,
            midg,
            max,
        }
    }

    /// Value at fraction `t`, interpolating within the segment containing `t`.
    #[must_use]
    pub fn lerp(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t < 1.0 / 3.0 {
            lerp(self.min, self.midl, t * 3.0)
        } else if t < 2.0 / 3.0 {
            lerp(self.midl, self.midg, t * 3.0 - 1.0)
        } else {
            lerp(self.midg, self.max, t * 3.0 - 2.0)
        }
    }

    /// Fraction at which the range reaches `value`.
    #[must_use]
    pub fn inverse_lerp(&self, value: f32) -> f32 {
        if value < self.midl {
            inverse_lerp(self.min, self.midl, value) / 3.0
        } else if value < self.midg {
            inverse_lerp(self.midl, self.midg, value) / 3.0 + 1.0 / 3.0
        } else {
            inverse_lerp(self.midg, self.max, value) / 3.0 + 2.0 / 3.0
        }
    }

    /// Restricts `value` to `min..=max`.
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }

    /// Inclusive membership test.
    #[must_use]
    pub fn is_include(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    /// Reports whether the control points are ordered.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.min <= self.midl && self.midl <= self.midg && self.midg <= self.max
    }
}

macro_rules! range_ops {
    ($range:ident { $($field:ident),+ }) => {
        impl Add for $range {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl Sub for $range {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl Add<f32> for $range {
            type Output = Self;

            fn add(self, rhs: f32) -> Self {
                Self { $($field: self.$field + rhs),+ }
            }
        }

        impl Sub<f32> for $range {
            type Output = Self;

            fn sub(self, rhs: f32) -> Self {
                Self { $($field: self.$field - rhs),+ }
            }
        }

        impl Mul<f32> for $range {
            type Output = Self;

            fn mul(self, rhs: f32) -> Self {
                Self { $($field: self.$field * rhs),+ }
            }
        }

        impl Div<f32> for $range {
            type Output = Result<Self, RangeError>;

            fn div(self, rhs: f32) -> Self::Output {
                if rhs == 0.0 {
                    return Err(RangeError::DivideByZero);
                }
                Ok(Self { $($field: self.$field / rhs),+ })
            }
        }
    };
}

range_ops!(RangeFloat2 { min, max });
range_ops!(RangeFloat3 { min, mid, max });
range_ops!(RangeFloat4 { min, midl, midg, max });
