//! Provides the scalar math used by the semi-supervised layers.
//!
//! The logistic terms are evaluated piecewise so that large scores never reach
//! `exp` and overflow: beyond `±LOGISTIC_CUTOFF` the asymptotic value is used.

/// Scores beyond this magnitude use the asymptotic logistic branch.
pub const LOGISTIC_CUTOFF: f32 = 20f32;

/// The logistic function `1 / (1 + e^(-x))`.
pub fn sigmoid(x: f32) -> f32 {
    1f32 / (1f32 + (-x).exp())
}

/// Loss of a sample that should be positive: `-log(sigmoid(x))`.
pub fn positive_logistic_loss(x: f32) -> f32 {
    if x > LOGISTIC_CUTOFF {
        0f32
    } else if x < -LOGISTIC_CUTOFF {
        -x
    } else {
        (-x).exp().ln_1p()
    }
}

/// Loss of a sample that should be negative: `-log(sigmoid(-x))`.
pub fn negative_logistic_loss(x: f32) -> f32 {
    if x > LOGISTIC_CUTOFF {
        x
    } else if x < -LOGISTIC_CUTOFF {
        0f32
    } else {
        x.exp().ln_1p()
    }
}

/// Derivative of [positive_logistic_loss](fn.positive_logistic_loss.html): `sigmoid(x) - 1`.
///
/// Evaluated as `-sigmoid(-x)`, which does not cancel to zero for large `x`.
pub fn positive_logistic_gradient(x: f32) -> f32 {
    if x > LOGISTIC_CUTOFF {
        0f32
    } else if x < -LOGISTIC_CUTOFF {
        -1f32
    } else {
        -sigmoid(-x)
    }
}

/// Derivative of [negative_logistic_loss](fn.negative_logistic_loss.html): `1 - sigmoid(-x)`,
/// evaluated as `sigmoid(x)`.
pub fn negative_logistic_gradient(x: f32) -> f32 {
    if x > LOGISTIC_CUTOFF {
        1f32
    } else if x < -LOGISTIC_CUTOFF {
        0f32
    } else {
        sigmoid(x)
    }
}

/// Sign of `x` as used for L1 gradients; `0` maps to `0`.
pub fn sign(x: f32) -> f32 {
    if x > 0f32 {
        1f32
    } else if x < 0f32 {
        -1f32
    } else {
        0f32
    }
}

/// Sum of absolute values.
pub fn asum(x: &[f32]) -> f32 {
    x.iter().fold(0f32, |sum, &val| sum + val.abs())
}

/// Dot product of two slices of equal length.
pub fn dot(x: &[f32], y: &[f32]) -> f32 {
    x.iter().zip(y.iter()).fold(0f32, |sum, (&a, &b)| sum + a * b)
}
