//! Finite difference check of analytic gradients.
#![allow(dead_code)]

/// Compares analytic gradients with central differences of a loss.
///
/// A component passes if `|computed - estimated| <= threshold * scale` with
/// `scale = max(|computed|, |estimated|, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct GradientChecker {
    pub stepsize: f32,
    pub threshold: f32,
    /// Components within `range` of `point` are skipped, for losses with a kink.
    pub kink: Option<(f32, f32)>,
}

impl GradientChecker {
    pub fn new(stepsize: f32, threshold: f32) -> GradientChecker {
        GradientChecker { stepsize: stepsize, threshold: threshold, kink: None }
    }

    pub fn with_kink(mut self, point: f32, range: f32) -> GradientChecker {
        self.kink = Some((point, range));
        self
    }

    /// Checks every component of `computed` against the loss around `input`.
    ///
    /// `loss` has to be the same function whose gradient at `input` is `computed`.
    pub fn check_gradient_exhaustive<F>(&self, input: &[f32], computed: &[f32], mut loss: F)
        where F: FnMut(&[f32]) -> f32
    {
        assert_eq!(input.len(), computed.len());
        let mut probe = input.to_vec();
        for i in 0..input.len() {
            if let Some((point, range)) = self.kink {
                if (input[i] - point).abs() < range {
                    continue;
                }
            }
            probe[i] = input[i] + self.stepsize;
            let positive = loss(&probe);
            probe[i] = input[i] - self.stepsize;
            let negative = loss(&probe);
            probe[i] = input[i];

            let estimated = (positive - negative) / (2f32 * self.stepsize);
            let scale = computed[i].abs().max(estimated.abs()).max(1f32);
            assert!((computed[i] - estimated).abs() <= self.threshold * scale,
                    "gradient {} of input {}: computed {}, estimated {}", i, input[i], computed[i], estimated);
        }
    }
}
