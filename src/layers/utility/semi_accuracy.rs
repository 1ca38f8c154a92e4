//! Reports how many samples of a batch are classified with the right sign.
//!
//! A sample is predicted positive if its score is greater than `0` and negative
//! otherwise. The prediction is compared to the strong label codes of the
//! [LabelEncoding][1]; bag codes never match.
//!
//! The accuracy is a monitoring statistic only. It should not be used as a loss
//! and has no backward pass.
//!
//! [1]: ../../loss/semi_loss/enum.LabelEncoding.html
use std::fmt;
use co::backend::Backend;
use co::frameworks::Native;
use co::SharedTensor;
use error::Error;
use layer::*;
use layers::loss::semi_loss::LabelEncoding;
use util::{native_slice, write_native};

#[derive(Debug, Clone, Copy)]
/// SemiAccuracy Utility Layer
pub struct SemiAccuracy {
    encoding: LabelEncoding,
}

impl SemiAccuracy {
    /// Create a SemiAccuracy layer from a SemiAccuracyConfig.
    pub fn from_config(config: &SemiAccuracyConfig) -> SemiAccuracy {
        SemiAccuracy {
            encoding: config.encoding,
        }
    }

    /// The label code predicted for a score.
    pub fn predict(&self, score: f32) -> f32 {
        if score > 0f32 {
            self.encoding.positive_code()
        } else {
            self.encoding.negative_code()
        }
    }

    /// Compare the sign predictions of `scores` to `labels`.
    ///
    /// Only the first `labels.len()` scores are used.
    pub fn evaluate(&self, scores: &[f32], labels: &[f32]) -> Accuracy {
        let num_correct = scores.iter().zip(labels.iter())
            .filter(|&(&score, &label)| self.predict(score) == label)
            .count();
        Accuracy { num_samples: labels.len(), num_correct: num_correct }
    }
}

impl ILayer for SemiAccuracy {
    fn type_name(&self) -> &'static str {
        "SemiAccuracy"
    }

    fn exact_num_inputs(&self) -> Option<usize> {
        Some(2)
    }

    fn reshape(&mut self, input_shapes: &[Vec<usize>]) -> Result<Vec<usize>, Error> {
        if input_shapes.len() != 2 {
            return Err(Error::ShapeMismatch(format!("SemiAccuracy layer takes 2 inputs, got {}", input_shapes.len())));
        }
        let num = input_shapes[0].first().cloned().unwrap_or(1);
        if input_shapes[1].first() != Some(&num) {
            return Err(Error::ShapeMismatch(format!(
                "The data and label should have the same number: {:?} and {:?}", input_shapes[0], input_shapes[1])));
        }
        if input_shapes[1].iter().skip(1).any(|&dim| dim != 1) {
            return Err(Error::ShapeMismatch(format!("label has to hold one value per sample, got shape {:?}", input_shapes[1])));
        }
        if input_shapes[0].iter().skip(1).any(|&dim| dim != 1) {
            return Err(Error::ShapeMismatch(format!("SemiAccuracy needs one score per sample, got shape {:?}", input_shapes[0])));
        }
        Ok(vec![1])
    }

    fn compute_output(&mut self,
                      backend: &Backend<Native>,
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut SharedTensor<f32>) -> Result<(), Error> {
        let scores = try!(native_slice(backend, input_data[0]));
        let labels = try!(native_slice(backend, input_data[1]));

        let accuracy = self.evaluate(scores, labels);
        debug!("SemiAccuracy: {}", accuracy);
        write_native(backend, output_data, &[accuracy.ratio()])
    }
}

#[derive(Debug, Clone, Copy)]
/// Specifies configuration parameters for a SemiAccuracy Layer.
pub struct SemiAccuracyConfig {
    /// The encoding that defines the positive and negative label codes.
    ///
    /// Default: SingleSign (`-1` positive, `-2` negative)
    pub encoding: LabelEncoding,
}

impl Default for SemiAccuracyConfig {
    fn default() -> SemiAccuracyConfig {
        SemiAccuracyConfig { encoding: LabelEncoding::SingleSign }
    }
}

impl Into<LayerType> for SemiAccuracyConfig {
    fn into(self) -> LayerType {
        LayerType::SemiAccuracy(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The accuracy of the sign predictions of a batch.
pub struct Accuracy {
    num_samples: usize,
    num_correct: usize,
}

impl Accuracy {
    /// Number of evaluated samples.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of correctly predicted samples.
    pub fn num_correct(&self) -> usize {
        self.num_correct
    }

    /// Fraction of correct predictions in `[0, 1]`; `0` for an empty batch.
    pub fn ratio(&self) -> f32 {
        if self.num_samples == 0 {
            return 0f32;
        }
        (self.num_correct as f32) / (self.num_samples as f32)
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}/{:?} = {:.2?}%", self.num_correct, self.num_samples, self.ratio() * 100f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layers::loss::semi_loss::LabelEncoding;

    #[test]
    fn predicts_sign_codes() {
        let layer = SemiAccuracy::from_config(&SemiAccuracyConfig::default());
        assert_eq!(-1f32, layer.predict(0.5f32));
        assert_eq!(-2f32, layer.predict(0f32));
        assert_eq!(-2f32, layer.predict(-3f32));

        let layer = SemiAccuracy::from_config(&SemiAccuracyConfig { encoding: LabelEncoding::PerSampleWeight });
        assert_eq!(1f32, layer.predict(0.5f32));
        assert_eq!(-1f32, layer.predict(-0.5f32));
    }

    #[test]
    fn counts_matching_predictions() {
        let layer = SemiAccuracy::from_config(&SemiAccuracyConfig::default());
        let accuracy = layer.evaluate(&[1f32, -1., 2., 0.], &[-1f32, -1., 3., -2.]);
        assert_eq!(4, accuracy.num_samples());
        assert_eq!(2, accuracy.num_correct());
        assert_eq!(0.5f32, accuracy.ratio());
        assert_eq!("2/4 = 50.00%", format!("{}", accuracy));
    }

    #[test]
    fn empty_batch_has_zero_accuracy() {
        let layer = SemiAccuracy::from_config(&SemiAccuracyConfig::default());
        assert_eq!(0f32, layer.evaluate(&[], &[]).ratio());
    }

    #[test]
    fn has_no_backward_pass() {
        let layer = SemiAccuracy::from_config(&SemiAccuracyConfig::default());
        assert!(!layer.is_loss());
    }
}
