//! Computes the semi-supervised loss of a batch of binary scores.
//!
//! Every sample of the batch carries one raw score (no activation applied) and
//! a label code. Depending on the [LabelEncoding][1] the label code marks the
//! sample as
//!
//! - a strongly labeled __positive__,
//! - a strongly labeled __negative__, or
//! - a member of a weakly labeled __bag__: a group of samples known to contain
//!   at least one positive, without knowing which one.
//!
//! Each bag is resolved to its __representative__, the member with the highest
//! score. Only the representative contributes to the loss, as if it were a
//! positive sample.
//!
//! The loss of a batch is the sum of three independently normalized logistic
//! terms:
//!
//! ```text
//! loss = sum_p(w_p * -log(sigmoid(x))) / num_positive
//!      + sum_n(w_n * -log(sigmoid(-x))) / num_negative
//!      + sum_b(w_b * -log(sigmoid(x_rep))) / num_bags
//! ```
//!
//! where the per-sample weights `w` are `1` or the configured `alpha`, `beta`
//! and `gamma` (see [GroupWeighting][2]). A group without members contributes
//! nothing.
//!
//! The layer also provides a plain norm loss ([SemiLossMode::Norm][3]), which
//! ignores the labels and computes the L1 or L2 norm of its input per sample.
//!
//! The weights and counts of the last forward pass are kept in the layer and
//! are consumed by the following backward pass. A backward pass always refers
//! to the most recent forward pass of the same layer.
//!
//! [1]: ./enum.LabelEncoding.html
//! [2]: ./enum.GroupWeighting.html
//! [3]: ./enum.SemiLossMode.html
use std::str::FromStr;
use co::backend::Backend;
use co::frameworks::Native;
use co::SharedTensor;
use error::{ConfigurationError, Error};
use layer::*;
use math;
use util::{native_slice, write_native};

#[derive(Debug, Copy, Clone, PartialEq)]
/// The norm used by the plain norm loss.
pub enum Norm {
    /// Sum of absolute values; the gradient is the sign of the input.
    L1,
    /// Sum of squares; the gradient is twice the input.
    L2,
}

impl Norm {
    /// Create a Norm from the numeric code used in layer parameter files.
    ///
    /// `1` is `L1`, `2` is `L2`. Every other code is a configuration error.
    pub fn from_code(code: i32) -> Result<Norm, ConfigurationError> {
        match code {
            1 => Ok(Norm::L1),
            2 => Ok(Norm::L2),
            _ => Err(ConfigurationError::UnknownNorm(code.to_string())),
        }
    }
}

impl Default for Norm {
    fn default() -> Norm {
        Norm::L1
    }
}

impl FromStr for Norm {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Norm, ConfigurationError> {
        match s {
            "L1" | "l1" => Ok(Norm::L1),
            "L2" | "l2" => Ok(Norm::L2),
            _ => Err(ConfigurationError::UnknownNorm(s.to_owned())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
/// How the label codes of a batch are interpreted.
pub enum LabelEncoding {
    /// One label input. `-1` is positive, `-2` is negative and every value `>= 0`
    /// is a bag identifier.
    ///
    /// Consecutive samples with the same bag identifier form one bag, so the
    /// members of a bag have to be contiguous in the batch.
    SingleSign,
    /// One label input. `1` is positive, `-1` is negative and `0` marks a bag
    /// member.
    ///
    /// Bag members are not grouped, every one of them is a bag of its own.
    PerSampleWeight,
    /// Two label inputs. The class labels use `1`, `-1` and `0` like
    /// `PerSampleWeight`, the second input holds the bag identifier of each
    /// sample.
    ///
    /// Consecutive `0`-class samples with the same bag identifier form one bag.
    /// A negative bag identifier on a `0`-class sample makes it a bag of its own.
    DualLabel,
}

impl LabelEncoding {
    /// The label code of a strongly labeled positive sample.
    pub fn positive_code(&self) -> f32 {
        match *self {
            LabelEncoding::SingleSign => -1f32,
            LabelEncoding::PerSampleWeight | LabelEncoding::DualLabel => 1f32,
        }
    }

    /// The label code of a strongly labeled negative sample.
    pub fn negative_code(&self) -> f32 {
        match *self {
            LabelEncoding::SingleSign => -2f32,
            LabelEncoding::PerSampleWeight | LabelEncoding::DualLabel => -1f32,
        }
    }

    /// Number of label inputs that follow the scores.
    pub fn num_label_inputs(&self) -> usize {
        match *self {
            LabelEncoding::DualLabel => 2,
            _ => 1,
        }
    }

    fn classify(&self, label: f32, bag_id: Option<f32>) -> Class {
        if label == self.positive_code() {
            return Class::Positive;
        }
        if label == self.negative_code() {
            return Class::Negative;
        }
        match *self {
            LabelEncoding::SingleSign if label >= 0f32 => Class::Bag(Some(label)),
            LabelEncoding::PerSampleWeight if label == 0f32 => Class::Bag(None),
            LabelEncoding::DualLabel if label == 0f32 => {
                match bag_id {
                    Some(id) if id >= 0f32 => Class::Bag(Some(id)),
                    _ => Class::Bag(None),
                }
            }
            _ => Class::Ignored,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
/// The loss computed by a [SemiLoss](./struct.SemiLoss.html) layer.
pub enum SemiLossMode {
    /// L1 or L2 norm of the input, averaged over the samples. Labels are ignored.
    Norm,
    /// Logistic loss over positive, negative and bag groups.
    Logistic(LabelEncoding),
}

#[derive(Debug, Copy, Clone, PartialEq)]
/// Whether `alpha`, `beta` and `gamma` scale the group terms.
pub enum GroupWeighting {
    /// Every contributing sample has weight `1`.
    Unit,
    /// Positive samples are weighted by `alpha`, negative samples by `beta`
    /// and bag representatives by `gamma`.
    Configured,
}

#[derive(Debug, Copy, Clone)]
/// Specifies configuration parameters for a SemiLoss Layer.
pub struct SemiLossConfig {
    /// Weight of the positive group.
    ///
    /// Default: 1.0
    pub alpha: f32,
    /// Weight of the negative group.
    ///
    /// Default: 1.0
    pub beta: f32,
    /// Weight of the bag group.
    ///
    /// Default: 1.0
    pub gamma: f32,
    /// The norm of the plain norm loss.
    ///
    /// Default: L1
    pub norm: Norm,
    /// The loss that is computed.
    ///
    /// Default: Norm
    pub mode: SemiLossMode,
    /// Whether the group weights are applied.
    ///
    /// Default: Unit
    pub weighting: GroupWeighting,
}

impl Default for SemiLossConfig {
    fn default() -> SemiLossConfig {
        SemiLossConfig {
            alpha: 1f32,
            beta: 1f32,
            gamma: 1f32,
            norm: Norm::default(),
            mode: SemiLossMode::Norm,
            weighting: GroupWeighting::Unit,
        }
    }
}

impl SemiLossConfig {
    /// Create a SemiLossConfig for the plain norm loss.
    pub fn norm(norm: Norm) -> SemiLossConfig {
        SemiLossConfig { norm: norm, ..SemiLossConfig::default() }
    }

    /// Create a SemiLossConfig for the logistic loss with a label encoding.
    ///
    /// The per-sample weight encoding applies `alpha`, `beta` and `gamma`,
    /// the run-length encodings do not.
    pub fn logistic(encoding: LabelEncoding) -> SemiLossConfig {
        let weighting = match encoding {
            LabelEncoding::PerSampleWeight => GroupWeighting::Configured,
            LabelEncoding::SingleSign | LabelEncoding::DualLabel => GroupWeighting::Unit,
        };
        SemiLossConfig {
            mode: SemiLossMode::Logistic(encoding),
            weighting: weighting,
            ..SemiLossConfig::default()
        }
    }

    /// Set the group weights `alpha`, `beta` and `gamma`.
    ///
    /// The weights only take effect with `GroupWeighting::Configured`. The
    /// run-length encodings default to `GroupWeighting::Unit`, so set
    /// `weighting` as well to apply them there.
    pub fn with_weights(mut self, alpha: f32, beta: f32, gamma: f32) -> SemiLossConfig {
        self.alpha = alpha;
        self.beta = beta;
        self.gamma = gamma;
        self
    }

    /// Number of inputs a layer with this configuration takes.
    pub fn num_inputs(&self) -> usize {
        match self.mode {
            SemiLossMode::Norm => 2,
            SemiLossMode::Logistic(encoding) => 1 + encoding.num_label_inputs(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        for &(name, value) in &[("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !value.is_finite() || value < 0f32 {
                return Err(format!("{} has to be finite and non-negative, got {}", name, value));
            }
        }
        Ok(())
    }

    fn ignores_weights(&self) -> bool {
        match (self.mode, self.weighting) {
            (SemiLossMode::Logistic(_), GroupWeighting::Unit) => {
                self.alpha != 1f32 || self.beta != 1f32 || self.gamma != 1f32
            }
            _ => false,
        }
    }

    fn factors(&self) -> (f32, f32, f32) {
        match self.weighting {
            GroupWeighting::Unit => (1f32, 1f32, 1f32),
            GroupWeighting::Configured => (self.alpha, self.beta, self.gamma),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// One of the three partitions of a batch.
pub enum Group {
    /// Strongly labeled positive samples.
    Positive,
    /// Strongly labeled negative samples.
    Negative,
    /// Bag representatives.
    Bag,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Per-sample weights of the three groups from the last forward pass.
///
/// At most one of the three weights is nonzero at every index.
pub struct GroupWeights {
    /// Weights of the positive samples.
    pub positive: Vec<f32>,
    /// Weights of the negative samples.
    pub negative: Vec<f32>,
    /// Weights of the bag representatives.
    pub bag: Vec<f32>,
}

impl GroupWeights {
    fn reset(&mut self, num: usize) {
        for weights in &mut [&mut self.positive, &mut self.negative, &mut self.bag] {
            weights.clear();
            weights.resize(num, 0f32);
        }
    }

    /// The group of sample `index` and its weight, if it has a nonzero weight.
    pub fn group(&self, index: usize) -> Option<(Group, f32)> {
        if self.positive[index] != 0f32 {
            Some((Group::Positive, self.positive[index]))
        } else if self.negative[index] != 0f32 {
            Some((Group::Negative, self.negative[index]))
        } else if self.bag[index] != 0f32 {
            Some((Group::Bag, self.bag[index]))
        } else {
            None
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
/// Number of contributors per group in the last forward pass.
pub struct GroupCounts {
    /// Number of positive samples.
    pub num_positive: usize,
    /// Number of negative samples.
    pub num_negative: usize,
    /// Number of resolved bags.
    pub num_bags: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Class {
    Positive,
    Negative,
    /// A bag member; `None` is a bag of its own.
    Bag(Option<f32>),
    Ignored,
}

#[derive(Debug, Copy, Clone)]
struct OpenBag {
    key: Option<f32>,
    representative: usize,
    best: f32,
}

impl OpenBag {
    fn continues_with(&self, class: Class) -> bool {
        match (self.key, class) {
            (Some(key), Class::Bag(Some(other))) => key == other,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
/// SemiLoss Loss Layer
pub struct SemiLoss {
    config: SemiLossConfig,

    weights: GroupWeights,
    counts: GroupCounts,
    /// input of the last forward pass
    cached_input: Vec<f32>,
    num: usize,
}

impl SemiLoss {
    /// Create a SemiLoss layer from a SemiLossConfig.
    ///
    /// Panics if a group weight is negative or not finite, as such a layer
    /// can never be trained.
    pub fn from_config(config: &SemiLossConfig) -> SemiLoss {
        if let Err(msg) = config.validate() {
            panic!("Invalid SemiLoss configuration: {}", msg);
        }
        if config.ignores_weights() {
            warn!("SemiLoss weights alpha {}, beta {}, gamma {} are ignored under unit weighting",
                  config.alpha, config.beta, config.gamma);
        }
        SemiLoss {
            config: *config,
            weights: GroupWeights::default(),
            counts: GroupCounts::default(),
            cached_input: Vec::new(),
            num: 0,
        }
    }

    /// The configuration of the layer.
    pub fn config(&self) -> &SemiLossConfig {
        &self.config
    }

    /// Group weights of the last forward pass.
    pub fn group_weights(&self) -> &GroupWeights {
        &self.weights
    }

    /// Group counts of the last forward pass.
    pub fn group_counts(&self) -> GroupCounts {
        self.counts
    }

    /// Compute the loss of a batch.
    ///
    /// `labels` holds one code per sample, so its length is the number of
    /// samples. `bag_ids` is required by the dual-label encoding and ignored
    /// otherwise.
    ///
    /// Replaces the weights and counts of the previous forward pass.
    pub fn forward(&mut self, scores: &[f32], labels: &[f32], bag_ids: Option<&[f32]>) -> Result<f32, Error> {
        let num = labels.len();
        try!(self.check_lengths(scores.len(), num, bag_ids.map(|ids| ids.len())));

        self.num = num;
        self.cached_input.clear();
        self.cached_input.extend_from_slice(scores);
        self.weights.reset(num);
        self.counts = GroupCounts::default();

        let loss = match self.config.mode {
            SemiLossMode::Norm => self.forward_norm(),
            SemiLossMode::Logistic(encoding) => self.forward_logistic(encoding, labels, bag_ids),
        };
        debug!("SemiLoss forward: loss {} over {} samples ({:?})", loss, num, self.counts);
        Ok(loss)
    }

    /// Compute the gradient of the last forward pass with respect to the scores.
    ///
    /// `loss_weight` is the gradient flowing into the loss from above. The
    /// gradient has to have the length of the scores of the last forward pass.
    pub fn backward(&self, loss_weight: f32, gradient: &mut [f32]) -> Result<(), Error> {
        if gradient.len() != self.cached_input.len() {
            return Err(Error::ShapeMismatch(format!(
                "gradient of length {} does not fit the {} scores of the last forward pass",
                gradient.len(), self.cached_input.len())));
        }
        match self.config.mode {
            SemiLossMode::Norm => self.backward_norm(loss_weight, gradient),
            SemiLossMode::Logistic(_) => self.backward_logistic(loss_weight, gradient),
        }
        Ok(())
    }

    fn check_lengths(&self, num_scores: usize, num: usize, num_bag_ids: Option<usize>) -> Result<(), Error> {
        match self.config.mode {
            SemiLossMode::Norm => {
                if num == 0 && num_scores != 0 || num != 0 && num_scores % num != 0 {
                    return Err(Error::ShapeMismatch(format!(
                        "{} scores cannot be split into {} samples", num_scores, num)));
                }
            }
            SemiLossMode::Logistic(encoding) => {
                if num_scores != num {
                    return Err(Error::ShapeMismatch(format!(
                        "The data and label should have the same number: {} scores, {} labels", num_scores, num)));
                }
                if encoding == LabelEncoding::DualLabel && num_bag_ids != Some(num) {
                    return Err(Error::ShapeMismatch(format!(
                        "dual-label encoding needs {} bag identifiers, got {:?}", num, num_bag_ids)));
                }
            }
        }
        Ok(())
    }

    fn forward_norm(&mut self) -> f32 {
        if self.num == 0 {
            return 0f32;
        }
        let sum = match self.config.norm {
            Norm::L1 => math::asum(&self.cached_input),
            Norm::L2 => math::dot(&self.cached_input, &self.cached_input),
        };
        sum / self.num as f32
    }

    fn backward_norm(&self, loss_weight: f32, gradient: &mut [f32]) {
        if self.num == 0 {
            return;
        }
        let scale = loss_weight / self.num as f32;
        for (grad, &x) in gradient.iter_mut().zip(self.cached_input.iter()) {
            *grad = match self.config.norm {
                Norm::L1 => math::sign(x) * scale,
                Norm::L2 => 2f32 * x * scale,
            };
        }
    }

    fn forward_logistic(&mut self, encoding: LabelEncoding, labels: &[f32], bag_ids: Option<&[f32]>) -> f32 {
        let (alpha, beta, gamma) = self.config.factors();
        let mut ignored = 0;
        let mut open: Option<OpenBag> = None;

        for (i, &label) in labels.iter().enumerate() {
            let score = self.cached_input[i];
            let class = encoding.classify(label, bag_ids.map(|ids| ids[i]));

            if let Some(ref mut bag) = open {
                if bag.continues_with(class) {
                    if score > bag.best {
                        bag.best = score;
                        bag.representative = i;
                    }
                    continue;
                }
            }
            if let Some(bag) = open.take() {
                self.close_bag(bag, gamma);
            }

            match class {
                Class::Positive => {
                    self.weights.positive[i] = alpha;
                    self.counts.num_positive += 1;
                }
                Class::Negative => {
                    self.weights.negative[i] = beta;
                    self.counts.num_negative += 1;
                }
                Class::Bag(key) => {
                    open = Some(OpenBag { key: key, representative: i, best: score });
                }
                Class::Ignored => ignored += 1,
            }
        }
        // a bag running until the end of the batch is never closed by a following sample
        if let Some(bag) = open.take() {
            self.close_bag(bag, gamma);
        }
        if ignored > 0 {
            warn!("SemiLoss ignored {} samples with label codes unknown to {:?}", ignored, encoding);
        }

        let counts = self.counts;
        let weights = &self.weights;
        let scores = &self.cached_input;
        let group_loss = |group_weights: &[f32], count: usize, term: fn(f32) -> f32| -> f32 {
            if count == 0 {
                return 0f32;
            }
            let sum = group_weights.iter().zip(scores.iter())
                .filter(|&(&w, _)| w != 0f32)
                .fold(0f32, |sum, (&w, &x)| sum + w * term(x));
            sum / count as f32
        };

        group_loss(&weights.positive, counts.num_positive, math::positive_logistic_loss)
            + group_loss(&weights.negative, counts.num_negative, math::negative_logistic_loss)
            + group_loss(&weights.bag, counts.num_bags, math::positive_logistic_loss)
    }

    fn close_bag(&mut self, bag: OpenBag, gamma: f32) {
        self.weights.bag[bag.representative] = gamma;
        self.counts.num_bags += 1;
    }

    fn backward_logistic(&self, loss_weight: f32, gradient: &mut [f32]) {
        let counts = self.counts;
        for (i, (grad, &x)) in gradient.iter_mut().zip(self.cached_input.iter()).enumerate() {
            *grad = match self.weights.group(i) {
                Some((Group::Positive, w)) => {
                    loss_weight * w / counts.num_positive as f32 * math::positive_logistic_gradient(x)
                }
                Some((Group::Negative, w)) => {
                    loss_weight * w / counts.num_negative as f32 * math::negative_logistic_gradient(x)
                }
                Some((Group::Bag, w)) => {
                    loss_weight * w / counts.num_bags as f32 * math::positive_logistic_gradient(x)
                }
                None => 0f32,
            };
        }
    }

    fn batch_size(shape: &[usize]) -> Result<usize, Error> {
        match shape.first() {
            Some(&num) => Ok(num),
            None => Err(Error::ShapeMismatch("SemiLoss layer does not accept scalar inputs".to_owned())),
        }
    }

    fn check_label_shape(name: &str, shape: &[usize], num: usize) -> Result<(), Error> {
        if shape.first() != Some(&num) {
            return Err(Error::ShapeMismatch(format!(
                "The data and {} should have the same number: {} samples, {} shape {:?}", name, num, name, shape)));
        }
        if shape.iter().skip(1).any(|&dim| dim != 1) {
            return Err(Error::ShapeMismatch(format!(
                "{} has to hold one value per sample, got shape {:?}", name, shape)));
        }
        Ok(())
    }
}

impl ILayer for SemiLoss {
    fn type_name(&self) -> &'static str {
        "SemiLoss"
    }

    fn is_loss(&self) -> bool {
        true
    }

    fn exact_num_inputs(&self) -> Option<usize> {
        Some(self.config.num_inputs())
    }

    fn reshape(&mut self, input_shapes: &[Vec<usize>]) -> Result<Vec<usize>, Error> {
        if input_shapes.len() != self.config.num_inputs() {
            return Err(Error::ShapeMismatch(format!(
                "SemiLoss layer takes {} inputs, got {}", self.config.num_inputs(), input_shapes.len())));
        }
        let num = try!(Self::batch_size(&input_shapes[0]));
        try!(Self::check_label_shape("label", &input_shapes[1], num));
        if let SemiLossMode::Logistic(encoding) = self.config.mode {
            let dim = input_shapes[0].iter().skip(1).fold(1, |prod, i| prod * i);
            if dim != 1 {
                return Err(Error::ShapeMismatch(format!(
                    "logistic SemiLoss needs one score per sample, got shape {:?}", input_shapes[0])));
            }
            if encoding == LabelEncoding::DualLabel {
                try!(Self::check_label_shape("bag identifier", &input_shapes[2], num));
            }
        }
        Ok(vec![1])
    }

    fn compute_output(&mut self,
                      backend: &Backend<Native>,
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut SharedTensor<f32>) -> Result<(), Error> {
        let scores = try!(native_slice(backend, input_data[0]));
        let labels = try!(native_slice(backend, input_data[1]));
        let bag_ids = match input_data.get(2) {
            Some(tensor) => Some(try!(native_slice(backend, tensor))),
            None => None,
        };

        let loss = try!(self.forward(scores, labels, bag_ids));
        write_native(backend, output_data, &[loss])
    }

    fn compute_input_gradient(&self,
                              backend: &Backend<Native>,
                              loss_weight: f32,
                              propagate_down: &[bool],
                              input_gradient: &mut SharedTensor<f32>) -> Result<(), Error> {
        if let Some(input) = propagate_down.iter().skip(1).position(|&down| down) {
            return Err(ConfigurationError::LabelGradient {
                layer: self.type_name().to_owned(),
                input: input + 1,
            }.into());
        }
        let mut gradient = vec![0f32; self.cached_input.len()];
        if propagate_down.first().cloned().unwrap_or(true) {
            try!(self.backward(loss_weight, &mut gradient));
        }
        write_native(backend, input_gradient, &gradient)
    }
}

impl Into<LayerType> for SemiLossConfig {
    fn into(self) -> LayerType {
        LayerType::SemiLoss(self)
    }
}
