//! Provides methods to calculate the loss (cost) of some output.
//!
//! A loss function is also sometimes called cost function.
pub use self::semi_loss::{
    Group, GroupCounts, GroupWeighting, GroupWeights, LabelEncoding, Norm,
    SemiLoss, SemiLossConfig, SemiLossMode,
};

pub mod semi_loss;
