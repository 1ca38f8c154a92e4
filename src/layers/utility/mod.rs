//! Provides various helpful layers, which might be not directly related to
//! neural networks in general.
//!
//! These layers do not have to necesarrely manipulate the data flowing through
//! them and might have no effect on the Networks' capabilities to learn
//! (e.g. reporting an accuracy) but obey all the rules of a [Layer][1].
//!
//! [1]: ../../layer/index.html
pub use self::semi_accuracy::{Accuracy, SemiAccuracy, SemiAccuracyConfig};

pub mod semi_accuracy;
