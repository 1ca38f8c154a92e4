//! Provides the semi-supervised layers.
//!
//! The operations provided by the layers can be
//! roughly grouped into two categories:
//!
//! * [__Loss__][mod_loss]</br>
//! Loss Layers compare an output to a target value and assign cost to
//! minimize. The [SemiLoss][1] layer assigns cost to a batch of binary scores
//! that are labeled positive, negative or as members of weakly labeled bags.
//!
//! * [__Utility__][mod_utility]</br>
//! Utility Layers provide all kind of helpful functionality, which might not
//! be directly related to learning. The [SemiAccuracy][2] layer reports how
//! many scores of a batch have the sign of their label.
//!
//! For more information about how these layers are driven, see the
//! documentation for the general [Layer module][3].
//!
//! [1]: ./loss/semi_loss/index.html
//! [2]: ./utility/semi_accuracy/index.html
//! [3]: ../layer/index.html
//!
//! [mod_loss]: ./loss/index.html
//! [mod_utility]: ./utility/index.html

#[allow(unused_import_braces)]
pub use self::loss::{
    GroupCounts, GroupWeighting, GroupWeights, LabelEncoding, Norm,
    SemiLoss, SemiLossConfig, SemiLossMode,
};

#[allow(unused_import_braces)]
pub use self::utility::{
    Accuracy,
    SemiAccuracy, SemiAccuracyConfig,
};

pub mod loss;
pub mod utility;
