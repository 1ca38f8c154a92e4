//! Leaf-Semi provides the layers for training a binary classifier or detector
//! from a mix of strong and weak supervision, in the style of Leaf and Caffe
//! layers.
//!
//! Every sample of a batch is one raw score produced by a network. The labels of
//! a batch mark each sample as a strongly labeled positive, a strongly labeled
//! negative or as a member of a __bag__: a group of samples known to contain at
//! least one positive, without knowing which one.
//!
//! ## Architecture
//!
//! The crate provides two [layers][layers]:
//!
//! * The [SemiLoss][semi_loss] layer partitions a batch into positive, negative
//! and bag groups, resolves each bag to its highest scoring member and computes
//! a logistic loss with an independent normalization per group. Its backward
//! step produces the gradient of that loss with respect to every score. It can
//! also compute a plain L1 or L2 norm loss.
//! * The [SemiAccuracy][semi_accuracy] layer reports the fraction of scores whose
//! sign matches their strong label. It is a monitoring statistic and has no
//! backward step.
//!
//! Both are driven through a generic [Layer][layer], which is created from a
//! [LayerConfig][layer_config] and works on [Collenchyma][collenchyma]
//! `SharedTensor`s on the native host CPU. The layers can also be used directly
//! on slices of scores and labels.
//!
//! A SemiLoss layer keeps the group weights and counts of its last forward step
//! for the following backward step. A layer instance therefore serves one
//! training iteration at a time; concurrent iterations need separate instances.
//!
//! ## Examples
//!
//! ```
//! # extern crate leaf_semi;
//! # use leaf_semi::layers::*;
//! # fn main() {
//! let mut loss = SemiLoss::from_config(&SemiLossConfig::logistic(LabelEncoding::SingleSign));
//! // one positive, one negative and a bag of two samples
//! let value = loss.forward(&[2f32, -1f32, 0.3f32, 0.9f32], &[-1f32, -2f32, 0f32, 0f32], None).unwrap();
//! assert!(value > 0f32);
//!
//! let mut gradient = vec![0f32; 4];
//! loss.backward(1f32, &mut gradient).unwrap();
//! // the weaker bag member does not receive a gradient
//! assert_eq!(0f32, gradient[2]);
//! # }
//! ```
//!
//! [collenchyma]: https://github.com/autumnai/collenchyma
//! [layers]: ./layers/index.html
//! [semi_loss]: ./layers/loss/semi_loss/index.html
//! [semi_accuracy]: ./layers/utility/semi_accuracy/index.html
//! [layer]: ./layer/struct.Layer.html
//! [layer_config]: ./layer/struct.LayerConfig.html
#![deny(missing_docs,
        missing_debug_implementations,
        unsafe_code,
        unused_import_braces)]
#![warn(missing_copy_implementations,
        trivial_casts, trivial_numeric_casts,
        unused_qualifications)]

#[macro_use]
extern crate log;
extern crate rand;
extern crate collenchyma as co;

pub mod error;
pub mod layer;
pub mod layers;
pub mod math;
pub mod util;
pub mod weight;
