//! Provides the error types of the semi-supervised layers.
//!
//! Errors are split into configuration mistakes, which are never recoverable
//! and should stop a training run before it proceeds, shape mismatches between
//! the tensors fed into a layer, and failures reported by the Collenchyma
//! backend.
use std::{error, fmt};

#[derive(Debug, Clone, PartialEq)]
/// Errors that can occur while setting up or running a layer.
pub enum Error {
    /// The layer was configured or wired in a way that can never work.
    Configuration(ConfigurationError),
    /// The shapes of the input tensors do not fit the layer.
    ShapeMismatch(String),
    /// The Collenchyma backend failed to provide or access memory.
    Backend(String),
}

#[derive(Debug, Clone, PartialEq)]
/// A configuration that the layers refuse to run with.
pub enum ConfigurationError {
    /// The norm kind is not one of `L1` or `L2`.
    UnknownNorm(String),
    /// A gradient was requested for an input that holds labels.
    LabelGradient {
        /// Name of the layer.
        layer: String,
        /// Index of the label input.
        input: usize,
    },
    /// Backward was requested from a layer that does not produce a loss.
    NotALoss(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Configuration(ref err) => write!(f, "Configuration error: {}", err),
            Error::ShapeMismatch(ref msg) => write!(f, "Shape mismatch: {}", msg),
            Error::Backend(ref msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigurationError::UnknownNorm(ref norm) => write!(f, "Unknown Norm: {}", norm),
            ConfigurationError::LabelGradient { ref layer, input } => {
                write!(f, "{} Layer cannot backpropagate to label input {}.", layer, input)
            }
            ConfigurationError::NotALoss(ref layer) => {
                write!(f, "{} Layer does not produce a loss and has no backward pass.", layer)
            }
        }
    }
}

impl error::Error for Error {}

impl error::Error for ConfigurationError {}

impl From<ConfigurationError> for Error {
    fn from(err: ConfigurationError) -> Error {
        Error::Configuration(err)
    }
}
