//! Provides the generic functionality of a layer and its configuration.
//!
//! A [Layer][1] wraps the specific implementation of a layer (e.g. a
//! [SemiLoss][2]), which is selected by the [LayerType][3] of its
//! [LayerConfig][4]. The Layer keeps track of the shapes of its inputs, calls
//! `reshape` on the implementation whenever they change and owns the output
//! and input gradient tensors.
//!
//! [1]: ./struct.Layer.html
//! [2]: ../layers/loss/semi_loss/struct.SemiLoss.html
//! [3]: ./enum.LayerType.html
//! [4]: ./struct.LayerConfig.html
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, RwLock};
use co::backend::Backend;
use co::frameworks::Native;
use co::{IBackend, SharedTensor};
use error::{ConfigurationError, Error};
use layers::*;
use util::{native_slice, resize_tensor, ArcLock};

/// The generic Layer
pub struct Layer {
    /// Identifies the Layer.
    pub name: String,
    /// The configuration of the Layer.
    pub config: Box<LayerConfig>,
    /// The implementation of the Layer.
    pub worker: Box<ILayer>,

    backend: Rc<Backend<Native>>,

    input_shapes: Vec<Vec<usize>>,
    output_data: ArcLock<SharedTensor<f32>>,
    input_gradient: ArcLock<SharedTensor<f32>>,
}

impl Layer {
    /// Creates a new Layer from a [LayerConfig][1].
    /// [1]: ./struct.LayerConfig.html
    pub fn from_config(backend: Rc<Backend<Native>>, config: &LayerConfig) -> Result<Layer, Error> {
        let worker = Self::worker_from_config(&config.layer_type);
        info!("Creating {} Layer '{}'", worker.type_name(), config.name);

        let output_data = try!(SharedTensor::<f32>::new(backend.device(), &vec![1])
            .map_err(|e| Error::Backend(format!("{:?}", e))));
        let input_gradient = try!(SharedTensor::<f32>::new(backend.device(), &vec![1])
            .map_err(|e| Error::Backend(format!("{:?}", e))));

        Ok(Layer {
            name: config.name.clone(),
            config: Box::new(config.clone()),
            worker: worker,

            backend: backend,

            input_shapes: Vec::new(),
            output_data: Arc::new(RwLock::new(output_data)),
            input_gradient: Arc::new(RwLock::new(input_gradient)),
        })
    }

    fn worker_from_config(layer_type: &LayerType) -> Box<ILayer> {
        match *layer_type {
            LayerType::SemiLoss(ref config) => Box::new(SemiLoss::from_config(config)),
            LayerType::SemiAccuracy(ref config) => Box::new(SemiAccuracy::from_config(config)),
        }
    }

    /// Uses the underlying layer implementation to compute a forward step.
    ///
    /// Reshapes the layer if the input shapes changed since the last call and
    /// returns the scalar output (the loss or the accuracy).
    pub fn forward(&mut self, inputs: &[ArcLock<SharedTensor<f32>>]) -> Result<f32, Error> {
        if let Some(expected) = self.worker.exact_num_inputs() {
            if inputs.len() != expected {
                return Err(Error::ShapeMismatch(format!("{} Layer '{}' takes {} inputs, got {}",
                                                        self.worker.type_name(), self.name, expected, inputs.len())));
            }
        }

        let mut guards = Vec::with_capacity(inputs.len());
        for input in inputs {
            guards.push(try!(input.read().map_err(|_| Error::Backend("input tensor lock is poisoned".to_owned()))));
        }
        let input_shapes = guards.iter().map(|tensor| tensor.desc().clone()).collect::<Vec<_>>();
        if input_shapes != self.input_shapes {
            let output_shape = try!(self.worker.reshape(&input_shapes));
            let mut output = try!(self.output_data.write()
                .map_err(|_| Error::Backend("output tensor lock is poisoned".to_owned())));
            try!(resize_tensor(&mut output, &output_shape));
            self.input_shapes = input_shapes;
        }

        let input_data = guards.iter().map(|guard| &**guard).collect::<Vec<&SharedTensor<f32>>>();
        let mut output = try!(self.output_data.write()
            .map_err(|_| Error::Backend("output tensor lock is poisoned".to_owned())));
        try!(self.worker.compute_output(&self.backend, &input_data, &mut output));

        let values = try!(native_slice(&self.backend, &output));
        Ok(values.first().cloned().unwrap_or(0f32))
    }

    /// Uses the underlying layer implementation to compute the gradient of the
    /// last forward step with respect to the first input.
    ///
    /// `loss_weight` is the gradient of the layer output, usually `1` for the
    /// final loss of a network.
    pub fn backward(&mut self, loss_weight: f32) -> Result<ArcLock<SharedTensor<f32>>, Error> {
        if !self.worker.is_loss() {
            return Err(ConfigurationError::NotALoss(self.name.clone()).into());
        }
        let input_shape = try!(self.input_shapes.first().cloned()
            .ok_or_else(|| Error::ShapeMismatch(format!("Layer '{}' has not seen any input; run forward first", self.name))));

        {
            let mut gradient = try!(self.input_gradient.write()
                .map_err(|_| Error::Backend("gradient tensor lock is poisoned".to_owned())));
            try!(resize_tensor(&mut gradient, &input_shape));
            let propagate_down = self.config.propagate_down(self.input_shapes.len());
            try!(self.worker.compute_input_gradient(&self.backend, loss_weight, &propagate_down, &mut gradient));
        }
        Ok(self.input_gradient.clone())
    }

    /// Returns the output tensor of the last forward step.
    pub fn output(&self) -> ArcLock<SharedTensor<f32>> {
        self.output_data.clone()
    }

    /// Returns the gradient tensor of the last backward step.
    pub fn input_gradient(&self) -> ArcLock<SharedTensor<f32>> {
        self.input_gradient.clone()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Layer {{ name: {:?}, worker: {:?}, input_shapes: {:?} }}", self.name, self.worker, self.input_shapes)
    }
}

/// A Layer implementation that can be driven by a [Layer](./struct.Layer.html).
pub trait ILayer : fmt::Debug {
    /// The name of the layer type, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Returns if the layer produces a loss and supports a backward step.
    fn is_loss(&self) -> bool {
        false
    }

    /// Returns the exact number of inputs the layer takes, if it is fixed.
    fn exact_num_inputs(&self) -> Option<usize> {
        None
    }

    /// Validates the input shapes and returns the shape of the output.
    ///
    /// Called once whenever the input shapes change; `compute_output` relies on
    /// the shapes it validated.
    fn reshape(&mut self, input_shapes: &[Vec<usize>]) -> Result<Vec<usize>, Error>;

    /// Compute the output of the layer from its inputs.
    fn compute_output(&mut self,
                      backend: &Backend<Native>,
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut SharedTensor<f32>) -> Result<(), Error>;

    /// Compute the gradient of the last output with respect to the first input.
    ///
    /// `propagate_down` holds one flag per input. Layers without a backward
    /// step report a configuration error.
    fn compute_input_gradient(&self,
                              _backend: &Backend<Native>,
                              _loss_weight: f32,
                              _propagate_down: &[bool],
                              _input_gradient: &mut SharedTensor<f32>) -> Result<(), Error> {
        Err(ConfigurationError::NotALoss(self.type_name().to_owned()).into())
    }
}

#[derive(Debug, Clone)]
/// Layer Configuration Struct
pub struct LayerConfig {
    /// The name of the Layer
    pub name: String,

    /// The type of the Layer
    pub layer_type: LayerType,

    /// Specifies on which inputs the backpropagation should be performed.
    ///
    /// If empty, the gradient is propagated to the first input only.
    pub propagate_down: Vec<bool>,
}

#[derive(Debug, Clone)]
/// The Layer Types
pub enum LayerType {
    /// Semi-supervised Loss Layer
    SemiLoss(SemiLossConfig),
    /// Semi-supervised Accuracy Layer
    SemiAccuracy(SemiAccuracyConfig),
}

impl LayerConfig {
    /// Creates a new LayerConfig
    pub fn new<L: Into<LayerType>>(name: &str, layer_type: L) -> LayerConfig {
        LayerConfig {
            name: name.to_owned(),
            layer_type: layer_type.into(),
            propagate_down: Vec::new(),
        }
    }

    /// Add if backpropagation should be performed on the next input.
    pub fn add_propagate_down(&mut self, propagate: bool) {
        self.propagate_down.push(propagate);
    }

    /// Backpropagation flags for `num_inputs` inputs.
    pub fn propagate_down(&self, num_inputs: usize) -> Vec<bool> {
        (0..num_inputs).map(|i| {
            match self.propagate_down.get(i) {
                Some(&down) => down,
                None => i == 0,
            }
        }).collect()
    }
}
