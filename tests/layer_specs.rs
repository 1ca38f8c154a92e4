extern crate leaf_semi;
extern crate collenchyma as co;
extern crate env_logger;

#[cfg(test)]
mod layer_spec {
    use std::rc::Rc;
    use std::sync::{Arc, RwLock};
    use co::backend::Backend;
    use co::frameworks::Native;
    use co::SharedTensor;
    use leaf_semi::error::{ConfigurationError, Error};
    use leaf_semi::layer::*;
    use leaf_semi::layers::*;
    use leaf_semi::util::{self, native_slice, native_tensor, ArcLock};
    use leaf_semi::weight::FillerType;

    fn native_backend() -> Rc<Backend<Native>> {
        Rc::new(util::native_backend().unwrap())
    }

    fn tensor(shape: &[usize], data: &[f32]) -> ArcLock<SharedTensor<f32>> {
        Arc::new(RwLock::new(native_tensor(shape, data).unwrap()))
    }

    fn read(backend: &Backend<Native>, tensor: &ArcLock<SharedTensor<f32>>) -> Vec<f32> {
        let guard = tensor.read().unwrap();
        let values = native_slice(backend, &guard).unwrap().to_vec();
        values
    }

    fn batch() -> (Vec<f32>, Vec<f32>) {
        (vec![1.5f32, -0.5, 3.0, 0.2, -2.0, 4.0, 0.4, -1.2, 2.2, 0.1],
         vec![-1f32, -1., -1., -2., -2., -2., 0., 0., 0., 0.])
    }

    #[test]
    fn semi_loss_layer_matches_engine() {
        let _ = env_logger::init();
        let backend = native_backend();
        let config = SemiLossConfig::logistic(LabelEncoding::SingleSign);
        let mut layer = Layer::from_config(backend.clone(), &LayerConfig::new("semi_loss", config)).unwrap();
        let (scores, labels) = batch();

        let loss = layer.forward(&[tensor(&[10, 1, 1, 1], &scores), tensor(&[10, 1, 1, 1], &labels)]).unwrap();
        let gradient = layer.backward(1f32).unwrap();

        let mut engine = SemiLoss::from_config(&config);
        assert_eq!(engine.forward(&scores, &labels, None).unwrap(), loss);
        assert_eq!(vec![loss], read(&backend, &layer.output()));

        let mut expected = vec![0f32; 10];
        engine.backward(1f32, &mut expected).unwrap();
        assert_eq!(expected, read(&backend, &gradient));
    }

    #[test]
    fn semi_loss_layer_on_filled_scores() {
        let backend = native_backend();
        let config = SemiLossConfig::logistic(LabelEncoding::SingleSign);
        let mut layer = Layer::from_config(backend.clone(), &LayerConfig::new("semi_loss", config)).unwrap();
        let (_, labels) = batch();
        let scores = tensor(&[10, 1], &[0f32; 10]);
        FillerType::Gaussian { mean: 0f32, std: 10f32, seed: 1701 }.fill(&mut scores.write().unwrap()).unwrap();

        let filled = read(&backend, &scores);
        let mut expected = vec![0f32; 10];
        FillerType::Gaussian { mean: 0f32, std: 10f32, seed: 1701 }.fill_slice(&mut expected);
        assert_eq!(expected, filled);

        let loss = layer.forward(&[scores, tensor(&[10, 1], &labels)]).unwrap();
        let mut engine = SemiLoss::from_config(&config);
        assert_eq!(engine.forward(&filled, &labels, None).unwrap(), loss);
    }

    #[test]
    fn excluded_scores_get_zero_gradient() {
        let backend = native_backend();
        let config = SemiLossConfig::logistic(LabelEncoding::SingleSign);
        let mut layer = Layer::from_config(backend.clone(), &LayerConfig::new("semi_loss", config)).unwrap();
        let (scores, labels) = batch();
        let inputs = [tensor(&[10], &scores), tensor(&[10], &labels)];

        layer.forward(&inputs).unwrap();
        layer.backward(1f32).unwrap();
        assert!(read(&backend, &layer.input_gradient()).iter().any(|&g| g != 0f32));

        layer.config.add_propagate_down(false);
        layer.forward(&inputs).unwrap();
        let gradient = layer.backward(1f32).unwrap();
        assert_eq!(vec![0f32; 10], read(&backend, &gradient));
        assert_eq!(vec![0f32; 10], read(&backend, &layer.input_gradient()));
    }

    #[test]
    fn semi_loss_layer_reshapes_with_batch() {
        let backend = native_backend();
        let mut layer = Layer::from_config(backend.clone(), &LayerConfig::new("semi_loss", SemiLossConfig::norm(Norm::L2))).unwrap();

        layer.forward(&[tensor(&[2, 2], &[1f32, 1., 1., 1.]), tensor(&[2], &[0f32, 0.])]).unwrap();
        let loss = layer.forward(&[tensor(&[3], &[1f32, 2., 3.]), tensor(&[3], &[0f32, 0., 0.])]).unwrap();
        assert!((loss - 14f32 / 3f32).abs() < 1e-6);

        let gradient = layer.backward(3f32).unwrap();
        assert_eq!(vec![2f32, 4., 6.], read(&backend, &gradient));
    }

    #[test]
    fn dual_label_layer_takes_three_inputs() {
        let backend = native_backend();
        let config = SemiLossConfig::logistic(LabelEncoding::DualLabel);
        let mut layer = Layer::from_config(backend.clone(), &LayerConfig::new("semi_loss", config)).unwrap();
        let scores = tensor(&[4], &[0.1f32, 0.8, 0.3, -0.4]);
        let labels = tensor(&[4], &[0f32, 0., 0., -1.]);

        match layer.forward(&[scores.clone(), labels.clone()]) {
            Err(Error::ShapeMismatch(_)) => {}
            other => panic!("expected a shape mismatch, got {:?}", other),
        }
        let bag_ids = tensor(&[4], &[2f32, 2., 3., -1.]);
        assert!(layer.forward(&[scores, labels, bag_ids]).unwrap() > 0f32);
    }

    #[test]
    fn label_mismatch_is_rejected() {
        let backend = native_backend();
        let config = SemiLossConfig::logistic(LabelEncoding::SingleSign);
        let mut layer = Layer::from_config(backend, &LayerConfig::new("semi_loss", config)).unwrap();

        let result = layer.forward(&[tensor(&[4], &[0f32; 4]), tensor(&[3], &[-1f32; 3])]);
        match result {
            Err(Error::ShapeMismatch(_)) => {}
            other => panic!("expected a shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn gradient_to_labels_is_a_configuration_error() {
        let backend = native_backend();
        let mut cfg = LayerConfig::new("semi_loss", SemiLossConfig::logistic(LabelEncoding::SingleSign));
        cfg.add_propagate_down(true);
        cfg.add_propagate_down(true);
        let mut layer = Layer::from_config(backend, &cfg).unwrap();
        let (scores, labels) = batch();
        layer.forward(&[tensor(&[10], &scores), tensor(&[10], &labels)]).unwrap();

        match layer.backward(1f32) {
            Err(Error::Configuration(ConfigurationError::LabelGradient { input, .. })) => assert_eq!(1, input),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn backward_before_forward_fails() {
        let mut layer = Layer::from_config(native_backend(), &LayerConfig::new("semi_loss", SemiLossConfig::default())).unwrap();
        assert!(layer.backward(1f32).is_err());
    }

    #[test]
    fn semi_accuracy_layer_reports_ratio() {
        let backend = native_backend();
        let mut layer = Layer::from_config(backend.clone(), &LayerConfig::new("accuracy", SemiAccuracyConfig::default())).unwrap();

        let scores = tensor(&[4, 1, 1, 1], &[0.5f32, -0.5, 2.0, -3.0]);
        let labels = tensor(&[4, 1, 1, 1], &[-1f32, -2., -2., 0.]);
        let accuracy = layer.forward(&[scores, labels]).unwrap();
        assert_eq!(0.5f32, accuracy);
        assert_eq!(vec![0.5f32], read(&backend, &layer.output()));
    }

    #[test]
    fn semi_accuracy_is_one_for_sign_labels() {
        let backend = native_backend();
        let mut layer = Layer::from_config(backend, &LayerConfig::new("accuracy", SemiAccuracyConfig::default())).unwrap();
        let scores = [3f32, -1., 0., 0.25, -7.5];
        let labels = scores.iter().map(|&s| if s > 0f32 { -1f32 } else { -2f32 }).collect::<Vec<_>>();

        let accuracy = layer.forward(&[tensor(&[5], &scores), tensor(&[5], &labels)]).unwrap();
        assert_eq!(1f32, accuracy);
    }

    #[test]
    fn semi_accuracy_has_no_backward() {
        let mut layer = Layer::from_config(native_backend(), &LayerConfig::new("accuracy", SemiAccuracyConfig::default())).unwrap();
        layer.forward(&[tensor(&[1], &[1f32]), tensor(&[1], &[-1f32])]).unwrap();
        match layer.backward(1f32) {
            Err(Error::Configuration(ConfigurationError::NotALoss(_))) => {}
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }
}
