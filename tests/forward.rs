use rand::rngs::StdRng;
use rand::SeedableRng;

use seqnet::{
    predict, select_device, ActivationFunction, BackendAvailability, Device, Flatten, Linear,
    ModelSpec, NnError, Sequential, Stage, Tensor,
};

const TOL: f64 = 1e-9;

fn quickstart(seed: u64) -> Sequential {
    ModelSpec { seed: Some(seed), ..ModelSpec::quickstart() }
        .build(Device::Cpu)
        .unwrap()
}

#[test]
fn flatten_keeps_batch_dimension() {
    let mut rng = StdRng::seed_from_u64(0);
    for n in [1, 3, 8] {
        let x = Tensor::rand_with(&[n, 28, 28], &mut rng);
        let y = Flatten::new(1).forward(&x).unwrap();
        assert_eq!(y.shape(), &[n, 784]);
        assert_eq!(y.data(), x.data());
    }
}

#[test]
fn linear_maps_feature_count() {
    let mut rng = StdRng::seed_from_u64(1);
    let layer = Linear::new(784, 20, &mut rng).unwrap();
    let x = Tensor::rand_with(&[5, 784], &mut rng);
    assert_eq!(layer.forward(&x).unwrap().shape(), &[5, 20]);
}

#[test]
fn linear_fails_fast_on_wrong_feature_count() {
    let mut rng = StdRng::seed_from_u64(2);
    let layer = Linear::new(784, 20, &mut rng).unwrap();
    let x = Tensor::rand_with(&[3, 28, 28], &mut rng);
    let err = layer.forward(&x).unwrap_err();
    assert_eq!(
        err,
        NnError::ShapeMismatch { op: "linear".to_string(), expected: vec![3, 28, 784], got: vec![3, 28, 28] }
    );
}

#[test]
fn relu_is_idempotent_and_non_negative() {
    let mut rng = StdRng::seed_from_u64(3);
    let x = Tensor::uniform_with(&[4, 16], -1.0, 1.0, &mut rng);
    let once = ActivationFunction::ReLU.apply(&x);
    let twice = ActivationFunction::ReLU.apply(&once);
    assert_eq!(once, twice);
    assert!(once.data().iter().all(|&v| v >= 0.0));
    assert!(x.data().iter().any(|&v| v < 0.0));
}

#[test]
fn quickstart_forward_produces_logits_per_example() {
    let model = quickstart(7);
    let mut rng = StdRng::seed_from_u64(8);
    let x = Tensor::rand_with(&[3, 28, 28], &mut rng);
    let logits = model.forward(&x).unwrap();
    assert_eq!(logits.shape(), &[3, 10]);
    assert_eq!(model.output_shape(x.shape()).unwrap(), logits.shape());
}

#[test]
fn hand_built_pipeline_matches_spec_build_shape() {
    let mut rng = StdRng::seed_from_u64(9);
    let model = Sequential::new(vec![
        Flatten::new(1).into(),
        Linear::new(784, 20, &mut rng).unwrap().into(),
        ActivationFunction::ReLU.into(),
        Linear::new(20, 10, &mut rng).unwrap().into(),
    ])
    .unwrap();
    let x = Tensor::rand_with(&[3, 28, 28], &mut rng);
    assert_eq!(model.forward(&x).unwrap().shape(), &[3, 10]);
}

#[test]
fn softmax_rows_are_distributions() {
    let model = quickstart(10);
    let mut rng = StdRng::seed_from_u64(11);
    let logits = model.forward(&Tensor::rand_with(&[4, 28, 28], &mut rng)).unwrap();
    let prediction = predict(&logits).unwrap();

    let sums = prediction.probabilities.sum_dim(1).unwrap();
    assert!(sums.data().iter().all(|s| (s - 1.0).abs() < TOL));
    assert!(prediction.probabilities.data().iter().all(|&p| (0.0..=1.0).contains(&p)));
    assert_eq!(prediction.classes.len(), 4);
    assert!(prediction.classes.iter().all(|&c| c < 10));
    assert_eq!(prediction.classes, logits.argmax(1).unwrap());
}

#[test]
fn softmax_stage_matches_predict() {
    let mut spec = ModelSpec { seed: Some(12), ..ModelSpec::quickstart() };
    spec.layers.push(seqnet::LayerSpec::Softmax { dim: 1 });
    let with_softmax = spec.build(Device::Cpu).unwrap();
    let without = quickstart(12);

    let mut rng = StdRng::seed_from_u64(13);
    let x = Tensor::rand_with(&[2, 28, 28], &mut rng);
    let probs = with_softmax.forward(&x).unwrap();
    let expected = predict(&without.forward(&x).unwrap()).unwrap().probabilities;
    for (a, b) in probs.data().iter().zip(expected.data()) {
        assert!((a - b).abs() < TOL);
    }
    assert!(matches!(with_softmax.stages().last(), Some(Stage::Softmax { dim: 1 })));
}

#[test]
fn device_selection_falls_back_to_cpu() {
    assert_eq!(select_device(&BackendAvailability::none()), Device::Cpu);
    assert_eq!(select_device(&BackendAvailability::from_list("cpu")), Device::Cpu);
    assert_eq!(select_device(&BackendAvailability::from_list("xpu,mps")), Device::Mps);
}

#[test]
fn input_must_live_on_model_device() {
    let model = quickstart(14).to(Device::Cuda);
    let x = Tensor::zeros(&[1, 28, 28]);
    let err = model.forward(&x).unwrap_err();
    assert_eq!(err, NnError::DeviceMismatch { expected: Device::Cuda, got: Device::Cpu });

    let logits = model.forward(&x.to(Device::Cuda)).unwrap();
    assert_eq!(logits.device(), Device::Cuda);
}

#[test]
fn spec_round_trips_through_file() {
    let spec = ModelSpec { seed: Some(15), ..ModelSpec::quickstart() };
    let path = std::env::temp_dir().join(format!("seqnet-spec-{}.json", std::process::id()));

    spec.save_json(&path).unwrap();
    let loaded = ModelSpec::load_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, spec);
    assert_eq!(loaded.build(Device::Cpu).unwrap(), spec.build(Device::Cpu).unwrap());
}

#[test]
fn load_json_reports_malformed_file() {
    let path = std::env::temp_dir().join(format!("seqnet-bad-{}.json", std::process::id()));
    std::fs::write(&path, "{ not json").unwrap();
    let err = ModelSpec::load_json(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[cfg(unix)]
#[test]
fn spec_files_keep_non_utf8_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let name = OsStr::from_bytes(b"seqnet-\xff-spec.json");
    let path = std::env::temp_dir().join(name);
    let spec = ModelSpec { seed: Some(16), ..ModelSpec::quickstart() };

    spec.save_json(&path).unwrap();
    assert!(path.exists());
    let loaded = ModelSpec::load_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, spec);
}
