//! End-to-end checks of layer semantics and sequential evaluation.

use seqnet::config::{ModelConfig, ParameterStore};
use seqnet::nn::{
    Activation, Conv2D, Conv2DConfig, Dense, Embedding, Flatten, Layer, MaxPooling2D, Module,
    Padding, Rescale, SimpleRnn, Value,
};
use seqnet::tensor::{Tensor1D, Tensor2D, Tensor3D, Tensor4D};
use seqnet::{Model, NnError};

use ndarray::{arr1, arr2, Array3};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use std::sync::Arc;
use std::thread;

const TOLERANCE: f32 = 1e-5;

/// Compares two value sequences elementwise and panics on the first divergence.
fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
    assert_eq!(actual.len(), expected.len(), "lengths differ: {:?} vs {:?}", actual, expected);
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        if (a - e).abs() > tolerance {
            panic!(
                "values differ at {}: actual {:.6}, expected {:.6} ({:?} vs {:?})",
                i, a, e, actual, expected
            );
        }
    }
}

fn vector(values: &[f32]) -> Tensor1D {
    Tensor1D::from_vec(values.to_vec()).unwrap()
}

fn simple_rnn() -> SimpleRnn {
    SimpleRnn::new(
        2,
        Activation::Tanh,
        Tensor2D::new(&[2, 2], vec![0.5, 0.1, -0.2, 0.4]).unwrap(),
        Tensor2D::new(&[1, 2], vec![1.0, -1.0]).unwrap(),
        vector(&[0.1, 0.0]),
    )
    .unwrap()
}

#[test]
fn test_rescale_matches_formula_on_random_images() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let dims = (rng.gen_range(1usize..6), rng.gen_range(1usize..6), rng.gen_range(1usize..4));
        let scale: f32 = rng.gen_range(-3.0..3.0);
        let offset: f32 = rng.gen_range(-3.0..3.0);
        let input = Tensor3D::from_array(Array3::random(dims, Uniform::new(-100.0f32, 100.0))).unwrap();

        let output = Rescale::new(scale, offset).forward(&input).unwrap();
        assert_eq!(output.shape(), input.shape());
        let expected: Vec<f32> = input.to_vec().iter().map(|x| x * scale + offset).collect();
        assert_close(&output.to_vec(), &expected, TOLERANCE);
    }
}

#[test]
fn test_flatten_keeps_values_in_row_major_order() {
    let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let input = Tensor3D::new(&[2, 3, 2], values.clone()).unwrap();
    let flat = Flatten::new().forward(&input).unwrap();
    assert_eq!(flat.to_vec(), values);

    let restored = flat.reshape3([2, 3, 2]).unwrap();
    assert_eq!(restored, input);
    assert_eq!(Flatten::new().forward(&restored).unwrap(), flat);
}

#[test]
fn test_dense_identity_weights() {
    let weight = Tensor2D::new(&[2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    let zero_bias = Dense::new(2, 2, Activation::Linear, weight.clone(), Some(vector(&[0.0, 0.0]))).unwrap();
    let unit_bias = Dense::new(2, 2, Activation::Linear, weight, Some(vector(&[1.0, 1.0]))).unwrap();

    let x = vector(&[1.0, 2.0]);
    assert_eq!(zero_bias.forward(&x).unwrap().to_vec(), vec![1.0, 2.0]);
    assert_eq!(unit_bias.forward(&x).unwrap().to_vec(), vec![2.0, 3.0]);
}

#[test]
fn test_identity_convolution() {
    let conv = Conv2D::new(
        Conv2DConfig::new(1, [1, 1]),
        Tensor4D::new(&[1, 1, 1, 1], vec![1.0]).unwrap(),
        vector(&[0.0]),
    )
    .unwrap();
    let input = Tensor3D::new(&[2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(conv.forward(&input).unwrap(), input);
}

#[test]
fn test_max_pooling_two_by_two() {
    let pool = MaxPooling2D::new([2, 2], [2, 2], Padding::Valid).unwrap();
    let input = Tensor3D::new(&[2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let output = pool.forward(&input).unwrap();
    assert_eq!(output.shape(), &[1, 1, 1]);
    assert_eq!(output.to_vec(), vec![4.0]);
}

#[test]
fn test_recurrent_state_persistence_is_observable() {
    let rnn = simple_rnn();
    let x = vector(&[1.0]);

    let mut state = rnn.initial_state();
    let first = rnn.forward(&mut state, &x).unwrap();
    let second = rnn.forward(&mut state, &x).unwrap();
    assert_ne!(first, second);

    state.reset();
    let after_reset = rnn.forward(&mut state, &x).unwrap();
    assert_eq!(after_reset, first);
}

#[test]
fn test_embedding_returns_rows_and_rejects_bad_indices() {
    let weight = Tensor2D::new(&[3, 2], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    let embedding = Embedding::new(3, 2, weight.clone()).unwrap();
    for i in 0..3 {
        assert_eq!(embedding.lookup(i).unwrap(), weight.row(i as usize).unwrap());
    }
    for bad in [3, 100, -1] {
        assert!(matches!(
            embedding.lookup(bad),
            Err(NnError::IndexOutOfRange { len: 3, .. })
        ));
    }
}

#[test]
fn test_rank_mismatch_stops_evaluation() {
    let dense = Dense::new(
        2,
        1,
        Activation::Linear,
        Tensor2D::new(&[2, 1], vec![1.0, 1.0]).unwrap(),
        None,
    )
    .unwrap();
    let model = Model::new(vec![Rescale::new(1.0, 0.0).into(), dense.into()]).unwrap();
    let input = Tensor3D::new(&[1, 2, 1], vec![1.0, 2.0]).unwrap();
    match model.evaluate(Value::Image(input)) {
        Err(NnError::ShapeMismatch { context, .. }) => assert!(context.contains("Dense")),
        other => panic!("expected a shape mismatch, got {:?}", other),
    }
}

#[test]
fn test_convolutional_classifier() {
    // 4x4x1 -> conv 2x2 (2 filters, same) -> pool 2x2 -> flatten (8) -> dense softmax (3)
    let mut kernel = vec![0.0f32; 2 * 2 * 1 * 2];
    // filter 0 sums the window, filter 1 picks its top-left pixel
    for k in 0..4 {
        kernel[k * 2] = 1.0;
    }
    kernel[1] = 1.0;
    let conv = Conv2D::new(
        Conv2DConfig::new(2, [2, 2])
            .with_padding(Padding::Same)
            .with_activation(Activation::Relu),
        Tensor4D::new(&[2, 2, 1, 2], kernel).unwrap(),
        vector(&[0.0, 0.0]),
    )
    .unwrap();
    let dense = Dense::new(
        8,
        3,
        Activation::Softmax,
        Tensor2D::new(&[8, 3], (0..24).map(|v| (v % 5) as f32 * 0.1).collect()).unwrap(),
        Some(vector(&[0.0, 0.0, 0.0])),
    )
    .unwrap();
    let layers: Vec<Layer> = vec![
        Rescale::new(1.0 / 16.0, 0.0).into(),
        conv.into(),
        MaxPooling2D::square(2).unwrap().into(),
        Flatten::new().into(),
        dense.into(),
    ];
    let model = Arc::new(Model::with_input_shape(layers, &[4, 4, 1]).unwrap());

    let image = Tensor3D::new(&[4, 4, 1], (0..16).map(|v| v as f32).collect()).unwrap();
    let probabilities = model.evaluate(Value::Image(image)).unwrap().into_vector().unwrap();
    assert_eq!(probabilities.len(), 3);
    assert!(probabilities.to_vec().iter().all(|p| *p > 0.0 && *p < 1.0));
    assert_close(&[probabilities.to_vec().iter().sum::<f32>()], &[1.0], TOLERANCE);
}

#[test]
fn test_shared_model_with_independent_states() {
    let embedding = Embedding::new(4, 1, Tensor2D::new(&[4, 1], vec![0.0, 1.0, 2.0, 3.0]).unwrap()).unwrap();
    let rnn = SimpleRnn::new(
        1,
        Activation::Linear,
        Tensor2D::new(&[1, 1], vec![1.0]).unwrap(),
        Tensor2D::new(&[1, 1], vec![1.0]).unwrap(),
        vector(&[0.0]),
    )
    .unwrap();
    let model = Arc::new(Model::new(vec![embedding.into(), rnn.into()]).unwrap());

    let handles: Vec<_> = (0..4i64)
        .map(|token| {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                let mut state = model.initial_state();
                let mut last = 0.0;
                for _ in 0..5 {
                    let out = model.forward(&mut state, Value::Index(token)).unwrap();
                    last = out.into_vector().unwrap().to_vec()[0];
                }
                last
            })
        })
        .collect();

    let totals: Vec<f32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(totals, vec![0.0, 5.0, 10.0, 15.0]);
}

#[test]
fn test_text_pipeline_from_json() {
    let config = ModelConfig::from_json(
        r#"{
            "layers": [
                { "class_name": "Embedding", "input_dim": 3, "output_dim": 1 },
                { "class_name": "SimpleRNN", "units": 2, "activation": "tanh" },
                { "class_name": "Dense", "input_dim": 2, "units": 2, "activation": "softmax" }
            ]
        }"#,
    )
    .unwrap();
    let params = ParameterStore::new()
        .with("0.weight", arr2(&[[0.0f32], [1.0], [-1.0]]).into_dyn())
        .with("1.weight_hidden", arr2(&[[0.5f32, 0.1], [-0.2, 0.4]]).into_dyn())
        .with("1.weight_input", arr2(&[[1.0f32, -1.0]]).into_dyn())
        .with("1.bias", arr1(&[0.1f32, 0.0]).into_dyn())
        .with("2.weight", arr2(&[[1.0f32, -1.0], [-1.0, 1.0]]).into_dyn())
        .with("2.bias", arr1(&[0.0f32, 0.0]).into_dyn());
    let model = config.build(&params).unwrap();
    assert!(model.is_stateful());

    let tokens = [1i64, 2, 2, 0];
    let mut session = model.session();
    let outputs = session
        .evaluate_sequence(tokens.iter().copied().map(Value::Index))
        .unwrap();
    assert_eq!(outputs.len(), tokens.len());
    for out in &outputs {
        let p = out.as_vector().unwrap().to_vec();
        assert_close(&[p.iter().sum::<f32>()], &[1.0], TOLERANCE);
    }

    // Replaying the sequence on a fresh session gives the same outputs.
    let mut replay = model.session();
    let again = replay
        .evaluate_sequence(tokens.iter().copied().map(Value::Index))
        .unwrap();
    assert_eq!(again, outputs);

    // The recurrent layer on its own, driven by hand, reaches the same hidden state.
    let rnn = simple_rnn();
    let mut state = rnn.initial_state();
    for token in tokens {
        let x = vector(&[[0.0, 1.0, -1.0][token as usize]]);
        rnn.forward(&mut state, &x).unwrap();
    }
    assert_close(
        &session.state().recurrent(1).unwrap().hidden().to_vec(),
        &state.hidden().to_vec(),
        TOLERANCE,
    );
}

#[test]
fn test_configuration_errors_surface_before_evaluation() {
    let unknown = ModelConfig::from_json(
        r#"{ "layers": [ { "class_name": "Dense", "input_dim": 1, "units": 1, "activation": "gelu", "use_bias": false } ] }"#,
    )
    .unwrap();
    let params = ParameterStore::new().with("0.weight", arr2(&[[1.0f32]]).into_dyn());
    assert!(matches!(unknown.build(&params), Err(NnError::Configuration(_))));

    let bad_shape = ModelConfig::from_json(
        r#"{ "input_shape": [4], "layers": [ { "class_name": "MaxPooling2D", "pool_size": [2, 2] } ] }"#,
    )
    .unwrap();
    assert!(matches!(
        bad_shape.build(&ParameterStore::new()),
        Err(NnError::ShapeMismatch { .. })
    ));
}
