use candle_core::{DType, Device, Tensor};
use caserag_embed::masked_mean_l2;

fn rows(t: &Tensor) -> Vec<Vec<f32>> { t.to_vec2().unwrap() }

#[test]
fn averages_only_unmasked_tokens_per_row() {
    let dev = Device::Cpu;
    // row 0: both tokens count, mean [2, 0]; row 1: padding token ignored, mean [0, 2]
    let hidden = Tensor::from_slice(&[1.0f32, 0.0, 3.0, 0.0, 0.0, 2.0, 9.0, 9.0], (2, 2, 2), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 1, 1, 0], (2, 2), &dev).unwrap();
    let out = rows(&masked_mean_l2(&hidden, &mask).unwrap());
    let expected = [[1.0f32, 0.0], [0.0, 1.0]];
    for (row, want) in out.iter().zip(expected) {
        for (a, b) in row.iter().zip(want) { assert!((a - b).abs() < 1e-5, "{row:?} vs {want:?}"); }
    }
}

#[test]
fn output_rows_have_unit_length() {
    let dev = Device::Cpu;
    let hidden = Tensor::from_slice(&[0.3f32, -1.2, 4.0, 2.5, 0.1, -0.7], (1, 2, 3), &dev).unwrap();
    let mask = Tensor::ones((1, 2), DType::F32, &dev).unwrap();
    let row = &rows(&masked_mean_l2(&hidden, &mask).unwrap())[0];
    let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5, "norm={norm}");
}

#[test]
fn mask_shape_must_match() {
    let dev = Device::Cpu;
    let hidden = Tensor::zeros((1, 3, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((1, 2), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&hidden, &mask).is_err());
}

#[test]
fn rank_two_hidden_is_rejected() {
    let dev = Device::Cpu;
    let hidden = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((2, 4), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&hidden, &mask).is_err());
}
