// projeto: rnnwindow
// file: src/neural/utils.rs
// Error handling, activations and weight initialisation helpers

use ndarray::{Array1, Array2, ShapeError};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Invalid step size: {0} (must be at least 1)")]
    InvalidStepSize(usize),

    #[error("Model configuration error: {0}")]
    ModelConfiguration(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Character {0:?} is not part of the vocabulary")]
    UnknownCharacter(char),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Data processing error: {0}")]
    DataProcessing(String),
}

impl From<ShapeError> for WindowError {
    fn from(err: ShapeError) -> Self {
        WindowError::Shape(err.to_string())
    }
}

impl From<serde_json::Error> for WindowError {
    fn from(err: serde_json::Error) -> Self {
        WindowError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for WindowError {
    fn from(err: toml::de::Error) -> Self {
        WindowError::Config(err.to_string())
    }
}

pub fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|val| 1.0 / (1.0 + (-val).exp()))
}

pub fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|val| val.tanh())
}

/// Softmax shifted by the max entry so large logits don't overflow.
pub fn softmax(x: &Array1<f64>) -> Array1<f64> {
    let max = x.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let exps = x.mapv(|val| (val - max).exp());
    let sum = exps.sum();
    exps / sum
}

/// Glorot-uniform matrix of shape `(rows, cols)`.
///
/// `fan_in`/`fan_out` are passed separately because the LSTM gates split one
/// logical kernel into four matrices and the limit must come from the fused one.
pub fn glorot_uniform<R: Rng + ?Sized>(
    rng: &mut R,
    rows: usize,
    cols: usize,
    fan_in: usize,
    fan_out: usize,
) -> Result<Array2<f64>, WindowError> {
    let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit)
        .map_err(|e| WindowError::ModelConfiguration(e.to_string()))?;
    Ok(Array2::from_shape_fn((rows, cols), |_| dist.sample(rng)))
}

pub fn bias_init(size: usize, value: f64) -> Array1<f64> {
    Array1::from_elem(size, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_activation_functions() {
        let x = Array1::from_vec(vec![-1.0, 0.0, 1.0]);
        let sig_result = sigmoid(&x);
        assert!(sig_result[0] < 0.5);
        assert!((sig_result[1] - 0.5).abs() < 1e-10);
        assert!(sig_result[2] > 0.5);
        let tanh_result = tanh(&x);
        assert!(tanh_result[0] < 0.0);
        assert!((tanh_result[1]).abs() < 1e-10);
        assert!(tanh_result[2] > 0.0);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let x = Array1::from_vec(vec![1000.0, 1001.0, 999.0]);
        let probs = softmax(&x);
        assert!((probs.sum() - 1.0).abs() < 1e-10);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[1] > probs[0] && probs[0] > probs[2]);
    }

    #[test]
    fn test_glorot_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = glorot_uniform(&mut rng, 5, 3, 3, 20).unwrap();
        let limit = (6.0f64 / 23.0).sqrt();
        assert_eq!(w.dim(), (5, 3));
        assert!(w.iter().all(|v| v.abs() <= limit));
    }

    #[test]
    fn test_error_conversion() {
        let err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0]).unwrap_err();
        let converted: WindowError = err.into();
        assert!(matches!(converted, WindowError::Shape(_)));
    }
}
