// projeto: rnnwindow
// file: src/neural/series.rs
// Sliding-window transform for numeric time series

use log::debug;
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

/// Windowed numeric series ready for a regressor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesDataset {
    pub window_size: usize,
    pub inputs: Array2<f64>,
    pub targets: Array2<f64>,
}

impl SeriesDataset {
    pub fn from_series(series: &[f64], window_size: usize) -> Self {
        let (inputs, targets) = window_transform_series(series, window_size);
        SeriesDataset { window_size, inputs, targets }
    }

    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.nrows() == 0
    }
}

/// Slices `series` into overlapping windows paired with the value that
/// follows each window.
///
/// Returns `X` shaped `(L - window_size, window_size)` and `y` shaped
/// `(L - window_size, 1)`. When `window_size >= L` both have zero rows.
pub fn window_transform_series<T: Clone>(series: &[T], window_size: usize) -> (Array2<T>, Array2<T>) {
    let n_pairs = series.len().saturating_sub(window_size);

    let inputs = Array2::from_shape_fn((n_pairs, window_size), |(i, j)| series[i + j].clone());
    let targets = Array2::from_shape_fn((n_pairs, 1), |(i, _)| series[i + window_size].clone());

    debug!("🔧 [Series] {} values, window {} -> {} pairs", series.len(), window_size, n_pairs);
    (inputs, targets)
}

/// Adds the trailing feature axis a recurrent layer expects:
/// `(N, window_size)` becomes `(N, window_size, 1)`.
pub fn as_sequence_batch(inputs: &Array2<f64>) -> Array3<f64> {
    inputs.clone().insert_axis(Axis(2))
}
