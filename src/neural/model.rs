// projeto: rnnwindow
// file: src/neural/model.rs
// Sequential LSTM/Dense models and the factory for the series and text networks

use std::collections::HashMap;
use std::fmt;

use log::{debug, info};
use ndarray::{Array1, Array2, Array3, ArrayView2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::neural::utils::{WindowError, bias_init, glorot_uniform, sigmoid, softmax, tanh};

/// Hidden units of the series regressor's LSTM.
pub const PART1_HIDDEN_UNITS: usize = 5;
/// Hidden units of the character model's LSTM.
pub const PART2_HIDDEN_UNITS: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Activation {
    Softmax,
}

impl Activation {
    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::Softmax => softmax(x),
        }
    }
}

/// Per-sample shape flowing between layers (the batch axis is implicit).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LayerShape {
    Sequence { timesteps: usize, features: usize },
    Vector(usize),
}

impl fmt::Display for LayerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerShape::Sequence { timesteps, features } => write!(f, "(None, {}, {})", timesteps, features),
            LayerShape::Vector(n) => write!(f, "(None, {})", n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayerWeights {
    pub w_ii: Array2<f64>,  // Input gate input weights
    pub w_if: Array2<f64>,  // Forget gate input weights
    pub w_ig: Array2<f64>,  // Cell gate input weights
    pub w_io: Array2<f64>,  // Output gate input weights
    pub w_hi: Array2<f64>,  // Input gate hidden weights
    pub w_hf: Array2<f64>,  // Forget gate hidden weights
    pub w_hg: Array2<f64>,  // Cell gate hidden weights
    pub w_ho: Array2<f64>,  // Output gate hidden weights
    pub b_i: Array1<f64>,   // Input gate bias
    pub b_f: Array1<f64>,   // Forget gate bias
    pub b_g: Array1<f64>,   // Cell gate bias
    pub b_o: Array1<f64>,   // Output gate bias
    pub return_sequences: bool,
}

impl LstmLayerWeights {
    pub fn new(rng: &mut StdRng, input_size: usize, units: usize, return_sequences: bool) -> Result<Self, WindowError> {
        if input_size == 0 || units == 0 {
            return Err(WindowError::ModelConfiguration(
                format!("LSTM needs positive sizes, got input {} and units {}", input_size, units)
            ));
        }

        // Limits come from the fused (input, 4 * units) and (units, 4 * units) kernels.
        let gates = 4 * units;
        Ok(LstmLayerWeights {
            w_ii: glorot_uniform(rng, units, input_size, input_size, gates)?,
            w_if: glorot_uniform(rng, units, input_size, input_size, gates)?,
            w_ig: glorot_uniform(rng, units, input_size, input_size, gates)?,
            w_io: glorot_uniform(rng, units, input_size, input_size, gates)?,
            w_hi: glorot_uniform(rng, units, units, units, gates)?,
            w_hf: glorot_uniform(rng, units, units, units, gates)?,
            w_hg: glorot_uniform(rng, units, units, units, gates)?,
            w_ho: glorot_uniform(rng, units, units, units, gates)?,
            b_i: bias_init(units, 0.0),
            b_f: bias_init(units, 1.0),
            b_g: bias_init(units, 0.0),
            b_o: bias_init(units, 0.0),
            return_sequences,
        })
    }

    pub fn units(&self) -> usize {
        self.w_ii.nrows()
    }

    pub fn input_size(&self) -> usize {
        self.w_ii.ncols()
    }

    fn num_parameters(&self) -> usize {
        self.w_ii.len() + self.w_if.len() + self.w_ig.len() + self.w_io.len()
            + self.w_hi.len() + self.w_hf.len() + self.w_hg.len() + self.w_ho.len()
            + self.b_i.len() + self.b_f.len() + self.b_g.len() + self.b_o.len()
    }

    fn check(&self) -> Result<(), WindowError> {
        let (units, input) = (self.units(), self.input_size());
        let kernels = [&self.w_if, &self.w_ig, &self.w_io];
        let recurrent = [&self.w_hi, &self.w_hf, &self.w_hg, &self.w_ho];
        let biases = [&self.b_i, &self.b_f, &self.b_g, &self.b_o];
        if kernels.iter().any(|w| w.dim() != (units, input))
            || recurrent.iter().any(|w| w.dim() != (units, units))
            || biases.iter().any(|b| b.len() != units)
        {
            return Err(WindowError::Shape(format!(
                "inconsistent LSTM weights for {} units over {} inputs", units, input
            )));
        }
        Ok(())
    }

    /// Runs the layer over every timestep; returns all hidden states, one per row.
    fn forward(&self, input: ArrayView2<f64>) -> Array2<f64> {
        let units = self.units();
        let seq_len = input.nrows();
        let mut outputs = Array2::zeros((seq_len, units));
        let mut hidden: Array1<f64> = Array1::zeros(units);
        let mut cell: Array1<f64> = Array1::zeros(units);

        for t in 0..seq_len {
            let x_t = input.row(t);

            // Input gate
            let i_t = sigmoid(&(self.w_ii.dot(&x_t) + self.w_hi.dot(&hidden) + &self.b_i));

            // Forget gate
            let f_t = sigmoid(&(self.w_if.dot(&x_t) + self.w_hf.dot(&hidden) + &self.b_f));

            // Cell candidate
            let g_t = tanh(&(self.w_ig.dot(&x_t) + self.w_hg.dot(&hidden) + &self.b_g));

            // Output gate
            let o_t = sigmoid(&(self.w_io.dot(&x_t) + self.w_ho.dot(&hidden) + &self.b_o));

            cell = &f_t * &cell + &i_t * &g_t;
            hidden = &o_t * &tanh(&cell);

            outputs.row_mut(t).assign(&hidden);
        }

        outputs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayerWeights {
    pub w: Array2<f64>,     // (units, inputs)
    pub b: Array1<f64>,
}

impl DenseLayerWeights {
    pub fn new(rng: &mut StdRng, input_size: usize, units: usize) -> Result<Self, WindowError> {
        if input_size == 0 || units == 0 {
            return Err(WindowError::ModelConfiguration(
                format!("Dense needs positive sizes, got input {} and units {}", input_size, units)
            ));
        }
        Ok(DenseLayerWeights {
            w: glorot_uniform(rng, units, input_size, input_size, units)?,
            b: bias_init(units, 0.0),
        })
    }

    pub fn units(&self) -> usize {
        self.w.nrows()
    }

    fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        self.w.dot(input) + &self.b
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Lstm(LstmLayerWeights),
    Dense(DenseLayerWeights),
    Activation(Activation),
}

enum Signal {
    Sequence(Array2<f64>),
    Vector(Array1<f64>),
}

impl Layer {
    fn kind(&self) -> &'static str {
        match self {
            Layer::Lstm(_) => "lstm",
            Layer::Dense(_) => "dense",
            Layer::Activation(_) => "activation",
        }
    }

    pub fn num_parameters(&self) -> usize {
        match self {
            Layer::Lstm(l) => l.num_parameters(),
            Layer::Dense(d) => d.w.len() + d.b.len(),
            Layer::Activation(_) => 0,
        }
    }

    fn output_shape(&self, input: LayerShape) -> Result<LayerShape, WindowError> {
        match (self, input) {
            (Layer::Lstm(l), LayerShape::Sequence { timesteps, features }) => {
                l.check()?;
                if features != l.input_size() {
                    return Err(WindowError::Shape(format!(
                        "LSTM expects {} features per step, got {}", l.input_size(), features
                    )));
                }
                Ok(if l.return_sequences {
                    LayerShape::Sequence { timesteps, features: l.units() }
                } else {
                    LayerShape::Vector(l.units())
                })
            }
            (Layer::Lstm(_), LayerShape::Vector(_)) => Err(WindowError::ModelConfiguration(
                "LSTM layer needs a sequence input (use return_sequences on the previous LSTM)".to_string()
            )),
            (Layer::Dense(d), LayerShape::Vector(n)) => {
                if d.w.ncols() != n || d.b.len() != d.units() {
                    return Err(WindowError::Shape(format!(
                        "Dense expects {} inputs, got {}", d.w.ncols(), n
                    )));
                }
                Ok(LayerShape::Vector(d.units()))
            }
            (Layer::Dense(_), LayerShape::Sequence { .. }) => Err(WindowError::ModelConfiguration(
                "Dense layer after a sequence output is not supported".to_string()
            )),
            (Layer::Activation(_), shape) => Ok(shape),
        }
    }

    fn forward(&self, signal: Signal) -> Signal {
        match (self, signal) {
            (Layer::Lstm(l), Signal::Sequence(seq)) => {
                let outputs = l.forward(seq.view());
                if l.return_sequences {
                    Signal::Sequence(outputs)
                } else {
                    let last = outputs.nrows().saturating_sub(1);
                    Signal::Vector(outputs.row(last).to_owned())
                }
            }
            (Layer::Dense(d), Signal::Vector(v)) => Signal::Vector(d.forward(&v)),
            (Layer::Activation(a), Signal::Vector(v)) => Signal::Vector(a.apply(&v)),
            (Layer::Activation(a), Signal::Sequence(mut seq)) => {
                for mut row in seq.rows_mut() {
                    let activated = a.apply(&row.to_owned());
                    row.assign(&activated);
                }
                Signal::Sequence(seq)
            }
            // Shapes are checked when layers are added.
            (_, signal) => signal,
        }
    }
}

/// One row of a model summary.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub name: String,
    pub output_shape: LayerShape,
    pub params: usize,
}

/// Linear stack of layers, shape-checked as it is built.
#[derive(Debug, Clone)]
pub struct SequentialModel {
    name: String,
    input_shape: LayerShape,
    output_shape: LayerShape,
    layers: Vec<Layer>,
}

impl SequentialModel {
    pub fn new(name: &str, timesteps: usize, features: usize) -> Result<Self, WindowError> {
        if timesteps == 0 || features == 0 {
            return Err(WindowError::ModelConfiguration(
                format!("input shape must be positive, got ({}, {})", timesteps, features)
            ));
        }
        let input_shape = LayerShape::Sequence { timesteps, features };
        Ok(SequentialModel {
            name: name.to_string(),
            input_shape,
            output_shape: input_shape,
            layers: Vec::new(),
        })
    }

    pub fn add(&mut self, layer: Layer) -> Result<&mut Self, WindowError> {
        let next = layer.output_shape(self.output_shape)?;
        debug!("🧱 [Model] {}: {} {} -> {}", self.name, layer.kind(), self.output_shape, next);
        self.output_shape = next;
        self.layers.push(layer);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_shape(&self) -> LayerShape {
        self.input_shape
    }

    pub fn output_shape(&self) -> LayerShape {
        self.output_shape
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(Layer::num_parameters).sum()
    }

    pub fn summary(&self) -> Vec<LayerSummary> {
        let mut counters: HashMap<&'static str, usize> = HashMap::new();
        let mut shape = self.input_shape;
        let mut rows = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let count = counters.entry(layer.kind()).or_insert(0);
            *count += 1;
            // Already validated in `add`.
            shape = layer.output_shape(shape).unwrap_or(shape);
            rows.push(LayerSummary {
                name: format!("{}_{}", layer.kind(), count),
                output_shape: shape,
                params: layer.num_parameters(),
            });
        }
        rows
    }

    pub fn log_summary(&self) {
        info!("📐 [Model] {} | input {}", self.name, self.input_shape);
        for row in self.summary() {
            info!("   ├── {:<14} {:<18} {:>8} params", row.name, row.output_shape.to_string(), row.params);
        }
        info!("   └── Total params: {}", self.num_parameters());
    }

    fn output_units(&self) -> Result<usize, WindowError> {
        match self.output_shape {
            LayerShape::Vector(n) => Ok(n),
            LayerShape::Sequence { .. } => Err(WindowError::ModelConfiguration(
                format!("model {} ends in a sequence; add a non-sequence layer before predicting", self.name)
            )),
        }
    }

    /// Forward pass for one sample shaped `(timesteps, features)`.
    pub fn predict(&self, sample: ArrayView2<f64>) -> Result<Array1<f64>, WindowError> {
        self.output_units()?;
        if let LayerShape::Sequence { timesteps, features } = self.input_shape {
            if sample.dim() != (timesteps, features) {
                return Err(WindowError::Shape(format!(
                    "expected sample of shape ({}, {}), got {:?}", timesteps, features, sample.dim()
                )));
            }
        }

        let mut signal = Signal::Sequence(sample.to_owned());
        for layer in &self.layers {
            signal = layer.forward(signal);
        }

        match signal {
            Signal::Vector(v) => Ok(v),
            Signal::Sequence(_) => Err(WindowError::ModelConfiguration(
                "forward pass ended in a sequence".to_string()
            )),
        }
    }

    /// Forward pass over a `(batch, timesteps, features)` array; one output row per sample.
    pub fn predict_batch(&self, batch: &Array3<f64>) -> Result<Array2<f64>, WindowError> {
        let out_units = self.output_units()?;
        let samples: Vec<ArrayView2<f64>> = batch.outer_iter().collect();

        let rows: Vec<Array1<f64>> = samples
            .par_iter()
            .map(|sample| self.predict(sample.view()))
            .collect::<Result<_, _>>()?;

        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Ok(Array2::from_shape_vec((rows.len(), out_units), flat)?)
    }
}

/// Layer library seam: anything that can assemble the two recurrent topologies.
pub trait ModelBackend {
    type Model;

    /// Recurrent layer over `(window_size, features)` feeding one linear output.
    fn recurrent_regressor(&self, window_size: usize, features: usize, hidden_units: usize)
        -> Result<Self::Model, WindowError>;

    /// Recurrent layer over one-hot `(window_size, num_chars)` feeding a softmax over `num_chars`.
    fn recurrent_classifier(&self, window_size: usize, num_chars: usize, hidden_units: usize)
        -> Result<Self::Model, WindowError>;
}

/// Builds `SequentialModel`s on ndarray. A seed makes the weights reproducible.
#[derive(Debug, Clone, Default)]
pub struct NdarrayBackend {
    seed: Option<u64>,
}

impl NdarrayBackend {
    pub fn with_seed(seed: u64) -> Self {
        NdarrayBackend { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

impl ModelBackend for NdarrayBackend {
    type Model = SequentialModel;

    fn recurrent_regressor(&self, window_size: usize, features: usize, hidden_units: usize)
        -> Result<SequentialModel, WindowError>
    {
        let mut rng = self.rng();
        let mut model = SequentialModel::new("series_regressor", window_size, features)?;
        model
            .add(Layer::Lstm(LstmLayerWeights::new(&mut rng, features, hidden_units, false)?))?
            .add(Layer::Dense(DenseLayerWeights::new(&mut rng, hidden_units, 1)?))?;
        Ok(model)
    }

    fn recurrent_classifier(&self, window_size: usize, num_chars: usize, hidden_units: usize)
        -> Result<SequentialModel, WindowError>
    {
        let mut rng = self.rng();
        let mut model = SequentialModel::new("char_classifier", window_size, num_chars)?;
        model
            .add(Layer::Lstm(LstmLayerWeights::new(&mut rng, num_chars, hidden_units, false)?))?
            .add(Layer::Dense(DenseLayerWeights::new(&mut rng, hidden_units, num_chars)?))?
            .add(Layer::Activation(Activation::Softmax))?;
        Ok(model)
    }
}

/// Builds the two fixed networks on top of a backend.
#[derive(Debug, Clone)]
pub struct ModelFactory<B: ModelBackend> {
    backend: B,
    pub regressor_units: usize,
    pub classifier_units: usize,
}

impl Default for ModelFactory<NdarrayBackend> {
    fn default() -> Self {
        ModelFactory::new(NdarrayBackend::default())
    }
}

impl<B: ModelBackend> ModelFactory<B> {
    pub fn new(backend: B) -> Self {
        ModelFactory {
            backend,
            regressor_units: PART1_HIDDEN_UNITS,
            classifier_units: PART2_HIDDEN_UNITS,
        }
    }

    pub fn with_units(mut self, regressor_units: usize, classifier_units: usize) -> Self {
        self.regressor_units = regressor_units;
        self.classifier_units = classifier_units;
        self
    }

    /// Series regressor: input `(window_size, step_size)`, one output.
    pub fn part1(&self, step_size: usize, window_size: usize) -> Result<B::Model, WindowError> {
        debug!("🛠️ [Factory] part1: window {} x step {}, {} units", window_size, step_size, self.regressor_units);
        self.backend.recurrent_regressor(window_size, step_size, self.regressor_units)
    }

    /// Character model: input `(window_size, num_chars)`, softmax over `num_chars`.
    pub fn part2(&self, window_size: usize, num_chars: usize) -> Result<B::Model, WindowError> {
        debug!("🛠️ [Factory] part2: window {} x {} chars, {} units", window_size, num_chars, self.classifier_units);
        self.backend.recurrent_classifier(window_size, num_chars, self.classifier_units)
    }
}

/// LSTM(5) over `(window_size, step_size)` followed by Dense(1).
pub fn build_part1_rnn(step_size: usize, window_size: usize) -> Result<SequentialModel, WindowError> {
    ModelFactory::default().part1(step_size, window_size)
}

/// LSTM(200) over `(window_size, num_chars)`, Dense(num_chars), softmax.
pub fn build_part2_rnn(window_size: usize, num_chars: usize) -> Result<SequentialModel, WindowError> {
    ModelFactory::default().part2(window_size, num_chars)
}
