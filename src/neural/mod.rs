// projeto: rnnwindow
// file: src/neural/mod.rs
// Module declarations for the windowing and model-building library

pub mod utils;    // Error type, activations and weight initialisation
pub mod series;   // Numeric sliding windows
pub mod text;     // Text cleaning, strided character windows, one-hot encoding
pub mod model;    // Sequential LSTM/Dense models and the model factory
pub mod storage;  // JSON snapshots of datasets and models
pub mod config;   // TOML configuration

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use model::{ModelBackend, ModelFactory, NdarrayBackend, SequentialModel, build_part1_rnn, build_part2_rnn};
pub use series::{SeriesDataset, as_sequence_batch, window_transform_series};
pub use text::{CharVocabulary, TextDataset, clean_text, encode_io_pairs, window_transform_text};
pub use utils::WindowError;
