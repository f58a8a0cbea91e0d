// projeto: rnnwindow
// file: src/lib.rs
// Data preparation and model construction for series and character RNNs

pub mod neural;

pub use neural::*;
