// projeto: rnnwindow
// file: src/neural/storage.rs
// JSON snapshots of windowed datasets and model weights

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::neural::model::{Layer, LayerShape, SequentialModel};
use crate::neural::utils::WindowError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub input_shape: LayerShape,
    pub num_parameters: usize,
    pub layers: Vec<Layer>,
}

impl SequentialModel {
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            name: self.name().to_string(),
            created_at: Utc::now(),
            input_shape: self.input_shape(),
            num_parameters: self.num_parameters(),
            layers: self.layers().to_vec(),
        }
    }

    /// Rebuilds a model layer by layer so a tampered snapshot fails the shape checks.
    pub fn from_snapshot(snapshot: ModelSnapshot) -> Result<Self, WindowError> {
        let (timesteps, features) = match snapshot.input_shape {
            LayerShape::Sequence { timesteps, features } => (timesteps, features),
            LayerShape::Vector(_) => {
                return Err(WindowError::ModelConfiguration(
                    format!("snapshot {} has a non-sequence input", snapshot.name)
                ));
            }
        };

        let mut model = SequentialModel::new(&snapshot.name, timesteps, features)?;
        for layer in snapshot.layers {
            model.add(layer)?;
        }
        Ok(model)
    }
}

pub fn save_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<(), WindowError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path.as_ref(), json)?;
    info!("💾 [Storage] Saved {}", path.as_ref().display());
    Ok(())
}

pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, WindowError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let value = serde_json::from_str(&contents)?;
    info!("📥 [Storage] Loaded {}", path.as_ref().display());
    Ok(value)
}

pub fn save_model_json<P: AsRef<Path>>(path: P, model: &SequentialModel) -> Result<(), WindowError> {
    save_json(path, &model.snapshot())
}

pub fn load_model_json<P: AsRef<Path>>(path: P) -> Result<SequentialModel, WindowError> {
    let snapshot: ModelSnapshot = load_json(path)?;
    SequentialModel::from_snapshot(snapshot)
}
