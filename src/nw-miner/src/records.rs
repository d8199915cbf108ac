//! Asset records: which models and materials to extract per item

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One item and its appearance variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub item_id: String,
    #[serde(default)]
    pub skins: Vec<Skin>,
}

/// A model and the material it is rendered with; empty strings mean none
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skin {
    pub model: String,
    pub material: String,
}

impl Skin {
    pub fn model(&self) -> Option<&str> {
        non_empty(&self.model)
    }

    pub fn material(&self) -> Option<&str> {
        non_empty(&self.material)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Load a JSON array of records
pub fn load_records(path: &Path) -> Result<Vec<AssetRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse records file {}", path.display()))
}
