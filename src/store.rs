//! Per-plant analysis histories on top of a [`KeyValueStore`].
//!
//! Each plant is one entry under `plant_<plant_id>` whose value is the JSON
//! of its [`PlantHistory`]. Saving is a plain read-modify-write with no
//! versioning, so two writers racing on the same plant keep the last write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::models::{PlantAnalysis, PlantHistory, MAX_HEALTH_SCORE};

pub const KEY_PREFIX: &str = "plant_";

pub fn storage_key(plant_id: &str) -> String {
    format!("{KEY_PREFIX}{plant_id}")
}

pub fn export_file_name(plant_id: &str) -> String {
    format!("{KEY_PREFIX}{plant_id}_history.json")
}

/// A history rendered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
}

#[derive(Clone)]
pub struct HistoryStore {
    backend: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        HistoryStore { backend }
    }

    /// Appends `analysis` to its plant's history, creating the history on
    /// first use. Returns the history as written.
    pub async fn save(&self, analysis: PlantAnalysis) -> Result<PlantHistory, StoreError> {
        self.save_with_name(analysis, None).await
    }

    /// Like [`HistoryStore::save`], also setting the display label when
    /// `name` is given. Analysis and label land in one write.
    pub async fn save_with_name(
        &self,
        analysis: PlantAnalysis,
        name: Option<String>,
    ) -> Result<PlantHistory, StoreError> {
        let plant_id = analysis.plant_id.clone();
        let key = storage_key(&plant_id);
        let mut history = self
            .read(&key, &plant_id)
            .await?
            .unwrap_or_else(|| PlantHistory::new(plant_id.clone()));
        history.analyses.push(analysis);
        if let Some(name) = name {
            history.plant_name = non_blank(name);
        }
        self.write(&key, &history).await?;
        info!(plant_id = %plant_id, analyses = history.analyses.len(), "analysis saved");
        Ok(history)
    }

    pub async fn get_history(&self, plant_id: &str) -> Result<Option<PlantHistory>, StoreError> {
        self.read(&storage_key(plant_id), plant_id).await
    }

    /// Every stored history, unordered. Entries that fail to decode are
    /// logged and left out so one bad plant does not hide the rest.
    pub async fn get_all(&self) -> Result<Vec<PlantHistory>, StoreError> {
        let mut histories = vec![];
        for key in self.backend.keys().await? {
            let Some(plant_id) = key.strip_prefix(KEY_PREFIX) else {
                continue;
            };
            let Some(raw) = self.backend.get(&key).await? else {
                continue;
            };
            match decode(&key, plant_id, &raw) {
                Ok(history) => histories.push(history),
                Err(e) => warn!(key = %key, error = %e, "skipping unreadable history"),
            }
        }
        debug!(count = histories.len(), "loaded all histories");
        Ok(histories)
    }

    /// Removes the whole history. Returns whether there was one.
    pub async fn delete(&self, plant_id: &str) -> Result<bool, StoreError> {
        let removed = self.backend.remove(&storage_key(plant_id)).await?;
        info!(plant_id, removed, "plant history deleted");
        Ok(removed)
    }

    /// Most recent analysis for the plant, used as the baseline for the
    /// next one.
    pub async fn latest(&self, plant_id: &str) -> Result<Option<PlantAnalysis>, StoreError> {
        Ok(self
            .get_history(plant_id)
            .await?
            .and_then(|mut h| h.analyses.pop()))
    }

    /// Sets or clears the display label. Analyses are left untouched.
    pub async fn set_plant_name(
        &self,
        plant_id: &str,
        name: Option<String>,
    ) -> Result<PlantHistory, StoreError> {
        let mut history = self.require(plant_id).await?;
        history.plant_name = name.and_then(non_blank);
        self.write(&storage_key(plant_id), &history).await?;
        Ok(history)
    }

    /// Pretty JSON of the stored history plus the file name to save it as.
    pub async fn export(&self, plant_id: &str) -> Result<Export, StoreError> {
        let history = self.require(plant_id).await?;
        Ok(Export {
            file_name: export_file_name(plant_id),
            contents: serde_json::to_string_pretty(&history)?,
        })
    }

    /// Writes the export into `dir` and returns the file path.
    pub async fn export_to(&self, dir: &Path, plant_id: &str) -> Result<PathBuf, StoreError> {
        let export = self.export(plant_id).await?;
        let path = dir.join(&export.file_name);
        tokio::fs::write(&path, export.contents)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        info!(plant_id, path = %path.display(), "history exported");
        Ok(path)
    }

    async fn require(&self, plant_id: &str) -> Result<PlantHistory, StoreError> {
        self.get_history(plant_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(plant_id.to_string()))
    }

    async fn read(&self, key: &str, plant_id: &str) -> Result<Option<PlantHistory>, StoreError> {
        match self.backend.get(key).await? {
            Some(raw) => decode(key, plant_id, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Writes under the key the history was read from, never one derived
    /// from the stored contents.
    async fn write(&self, key: &str, history: &PlantHistory) -> Result<(), StoreError> {
        let raw = serde_json::to_string(history)?;
        self.backend.set(key, &raw).await
    }
}

fn non_blank(name: String) -> Option<String> {
    if name.trim().is_empty() {
        None
    } else {
        Some(name)
    }
}

fn decode(key: &str, plant_id: &str, raw: &str) -> Result<PlantHistory, StoreError> {
    let history: PlantHistory =
        serde_json::from_str(raw).map_err(|e| StoreError::CorruptHistory {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    if history.plant_id != plant_id {
        return Err(StoreError::CorruptHistory {
            key: key.to_string(),
            reason: format!("entry belongs to plant '{}'", history.plant_id),
        });
    }
    if let Some(bad) = history
        .analyses
        .iter()
        .find(|a| a.score() > MAX_HEALTH_SCORE)
    {
        return Err(StoreError::CorruptHistory {
            key: key.to_string(),
            reason: format!("health score {} out of range", bad.score()),
        });
    }
    Ok(history)
}
