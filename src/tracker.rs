use std::path::Path;

use rand::Rng;
use tracing::{info, warn};

use crate::analysis::AnalysisGenerator;
use crate::clock::Clock;
use crate::error::TrackerError;
use crate::image::{load_data_uri, missing_input, validate_request};
use crate::models::PlantAnalysis;
use crate::store::HistoryStore;

/// Runs one analysis end to end: validate, load the previous report,
/// generate, save.
pub struct Tracker<C, R> {
    store: HistoryStore,
    generator: AnalysisGenerator<C, R>,
}

impl<C: Clock, R: Rng> Tracker<C, R> {
    pub fn new(store: HistoryStore, generator: AnalysisGenerator<C, R>) -> Self {
        Tracker { store, generator }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Analyses an image file for `plant_id`. A `name` also labels the plant.
    pub async fn analyze_file(
        &mut self,
        image: Option<&Path>,
        plant_id: &str,
        name: Option<String>,
    ) -> Result<PlantAnalysis, TrackerError> {
        let image = validate_request(image, plant_id)?;
        let image_data = load_data_uri(image).await?;
        self.analyze(&image_data, plant_id, name).await
    }

    /// Same as [`Tracker::analyze_file`] for an image already encoded as a
    /// data URI.
    pub async fn analyze(
        &mut self,
        image_data: &str,
        plant_id: &str,
        name: Option<String>,
    ) -> Result<PlantAnalysis, TrackerError> {
        if image_data.is_empty() || plant_id.trim().is_empty() {
            return Err(missing_input());
        }

        let previous = self.store.latest(plant_id).await?;
        if previous.is_none() {
            info!(plant_id, "first analysis for plant");
        }
        let analysis = self
            .generator
            .analyze(image_data, plant_id, previous.as_ref())
            .await;

        if let Err(e) = self.store.save_with_name(analysis.clone(), name).await {
            warn!(plant_id, error = %e, "could not save analysis");
            return Err(e.into());
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::tempdir;

    use crate::clock::ManualClock;
    use crate::error::StoreError;
    use crate::kv::{KeyValueStore, MemoryStore};
    use crate::models::HealthTrend;

    fn tracker(backend: Arc<MemoryStore>) -> Tracker<ManualClock, ChaCha8Rng> {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 7, 30, 0).unwrap());
        Tracker::new(
            HistoryStore::new(backend),
            AnalysisGenerator::new(clock, ChaCha8Rng::seed_from_u64(99)),
        )
    }

    #[tokio::test]
    async fn first_then_second_analysis() {
        let mut tracker = tracker(Arc::new(MemoryStore::new()));

        let first = tracker.analyze("data:image/png;base64,AA==", "p1", None).await.unwrap();
        assert!(first.changes_detected.is_none());

        let second = tracker.analyze("data:image/png;base64,AQ==", "p1", None).await.unwrap();
        let trend = second.changes_detected.as_ref().unwrap().health_trend;
        assert_eq!(trend, HealthTrend::from_scores(first.score(), second.score()));
        assert!(second.timestamp > first.timestamp);

        let history = tracker.store().get_history("p1").await.unwrap().unwrap();
        assert_eq!(history.analyses, vec![first, second]);
    }

    #[tokio::test]
    async fn name_labels_plant() {
        let mut tracker = tracker(Arc::new(MemoryStore::new()));
        tracker
            .analyze("data:image/png;base64,AA==", "p1", Some("Helecho".into()))
            .await
            .unwrap();

        let history = tracker.store().get_history("p1").await.unwrap().unwrap();
        assert_eq!(history.display_name(), "Helecho");
    }

    #[tokio::test]
    async fn plant_id_is_stored_as_given() {
        let mut tracker = tracker(Arc::new(MemoryStore::new()));
        let analysis = tracker
            .analyze("data:image/png;base64,AA==", " p1 ", None)
            .await
            .unwrap();
        assert_eq!(analysis.plant_id, " p1 ");

        assert!(tracker.store().get_history(" p1 ").await.unwrap().is_some());
        assert!(tracker.store().get_history("p1").await.unwrap().is_none());
    }

    /// Counts writes and refuses all of them after the first `allowed`.
    struct CountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
        allowed: usize,
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(StoreError::io(
                    "counting",
                    std::io::Error::from(std::io::ErrorKind::Other),
                ));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.remove(key).await
        }

        async fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.keys().await
        }
    }

    #[tokio::test]
    async fn named_analysis_is_one_write() {
        let backend = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            writes: AtomicUsize::new(0),
            allowed: 1,
        });
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 7, 30, 0).unwrap());
        let mut tracker = Tracker::new(
            HistoryStore::new(backend.clone()),
            AnalysisGenerator::new(clock, ChaCha8Rng::seed_from_u64(5)),
        );

        tracker
            .analyze("data:image/png;base64,AA==", "p1", Some("Ficus".into()))
            .await
            .unwrap();
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);

        let history = tracker.store().get_history("p1").await.unwrap().unwrap();
        assert_eq!(history.display_name(), "Ficus");
        assert_eq!(history.analyses.len(), 1);

        // A refused write stores nothing, so retrying cannot duplicate.
        assert!(tracker
            .analyze("data:image/png;base64,AA==", "p1", Some("Ficus".into()))
            .await
            .is_err());
        let history = tracker.store().get_history("p1").await.unwrap().unwrap();
        assert_eq!(history.analyses.len(), 1);
    }

    #[tokio::test]
    async fn missing_input_generates_nothing() {
        let backend = Arc::new(MemoryStore::new());
        let mut tracker = tracker(backend.clone());

        let err = tracker.analyze_file(None, "p1", None).await.unwrap_err();
        assert!(err.is_input_error());
        let err = tracker.analyze("data:image/png;base64,AA==", "", None).await.unwrap_err();
        assert!(err.is_input_error());

        assert!(backend.keys().await.unwrap().is_empty());
        assert!(tracker.generator.clock().sleeps().is_empty());
    }

    #[tokio::test]
    async fn corrupt_history_surfaces_as_store_error() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("plant_p1", "[1, 2").await.unwrap();
        let mut tracker = tracker(backend);

        let err = tracker
            .analyze("data:image/png;base64,AA==", "p1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Store(_)));
        assert!(!err.is_input_error());
    }

    #[tokio::test]
    async fn analyzes_image_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("maceta.png");
        std::fs::write(&path, b"hola").unwrap();
        let mut tracker = tracker(Arc::new(MemoryStore::new()));

        let analysis = tracker.analyze_file(Some(path.as_path()), "p2", None).await.unwrap();
        assert_eq!(
            analysis.image_url.as_deref(),
            Some("data:image/png;base64,aG9sYQ==")
        );
    }
}
