//! Simulated plant health analysis.
//!
//! Stands in for a vision-model call: it waits a fixed latency on the
//! injected [`Clock`], then fills every metric from a fixed vocabulary using
//! the injected random source. When the previous analysis for the plant is
//! known, the new report carries a diff against it.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::models::{AnalysisMetrics, ChangesDetected, HealthTrend, PlantAnalysis};

/// Time a real inference call is expected to take.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(2000);

/// Inclusive bounds of a generated score.
pub const MIN_GENERATED_SCORE: u8 = 70;
pub const MAX_GENERATED_SCORE: u8 = 100;

pub const FLOWER_VOLUMES: &[&str] = &["Low", "Moderate", "High", "Very High"];

pub const FLOWER_DENSITIES: &[&str] = &["Sparse", "Moderate", "Dense", "Very Dense"];

pub const COLOR_HEALTH: &[&str] = &[
    "Vibrant green with healthy coloration",
    "Deep green with good vitality",
    "Healthy green with minor pale spots",
    "Excellent color with purple undertones",
];

pub const LEAF_CONDITIONS: &[&str] = &[
    "Pristine - no visible damage",
    "Excellent - minor edge browning",
    "Good - few small spots present",
    "Very good - minimal defects",
];

pub const STRESS_SIGNS: &[&str] = &[
    "No stress indicators detected",
    "Mild light stress on upper leaves",
    "Minor nutrient deficiency signs",
    "Slight overwatering indicators",
    "No significant stress",
];

pub const STRUCTURES: &[&str] = &[
    "Well-developed branching structure",
    "Compact and bushy growth pattern",
    "Tall with good internodal spacing",
    "Excellent canopy development",
];

pub const TRICHOMES: &[&str] = &[
    "Cloudy trichomes with 10% amber",
    "Mostly clear, early development",
    "Mixed clear and cloudy trichomes",
    "Dense trichome coverage, mostly cloudy",
];

const GROWTH_CHANGE: &str = "Noticeable increase in flower volume and density";
const DENSITY_CHANGE: &str = "Flower density has increased by approximately 15%";
const COLOR_CHANGE: &str = "Color vibrancy maintained with slight improvement";

pub struct AnalysisGenerator<C, R> {
    clock: C,
    rng: R,
    latency: Duration,
}

impl AnalysisGenerator<SystemClock, StdRng> {
    /// Generator on real time, seeded from the operating system.
    pub fn system(latency: Duration) -> Self {
        AnalysisGenerator::new(SystemClock, StdRng::from_os_rng()).with_latency(latency)
    }
}

impl<C: Clock, R: Rng> AnalysisGenerator<C, R> {
    pub fn new(clock: C, rng: R) -> Self {
        AnalysisGenerator {
            clock,
            rng,
            latency: DEFAULT_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Produces a new analysis for `plant_id`.
    ///
    /// `image_data` is stored as-is in `image_url`; it is not inspected.
    /// Nothing is persisted here.
    pub async fn analyze(
        &mut self,
        image_data: &str,
        plant_id: &str,
        previous: Option<&PlantAnalysis>,
    ) -> PlantAnalysis {
        debug!(plant_id, latency_ms = self.latency.as_millis() as u64, "waiting for analysis");
        self.clock.sleep(self.latency).await;

        let metrics = self.generate_metrics();
        let changes_detected = previous.map(|prev| detect_changes(prev, &metrics));

        info!(
            plant_id,
            score = metrics.overall_health_score,
            trend = changes_detected.as_ref().map(|c| c.health_trend.as_str()),
            "analysis generated"
        );

        PlantAnalysis {
            timestamp: self.clock.now(),
            plant_id: plant_id.to_string(),
            image_url: Some(image_data.to_string()),
            analysis: metrics,
            changes_detected,
        }
    }

    fn generate_metrics(&mut self) -> AnalysisMetrics {
        let rng = &mut self.rng;
        AnalysisMetrics {
            flower_volume: pick(rng, FLOWER_VOLUMES),
            flower_density: pick(rng, FLOWER_DENSITIES),
            color_health: pick(rng, COLOR_HEALTH),
            leaf_condition: pick(rng, LEAF_CONDITIONS),
            stress_signs: pick(rng, STRESS_SIGNS),
            general_structure: pick(rng, STRUCTURES),
            trichome_development: pick(rng, TRICHOMES),
            overall_health_score: rng.random_range(MIN_GENERATED_SCORE..=MAX_GENERATED_SCORE),
        }
    }
}

/// Diff of `current` against the previous analysis.
///
/// Only the trend looks at the data; the descriptions are fixed templates.
pub fn detect_changes(previous: &PlantAnalysis, current: &AnalysisMetrics) -> ChangesDetected {
    ChangesDetected {
        growth_change: GROWTH_CHANGE.to_string(),
        density_change: DENSITY_CHANGE.to_string(),
        color_change: COLOR_CHANGE.to_string(),
        health_trend: HealthTrend::from_scores(previous.score(), current.overall_health_score),
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}
