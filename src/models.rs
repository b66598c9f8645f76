use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Highest score a stored analysis may carry.
pub const MAX_HEALTH_SCORE: u8 = 100;

/// Structured metrics of a single analysis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalysisMetrics {
    pub flower_volume: String,
    pub flower_density: String,
    pub color_health: String,
    pub leaf_condition: String,
    pub stress_signs: String,
    pub general_structure: String,
    pub trichome_development: String,
    pub overall_health_score: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthTrend {
    Improved,
    Stable,
    Worse,
}

impl HealthTrend {
    /// Score swing that still counts as stable, in either direction.
    pub const STABLE_MARGIN: i16 = 5;

    pub fn from_scores(previous: u8, current: u8) -> Self {
        let delta = i16::from(current) - i16::from(previous);
        if delta > Self::STABLE_MARGIN {
            HealthTrend::Improved
        } else if delta < -Self::STABLE_MARGIN {
            HealthTrend::Worse
        } else {
            HealthTrend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthTrend::Improved => "improved",
            HealthTrend::Stable => "stable",
            HealthTrend::Worse => "worse",
        }
    }
}

/// Diff of an analysis against the previous one for the same plant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChangesDetected {
    pub growth_change: String,
    pub density_change: String,
    pub color_change: String,
    pub health_trend: HealthTrend,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlantAnalysis {
    pub timestamp: DateTime<Utc>,
    pub plant_id: String,
    /// Embedded `data:` URI of the analysed image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub analysis: AnalysisMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_detected: Option<ChangesDetected>,
}

impl PlantAnalysis {
    pub fn score(&self) -> u8 {
        self.analysis.overall_health_score
    }
}

/// Append-only record of every analysis made for one plant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlantHistory {
    pub plant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_name: Option<String>,
    pub analyses: Vec<PlantAnalysis>,
}

impl PlantHistory {
    pub fn new(plant_id: impl Into<String>) -> Self {
        PlantHistory {
            plant_id: plant_id.into(),
            plant_name: None,
            analyses: vec![],
        }
    }

    pub fn latest(&self) -> Option<&PlantAnalysis> {
        self.analyses.last()
    }

    pub fn display_name(&self) -> &str {
        self.plant_name.as_deref().unwrap_or(&self.plant_id)
    }

    /// Timestamp of the most recent analysis, if any.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.latest().map(|a| a.timestamp)
    }
}

/// Orders histories by their most recent analysis, newest first.
/// Histories without analyses go last.
pub fn sort_by_latest(histories: &mut [PlantHistory]) {
    histories.sort_by(|a, b| b.last_updated().cmp(&a.last_updated()));
}

/// Coarse bucket of a health score used when presenting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => HealthBand::Excellent,
            75..=89 => HealthBand::Good,
            60..=74 => HealthBand::Fair,
            _ => HealthBand::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthBand::Excellent => "excelente",
            HealthBand::Good => "buena",
            HealthBand::Fair => "regular",
            HealthBand::Poor => "mala",
        }
    }
}
