//! Period summaries and insights computed from a stored history.

use chrono::{DateTime, Duration, Utc};

use crate::models::{HealthBand, HealthTrend, PlantAnalysis, PlantHistory};

/// Default length of a summary period.
pub const DEFAULT_PERIOD_DAYS: u32 = 7;

/// Aggregates of the analyses a plant received during one period.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub plant_id: String,
    pub plant_name: String,
    /// End of the period (inclusive).
    pub period_end: DateTime<Utc>,
    pub period_days: u32,
    pub analyses: usize,
    /// Mean score of the period, `None` when it has no analyses.
    pub average_score: Option<f64>,
    pub latest_score: Option<u8>,
    pub improved: usize,
    pub stable: usize,
    pub worse: usize,
}

impl HistorySummary {
    /// Difference between the last and the first score of the period.
    pub fn score_change(&self, history: &PlantHistory) -> Option<i16> {
        let mut scores = in_period(history, self.period_end, self.period_days).map(|a| a.score());
        let first = scores.next()?;
        let last = scores.last().unwrap_or(first);
        Some(i16::from(last) - i16::from(first))
    }
}

/// Summarises the analyses of `history` taken in the `days` before `now`.
pub fn summarize(history: &PlantHistory, now: DateTime<Utc>, days: u32) -> HistorySummary {
    let mut summary = HistorySummary {
        plant_id: history.plant_id.clone(),
        plant_name: history.display_name().to_string(),
        period_end: now,
        period_days: days,
        analyses: 0,
        average_score: None,
        latest_score: None,
        improved: 0,
        stable: 0,
        worse: 0,
    };

    let mut total = 0u32;
    for analysis in in_period(history, now, days) {
        summary.analyses += 1;
        total += u32::from(analysis.score());
        summary.latest_score = Some(analysis.score());
        match analysis.changes_detected.as_ref().map(|c| c.health_trend) {
            Some(HealthTrend::Improved) => summary.improved += 1,
            Some(HealthTrend::Stable) => summary.stable += 1,
            Some(HealthTrend::Worse) => summary.worse += 1,
            None => {}
        }
    }
    if summary.analyses > 0 {
        summary.average_score = Some(f64::from(total) / summary.analyses as f64);
    }
    summary
}

fn in_period(
    history: &PlantHistory,
    end: DateTime<Utc>,
    days: u32,
) -> impl Iterator<Item = &PlantAnalysis> {
    let start = end - Duration::days(i64::from(days));
    history
        .analyses
        .iter()
        .filter(move |a| a.timestamp > start && a.timestamp <= end)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    fn warning(message: String) -> Self {
        Insight { kind: InsightKind::Warning, message }
    }

    fn info(message: String) -> Self {
        Insight { kind: InsightKind::Info, message }
    }
}

/// Observations about the whole history, warnings first.
pub fn insights(history: &PlantHistory) -> Vec<Insight> {
    let Some(latest) = history.latest() else {
        return vec![Insight::info(
            "Todavía no hay análisis. Sube una foto para empezar.".to_string(),
        )];
    };

    let mut warnings = vec![];
    let mut infos = vec![];

    let n = history.analyses.len();
    if n >= 2 {
        let previous = history.analyses[n - 2].score();
        if let Some(changes) = &latest.changes_detected {
            let message = match changes.health_trend {
                HealthTrend::Worse => {
                    warnings.push(Insight::warning(format!(
                        "La salud bajó de {} a {} desde el análisis anterior",
                        previous,
                        latest.score()
                    )));
                    None
                }
                HealthTrend::Improved => Some(format!(
                    "La salud mejoró de {} a {} desde el análisis anterior",
                    previous,
                    latest.score()
                )),
                HealthTrend::Stable => None,
            };
            infos.extend(message.map(Insight::info));
        }

        let worse_streak = history
            .analyses
            .iter()
            .rev()
            .take_while(|a| {
                a.changes_detected
                    .as_ref()
                    .is_some_and(|c| c.health_trend == HealthTrend::Worse)
            })
            .count();
        if worse_streak >= 2 {
            warnings.push(Insight::warning(format!(
                "{} análisis seguidos con la salud en baja",
                worse_streak
            )));
        }
        infos.push(Insight::info(format!(
            "Datos históricos disponibles: {} análisis",
            n
        )));
    }

    match HealthBand::from_score(latest.score()) {
        band @ (HealthBand::Fair | HealthBand::Poor) => warnings.push(Insight::warning(format!(
            "Salud {} ({}/100): revisa riego, luz y nutrientes",
            band.label(),
            latest.score()
        ))),
        HealthBand::Excellent | HealthBand::Good => {}
    }

    warnings.extend(infos);
    warnings
}
